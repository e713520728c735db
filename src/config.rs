use std::{ops::RangeInclusive, path::PathBuf};

use crate::common::{BenchError, Result};

pub const DEFAULT_CONNECTION_STRING: &str = "Filename=TestDatabase.db";
pub const DEFAULT_NAMESPACE: &str = "test";
pub const DEFAULT_TITLE_SUFFIX: &str = " 2";

const MEMORY_LOCATION: &str = ":memory:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageLocation {
    File(PathBuf),
    Memory,
}

impl StorageLocation {
    #[must_use]
    pub fn file_path(&self) -> Option<&PathBuf> {
        match self {
            Self::File(path) => Some(path),
            Self::Memory => None,
        }
    }
}

/// Parsed `Key=Value;Key=Value` connection string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionString {
    pub location: StorageLocation,
}

impl ConnectionString {
    /// # Errors
    ///
    /// On malformed pairs, unknown keys or a missing file name.
    pub fn parse(input: &str) -> Result<Self> {
        let mut location = None;

        for pair in input.split(';').map(str::trim).filter(|pair| !pair.is_empty()) {
            let Some((key, value)) = pair.split_once('=') else {
                return Err(BenchError::InvalidConfig(format!(
                    "Expected Key=Value, got: {pair}"
                )));
            };

            match key.trim().to_ascii_lowercase().as_str() {
                "filename" | "data source" | "datasource" => {
                    let value = value.trim();
                    if value.is_empty() {
                        return Err(BenchError::InvalidConfig("Empty file name".into()));
                    }

                    location = Some(if value == MEMORY_LOCATION {
                        StorageLocation::Memory
                    } else {
                        StorageLocation::File(PathBuf::from(value))
                    });
                }
                other => {
                    return Err(BenchError::InvalidConfig(format!(
                        "Unknown connection string key: {other}"
                    )))
                }
            }
        }

        location
            .map(|location| Self { location })
            .ok_or_else(|| BenchError::InvalidConfig("Connection string names no file".into()))
    }

    #[must_use]
    pub fn memory() -> Self {
        Self {
            location: StorageLocation::Memory,
        }
    }

    #[must_use]
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            location: StorageLocation::File(path.into()),
        }
    }
}

/// Fixed workload parameters.
#[derive(Debug, Clone)]
pub struct Config {
    pub connection_string: String,
    pub namespace: String,
    pub row_by_row_range: RangeInclusive<i64>,
    pub bulk_insert_range: RangeInclusive<i64>,
    pub title_suffix: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            connection_string: DEFAULT_CONNECTION_STRING.into(),
            namespace: DEFAULT_NAMESPACE.into(),
            row_by_row_range: 1..=100_000,
            bulk_insert_range: 100_001..=200_000,
            title_suffix: DEFAULT_TITLE_SUFFIX.into(),
        }
    }
}

impl Config {
    /// # Errors
    ///
    /// On bad connection string, namespace, or overlapping ranges.
    pub fn validate(&self) -> Result<ConnectionString> {
        let connection_string = ConnectionString::parse(&self.connection_string)?;

        if !is_identifier(&self.namespace) {
            return Err(BenchError::InvalidConfig(format!(
                "Namespace is not a plain identifier: {}",
                self.namespace
            )));
        }

        if ranges_overlap(&self.row_by_row_range, &self.bulk_insert_range) {
            return Err(BenchError::InvalidConfig(format!(
                "Ranges {:?} and {:?} overlap",
                self.row_by_row_range, self.bulk_insert_range
            )));
        }

        Ok(connection_string)
    }
}

#[must_use]
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn ranges_overlap(lhs: &RangeInclusive<i64>, rhs: &RangeInclusive<i64>) -> bool {
    !lhs.is_empty() && !rhs.is_empty() && lhs.start() <= rhs.end() && rhs.start() <= lhs.end()
}
