use std::path::Path;

use log::debug;

/// Primary `SQLite` result code for any constraint failure.
const SQLITE_CONSTRAINT: isize = 19;

pub type Result<T> = std::result::Result<T, BenchError>;

#[derive(Debug, thiserror::Error)]
pub enum BenchError {
    #[error("Constraint violation: {0}")]
    Constraint(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Glob(#[from] glob::PatternError),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Record in table {0} has no identifier")]
    MissingIdentity(&'static str),
    #[error("No row with identifier {id} in table {table}")]
    NotFound { table: &'static str, id: i64 },
}

impl BenchError {
    #[must_use]
    pub const fn is_constraint_violation(&self) -> bool {
        matches!(self, Self::Constraint(_))
    }
}

impl From<sqlite::Error> for BenchError {
    fn from(err: sqlite::Error) -> Self {
        let message = err
            .message
            .clone()
            .unwrap_or_else(|| "unknown sqlite failure".into());

        match err.code {
            // Extended codes keep the primary code in the low byte.
            Some(code) if code & 0xff == SQLITE_CONSTRAINT => Self::Constraint(message),
            _ => Self::Storage(message),
        }
    }
}

/// Removes a database file together with its journal companions.
///
/// Returns the number of deleted files.
///
/// # Errors
///
/// On invalid pattern or file removal failure.
pub fn delete_database_files(path: &Path) -> Result<usize> {
    let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
        return Err(BenchError::InvalidConfig(format!(
            "Database path has no file name: {}",
            path.display()
        )));
    };

    let pattern = format!("{}*", glob::Pattern::escape(&path.to_string_lossy()));
    let mut deleted = 0usize;

    for entry in glob::glob(&pattern)?.flatten() {
        let Some(candidate) = entry.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        let Some(suffix) = candidate.strip_prefix(file_name) else {
            continue;
        };

        if matches!(suffix, "" | "-journal" | "-wal" | "-shm") {
            std::fs::remove_file(&entry)?;
            debug!("Deleted {}", entry.display());
            deleted += 1;
        }
    }

    Ok(deleted)
}
