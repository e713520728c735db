use log::info;

use crate::{
    backend::StorageBackend,
    common::{delete_database_files, Result},
    config::Config,
    sqlite_backend::SqliteBackend,
};

/// Deletes any previous database at the configured location and creates a fresh schema.
///
/// # Errors
///
/// On invalid config, file removal or DDL failure.
pub fn initialize(config: &Config) -> Result<SqliteBackend> {
    let connection_string = config.validate()?;

    if let Some(path) = connection_string.location.file_path() {
        let deleted = delete_database_files(path)?;
        if deleted > 0 {
            info!("Removed {deleted} files of previous run at {}", path.display());
        }
    }

    let mut backend = SqliteBackend::open(&connection_string, &config.namespace)?;
    backend.ensure_schema()?;
    Ok(backend)
}
