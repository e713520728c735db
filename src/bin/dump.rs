use std::io::{self, Write};

use anyhow::{bail, Context};
use blogbench::{backend::StorageBackend, config::Config, sqlite_backend::SqliteBackend};
use log::LevelFilter;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::new()
        .filter_level(LevelFilter::Warn)
        .init();

    let config = Config::default();
    let connection_string = config.validate().context("Invalid configuration")?;

    // Attaching a missing file would create an empty database.
    if let Some(path) = connection_string.location.file_path() {
        if !path.exists() {
            bail!("No database at {}", path.display());
        }
    }

    let backend = SqliteBackend::open(&connection_string, &config.namespace)
        .context("Failed to open database")?;
    let mut out = io::stdout().lock();

    // SCHEMA
    serde_json::to_writer_pretty(&mut out, &backend.schema()).context("Failed writing schema")?;
    writeln!(out)?;

    // DATA
    for blog in backend.load_blogs().context("Failed reading blogs")? {
        serde_json::to_writer(&mut out, &blog)?;
        writeln!(out)?;
    }
    for autor in backend.load_autors().context("Failed reading authors")? {
        serde_json::to_writer(&mut out, &autor)?;
        writeln!(out)?;
    }

    Ok(())
}
