use std::{io::Write, time::Duration};

use log::info;

use crate::{
    backend::{BulkConfig, StorageBackend},
    common::Result,
    config::Config,
    generator::generate_blogs,
    initializer::initialize,
    report::Reporter,
    schema::Table,
    strategies::{append_title_suffix, insert_in_bulk, insert_row_by_row},
};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WorkloadSummary {
    pub row_by_row: usize,
    pub updated: usize,
    pub bulk_inserted: usize,
    pub blog_count: u64,
    pub autor_count: u64,
    pub elapsed: Duration,
}

/// Resets the database, runs the three strategies and reports the final count.
///
/// The backend is closed before returning.
///
/// # Errors
///
/// On the first failure of any step.
pub fn run<W: Write>(config: &Config, reporter: &mut Reporter<W>) -> Result<WorkloadSummary> {
    let mut backend = initialize(config)?;
    run_on(&mut backend, config, reporter)
}

/// # Errors
///
/// On the first failure of any step.
pub fn run_on<W: Write>(
    backend: &mut dyn StorageBackend,
    config: &Config,
    reporter: &mut Reporter<W>,
) -> Result<WorkloadSummary> {
    let mut summary = WorkloadSummary::default();

    if backend.count(Table::Blogs)? == 0 {
        reporter.start();

        reporter.checkpoint("Start")?;
        summary.row_by_row =
            insert_row_by_row(backend, generate_blogs(config.row_by_row_range.clone()))?;
        reporter.checkpoint("Finish save")?;

        reporter.checkpoint("Start update")?;
        summary.updated = append_title_suffix(backend, &config.title_suffix)?;
        reporter.checkpoint("Finish Saved")?;

        reporter.checkpoint("Start BulkInsert")?;
        let mut blogs = generate_blogs(config.bulk_insert_range.clone());
        let bulk_config = BulkConfig {
            preserve_insert_order: true,
            set_output_identity: true,
        };
        summary.bulk_inserted = insert_in_bulk(backend, &mut blogs, &bulk_config)?;
        reporter.checkpoint("Finish BulkInsert save blogs")?;
    } else {
        info!("Blogs already present, skipping inserts");
    }

    summary.blog_count = backend.count(Table::Blogs)?;
    summary.autor_count = backend.count(Table::Autors)?;
    summary.elapsed = reporter.count(summary.blog_count)?;

    Ok(summary)
}
