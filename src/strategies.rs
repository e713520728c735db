use log::info;

use crate::{
    backend::{BulkConfig, StorageBackend},
    common::Result,
    entity::Blog,
};

/// Stages every blog as an individual insert, then commits them as one batch.
///
/// # Errors
///
/// On commit failure. Nothing from the batch is persisted then.
pub fn insert_row_by_row(backend: &mut dyn StorageBackend, blogs: Vec<Blog>) -> Result<usize> {
    for blog in blogs {
        backend.stage_insert(blog);
    }

    let applied = backend.commit()?;
    info!("Row-by-row inserted {applied} blogs");
    Ok(applied)
}

/// Reads back every persisted blog, appends `suffix` to its title and commits.
///
/// # Errors
///
/// On read-back or commit failure.
pub fn append_title_suffix(backend: &mut dyn StorageBackend, suffix: &str) -> Result<usize> {
    let blogs = backend.load_blogs()?;
    let append = |blog: &mut Blog| blog.title.push_str(suffix);

    for blog in blogs {
        backend.stage_update(blog, &append);
    }

    let applied = backend.commit()?;
    info!("Updated {applied} blog titles");
    Ok(applied)
}

/// Writes the batch with one bulk call and commits whatever is staged afterwards.
///
/// # Errors
///
/// On bulk write or commit failure.
pub fn insert_in_bulk(
    backend: &mut dyn StorageBackend,
    blogs: &mut [Blog],
    config: &BulkConfig,
) -> Result<usize> {
    let written = backend.bulk_insert(blogs, config)?;
    backend.commit()?;
    Ok(written)
}
