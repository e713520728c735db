use crate::{
    common::Result,
    entity::{Autor, Blog},
    schema::Table,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BulkConfig {
    /// Write rows in submission order. Otherwise rows are sorted by identifier.
    pub preserve_insert_order: bool,
    /// Write backend-assigned identifiers back into the submitted records.
    pub set_output_identity: bool,
}

impl Default for BulkConfig {
    fn default() -> Self {
        Self {
            preserve_insert_order: true,
            set_output_identity: false,
        }
    }
}

/// Explicit repository over plain records: stage, commit, bulk insert.
pub trait StorageBackend {
    /// Creates missing tables and indices. Returns whether anything was created.
    ///
    /// # Errors
    ///
    /// On DDL failure.
    fn ensure_schema(&mut self) -> Result<bool>;

    fn stage_insert(&mut self, blog: Blog);

    fn stage_update(&mut self, blog: Blog, mutator: &dyn Fn(&mut Blog));

    fn pending_changes(&self) -> usize;

    /// Applies every staged change in one transaction.
    ///
    /// # Errors
    ///
    /// On any write failure, after rolling back. Staged changes are dropped.
    fn commit(&mut self) -> Result<usize>;

    /// Writes `blogs` and their authors in one transaction.
    ///
    /// # Errors
    ///
    /// On any write failure, after rolling back.
    fn bulk_insert(&mut self, blogs: &mut [Blog], config: &BulkConfig) -> Result<usize>;

    /// # Errors
    ///
    /// On query failure.
    fn count(&self, table: Table) -> Result<u64>;

    /// Every persisted blog ordered by identifier, without authors.
    ///
    /// # Errors
    ///
    /// On query failure.
    fn load_blogs(&self) -> Result<Vec<Blog>>;

    /// # Errors
    ///
    /// On query failure.
    fn load_autors(&self) -> Result<Vec<Autor>>;
}
