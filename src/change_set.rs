use crate::entity::Blog;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    /// New blog together with its owned authors.
    Insert(Blog),
    /// Already persisted blog whose columns are rewritten.
    Update(Blog),
}

/// In-memory queue of pending writes, applied by a single commit.
#[derive(Debug, Default)]
pub struct ChangeSet {
    pending: Vec<Change>,
}

impl ChangeSet {
    #[must_use]
    pub const fn new() -> Self {
        Self { pending: vec![] }
    }

    pub fn stage_insert(&mut self, blog: Blog) {
        self.pending.push(Change::Insert(blog));
    }

    pub fn stage_update(&mut self, mut blog: Blog, mutator: &dyn Fn(&mut Blog)) {
        mutator(&mut blog);
        self.pending.push(Change::Update(blog));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Takes every pending change, leaving the set empty.
    pub fn drain(&mut self) -> Vec<Change> {
        std::mem::take(&mut self.pending)
    }
}
