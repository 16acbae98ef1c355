//! File matching predicate handed to `find_file_ids`.

use uuid::Uuid;

/// Criteria for selecting files.
///
/// Semantics:
/// - `tags`: the file must carry **all** listed tags.
/// - `types`: the file's type must be **one of** the listed types.
/// - `directories`: the file's directory must be **one of** the listed
///   references; `None` is the root sentinel (no directory).
///
/// Present axes are combined with AND; an empty filter matches every file.
#[derive(Debug, Clone, Default)]
pub struct FileFilter {
    pub tags: Vec<Uuid>,
    pub types: Vec<String>,
    pub directories: Vec<Option<Uuid>>,
}

impl FileFilter {
    /// A filter with no criteria (matches all files).
    pub fn all() -> Self {
        Self::default()
    }

    /// True when no axis is constrained.
    pub fn is_unconstrained(&self) -> bool {
        self.tags.is_empty() && self.types.is_empty() && self.directories.is_empty()
    }

    pub fn with_tags(mut self, tags: Vec<Uuid>) -> Self {
        self.tags = tags;
        self.tags.sort_unstable();
        self.tags.dedup();
        self
    }

    pub fn with_types(mut self, types: Vec<String>) -> Self {
        self.types = types;
        self.types.sort_unstable();
        self.types.dedup();
        self
    }

    pub fn with_directories(mut self, directories: Vec<Option<Uuid>>) -> Self {
        self.directories = directories;
        self.directories.sort_unstable();
        self.directories.dedup();
        self
    }
}
