//! File repository.

use crate::error::MetadataResult;
use crate::filter::FileFilter;
use crate::models::{FileRecord, NewFile};
use async_trait::async_trait;
use uuid::Uuid;

/// Repository for file record operations.
#[async_trait]
pub trait FileRepo: Send + Sync {
    /// Get a fully assembled file record (tags and ordered chunk handles
    /// included). `Ok(None)` for unknown ids.
    async fn get_file(&self, file_id: Uuid) -> MetadataResult<Option<FileRecord>>;

    /// Find the ids of all files matching the filter. An unconstrained
    /// filter matches every file.
    async fn find_file_ids(&self, filter: &FileFilter) -> MetadataResult<Vec<Uuid>>;

    /// Check whether a non-deleted file with the exact
    /// `(name, type, size, directory)` key exists.
    ///
    /// This is the pre-insert existence check backing the file uniqueness
    /// invariant; there is no store-level constraint.
    async fn file_exists(
        &self,
        file_name: &str,
        file_type: &str,
        size_bytes: u64,
        directory_id: Option<Uuid>,
    ) -> MetadataResult<bool>;

    /// Commit a new file record, returning its id.
    async fn insert_file(&self, file: &NewFile) -> MetadataResult<Uuid>;

    /// Re-point a file at a different directory (or the root).
    async fn update_file_directory(
        &self,
        file_id: Uuid,
        directory_id: Option<Uuid>,
    ) -> MetadataResult<()>;

    /// Add tags to a file's tag set (duplicates ignored).
    async fn add_file_tags(&self, file_id: Uuid, tags: &[Uuid]) -> MetadataResult<()>;

    /// Remove tags from a file's tag set (absent tags ignored).
    async fn remove_file_tags(&self, file_id: Uuid, tags: &[Uuid]) -> MetadataResult<()>;

    /// Replace a file's tag set wholesale.
    async fn replace_file_tags(&self, file_id: Uuid, tags: &[Uuid]) -> MetadataResult<()>;

    /// Delete a file record and its tag/chunk associations.
    /// Returns false for unknown ids.
    async fn delete_file(&self, file_id: Uuid) -> MetadataResult<bool>;

    /// Ids of files directly owned by any of the given directories.
    async fn file_ids_in_directories(&self, directory_ids: &[Uuid]) -> MetadataResult<Vec<Uuid>>;

    /// Ids of files carrying at least one of the given tags.
    async fn files_tagged_any(&self, tag_ids: &[Uuid]) -> MetadataResult<Vec<Uuid>>;

    /// Move every file owned by one of `from` onto `to`.
    /// Used by directory reconciliation to collapse duplicate siblings.
    async fn reassign_files(&self, from: &[Uuid], to: Uuid) -> MetadataResult<()>;

    /// Replace every reference to one of the `from` tags with `to`,
    /// collapsing duplicates. Used by tag reconciliation.
    async fn repoint_file_tags(&self, from: &[Uuid], to: Uuid) -> MetadataResult<()>;

    /// Remove every reference to the given tags from all files.
    async fn strip_tags(&self, tag_ids: &[Uuid]) -> MetadataResult<()>;
}
