//! Directory repository.

use crate::error::MetadataResult;
use crate::models::DirectoryRow;
use async_trait::async_trait;
use uuid::Uuid;

/// Repository for directory records.
#[async_trait]
pub trait DirectoryRepo: Send + Sync {
    /// Get a directory by id. `Ok(None)` for unknown ids.
    async fn get_directory(&self, directory_id: Uuid) -> MetadataResult<Option<DirectoryRow>>;

    /// Find directories whose name is in `names` AND whose parent is in
    /// `parents` (`None` entries match root directories). An omitted axis
    /// is unconstrained; both omitted returns every directory.
    ///
    /// Results are in insertion order, so the first row of a duplicate
    /// sibling group is the pre-existing record.
    async fn find_directories(
        &self,
        names: Option<&[String]>,
        parents: Option<&[Option<Uuid>]>,
    ) -> MetadataResult<Vec<DirectoryRow>>;

    /// Insert a new directory, returning its id.
    async fn insert_directory(&self, name: &str, parent_id: Option<Uuid>) -> MetadataResult<Uuid>;

    /// Apply a rename and/or move. The outer `Option` distinguishes
    /// "leave the parent alone" from "set it" (`Some(None)` moves the
    /// directory to the root). `NotFound` for unknown ids.
    async fn update_directory(
        &self,
        directory_id: Uuid,
        new_name: Option<&str>,
        new_parent: Option<Option<Uuid>>,
    ) -> MetadataResult<()>;

    /// Delete a directory record. Returns false for unknown ids.
    /// Descendant and file cleanup is the tree engine's job.
    async fn delete_directory(&self, directory_id: Uuid) -> MetadataResult<bool>;
}
