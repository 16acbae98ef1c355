//! Tag repository. Same shape as the directory repository; tags form an
//! independent forest.

use crate::error::MetadataResult;
use crate::models::TagRow;
use async_trait::async_trait;
use uuid::Uuid;

/// Repository for tag records.
#[async_trait]
pub trait TagRepo: Send + Sync {
    /// Get a tag by id. `Ok(None)` for unknown ids.
    async fn get_tag(&self, tag_id: Uuid) -> MetadataResult<Option<TagRow>>;

    /// Find tags by name/parent criteria, insertion-ordered.
    /// See [`crate::repos::DirectoryRepo::find_directories`] for the axis
    /// semantics.
    async fn find_tags(
        &self,
        names: Option<&[String]>,
        parents: Option<&[Option<Uuid>]>,
    ) -> MetadataResult<Vec<TagRow>>;

    /// Insert a new tag, returning its id.
    async fn insert_tag(&self, name: &str, parent_id: Option<Uuid>) -> MetadataResult<Uuid>;

    /// Apply a rename and/or move. The outer `Option` distinguishes
    /// "leave the parent alone" from "set it" (`Some(None)` moves the tag
    /// to the root). `NotFound` for unknown ids.
    async fn update_tag(
        &self,
        tag_id: Uuid,
        new_name: Option<&str>,
        new_parent: Option<Option<Uuid>>,
    ) -> MetadataResult<()>;

    /// Delete a tag record. Returns false for unknown ids.
    async fn delete_tag(&self, tag_id: Uuid) -> MetadataResult<bool>;
}
