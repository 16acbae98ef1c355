//! Database models mapping to the metadata schema.

use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// File record row.
#[derive(Debug, Clone, FromRow)]
pub struct FileRow {
    pub file_id: Uuid,
    pub file_name: String,
    pub file_type: String,
    pub size_bytes: i64,
    pub directory_id: Option<Uuid>,
    /// Client-supplied creation time; older records may lack it.
    pub created_at: Option<OffsetDateTime>,
    /// Server-assigned at upload commit.
    pub uploaded_at: OffsetDateTime,
}

/// Directory record row. Directories form a forest (null parent = root).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DirectoryRow {
    pub directory_id: Uuid,
    pub directory_name: String,
    pub parent_id: Option<Uuid>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Tag record row. Tags form a forest exactly like directories.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TagRow {
    pub tag_id: Uuid,
    pub tag_name: String,
    pub parent_id: Option<Uuid>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// A fully assembled file record: row plus tag set and ordered chunk
/// handles. This is the shape the engine and the API surface work with;
/// the adapter owns the translation to and from the three backing tables.
#[derive(Debug, Clone, Serialize)]
pub struct FileRecord {
    pub file_id: Uuid,
    pub file_name: String,
    pub file_type: String,
    pub size_bytes: u64,
    pub directory_id: Option<Uuid>,
    /// Unordered, no duplicates.
    pub tags: Vec<Uuid>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub uploaded_at: OffsetDateTime,
    /// Transport handles in reassembly order.
    pub chunk_handles: Vec<String>,
}

/// Input for committing a new file record.
#[derive(Debug, Clone)]
pub struct NewFile {
    pub file_name: String,
    pub file_type: String,
    pub size_bytes: u64,
    pub directory_id: Option<Uuid>,
    pub tags: Vec<Uuid>,
    pub created_at: Option<OffsetDateTime>,
    /// Handles in send order; persisted positions preserve this order.
    pub chunk_handles: Vec<String>,
}
