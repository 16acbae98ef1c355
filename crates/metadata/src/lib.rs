//! Metadata storage for the shelf file service.
//!
//! Files, directories, and tags are kept in a SQLite database behind the
//! [`MetadataStore`] trait. Directories and tags each form a forest; file
//! records reference a directory and a set of tags plus the ordered chunk
//! handles the transport returned at upload time.

pub mod error;
pub mod filter;
pub mod models;
pub mod repos;
pub mod store;

pub use error::{parse_id, MetadataError, MetadataResult};
pub use filter::FileFilter;
pub use models::{DirectoryRow, FileRecord, NewFile, TagRow};
pub use repos::{DirectoryRepo, FileRepo, TagRepo};
pub use store::{MetadataStore, SqliteStore};

use shelf_core::config::MetadataConfig;
use std::sync::Arc;

/// Build a metadata store from configuration.
pub async fn from_config(config: &MetadataConfig) -> MetadataResult<Arc<dyn MetadataStore>> {
    match config {
        MetadataConfig::Sqlite { path } => {
            tracing::info!(path = %path.display(), "opening sqlite metadata store");
            let store = SqliteStore::new(path).await?;
            Ok(Arc::new(store))
        }
    }
}
