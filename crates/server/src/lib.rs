//! HTTP service for the shelf file store.
//!
//! This crate holds the engine and its thin HTTP surface:
//! - Hierarchy engine over the directory and tag forests
//! - Query composition from wire criteria
//! - Transfer orchestration (chunked upload/download, bulk archives)
//! - Route handlers and application state

pub mod archive;
pub mod error;
pub mod handlers;
pub mod query;
pub mod routes;
pub mod state;
pub mod transfer;
pub mod tree;

pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
