//! Core domain types and shared logic for the shelf file-storage service.
//!
//! This crate defines the pieces shared by every other crate:
//! - The chunk codec (split/join against the transport size ceiling)
//! - Application configuration
//! - Per-transfer progress accounting
//! - The core error type

pub mod chunk;
pub mod config;
pub mod error;
pub mod progress;

pub use chunk::{join, split};
pub use config::AppConfig;
pub use error::{Error, Result};
pub use progress::TransferProgress;

/// Default per-object size ceiling imposed by the blob transport: 50 MiB.
pub const DEFAULT_MAX_OBJECT_SIZE: u64 = 50 * 1024 * 1024;
