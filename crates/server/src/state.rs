//! Application state shared across handlers.

use shelf_core::config::AppConfig;
use shelf_metadata::MetadataStore;
use shelf_transport::BlobTransport;
use std::path::Path;
use std::sync::Arc;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Metadata store.
    pub metadata: Arc<dyn MetadataStore>,
    /// Blob transport channel.
    pub transport: Arc<dyn BlobTransport>,
}

impl AppState {
    /// Create a new application state.
    pub fn new(
        config: AppConfig,
        metadata: Arc<dyn MetadataStore>,
        transport: Arc<dyn BlobTransport>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            metadata,
            transport,
        }
    }

    /// Name of the transport channel carrying chunk payloads.
    pub fn channel(&self) -> &str {
        &self.config.channel
    }

    /// Local staging directory used for chunk reassembly.
    pub fn staging_dir(&self) -> &Path {
        &self.config.server.staging_dir
    }
}
