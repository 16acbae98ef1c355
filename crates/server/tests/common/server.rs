//! Server test utilities.

use shelf_core::config::AppConfig;
use shelf_metadata::{MetadataStore, SqliteStore};
use shelf_server::{create_router, AppState};
use shelf_transport::BlobTransport;
use std::sync::Arc;
use tempfile::TempDir;

/// A test server wrapper with all dependencies.
/// Note: #[allow(dead_code)] because each test file compiles common/ separately.
#[allow(dead_code)]
pub struct TestServer {
    pub router: axum::Router,
    pub state: AppState,
    _temp_dir: TempDir,
}

#[allow(dead_code)]
impl TestServer {
    /// Create a test server with a filesystem transport.
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Create a test server with config modifications applied before the
    /// transport and metadata store are built.
    pub async fn with_config<F>(modifier: F) -> Self
    where
        F: FnOnce(&mut AppConfig),
    {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        let mut config = AppConfig::for_testing(temp_dir.path());
        modifier(&mut config);

        let transport = shelf_transport::from_config(&config.transport)
            .await
            .expect("Failed to create transport");

        Self::build(temp_dir, config, transport).await
    }

    /// Create a test server over a caller-provided transport.
    pub async fn with_transport(transport: Arc<dyn BlobTransport>) -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        let config = AppConfig::for_testing(temp_dir.path());
        Self::build(temp_dir, config, transport).await
    }

    async fn build(
        temp_dir: TempDir,
        config: AppConfig,
        transport: Arc<dyn BlobTransport>,
    ) -> Self {
        let db_path = temp_dir.path().join("metadata.db");
        let metadata: Arc<dyn MetadataStore> = Arc::new(
            SqliteStore::new(&db_path)
                .await
                .expect("Failed to create metadata store"),
        );

        let state = AppState::new(config, metadata, transport);
        let router = create_router(state.clone());

        Self {
            router,
            state,
            _temp_dir: temp_dir,
        }
    }

    /// Get access to the underlying metadata store.
    pub fn metadata(&self) -> Arc<dyn MetadataStore> {
        self.state.metadata.clone()
    }

    /// The staging directory configured for this server.
    pub fn staging_dir(&self) -> std::path::PathBuf {
        self.state.config.server.staging_dir.clone()
    }
}
