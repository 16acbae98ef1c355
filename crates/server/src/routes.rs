//! Route configuration.

use crate::handlers;
use crate::state::AppState;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check (unauthenticated, for load balancers and probes)
        .route("/v1/health", get(handlers::health_check))
        // Files
        .route(
            "/v1/files",
            post(handlers::upload_file).get(handlers::list_files),
        )
        .route("/v1/files/archive", get(handlers::archive_files))
        .route("/v1/files/patch", post(handlers::patch_files_by_filter))
        .route("/v1/files/delete", post(handlers::delete_files))
        .route(
            "/v1/files/{file_id}",
            get(handlers::get_file_meta)
                .patch(handlers::patch_file)
                .delete(handlers::delete_file),
        )
        .route("/v1/files/{file_id}/content", get(handlers::download_file))
        // Directories
        .route(
            "/v1/directories",
            get(handlers::list_directories).post(handlers::create_directory),
        )
        .route(
            "/v1/directories/patch",
            post(handlers::patch_directories_bulk),
        )
        .route(
            "/v1/directories/{directory_id}",
            get(handlers::get_directory)
                .patch(handlers::patch_directory)
                .delete(handlers::delete_directory),
        )
        .route(
            "/v1/directories/{directory_id}/archive",
            get(handlers::archive_directory),
        )
        // Tags
        .route(
            "/v1/tags",
            get(handlers::list_tags).post(handlers::create_tag),
        )
        .route(
            "/v1/tags/{tag_id}",
            get(handlers::get_tag)
                .patch(handlers::patch_tag)
                .delete(handlers::delete_tag),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
