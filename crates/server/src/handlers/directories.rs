//! Directory endpoints.

use crate::error::{ApiError, ApiResult};
use crate::handlers::common::{CreateNodeRequest, ListNodesParams, NodePatchRequest};
use crate::query::parse_wire_id;
use crate::state::AppState;
use crate::transfer::{self, CascadeOutcome};
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use shelf_core::progress::TransferProgress;
use uuid::Uuid;

use crate::tree::{self, DirectoryForest, TreeNode};

fn forest(state: &AppState) -> DirectoryForest {
    DirectoryForest::new(state.metadata.clone())
}

/// GET /v1/directories - Resolve directories by name/parent criteria,
/// optionally with all their descendants.
pub async fn list_directories(
    State(state): State<AppState>,
    Query(params): Query<ListNodesParams>,
) -> ApiResult<Json<Vec<TreeNode>>> {
    let names = params.names();
    let parents = params.parents()?;
    let nodes = tree::resolve(
        &forest(&state),
        names.as_deref(),
        parents.as_deref(),
        params.recursive,
    )
    .await?;
    Ok(Json(nodes))
}

#[derive(Debug, Serialize)]
pub struct CreateDirectoryResponse {
    pub directory_id: Uuid,
}

/// POST /v1/directories - Create a directory. Same-name siblings are
/// rejected with 409.
pub async fn create_directory(
    State(state): State<AppState>,
    Json(request): Json<CreateNodeRequest>,
) -> ApiResult<(StatusCode, Json<CreateDirectoryResponse>)> {
    let parent = request.parent_id()?;
    let directory_id = tree::create(&forest(&state), &request.name, parent).await?;
    Ok((
        StatusCode::CREATED,
        Json(CreateDirectoryResponse { directory_id }),
    ))
}

#[derive(Debug, Serialize)]
pub struct DirectoryDetail {
    pub directory: TreeNode,
    pub children: Vec<TreeNode>,
    /// Ids of files directly owned by this directory.
    pub files: Vec<Uuid>,
}

/// GET /v1/directories/{directory_id} - One directory with its direct
/// children and owned files.
pub async fn get_directory(
    State(state): State<AppState>,
    Path(directory_id): Path<String>,
) -> ApiResult<Json<DirectoryDetail>> {
    let directory_id = parse_wire_id(&directory_id)?;
    let forest = forest(&state);
    let directory = tree::Forest::get(&forest, directory_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("directory {directory_id}")))?;
    let children = tree::children(&forest, directory_id).await?;
    let files = state
        .metadata
        .file_ids_in_directories(&[directory_id])
        .await?;
    Ok(Json(DirectoryDetail {
        directory,
        children,
        files,
    }))
}

#[derive(Debug, Serialize)]
pub struct DirectoryPatchResponse {
    /// Surviving directory id; differs from the patched id when the
    /// rename/move merged it into a pre-existing sibling.
    pub directory_id: Uuid,
}

/// PATCH /v1/directories/{directory_id} - Rename and/or move, collapsing
/// any duplicate sibling the change produces.
pub async fn patch_directory(
    State(state): State<AppState>,
    Path(directory_id): Path<String>,
    Json(patch): Json<NodePatchRequest>,
) -> ApiResult<Json<DirectoryPatchResponse>> {
    let directory_id = parse_wire_id(&directory_id)?;
    let new_parent = patch.new_parent()?;
    let survivor = tree::rename_move(
        &forest(&state),
        directory_id,
        patch.name.as_deref(),
        new_parent,
    )
    .await?;
    Ok(Json(DirectoryPatchResponse {
        directory_id: survivor,
    }))
}

/// DELETE /v1/directories/{directory_id} - Delete the directory, all its
/// descendant directories, and every file transitively under them.
pub async fn delete_directory(
    State(state): State<AppState>,
    Path(directory_id): Path<String>,
) -> ApiResult<Json<CascadeOutcome>> {
    let directory_id = parse_wire_id(&directory_id)?;
    let outcome = transfer::delete_directory_cascade(&state, directory_id).await?;
    Ok(Json(outcome))
}

/// GET /v1/directories/{directory_id}/archive - Tar archive of every file
/// transitively under the directory.
pub async fn archive_directory(
    State(state): State<AppState>,
    Path(directory_id): Path<String>,
) -> ApiResult<Response> {
    let directory_id = parse_wire_id(&directory_id)?;
    let archive =
        transfer::directory_archive(&state, directory_id, &TransferProgress::default()).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "application/x-tar".to_string()),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"directory.tar\"".to_string(),
            ),
        ],
        archive,
    )
        .into_response())
}

/// Body for a bulk directory move: every directory matching the name /
/// parent criteria is moved under the new parent.
#[derive(Debug, Deserialize)]
pub struct BulkDirectoryPatch {
    /// Comma-separated names to match; absent matches any name.
    pub name: Option<String>,
    /// Comma-separated parent ids to match (`root` for top level).
    pub parent: Option<String>,
    /// Target parent id, or `root` for the top level.
    pub new_parent: String,
}

#[derive(Debug, Serialize)]
pub struct BulkDirectoryPatchResponse {
    /// Surviving ids after any merges.
    pub directories: Vec<Uuid>,
}

/// POST /v1/directories/patch - Move every matching directory under a new
/// parent, merging into same-name siblings where they exist.
pub async fn patch_directories_bulk(
    State(state): State<AppState>,
    Json(request): Json<BulkDirectoryPatch>,
) -> ApiResult<Json<BulkDirectoryPatchResponse>> {
    let params = ListNodesParams {
        name: request.name.clone(),
        parent: request.parent.clone(),
        recursive: false,
    };
    let names = params.names();
    let parents = params.parents()?;
    let new_parent = crate::query::parse_directory_ref(&request.new_parent)?;

    let forest = forest(&state);
    let matches = tree::resolve(&forest, names.as_deref(), parents.as_deref(), false).await?;
    if matches.is_empty() {
        return Err(ApiError::NotFound(
            "no directories match the criteria".into(),
        ));
    }

    let mut directories = Vec::with_capacity(matches.len());
    for node in matches {
        let survivor = tree::rename_move(&forest, node.id, None, Some(new_parent)).await?;
        directories.push(survivor);
    }
    Ok(Json(BulkDirectoryPatchResponse { directories }))
}
