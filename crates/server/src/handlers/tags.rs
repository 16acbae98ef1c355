//! Tag endpoints.

use crate::error::{ApiError, ApiResult};
use crate::handlers::common::{CreateNodeRequest, ListNodesParams, NodePatchRequest};
use crate::query::parse_wire_id;
use crate::state::AppState;
use crate::tree::{self, Forest, TagForest, TreeNode};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

fn forest(state: &AppState) -> TagForest {
    TagForest::new(state.metadata.clone())
}

/// GET /v1/tags - Resolve tags by name/parent criteria, optionally with
/// all their descendants.
pub async fn list_tags(
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
pub struct CreateTagResponse {
    pub tag_id: Uuid,
}

/// POST /v1/tags - Create a tag. Same-name siblings are rejected with 409.
pub async fn create_tag(
    State(state): State<AppState>,
    Json(request): Json<CreateNodeRequest>,
) -> ApiResult<(StatusCode, Json<CreateTagResponse>)> {
    let parent = request.parent_id()?;
    let tag_id = tree::create(&forest(&state), &request.name, parent).await?;
    Ok((StatusCode::CREATED, Json(CreateTagResponse { tag_id })))
}

#[derive(Debug, Serialize)]
pub struct TagDetail {
    pub tag: TreeNode,
    pub children: Vec<TreeNode>,
    /// Ids of files carrying this tag.
    pub files: Vec<Uuid>,
}

/// GET /v1/tags/{tag_id} - One tag with its direct children and the files
/// carrying it.
pub async fn get_tag(
    State(state): State<AppState>,
    Path(tag_id): Path<String>,
) -> ApiResult<Json<TagDetail>> {
    let tag_id = parse_wire_id(&tag_id)?;
    let forest = forest(&state);
    let tag = Forest::get(&forest, tag_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("tag {tag_id}")))?;
    let children = tree::children(&forest, tag_id).await?;
    let files = state.metadata.files_tagged_any(&[tag_id]).await?;
    Ok(Json(TagDetail {
        tag,
        children,
        files,
    }))
}

#[derive(Debug, Serialize)]
pub struct TagPatchResponse {
    /// Surviving tag id; differs from the patched id when the rename/move
    /// merged it into a pre-existing sibling.
    pub tag_id: Uuid,
}

/// PATCH /v1/tags/{tag_id} - Rename and/or move, collapsing any duplicate
/// sibling the change produces.
pub async fn patch_tag(
    State(state): State<AppState>,
    Path(tag_id): Path<String>,
    Json(patch): Json<NodePatchRequest>,
) -> ApiResult<Json<TagPatchResponse>> {
    let tag_id = parse_wire_id(&tag_id)?;
    let new_parent = patch.new_parent()?;
    let survivor =
        tree::rename_move(&forest(&state), tag_id, patch.name.as_deref(), new_parent).await?;
    Ok(Json(TagPatchResponse { tag_id: survivor }))
}

#[derive(Debug, Serialize)]
pub struct TagDeleteResponse {
    pub tags_deleted: usize,
}

/// DELETE /v1/tags/{tag_id} - Delete the tag and its whole subtree,
/// stripping references from files first.
pub async fn delete_tag(
    State(state): State<AppState>,
    Path(tag_id): Path<String>,
) -> ApiResult<Json<TagDeleteResponse>> {
    let tag_id = parse_wire_id(&tag_id)?;
    let tags_deleted = forest(&state).delete_cascade(tag_id).await?;
    Ok(Json(TagDeleteResponse { tags_deleted }))
}
