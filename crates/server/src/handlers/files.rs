//! File endpoints: upload, query, download, patch, delete.

use crate::error::{ApiError, ApiResult};
use crate::query::{build_file_filter, parse_directory_ref, parse_wire_id, split_csv};
use crate::state::AppState;
use crate::transfer::{self, UploadRequest};
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use shelf_core::progress::TransferProgress;
use shelf_metadata::FileRecord;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use uuid::Uuid;

/// Query parameters for a single-file upload.
#[derive(Debug, Deserialize)]
pub struct UploadParams {
    pub name: String,
    #[serde(rename = "type")]
    pub file_type: String,
    /// Owning directory id, or `root` / absent for the top level.
    pub directory: Option<String>,
    /// Comma-separated tag ids.
    pub tags: Option<String>,
    /// Client-side creation timestamp (RFC 3339).
    pub created_at: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub file_id: Uuid,
}

/// POST /v1/files - Upload one file (raw body is the payload).
pub async fn upload_file(
    State(state): State<AppState>,
    Query(params): Query<UploadParams>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<UploadResponse>)> {
    let directory_id = match params.directory.as_deref() {
        None => None,
        Some(raw) => parse_directory_ref(raw)?,
    };
    let tags = match params.tags.as_deref() {
        None => Vec::new(),
        Some(raw) => split_csv(raw)
            .iter()
            .map(|t| parse_wire_id(t))
            .collect::<ApiResult<Vec<_>>>()?,
    };
    let created_at = params
        .created_at
        .as_deref()
        .map(|raw| {
            OffsetDateTime::parse(raw, &Rfc3339)
                .map_err(|_| ApiError::InvalidInput(format!("invalid created_at: {raw}")))
        })
        .transpose()?;

    let file_id = transfer::upload_one(
        &state,
        UploadRequest {
            file_name: params.name,
            file_type: params.file_type,
            data: body,
            directory_id,
            tags,
            created_at,
        },
        &TransferProgress::default(),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(UploadResponse { file_id })))
}

/// Query parameters shared by file listing and filter-based archives.
#[derive(Debug, Default, Deserialize)]
pub struct FileFilterParams {
    /// Comma-separated tag ids; a file must carry all of them.
    pub tags: Option<String>,
    /// Comma-separated file types; any matches.
    pub types: Option<String>,
    /// Comma-separated directory ids (`root` for the top level); any matches.
    pub directories: Option<String>,
}

impl FileFilterParams {
    fn parts(&self) -> MatchParts {
        MatchParts {
            tags: self.tags.as_deref().map(split_csv).unwrap_or_default(),
            types: self.types.as_deref().map(split_csv).unwrap_or_default(),
            directories: self
                .directories
                .as_deref()
                .map(split_csv)
                .unwrap_or_default(),
        }
    }
}

struct MatchParts {
    tags: Vec<String>,
    types: Vec<String>,
    directories: Vec<String>,
}

async fn find_matching_ids(state: &AppState, params: &FileFilterParams) -> ApiResult<Vec<Uuid>> {
    let parts = params.parts();
    let filter = build_file_filter(&parts.tags, &parts.types, &parts.directories)?;
    Ok(state.metadata.find_file_ids(&filter).await?)
}

/// GET /v1/files - List file records matching the filter criteria.
/// No criteria at all lists everything.
pub async fn list_files(
    State(state): State<AppState>,
    Query(params): Query<FileFilterParams>,
) -> ApiResult<Json<Vec<FileRecord>>> {
    let ids = find_matching_ids(&state, &params).await?;
    let mut records = Vec::with_capacity(ids.len());
    for id in ids {
        if let Some(record) = state.metadata.get_file(id).await? {
            records.push(record);
        }
    }
    Ok(Json(records))
}

/// GET /v1/files/{file_id} - Get one file record.
pub async fn get_file_meta(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
) -> ApiResult<Json<FileRecord>> {
    let file_id = parse_wire_id(&file_id)?;
    let record = state
        .metadata
        .get_file(file_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("file {file_id}")))?;
    Ok(Json(record))
}

/// GET /v1/files/{file_id}/content - Download one file's payload.
pub async fn download_file(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
) -> ApiResult<Response> {
    let file_id = parse_wire_id(&file_id)?;
    let (name, data) =
        transfer::download_one(&state, file_id, &TransferProgress::default()).await?;
    Ok(attachment_response("application/octet-stream", &name, data))
}

/// GET /v1/files/archive - Download every file matching the filter
/// criteria as one tar archive.
pub async fn archive_files(
    State(state): State<AppState>,
    Query(params): Query<FileFilterParams>,
) -> ApiResult<Response> {
    let ids = find_matching_ids(&state, &params).await?;
    let archive = transfer::download_many(&state, &ids, &TransferProgress::default()).await?;
    Ok(attachment_response("application/x-tar", "shelf.tar", archive))
}

fn attachment_response(content_type: &'static str, name: &str, data: Bytes) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{name}\""),
            ),
        ],
        data,
    )
        .into_response()
}

/// Body for a single-file patch.
#[derive(Debug, Default, Deserialize)]
pub struct FilePatch {
    /// New owning directory id, or `root` to move to the top level.
    pub directory: Option<String>,
    /// Tag ids to add.
    #[serde(default)]
    pub add_tags: Vec<String>,
    /// Tag ids to remove.
    #[serde(default)]
    pub remove_tags: Vec<String>,
    /// Replacement tag set; overrides add/remove when present.
    pub tags: Option<Vec<String>>,
}

async fn apply_file_patch(state: &AppState, file_id: Uuid, patch: &FilePatch) -> ApiResult<()> {
    if let Some(raw) = patch.directory.as_deref() {
        let directory_id = parse_directory_ref(raw)?;
        if let Some(id) = directory_id {
            if state.metadata.get_directory(id).await?.is_none() {
                return Err(ApiError::NotFound(format!("directory {id}")));
            }
        }
        state
            .metadata
            .update_file_directory(file_id, directory_id)
            .await?;
    }

    if let Some(replacement) = &patch.tags {
        let tags = replacement
            .iter()
            .map(|t| parse_wire_id(t))
            .collect::<ApiResult<Vec<_>>>()?;
        state.metadata.replace_file_tags(file_id, &tags).await?;
    } else {
        if !patch.add_tags.is_empty() {
            let tags = patch
                .add_tags
                .iter()
                .map(|t| parse_wire_id(t))
                .collect::<ApiResult<Vec<_>>>()?;
            state.metadata.add_file_tags(file_id, &tags).await?;
        }
        if !patch.remove_tags.is_empty() {
            let tags = patch
                .remove_tags
                .iter()
                .map(|t| parse_wire_id(t))
                .collect::<ApiResult<Vec<_>>>()?;
            state.metadata.remove_file_tags(file_id, &tags).await?;
        }
    }
    Ok(())
}

/// PATCH /v1/files/{file_id} - Move a file and/or adjust its tag set.
pub async fn patch_file(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
    Json(patch): Json<FilePatch>,
) -> ApiResult<Json<FileRecord>> {
    let file_id = parse_wire_id(&file_id)?;
    if state.metadata.get_file(file_id).await?.is_none() {
        return Err(ApiError::NotFound(format!("file {file_id}")));
    }

    apply_file_patch(&state, file_id, &patch).await?;

    let record = state
        .metadata
        .get_file(file_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("file {file_id}")))?;
    Ok(Json(record))
}

/// Body for a filter-scoped bulk patch.
#[derive(Debug, Deserialize)]
pub struct BulkFilePatch {
    #[serde(default)]
    pub filter: FileFilterParams,
    #[serde(flatten)]
    pub patch: FilePatch,
}

#[derive(Debug, Serialize)]
pub struct BulkPatchResponse {
    pub updated: Vec<Uuid>,
}

/// POST /v1/files/patch - Apply one patch to every file matching the
/// filter criteria.
pub async fn patch_files_by_filter(
    State(state): State<AppState>,
    Json(request): Json<BulkFilePatch>,
) -> ApiResult<Json<BulkPatchResponse>> {
    let ids = find_matching_ids(&state, &request.filter).await?;
    for file_id in &ids {
        apply_file_patch(&state, *file_id, &request.patch).await?;
    }
    Ok(Json(BulkPatchResponse { updated: ids }))
}

/// DELETE /v1/files/{file_id} - Delete one file, chunks included.
pub async fn delete_file(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
) -> ApiResult<StatusCode> {
    let file_id = parse_wire_id(&file_id)?;
    transfer::delete_one(&state, file_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Body for a bulk delete.
#[derive(Debug, Deserialize)]
pub struct FileIdList {
    pub file_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct BulkDeleteResponse {
    pub deleted: Vec<Uuid>,
}

/// POST /v1/files/delete - Delete a batch of files, best-effort.
pub async fn delete_files(
    State(state): State<AppState>,
    Json(request): Json<FileIdList>,
) -> ApiResult<Json<BulkDeleteResponse>> {
    let ids = request
        .file_ids
        .iter()
        .map(|id| parse_wire_id(id))
        .collect::<ApiResult<Vec<_>>>()?;
    let deleted = transfer::delete_many(&state, &ids).await?;
    Ok(Json(BulkDeleteResponse { deleted }))
}
