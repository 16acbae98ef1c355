//! Transfer orchestration: moving file payloads between the HTTP surface
//! and the chunked blob channel.
//!
//! Uploads are two-phase: chunks go to the transport first, the metadata
//! record is committed last. A failure anywhere before the commit retracts
//! the chunks already sent, so the channel never accumulates orphans for a
//! file that was never recorded.
//!
//! Every transfer takes a [`TransferProgress`] handle from the caller, who
//! keeps a clone to observe cumulative bytes while the transfer runs. Bulk
//! operations restart the handle per item.

use crate::archive::{bundle, NameDeduper};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::tree::{self, DirectoryForest, Forest};
use bytes::Bytes;
use serde::Serialize;
use shelf_core::chunk;
use shelf_core::progress::TransferProgress;
use shelf_metadata::{FileRecord, NewFile};
use shelf_transport::ChunkHandle;
use std::collections::HashSet;
use std::path::Path;
use time::OffsetDateTime;
use uuid::Uuid;

/// One file to upload.
#[derive(Debug)]
pub struct UploadRequest {
    pub file_name: String,
    pub file_type: String,
    pub data: Bytes,
    pub directory_id: Option<Uuid>,
    pub tags: Vec<Uuid>,
    pub created_at: Option<OffsetDateTime>,
}

/// Per-item failure in a bulk operation.
#[derive(Debug, Serialize)]
pub struct ItemFailure {
    pub item: String,
    pub error: String,
}

/// Outcome of a bulk upload.
#[derive(Debug, Serialize)]
pub struct BulkUploadOutcome {
    pub uploaded: Vec<Uuid>,
    pub failures: Vec<ItemFailure>,
}

/// Outcome of a cascaded directory deletion.
#[derive(Debug, Serialize)]
pub struct CascadeOutcome {
    pub directories_deleted: usize,
    pub files_deleted: usize,
    /// Files and directories that could not be deleted, by id.
    pub failures: Vec<ItemFailure>,
}

/// Upload one file: split if the payload exceeds the channel ceiling,
/// send chunks in order, then commit the metadata record.
#[tracing::instrument(skip(state, request, progress), fields(file_name = %request.file_name, size = request.data.len()))]
pub async fn upload_one(
    state: &AppState,
    request: UploadRequest,
    progress: &TransferProgress,
) -> ApiResult<Uuid> {
    if request.file_name.trim().is_empty() {
        return Err(ApiError::InvalidInput("file name must not be empty".into()));
    }
    if request.file_type.trim().is_empty() {
        return Err(ApiError::InvalidInput("file type must not be empty".into()));
    }
    if let Some(directory_id) = request.directory_id {
        if state.metadata.get_directory(directory_id).await?.is_none() {
            return Err(ApiError::NotFound(format!("directory {directory_id}")));
        }
    }

    let size = request.data.len() as u64;
    if state
        .metadata
        .file_exists(
            &request.file_name,
            &request.file_type,
            size,
            request.directory_id,
        )
        .await?
    {
        return Err(ApiError::Conflict(format!(
            "file '{}' with the same type, size, and directory already exists",
            request.file_name
        )));
    }

    let max = state.transport.max_object_size();
    let chunks = chunk::split(&request.data, max)?;
    let total = chunks.len();
    progress.begin(size);

    let mut handles: Vec<ChunkHandle> = Vec::with_capacity(total);
    for (index, data) in chunks.into_iter().enumerate() {
        let caption = format!("{} - {}/{}", request.file_name, index + 1, total);
        let chunk_len = data.len() as u64;
        match state.transport.send(state.channel(), data, &caption).await {
            Ok(handle) => {
                progress.advance(index, max, chunk_len);
                handles.push(handle);
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    chunk = index + 1,
                    total,
                    "chunk send failed, aborting upload"
                );
                retract(state, &handles).await;
                return Err(e.into());
            }
        }
    }

    let new_file = NewFile {
        file_name: request.file_name.clone(),
        file_type: request.file_type,
        size_bytes: size,
        directory_id: request.directory_id,
        tags: request.tags,
        created_at: request.created_at,
        chunk_handles: handles.iter().map(|h| h.as_str().to_string()).collect(),
    };
    let file_id = match state.metadata.insert_file(&new_file).await {
        Ok(id) => id,
        Err(e) => {
            retract(state, &handles).await;
            return Err(e.into());
        }
    };

    progress.finish();
    tracing::info!(
        file_id = %file_id,
        chunks = total,
        bytes = progress.transferred(),
        "upload committed"
    );
    Ok(file_id)
}

/// Best-effort retraction of chunks sent before an aborted upload.
async fn retract(state: &AppState, handles: &[ChunkHandle]) {
    if handles.is_empty() {
        return;
    }
    if let Err(e) = state.transport.delete(state.channel(), handles).await {
        tracing::warn!(
            error = %e,
            count = handles.len(),
            "failed to retract chunks after aborted upload"
        );
    }
}

/// Upload a batch sequentially. Partial success is reported per item; the
/// whole operation fails only when nothing was uploaded. The progress
/// handle tracks the item currently in flight.
pub async fn upload_many(
    state: &AppState,
    requests: Vec<UploadRequest>,
    progress: &TransferProgress,
) -> ApiResult<BulkUploadOutcome> {
    if requests.is_empty() {
        return Err(ApiError::InvalidInput("no files provided".into()));
    }

    let mut outcome = BulkUploadOutcome {
        uploaded: Vec::new(),
        failures: Vec::new(),
    };
    for request in requests {
        let item = request.file_name.clone();
        match upload_one(state, request, progress).await {
            Ok(file_id) => outcome.uploaded.push(file_id),
            Err(e) => outcome.failures.push(ItemFailure {
                item,
                error: e.to_string(),
            }),
        }
    }

    if outcome.uploaded.is_empty() {
        return Err(ApiError::NotFound(
            "none of the files could be uploaded".into(),
        ));
    }
    Ok(outcome)
}

/// Download one file: fetch its chunks in stored order, stage them
/// locally, and reassemble. Staging is cleared on every path.
#[tracing::instrument(skip(state, progress))]
pub async fn download_one(
    state: &AppState,
    file_id: Uuid,
    progress: &TransferProgress,
) -> ApiResult<(String, Bytes)> {
    let record = state
        .metadata
        .get_file(file_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("file {file_id}")))?;

    let staging = state.staging_dir().join(Uuid::new_v4().to_string());
    tokio::fs::create_dir_all(&staging).await?;

    let result = fetch_and_join(state, &record, &staging, progress).await;
    if let Err(e) = tokio::fs::remove_dir_all(&staging).await {
        tracing::warn!(
            error = %e,
            path = %staging.display(),
            "failed to clear staging directory"
        );
    }

    let data = result?;
    tracing::info!(file_id = %file_id, bytes = data.len(), "download complete");
    Ok((record.file_name, data))
}

async fn fetch_and_join(
    state: &AppState,
    record: &FileRecord,
    staging: &Path,
    progress: &TransferProgress,
) -> ApiResult<Bytes> {
    let max = state.transport.max_object_size();
    progress.begin(record.size_bytes);

    let mut chunks = Vec::with_capacity(record.chunk_handles.len());
    for (index, raw) in record.chunk_handles.iter().enumerate() {
        let handle = ChunkHandle::parse(raw)?;
        let data = state.transport.fetch(state.channel(), &handle).await?;
        tokio::fs::write(staging.join(format!("chunk-{index}")), &data).await?;
        progress.advance(index, max, data.len() as u64);
        chunks.push(data);
    }

    progress.finish();
    Ok(chunk::join(&chunks))
}

/// Download a batch and bundle the results into one flat tar archive,
/// disambiguating duplicate names with a first-occurrence counter. The
/// progress handle tracks the file currently in flight.
pub async fn download_many(
    state: &AppState,
    file_ids: &[Uuid],
    progress: &TransferProgress,
) -> ApiResult<Bytes> {
    if file_ids.is_empty() {
        return Err(ApiError::InvalidInput("no files requested".into()));
    }

    let mut deduper = NameDeduper::new();
    let mut entries = Vec::with_capacity(file_ids.len());
    for file_id in file_ids {
        match download_one(state, *file_id, progress).await {
            Ok((name, data)) => entries.push((deduper.disambiguate(&name), data)),
            Err(e) => {
                tracing::warn!(file_id = %file_id, error = %e, "skipping file in bulk download");
            }
        }
    }

    if entries.is_empty() {
        return Err(ApiError::NotFound(
            "none of the requested files could be downloaded".into(),
        ));
    }
    bundle(&entries)
}

/// Delete one file: retire its chunks from the channel, then the record.
#[tracing::instrument(skip(state))]
pub async fn delete_one(state: &AppState, file_id: Uuid) -> ApiResult<()> {
    let record = state
        .metadata
        .get_file(file_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("file {file_id}")))?;

    let handles = record
        .chunk_handles
        .iter()
        .map(|raw| ChunkHandle::parse(raw))
        .collect::<Result<Vec<_>, _>>()?;
    state.transport.delete(state.channel(), &handles).await?;
    state.metadata.delete_file(file_id).await?;

    tracing::info!(file_id = %file_id, chunks = handles.len(), "file deleted");
    Ok(())
}

/// Delete a batch, best-effort. Returns the ids actually deleted; fails
/// only when nothing was.
pub async fn delete_many(state: &AppState, file_ids: &[Uuid]) -> ApiResult<Vec<Uuid>> {
    if file_ids.is_empty() {
        return Err(ApiError::InvalidInput("no files requested".into()));
    }

    let mut deleted = Vec::with_capacity(file_ids.len());
    for file_id in file_ids {
        match delete_one(state, *file_id).await {
            Ok(()) => deleted.push(*file_id),
            Err(e) => {
                tracing::warn!(file_id = %file_id, error = %e, "skipping file in bulk delete");
            }
        }
    }

    if deleted.is_empty() {
        return Err(ApiError::NotFound(
            "none of the requested files could be deleted".into(),
        ));
    }
    Ok(deleted)
}

/// Delete a directory and its whole subtree: every file transitively
/// under it (chunks included), then the directory records bottom-up.
///
/// Best-effort: each file and directory is attempted independently and
/// failures are reported in the outcome. A directory that still holds an
/// undeleted file, or whose child could not be removed, is kept so no
/// record ends up dangling. The operation fails only when nothing at all
/// was deleted.
#[tracing::instrument(skip(state))]
pub async fn delete_directory_cascade(
    state: &AppState,
    directory_id: Uuid,
) -> ApiResult<CascadeOutcome> {
    let forest = DirectoryForest::new(state.metadata.clone());
    let directory_ids = tree::subtree(&forest, directory_id).await?;
    let file_ids = state.metadata.file_ids_in_directories(&directory_ids).await?;

    let mut failures = Vec::new();
    let mut files_deleted = 0;
    // Directories that keep undeleted content and must survive the sweep.
    let mut blocked: HashSet<Uuid> = HashSet::new();
    for file_id in &file_ids {
        match delete_one(state, *file_id).await {
            Ok(()) => files_deleted += 1,
            Err(e) => {
                tracing::warn!(file_id = %file_id, error = %e, "skipping file in cascade");
                if let Ok(Some(record)) = state.metadata.get_file(*file_id).await {
                    if let Some(directory_id) = record.directory_id {
                        blocked.insert(directory_id);
                    }
                }
                failures.push(ItemFailure {
                    item: file_id.to_string(),
                    error: e.to_string(),
                });
            }
        }
    }

    // Children before parents.
    let mut directories_deleted = 0;
    for id in directory_ids.iter().rev() {
        let Some(node) = forest.get(*id).await? else {
            continue;
        };
        if blocked.contains(id) {
            failures.push(ItemFailure {
                item: id.to_string(),
                error: "directory still holds undeleted content".to_string(),
            });
            if let Some(parent_id) = node.parent_id {
                blocked.insert(parent_id);
            }
            continue;
        }
        match forest.remove_node(*id).await {
            Ok(_) => directories_deleted += 1,
            Err(e) => {
                tracing::warn!(directory_id = %id, error = %e, "skipping directory in cascade");
                failures.push(ItemFailure {
                    item: id.to_string(),
                    error: e.to_string(),
                });
                if let Some(parent_id) = node.parent_id {
                    blocked.insert(parent_id);
                }
            }
        }
    }

    if files_deleted == 0 && directories_deleted == 0 {
        return Err(ApiError::NotFound(
            "nothing under the directory could be deleted".into(),
        ));
    }

    let outcome = CascadeOutcome {
        directories_deleted,
        files_deleted,
        failures,
    };
    tracing::info!(
        directory_id = %directory_id,
        directories = outcome.directories_deleted,
        files = outcome.files_deleted,
        failed = outcome.failures.len(),
        "deleted directory subtree"
    );
    Ok(outcome)
}

/// Archive of every file transitively under a directory. An empty subtree
/// yields an empty archive.
pub async fn directory_archive(
    state: &AppState,
    directory_id: Uuid,
    progress: &TransferProgress,
) -> ApiResult<Bytes> {
    let forest = DirectoryForest::new(state.metadata.clone());
    let directory_ids = tree::subtree(&forest, directory_id).await?;
    let file_ids = state.metadata.file_ids_in_directories(&directory_ids).await?;

    if file_ids.is_empty() {
        return bundle(&[]);
    }
    download_many(state, &file_ids, progress).await
}
