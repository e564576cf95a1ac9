use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json};
use serde::{Deserialize, Serialize};
use serde_json::json;

use filechain_ledger::{
    BlockSnapshot, CancelFlag, DeletionPolicy, FileRecord, MiningLimits, ValidationReport,
};

use crate::error::{ServerError, ServerResult};
use crate::state::AppState;

/// Query string of an upload.
#[derive(Debug, Default, Deserialize)]
pub struct UploadParams {
    #[serde(default)]
    pub name: String,
    pub uploader: Option<String>,
}

/// Body of a successful upload.
#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub block_index: u64,
    pub digest: String,
    pub content_address: String,
    pub filename: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub removed: bool,
    pub policy: DeletionPolicy,
}

/// Cancels an in-flight nonce search if the request future is dropped.
struct CancelOnDrop(CancelFlag);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.cancel();
    }
}

/// Health check handler.
pub async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Info handler.
pub async fn info_handler(State(state): State<AppState>) -> ServerResult<Json<serde_json::Value>> {
    let (difficulty, policy, blocks) = state.ledger.read(|l| {
        (l.difficulty(), l.deletion_policy(), l.block_count())
    })?;
    Ok(Json(json!({
        "name": "filechain-server",
        "version": env!("CARGO_PKG_VERSION"),
        "difficulty": u32::from(difficulty),
        "deletion_policy": policy,
        "blocks": blocks,
    })))
}

pub async fn list_files_handler(
    State(state): State<AppState>,
) -> ServerResult<Json<Vec<FileRecord>>> {
    Ok(Json(state.ledger.list_records()?))
}

/// Store the body in the blob store, then seal a record of it into the chain.
pub async fn upload_handler(
    State(state): State<AppState>,
    Query(params): Query<UploadParams>,
    body: Bytes,
) -> ServerResult<(StatusCode, Json<UploadResponse>)> {
    let name = base_name(&params.name);
    if name.is_empty() {
        return Err(ServerError::BadRequest("no file name given".into()));
    }
    if name.chars().any(char::is_control) {
        return Err(ServerError::BadRequest(
            "file name contains control characters".into(),
        ));
    }
    if body.is_empty() {
        return Err(ServerError::BadRequest("no file uploaded".into()));
    }

    let gate = state.blob_gate.clone().lock_owned().await;
    let content_address = state.store.put(&body)?;
    let record = FileRecord::new(name, body.len() as u64, content_address.clone())
        .with_uploader(params.uploader.unwrap_or_default());
    record
        .validate()
        .map_err(|e| ServerError::BadRequest(e.to_string()))?;

    let guard = CancelOnDrop(CancelFlag::new());
    let limits =
        MiningLimits::with_timeout(state.config.mining_timeout()).with_cancel(guard.0.clone());
    let ledger = state.ledger.clone();
    let block = tokio::task::spawn_blocking(move || {
        let _gate = gate;
        ledger.append(record, &limits)
    })
    .await
    .map_err(|e| ServerError::Internal(e.to_string()))??;

    tracing::info!(
        index = block.index,
        name,
        content_address = %content_address,
        "file recorded"
    );
    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            block_index: block.index,
            digest: block.digest,
            content_address,
            filename: name.to_string(),
        }),
    ))
}

pub async fn get_file_handler(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> ServerResult<Json<FileRecord>> {
    state
        .ledger
        .find(&address)?
        .map(Json)
        .ok_or_else(|| not_registered(&address))
}

/// Stream the stored bytes of a registered file as an attachment.
pub async fn download_handler(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> ServerResult<impl IntoResponse> {
    let record = state
        .ledger
        .find(&address)?
        .ok_or_else(|| not_registered(&address))?;
    let bytes = state
        .store
        .get(&address)?
        .ok_or_else(|| ServerError::NotFound(format!("content of {address} is unavailable")))?;

    let disposition = format!("attachment; filename=\"{}\"", record.name.replace('"', ""));
    Ok((
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    ))
}

/// Remove a record per the configured deletion policy. The blob is dropped
/// once no live record references it; the blob gate keeps a concurrent
/// upload of the same bytes from losing its content.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> ServerResult<Json<DeleteResponse>> {
    let _gate = state.blob_gate.lock().await;
    let ledger = state.ledger.clone();
    let target = address.clone();
    let removed = tokio::task::spawn_blocking(move || ledger.delete(&target))
        .await
        .map_err(|e| ServerError::Internal(e.to_string()))??;
    if !removed {
        return Err(not_registered(&address));
    }

    if state.ledger.find(&address)?.is_none() {
        state.store.remove(&address)?;
    }
    let policy = state.ledger.deletion_policy()?;
    tracing::info!(content_address = %address, %policy, "file deleted");
    Ok(Json(DeleteResponse {
        removed,
        policy,
    }))
}

pub async fn blockchain_handler(
    State(state): State<AppState>,
) -> ServerResult<Json<Vec<BlockSnapshot>>> {
    Ok(Json(state.ledger.export()?))
}

pub async fn verify_handler(
    State(state): State<AppState>,
) -> ServerResult<Json<ValidationReport>> {
    Ok(Json(state.ledger.validate()?))
}

fn not_registered(address: &str) -> ServerError {
    ServerError::NotFound(format!("no file registered under {address}"))
}

/// Last path component, trimmed. Uploaded names never carry directories.
fn base_name(name: &str) -> &str {
    name.rsplit(['/', '\\']).next().unwrap_or_default().trim()
}
