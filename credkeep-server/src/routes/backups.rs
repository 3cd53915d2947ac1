use super::{read_label, LabelBody};
use crate::error::AppError;
use crate::state::AppState;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::routing::{delete, get, patch, post};
use axum::{Json, Router};
use credkeep_core::{BackupEntry, ScanResult};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_backups).post(create_backup))
        .route("/{id}", delete(delete_backup))
        .route("/{id}/label", patch(update_label))
        .route("/{id}/restore", post(restore_backup))
}

#[derive(Debug, Deserialize)]
struct UpdateLabelRequest {
    label: String,
}

async fn list_backups(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<BackupEntry>>, AppError> {
    let service = state.service.clone();
    let entries = tokio::task::spawn_blocking(move || service.list_backups()).await??;
    Ok(Json(entries))
}

async fn create_backup(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<ScanResult>, AppError> {
    let LabelBody { label } = read_label(&body)?;
    let service = state.service.clone();
    let result = tokio::task::spawn_blocking(move || service.create_backup(label.as_deref()))
        .await??;
    Ok(Json(result))
}

async fn update_label(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<UpdateLabelRequest>,
) -> Result<Json<BackupEntry>, AppError> {
    let service = state.service.clone();
    let entry = tokio::task::spawn_blocking(move || service.update_label(&id, &body.label)).await??;
    Ok(Json(entry))
}

async fn restore_backup(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let service = state.service.clone();
    let restored = id.clone();
    tokio::task::spawn_blocking(move || service.restore(&restored)).await??;
    Ok(Json(json!({ "restored": id })))
}

async fn delete_backup(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let service = state.service.clone();
    let deleted = id.clone();
    tokio::task::spawn_blocking(move || service.delete(&deleted)).await??;
    Ok(Json(json!({ "deleted": id })))
}
