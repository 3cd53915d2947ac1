use super::{read_label, LabelBody};
use crate::error::AppError;
use crate::state::AppState;
use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use credkeep_core::{ScanResult, StatusReport, Trigger};
use std::sync::Arc;

pub async fn status(State(state): State<Arc<AppState>>) -> Result<Json<StatusReport>, AppError> {
    let service = state.service.clone();
    let report = tokio::task::spawn_blocking(move || service.status()).await??;
    Ok(Json(report))
}

/// Manual scan; an empty body is allowed.
pub async fn scan(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<ScanResult>, AppError> {
    let LabelBody { label } = read_label(&body)?;
    let service = state.service.clone();
    let result = tokio::task::spawn_blocking(move || {
        service.scan(Trigger::Manual, label.as_deref())
    })
    .await??;
    Ok(Json(result))
}
