pub mod backups;
pub mod login;
pub mod status;

use crate::error::AppError;
use crate::state::AppState;
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/status", get(status::status))
        .route("/api/scan", post(status::scan))
        .route("/api/login", post(login::login))
        .nest("/api/backups", backups::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Optional `{"label": ...}` request body
#[derive(Debug, Default, Deserialize)]
pub(crate) struct LabelBody {
    #[serde(default)]
    pub label: Option<String>,
}

/// Parse a body that may be empty or whitespace only.
pub(crate) fn read_label(body: &[u8]) -> Result<LabelBody, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(LabelBody::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| AppError::BadRequest(format!("invalid request body: {e}")))
}
