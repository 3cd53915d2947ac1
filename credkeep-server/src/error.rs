use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use credkeep_core::VaultError;
use serde_json::json;

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Vault(#[from] VaultError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<tokio::task::JoinError> for AppError {
    fn from(e: tokio::task::JoinError) -> Self {
        AppError::Internal(anyhow::anyhow!(e))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, kind, msg) = match &self {
            AppError::BadRequest(m) => (StatusCode::BAD_REQUEST, "bad_request", m.clone()),
            AppError::Vault(e) => {
                let status = match e {
                    VaultError::BackupNotFound(_) => StatusCode::NOT_FOUND,
                    VaultError::LabelConflict(_) => StatusCode::CONFLICT,
                    VaultError::InvalidLabel(_) => StatusCode::BAD_REQUEST,
                    VaultError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
                    VaultError::CommandNotFound(_) => StatusCode::SERVICE_UNAVAILABLE,
                    VaultError::CommandFailed(_) => StatusCode::BAD_GATEWAY,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                if status.is_server_error() {
                    tracing::error!("Request failed: {e:#}");
                }
                (status, e.kind(), e.to_string())
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:#}");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal", "Internal server error".into())
            }
        };

        let mut body = json!({ "error": msg, "kind": kind });
        if let AppError::Vault(VaultError::CommandFailed(output)) = &self {
            body["output"] = json!(output);
        }
        (status, Json(body)).into_response()
    }
}
