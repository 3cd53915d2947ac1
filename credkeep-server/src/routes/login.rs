use crate::error::AppError;
use crate::state::AppState;
use axum::extract::State;
use axum::Json;
use credkeep_core::service::login::CommandOutput;
use std::sync::Arc;

/// Run the configured login command and hand back its captured output.
pub async fn login(State(state): State<Arc<AppState>>) -> Result<Json<CommandOutput>, AppError> {
    let output = state.service.login().await?;
    Ok(Json(output))
}
