use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::cleanup::CleanupReport;
use crate::handlers::auth::{auth_error_response, internal_error, ApiError};
use crate::middleware::CurrentUser;
use crate::state::AdvancedState;

/// POST /api/admin/run-cleanup-step
pub async fn run_cleanup_step(
    State(state): State<AdvancedState>,
    CurrentUser(admin): CurrentUser,
) -> Result<Json<CleanupReport>, ApiError> {
    tracing::info!(admin = %admin.username, "Running cleanup step");

    let report = state.cleanup.run_step().await.map_err(internal_error)?;

    Ok(Json(report))
}

/// DELETE /api/admin/users/:user_id
///
/// The user's todos stay until the next cleanup step.
pub async fn delete_user(
    State(state): State<AdvancedState>,
    CurrentUser(admin): CurrentUser,
    Path(user_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state
        .auth
        .auth
        .delete_user(user_id)
        .await
        .map_err(auth_error_response)?;

    tracing::info!(%user_id, admin = %admin.username, "User deleted by admin");

    Ok(StatusCode::NO_CONTENT)
}
