use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use todo_models::{AddOrganizationMember, CreateOrganization, Organization, OrganizationMember};
use uuid::Uuid;

use crate::handlers::auth::{auth_error_response, ApiError};
use crate::middleware::CurrentUser;
use crate::state::AuthState;

/// GET /api/orgs
pub async fn list_organizations(
    State(state): State<Arc<AuthState>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<Organization>>, ApiError> {
    let orgs = state
        .orgs
        .get_user_orgs(user.user_id)
        .await
        .map_err(auth_error_response)?;

    Ok(Json(orgs))
}

/// POST /api/orgs
pub async fn create_organization(
    State(state): State<Arc<AuthState>>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<CreateOrganization>,
) -> Result<(StatusCode, Json<Organization>), ApiError> {
    let org = state
        .orgs
        .create(user.user_id, request)
        .await
        .map_err(auth_error_response)?;

    Ok((StatusCode::CREATED, Json(org)))
}

/// POST /api/orgs/:org_id/members
pub async fn add_member(
    State(state): State<Arc<AuthState>>,
    CurrentUser(user): CurrentUser,
    Path(org_id): Path<Uuid>,
    Json(request): Json<AddOrganizationMember>,
) -> Result<(StatusCode, Json<OrganizationMember>), ApiError> {
    let member = state
        .orgs
        .add_member(user.user_id, org_id, request)
        .await
        .map_err(auth_error_response)?;

    Ok((StatusCode::CREATED, Json(member)))
}
