use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use todo_docstore::{Filter, ObjectId};
use todo_models::{CreateTodoDocument, TodoDocument};

use crate::handlers::auth::{api_error, auth_error_response, internal_error, ApiError};
use crate::middleware::{AuthUser, CurrentUser};
use crate::state::AdvancedState;

/// Upper bound on todos returned by one listing
pub const LIST_LIMIT: i64 = 100;

async fn caller_org_ids(state: &AdvancedState, user: &AuthUser) -> Result<Vec<String>, ApiError> {
    state
        .auth
        .orgs
        .org_ids_for_user(user.user_id)
        .await
        .map_err(auth_error_response)
}

/// GET /api/todos
///
/// Todos of every organization the caller belongs to.
pub async fn list_todos(
    State(state): State<AdvancedState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<TodoDocument>>, ApiError> {
    let org_ids = caller_org_ids(&state, &user).await?;
    if org_ids.is_empty() {
        return Ok(Json(Vec::new()));
    }

    let todos = state
        .todos
        .find(&Filter::is_in("org_id", org_ids), Some(LIST_LIMIT))
        .await
        .map_err(internal_error)?;

    Ok(Json(todos))
}

/// POST /api/todos
pub async fn create_todo(
    State(state): State<AdvancedState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<CreateTodoDocument>,
) -> Result<(StatusCode, Json<TodoDocument>), ApiError> {
    let org_ids = caller_org_ids(&state, &user).await?;
    if !org_ids.contains(&request.org_id) {
        return Err(api_error(
            StatusCode::FORBIDDEN,
            "forbidden",
            "You are not a member of this organization",
        ));
    }

    let doc = TodoDocument {
        id: ObjectId::new().to_hex(),
        content: request.content,
        user_id: user.user_id.to_string(),
        org_id: request.org_id,
    };

    let id = state.todos.insert_one(&doc).await.map_err(internal_error)?;

    let created = state
        .todos
        .find_by_id(&id)
        .await
        .map_err(internal_error)?
        .ok_or_else(|| internal_error(format!("Inserted todo {} could not be read back", id)))?;

    tracing::info!(todo_id = %id, org_id = %created.org_id, user_id = %user.user_id, "Todo created");

    Ok((StatusCode::CREATED, Json(created)))
}

/// DELETE /api/todos/:todo_id
pub async fn delete_todo(
    State(state): State<AdvancedState>,
    CurrentUser(user): CurrentUser,
    Path(todo_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = ObjectId::parse(&todo_id)
        .map_err(|_| api_error(StatusCode::NOT_FOUND, "not_found", "Invalid Todo ID"))?;

    let todo = state
        .todos
        .find_by_id(&id)
        .await
        .map_err(internal_error)?
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "not_found", "Todo not found"))?;

    let org_ids = caller_org_ids(&state, &user).await?;
    if !org_ids.contains(&todo.org_id) {
        return Err(api_error(
            StatusCode::FORBIDDEN,
            "forbidden",
            "You do not have permission to delete this todo",
        ));
    }

    state
        .todos
        .delete_one(&Filter::by_id(&id))
        .await
        .map_err(internal_error)?;

    tracing::info!(todo_id = %id, user_id = %user.user_id, "Todo deleted");

    Ok(StatusCode::NO_CONTENT)
}
