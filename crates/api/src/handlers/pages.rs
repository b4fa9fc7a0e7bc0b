use askama::Template;
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use todo_models::{NewTodo, Todo};
use validator::Validate;

use crate::handlers::auth::{internal_error, ApiError};
use crate::middleware::{CurrentUser, OptionalUser};
use crate::state::SimpleState;

#[derive(Template)]
#[template(path = "todos.html")]
struct TodosTemplate {
    username: String,
    todos: Vec<Todo>,
}

/// 302 Found, which `Redirect` has no constructor for
fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

/// GET /
pub async fn index(OptionalUser(user): OptionalUser) -> Response {
    match user {
        Some(_) => found("/todos"),
        None => found("/auth/login?return_url=/"),
    }
}

/// GET /todos
pub async fn list_todos(
    State(state): State<SimpleState>,
    OptionalUser(user): OptionalUser,
) -> Result<Response, ApiError> {
    let Some(user) = user else {
        return Ok(Redirect::temporary("/").into_response());
    };

    let todos = state
        .todos
        .list_for_user(user.user_id)
        .await
        .map_err(internal_error)?;

    let page = TodosTemplate {
        username: user.username,
        todos,
    };

    let html = page.render().map_err(internal_error)?;
    Ok(Html(html).into_response())
}

/// POST /todos/add
pub async fn add_todo(
    State(state): State<SimpleState>,
    CurrentUser(user): CurrentUser,
    Form(form): Form<NewTodo>,
) -> Result<Redirect, ApiError> {
    let content = form.content.trim();
    let new_todo = NewTodo {
        content: content.to_string(),
    };

    if new_todo.validate().is_ok() {
        state
            .todos
            .create(user.user_id, content)
            .await
            .map_err(internal_error)?;
    } else {
        tracing::debug!(user_id = %user.user_id, "Ignoring empty or oversized todo");
    }

    Ok(Redirect::to("/todos"))
}

/// GET /todos/:todo_id/delete
pub async fn delete_todo(
    State(state): State<SimpleState>,
    CurrentUser(user): CurrentUser,
    Path(todo_id): Path<i64>,
) -> Result<Redirect, ApiError> {
    // Someone else's todo is left alone without telling the caller
    let deleted = state
        .todos
        .delete_owned(todo_id, user.user_id)
        .await
        .map_err(internal_error)?;

    if !deleted {
        tracing::debug!(todo_id, user_id = %user.user_id, "No owned todo to delete");
    }

    Ok(Redirect::to("/todos"))
}
