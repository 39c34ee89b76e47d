use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::Value;
use tracing::instrument;

use super::dto::{from_payload, CreateTodoItem, ListQuery, UpdateTodoItem};
use super::model::TodoItem;
use super::services;
use crate::{auth::jwt::AuthUser, error::AppResult, state::AppState};

pub fn todo_item_routes() -> Router<AppState> {
    Router::new()
        .route("/todo_items", get(list_todo_items).post(create_todo_item))
        .route(
            "/todo_items/:id",
            get(show_todo_item)
                .put(update_todo_item)
                .patch(update_todo_item)
                .delete(destroy_todo_item),
        )
}

#[instrument(skip(state))]
pub async fn list_todo_items(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> AppResult<Json<Vec<TodoItem>>> {
    let Query(q) = query?;
    let items = services::list(state.todos.as_ref(), user_id, q.query.as_deref()).await?;
    Ok(Json(items))
}

#[instrument(skip(state))]
pub async fn show_todo_item(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    path: Result<Path<i64>, PathRejection>,
) -> AppResult<Json<TodoItem>> {
    let Path(id) = path?;
    Ok(Json(services::show(state.todos.as_ref(), user_id, id).await?))
}

#[instrument(skip(state, body))]
pub async fn create_todo_item(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    body: Result<Json<Value>, JsonRejection>,
) -> AppResult<(StatusCode, Json<TodoItem>)> {
    let Json(body) = body?;
    let input: CreateTodoItem = from_payload(body)?;
    let item = services::create(state.todos.as_ref(), user_id, input).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

#[instrument(skip(state, body))]
pub async fn update_todo_item(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    path: Result<Path<i64>, PathRejection>,
    body: Result<Json<Value>, JsonRejection>,
) -> AppResult<Json<TodoItem>> {
    let Path(id) = path?;
    let Json(body) = body?;
    let input: UpdateTodoItem = from_payload(body)?;
    Ok(Json(services::update(state.todos.as_ref(), user_id, id, input).await?))
}

#[instrument(skip(state))]
pub async fn destroy_todo_item(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    path: Result<Path<i64>, PathRejection>,
) -> AppResult<Json<TodoItem>> {
    let Path(id) = path?;
    Ok(Json(services::destroy(state.todos.as_ref(), user_id, id).await?))
}
