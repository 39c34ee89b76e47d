use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::dto::{CreateTodoItem, UpdateTodoItem};
use super::model::{normalize_content, NewTodoItem, TodoChanges, TodoItem};
use super::repo::TodoStore;
use crate::error::{AppError, AppResult};

fn blank_content() -> AppError {
    AppError::validation("content", "can't be blank")
}

/// Items owned by `user_id`, optionally narrowed to those containing `filter`.
#[instrument(skip(store))]
pub async fn list(
    store: &dyn TodoStore,
    user_id: Uuid,
    filter: Option<&str>,
) -> AppResult<Vec<TodoItem>> {
    let items = match filter.filter(|f| !f.is_empty()) {
        Some(needle) => store.filter(user_id, needle).await?,
        None => store.all(user_id).await?,
    };
    Ok(items)
}

#[instrument(skip(store))]
pub async fn show(store: &dyn TodoStore, user_id: Uuid, id: i64) -> AppResult<TodoItem> {
    owned_item(store, user_id, id).await
}

#[instrument(skip(store, input))]
pub async fn create(
    store: &dyn TodoStore,
    user_id: Uuid,
    input: CreateTodoItem,
) -> AppResult<TodoItem> {
    let content = normalize_content(input.content.as_deref()).ok_or_else(blank_content)?;
    let item = store
        .create(NewTodoItem {
            owner_id: user_id,
            content,
            completed_at: input.completed_at,
        })
        .await?;
    info!(todo_item_id = item.id, %user_id, "todo item created");
    Ok(item)
}

/// Applies `input` to an owned item. An absent `completed_at` clears completion.
#[instrument(skip(store, input))]
pub async fn update(
    store: &dyn TodoStore,
    user_id: Uuid,
    id: i64,
    input: UpdateTodoItem,
) -> AppResult<TodoItem> {
    let current = owned_item(store, user_id, id).await?;
    let content = match input.content {
        Some(raw) => normalize_content(Some(&raw)).ok_or_else(blank_content)?,
        None => current.content,
    };
    let changes = TodoChanges {
        content,
        completed_at: input.completed_at,
    };
    let item = store
        .update(id, changes)
        .await?
        .ok_or(AppError::NotFound("todo item"))?;
    info!(todo_item_id = id, completed = item.is_completed(), "todo item updated");
    Ok(item)
}

/// Deletes an owned item and returns its last state. Not idempotent.
#[instrument(skip(store))]
pub async fn destroy(store: &dyn TodoStore, user_id: Uuid, id: i64) -> AppResult<TodoItem> {
    owned_item(store, user_id, id).await?;
    let item = store
        .delete(id)
        .await?
        .ok_or(AppError::NotFound("todo item"))?;
    info!(todo_item_id = id, %user_id, "todo item destroyed");
    Ok(item)
}

// Foreign items read as missing so ids of other users' items don't leak.
async fn owned_item(store: &dyn TodoStore, user_id: Uuid, id: i64) -> AppResult<TodoItem> {
    match store.find(id).await? {
        Some(item) if item.owner_id == user_id => Ok(item),
        Some(item) => {
            warn!(todo_item_id = id, %user_id, owner_id = %item.owner_id, "todo item owned by another user");
            Err(AppError::NotFound("todo item"))
        }
        None => Err(AppError::NotFound("todo item")),
    }
}
