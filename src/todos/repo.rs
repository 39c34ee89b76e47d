use anyhow::Context;
use axum::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::model::{NewTodoItem, TodoChanges, TodoItem};

/// Keyed CRUD over the `todo_items` table.
///
/// `update` and `delete` return `None` when no row has the given id.
#[async_trait]
pub trait TodoStore: Send + Sync {
    async fn find(&self, id: i64) -> anyhow::Result<Option<TodoItem>>;
    async fn create(&self, attrs: NewTodoItem) -> anyhow::Result<TodoItem>;
    async fn update(&self, id: i64, changes: TodoChanges) -> anyhow::Result<Option<TodoItem>>;
    async fn delete(&self, id: i64) -> anyhow::Result<Option<TodoItem>>;
    async fn all(&self, owner_id: Uuid) -> anyhow::Result<Vec<TodoItem>>;
    /// Items of `owner_id` whose content contains `needle`, case-sensitively.
    async fn filter(&self, owner_id: Uuid, needle: &str) -> anyhow::Result<Vec<TodoItem>>;
}

#[derive(Clone)]
pub struct PgTodoStore {
    db: PgPool,
}

impl PgTodoStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TodoStore for PgTodoStore {
    async fn find(&self, id: i64) -> anyhow::Result<Option<TodoItem>> {
        sqlx::query_as::<_, TodoItem>(
            r#"
            SELECT id, owner_id, content, completed_at, created_at, updated_at
              FROM todo_items
             WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find todo item")
    }

    async fn create(&self, attrs: NewTodoItem) -> anyhow::Result<TodoItem> {
        sqlx::query_as::<_, TodoItem>(
            r#"
            INSERT INTO todo_items (owner_id, content, completed_at)
            VALUES ($1, $2, $3)
            RETURNING id, owner_id, content, completed_at, created_at, updated_at
            "#,
        )
        .bind(attrs.owner_id)
        .bind(&attrs.content)
        .bind(attrs.completed_at)
        .fetch_one(&self.db)
        .await
        .context("insert todo item")
    }

    async fn update(&self, id: i64, changes: TodoChanges) -> anyhow::Result<Option<TodoItem>> {
        sqlx::query_as::<_, TodoItem>(
            r#"
            UPDATE todo_items
               SET content = $2,
                   completed_at = $3,
                   updated_at = now()
             WHERE id = $1
            RETURNING id, owner_id, content, completed_at, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&changes.content)
        .bind(changes.completed_at)
        .fetch_optional(&self.db)
        .await
        .context("update todo item")
    }

    async fn delete(&self, id: i64) -> anyhow::Result<Option<TodoItem>> {
        sqlx::query_as::<_, TodoItem>(
            r#"
            DELETE FROM todo_items
             WHERE id = $1
            RETURNING id, owner_id, content, completed_at, created_at, updated_at
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("delete todo item")
    }

    async fn all(&self, owner_id: Uuid) -> anyhow::Result<Vec<TodoItem>> {
        sqlx::query_as::<_, TodoItem>(
            r#"
            SELECT id, owner_id, content, completed_at, created_at, updated_at
              FROM todo_items
             WHERE owner_id = $1
             ORDER BY id ASC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.db)
        .await
        .context("list todo items")
    }

    async fn filter(&self, owner_id: Uuid, needle: &str) -> anyhow::Result<Vec<TodoItem>> {
        // strpos keeps `%` and `_` literal, unlike LIKE
        sqlx::query_as::<_, TodoItem>(
            r#"
            SELECT id, owner_id, content, completed_at, created_at, updated_at
              FROM todo_items
             WHERE owner_id = $1
               AND strpos(content, $2) > 0
             ORDER BY id ASC
            "#,
        )
        .bind(owner_id)
        .bind(needle)
        .fetch_all(&self.db)
        .await
        .context("filter todo items")
    }
}
