//! In-process store used by tests and by `STORE_BACKEND=memory`.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use axum::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::auth::repo::{User, UserStore};
use crate::todos::model::{NewTodoItem, TodoChanges, TodoItem};
use crate::todos::repo::TodoStore;

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    // keyed by id so iteration follows insertion order
    todo_items: BTreeMap<i64, TodoItem>,
    next_todo_id: i64,
}

/// Both stores over one lock, so the owner foreign key can be checked.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn todo_count(&self) -> usize {
        self.tables.read().await.todo_items.len()
    }
}

#[async_trait]
impl TodoStore for MemoryStore {
    async fn find(&self, id: i64) -> anyhow::Result<Option<TodoItem>> {
        Ok(self.tables.read().await.todo_items.get(&id).cloned())
    }

    async fn create(&self, attrs: NewTodoItem) -> anyhow::Result<TodoItem> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&attrs.owner_id) {
            anyhow::bail!("insert todo item: owner {} does not exist", attrs.owner_id);
        }
        if attrs.content.trim().is_empty() {
            anyhow::bail!("insert todo item: content must not be blank");
        }
        tables.next_todo_id += 1;
        let now = OffsetDateTime::now_utc();
        let item = TodoItem {
            id: tables.next_todo_id,
            owner_id: attrs.owner_id,
            content: attrs.content,
            completed_at: attrs.completed_at,
            created_at: now,
            updated_at: now,
        };
        tables.todo_items.insert(item.id, item.clone());
        Ok(item)
    }

    async fn update(&self, id: i64, changes: TodoChanges) -> anyhow::Result<Option<TodoItem>> {
        let mut tables = self.tables.write().await;
        let Some(item) = tables.todo_items.get_mut(&id) else {
            return Ok(None);
        };
        item.content = changes.content;
        item.completed_at = changes.completed_at;
        item.updated_at = OffsetDateTime::now_utc();
        Ok(Some(item.clone()))
    }

    async fn delete(&self, id: i64) -> anyhow::Result<Option<TodoItem>> {
        Ok(self.tables.write().await.todo_items.remove(&id))
    }

    async fn all(&self, owner_id: Uuid) -> anyhow::Result<Vec<TodoItem>> {
        let tables = self.tables.read().await;
        Ok(tables
            .todo_items
            .values()
            .filter(|t| t.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn filter(&self, owner_id: Uuid, needle: &str) -> anyhow::Result<Vec<TodoItem>> {
        let tables = self.tables.read().await;
        Ok(tables
            .todo_items
            .values()
            .filter(|t| t.owner_id == owner_id && t.content.contains(needle))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn create(&self, email: &str, password_hash: &str) -> anyhow::Result<Option<User>> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.email == email) {
            return Ok(None);
        }
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: OffsetDateTime::now_utc(),
        };
        tables.users.insert(user.id, user.clone());
        Ok(Some(user))
    }
}
