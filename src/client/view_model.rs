use std::collections::HashSet;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use time::OffsetDateTime;
use tracing::{debug, warn};

use super::api::TodoApi;
use super::error::ClientError;
use super::reconcile::{remove_by_id, replace_by_id};
use crate::todos::dto::{CreateTodoItem, UpdateTodoItem};
use crate::todos::model::TodoItem;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Default)]
struct ClientState {
    items: Vec<TodoItem>,
    draft: String,
    last_error: Option<String>,
    in_flight: HashSet<i64>,
    // Bumped by every list request and every applied change.
    generation: u64,
}

/// Local mirror of the current user's todo items.
///
/// Every operation is one request. State only changes once a request has
/// succeeded; failures are recorded in [`TodoClient::last_error`] and
/// returned. At most one toggle or remove may be outstanding per item.
pub struct TodoClient {
    api: Arc<dyn TodoApi>,
    config: ClientConfig,
    state: Mutex<ClientState>,
}

/// Marks an item busy until dropped.
struct InFlight<'a> {
    client: &'a TodoClient,
    id: i64,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.client.lock().in_flight.remove(&self.id);
    }
}

impl TodoClient {
    pub fn new(api: Arc<dyn TodoApi>, config: ClientConfig) -> Self {
        Self {
            api,
            config,
            state: Mutex::new(ClientState::default()),
        }
    }

    pub fn items(&self) -> Vec<TodoItem> {
        self.lock().items.clone()
    }

    pub fn draft(&self) -> String {
        self.lock().draft.clone()
    }

    pub fn set_draft(&self, text: impl Into<String>) {
        self.lock().draft = text.into();
    }

    /// Message of the most recent failure, cleared by the next success.
    pub fn last_error(&self) -> Option<String> {
        self.lock().last_error.clone()
    }

    pub fn is_pending(&self, id: i64) -> bool {
        self.lock().in_flight.contains(&id)
    }

    /// Replaces the local list with the server's.
    pub async fn load(&self) -> Result<(), ClientError> {
        self.fetch(None).await
    }

    /// Like [`load`](Self::load), keeping only items whose content contains `query`.
    pub async fn search(&self, query: &str) -> Result<(), ClientError> {
        self.fetch(Some(query)).await
    }

    /// A reply overtaken by a later list request or a local change is dropped.
    async fn fetch(&self, query: Option<&str>) -> Result<(), ClientError> {
        let sent_at = {
            let mut state = self.lock();
            state.generation += 1;
            state.generation
        };
        self.round_trip(self.api.list(query), |state, items| {
            if state.generation != sent_at {
                debug!(count = items.len(), "stale todo list discarded");
                return;
            }
            debug!(count = items.len(), "todo items loaded");
            state.items = items;
        })
        .await
    }

    /// Creates an item and appends it. Blank content sends nothing and yields `None`.
    pub async fn submit_create(&self, content: &str) -> Result<Option<TodoItem>, ClientError> {
        if content.trim().is_empty() {
            return Ok(None);
        }
        let input = CreateTodoItem {
            content: Some(content.to_string()),
            completed_at: None,
        };
        self.round_trip(self.api.create(&input), |state, item| {
            state.items.push(item.clone());
            state.draft.clear();
            state.generation += 1;
            Some(item)
        })
        .await
    }

    /// Submits the current draft.
    pub async fn submit_draft(&self) -> Result<Option<TodoItem>, ClientError> {
        let draft = self.draft();
        self.submit_create(&draft).await
    }

    /// Marks `item` completed now, or clears its completion.
    pub async fn toggle_complete(&self, item: &TodoItem, checked: bool) -> Result<TodoItem, ClientError> {
        let _busy = self.begin(item.id)?;
        let input = UpdateTodoItem {
            content: None,
            completed_at: checked.then(OffsetDateTime::now_utc),
        };
        self.round_trip(self.api.update(item.id, &input), |state, updated| {
            state.generation += 1;
            if !replace_by_id(&mut state.items, updated.clone()) {
                debug!(todo_item_id = updated.id, "updated item no longer listed locally");
            }
            updated
        })
        .await
    }

    pub async fn remove(&self, item: &TodoItem) -> Result<TodoItem, ClientError> {
        let id = item.id;
        let _busy = self.begin(id)?;
        self.round_trip(self.api.delete(id), |state, deleted| {
            remove_by_id(&mut state.items, id);
            state.generation += 1;
            deleted
        })
        .await
    }

    fn begin(&self, id: i64) -> Result<InFlight<'_>, ClientError> {
        let mut state = self.lock();
        if !state.in_flight.insert(id) {
            let err = ClientError::Busy(id);
            state.last_error = Some(err.to_string());
            return Err(err);
        }
        Ok(InFlight { client: self, id })
    }

    /// Awaits `request` under the configured timeout, then either applies
    /// `reconcile` or records the failure.
    async fn round_trip<T, R, F>(
        &self,
        request: F,
        reconcile: impl FnOnce(&mut ClientState, T) -> R,
    ) -> Result<R, ClientError>
    where
        F: Future<Output = Result<T, ClientError>>,
    {
        let timeout = self.config.request_timeout;
        let result = match tokio::time::timeout(timeout, request).await {
            Ok(result) => result,
            Err(_) => Err(ClientError::Timeout(timeout)),
        };

        let mut state = self.lock();
        match result {
            Ok(value) => {
                state.last_error = None;
                Ok(reconcile(&mut *state, value))
            }
            Err(e) => {
                warn!(error = %e, "todo request failed");
                state.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, ClientState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
