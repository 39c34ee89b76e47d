use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

use super::model::lenient_timestamp;
use crate::error::AppError;

/// Body of `POST /api/todo_items`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTodoItem {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(
        default,
        alias = "completed_at",
        skip_serializing_if = "Option::is_none",
        serialize_with = "time::serde::rfc3339::option::serialize",
        deserialize_with = "lenient_timestamp"
    )]
    pub completed_at: Option<OffsetDateTime>,
}

/// Body of `PUT|PATCH /api/todo_items/:id`.
///
/// A missing `completedAt` clears the completion; it is not a partial merge.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTodoItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(
        default,
        alias = "completed_at",
        skip_serializing_if = "Option::is_none",
        serialize_with = "time::serde::rfc3339::option::serialize",
        deserialize_with = "lenient_timestamp"
    )]
    pub completed_at: Option<OffsetDateTime>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub query: Option<String>,
}

/// Reads a request body that is either bare or wrapped as `{"todo_item": {...}}`.
pub fn from_payload<T: DeserializeOwned>(body: Value) -> Result<T, AppError> {
    let inner = match body {
        Value::Object(mut map) if map.contains_key("todo_item") => {
            map.remove("todo_item").unwrap_or(Value::Null)
        }
        other => other,
    };
    serde_json::from_value(inner).map_err(|e| AppError::validation("body", e.to_string()))
}
