use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use uuid::Uuid;

/// A persisted todo item, also the JSON shape returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TodoItem {
    pub id: i64,
    pub owner_id: Uuid,
    pub content: String,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub completed_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl TodoItem {
    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }
}

/// Attributes for inserting a row. `content` is already normalized.
#[derive(Debug, Clone)]
pub struct NewTodoItem {
    pub owner_id: Uuid,
    pub content: String,
    pub completed_at: Option<OffsetDateTime>,
}

/// Full replacement of the mutable columns of a row.
#[derive(Debug, Clone)]
pub struct TodoChanges {
    pub content: String,
    pub completed_at: Option<OffsetDateTime>,
}

/// Trims `raw`; blank input becomes `None` so it fails the required check.
pub fn normalize_content(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Text(String),
    Flag(bool),
}

/// Accepts an RFC 3339 string, `null`, `""` or `false`; the last three mean "not completed".
pub(crate) fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<OffsetDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<RawTimestamp>::deserialize(deserializer)? {
        None | Some(RawTimestamp::Flag(false)) => Ok(None),
        Some(RawTimestamp::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(RawTimestamp::Text(s)) => OffsetDateTime::parse(s.trim(), &Rfc3339)
            .map(Some)
            .map_err(serde::de::Error::custom),
        Some(RawTimestamp::Flag(true)) => Err(serde::de::Error::custom(
            "completedAt must be a timestamp, not `true`",
        )),
    }
}
