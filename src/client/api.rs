use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::json;
use tracing::debug;

use super::error::ClientError;
use crate::todos::dto::{CreateTodoItem, UpdateTodoItem};
use crate::todos::model::TodoItem;

/// One request/response exchange per call against the todo item API.
#[async_trait]
pub trait TodoApi: Send + Sync {
    async fn list(&self, query: Option<&str>) -> Result<Vec<TodoItem>, ClientError>;
    async fn create(&self, input: &CreateTodoItem) -> Result<TodoItem, ClientError>;
    async fn update(&self, id: i64, input: &UpdateTodoItem) -> Result<TodoItem, ClientError>;
    async fn delete(&self, id: i64) -> Result<TodoItem, ClientError>;
}

#[derive(Deserialize)]
struct ErrorPayload {
    error: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenPayload {
    access_token: String,
}

/// `TodoApi` over HTTP with a bearer access token.
#[derive(Debug, Clone)]
pub struct HttpTodoApi {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpTodoApi {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub async fn register(self, email: &str, password: &str) -> Result<Self, ClientError> {
        self.authenticate("/api/auth/register", email, password).await
    }

    pub async fn login(self, email: &str, password: &str) -> Result<Self, ClientError> {
        self.authenticate("/api/auth/login", email, password).await
    }

    async fn authenticate(self, path: &str, email: &str, password: &str) -> Result<Self, ClientError> {
        let response = self
            .request(Method::POST, path)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        let tokens: TokenPayload = read_json(response).await?;
        Ok(self.with_token(tokens.access_token))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!(%method, %url, "todo api request");
        let builder = self.http.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }
}

#[async_trait]
impl TodoApi for HttpTodoApi {
    async fn list(&self, query: Option<&str>) -> Result<Vec<TodoItem>, ClientError> {
        let mut builder = self.request(Method::GET, "/api/todo_items");
        if let Some(q) = query {
            builder = builder.query(&[("query", q)]);
        }
        read_json(builder.send().await?).await
    }

    async fn create(&self, input: &CreateTodoItem) -> Result<TodoItem, ClientError> {
        let response = self
            .request(Method::POST, "/api/todo_items")
            .json(input)
            .send()
            .await?;
        read_json(response).await
    }

    async fn update(&self, id: i64, input: &UpdateTodoItem) -> Result<TodoItem, ClientError> {
        let response = self
            .request(Method::PUT, &format!("/api/todo_items/{id}"))
            .json(input)
            .send()
            .await?;
        read_json(response).await
    }

    async fn delete(&self, id: i64) -> Result<TodoItem, ClientError> {
        let response = self
            .request(Method::DELETE, &format!("/api/todo_items/{id}"))
            .send()
            .await?;
        read_json(response).await
    }
}

/// Any non-2xx status is an error; 404 gets its own variant.
async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Err(ClientError::NotFound);
    }
    if !status.is_success() {
        let message = match response.json::<ErrorPayload>().await {
            Ok(body) => body.error,
            Err(_) => status.canonical_reason().unwrap_or("unknown error").to_string(),
        };
        return Err(ClientError::Api {
            status: status.as_u16(),
            message,
        });
    }
    response
        .json::<T>()
        .await
        .map_err(|e| ClientError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_stripped() {
        let api = HttpTodoApi::new("http://localhost:8080/");
        assert_eq!(api.base_url, "http://localhost:8080");
        assert!(api.token.is_none());
        assert_eq!(api.with_token("t").token.as_deref(), Some("t"));
    }
}
