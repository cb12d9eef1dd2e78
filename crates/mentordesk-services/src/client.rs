//! HTTP client for the MentorDesk API.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{header, Client, Method};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::error::TransportError;
use crate::types::{
    Category, Mentor, MentorCreateRequest, Progress, ProgressUpdateRequest, Task, TaskRequest,
};

/// Thin wrapper over `reqwest` that normalizes every outcome into
/// `Result<T, TransportError>`. Holds no state besides the base URL.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    client: Arc<Client>,
}

impl ApiClient {
    /// Create a client for `base_url` (e.g. `https://host`, without `/api`).
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, TransportError> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        let parsed =
            Url::parse(&base_url).map_err(|e| TransportError::InvalidUrl(format!("{base_url}: {e}")))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(TransportError::InvalidUrl(format!(
                "unsupported scheme {}",
                parsed.scheme()
            )));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            base_url,
            client: Arc::new(client),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issue a request and decode the JSON response as `T`.
    ///
    /// An empty success body decodes as JSON `null`.
    pub async fn request<T, B>(
        &self,
        endpoint: &str,
        method: Method,
        body: Option<&B>,
    ) -> Result<T, TransportError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = format!("{}{}", self.base_url, endpoint);
        tracing::debug!("API request: {} {}", method, url);

        let mut builder = self
            .client
            .request(method.clone(), &url)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ACCEPT, "application/json");
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            tracing::warn!("API request {} {} failed: {}", method, url, e);
            TransportError::from(e)
        })?;

        let status = response.status();
        tracing::debug!("API response: {} {} -> {}", method, url, status);
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
            });
        }

        let text = response.text().await?;
        let value = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text)?
        };

        Ok(serde_json::from_value(value)?)
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, TransportError> {
        self.request(endpoint, Method::GET, None::<&()>).await
    }

    /// GET a list endpoint, coercing the payload defensively.
    async fn list<T: DeserializeOwned>(&self, endpoint: &str) -> Result<Vec<T>, TransportError> {
        let payload: Value = self.get(endpoint).await?;
        let items = coerce_list(payload);
        tracing::info!("Fetched {} items from {}", items.len(), endpoint);
        Ok(items)
    }

    pub async fn health(&self) -> Result<Value, TransportError> {
        self.get("/api/health").await
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>, TransportError> {
        self.list("/api/categories").await
    }

    pub async fn list_mentors(&self) -> Result<Vec<Mentor>, TransportError> {
        self.list("/api/mentors").await
    }

    pub async fn get_mentor(&self, id: &str) -> Result<Mentor, TransportError> {
        self.get(&format!("/api/mentors/{}", id)).await
    }

    /// Create a mentor. Returns the created record when the server echoes one.
    pub async fn create_mentor(
        &self,
        request: &MentorCreateRequest,
    ) -> Result<Option<Mentor>, TransportError> {
        let value: Value = self
            .request("/api/mentors", Method::POST, Some(request))
            .await?;
        Ok(ack_or_record(value))
    }

    /// Follow a mentor. The server answers with the updated mentor or a bare ack.
    pub async fn follow_mentor(&self, id: &str) -> Result<Option<Mentor>, TransportError> {
        let value: Value = self
            .request(&format!("/api/mentors/{}/follow", id), Method::POST, None::<&()>)
            .await?;
        Ok(ack_or_record(value))
    }

    pub async fn list_tasks(&self) -> Result<Vec<Task>, TransportError> {
        self.list("/api/tasks").await
    }

    pub async fn get_task(&self, id: &str) -> Result<Task, TransportError> {
        self.get(&format!("/api/tasks/{}", id)).await
    }

    pub async fn create_task(&self, request: &TaskRequest) -> Result<Option<Task>, TransportError> {
        let value: Value = self.request("/api/tasks", Method::POST, Some(request)).await?;
        Ok(ack_or_record(value))
    }

    pub async fn update_task(
        &self,
        id: &str,
        request: &TaskRequest,
    ) -> Result<Option<Task>, TransportError> {
        let value: Value = self
            .request(&format!("/api/tasks/{}", id), Method::PUT, Some(request))
            .await?;
        Ok(ack_or_record(value))
    }

    pub async fn delete_task(&self, id: &str) -> Result<(), TransportError> {
        let _: Value = self
            .request(&format!("/api/tasks/{}", id), Method::DELETE, None::<&()>)
            .await?;
        Ok(())
    }

    pub async fn update_task_progress(
        &self,
        id: &str,
        progress: Progress,
    ) -> Result<Option<Task>, TransportError> {
        let body = ProgressUpdateRequest { progress };
        let value: Value = self
            .request(&format!("/api/tasks/{}/progress", id), Method::PATCH, Some(&body))
            .await?;
        Ok(ack_or_record(value))
    }
}

/// Treat anything that isn't a JSON array as an empty list; skip entries
/// that fail to decode.
pub fn coerce_list<T: DeserializeOwned>(payload: Value) -> Vec<T> {
    match payload {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match serde_json::from_value(item) {
                Ok(v) => Some(v),
                Err(e) => {
                    tracing::warn!("Skipping malformed list entry: {}", e);
                    None
                }
            })
            .collect(),
        Value::Null => Vec::new(),
        other => {
            tracing::warn!("Expected a JSON array, got {}; treating as empty", json_kind(&other));
            Vec::new()
        }
    }
}

/// Decode a mutation response as a record, or `None` if it was only an ack.
fn ack_or_record<T: DeserializeOwned>(value: Value) -> Option<T> {
    serde_json::from_value(value).ok()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_invalid_base_url() {
        let err = ApiClient::new("not a url", Duration::from_secs(5)).unwrap_err();
        assert!(matches!(err, TransportError::InvalidUrl(_)));

        let err = ApiClient::new("ftp://example.com", Duration::from_secs(5)).unwrap_err();
        assert!(matches!(err, TransportError::InvalidUrl(_)));
    }

    #[test]
    fn test_trims_trailing_slash() {
        let client = ApiClient::new("https://example.com/", Duration::from_secs(5)).unwrap();
        assert_eq!(client.base_url(), "https://example.com");
    }

    #[test]
    fn test_coerce_list_non_array_is_empty() {
        let tasks: Vec<Task> = coerce_list(serde_json::json!({"error": "nope"}));
        assert!(tasks.is_empty());

        let tasks: Vec<Task> = coerce_list(Value::Null);
        assert!(tasks.is_empty());
    }

    #[test]
    fn test_coerce_list_skips_malformed_entries() {
        let tasks: Vec<Task> = coerce_list(serde_json::json!([
            {"_id": "t1", "title": "Keep"},
            {"title": "No id"},
            42
        ]));
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id, "t1");
    }

    #[test]
    fn test_ack_or_record() {
        let mentor: Option<Mentor> = ack_or_record(serde_json::json!({"_id": "m1"}));
        assert_eq!(mentor.map(|m| m.id), Some("m1".to_string()));

        let ack: Option<Mentor> = ack_or_record(serde_json::json!({"message": "ok"}));
        assert!(ack.is_none());
    }
}
