//! The seam between views and the remote API.
//!
//! Views hold an `Arc<dyn MentorApi>` so they can run against the HTTP
//! client or an in-memory double.

use async_trait::async_trait;

use crate::client::ApiClient;
use crate::error::TransportError;
use crate::types::{Category, Mentor, MentorCreateRequest, Progress, Task, TaskRequest};

#[async_trait]
pub trait MentorApi: Send + Sync {
    async fn list_categories(&self) -> Result<Vec<Category>, TransportError>;

    async fn list_mentors(&self) -> Result<Vec<Mentor>, TransportError>;

    async fn create_mentor(
        &self,
        request: &MentorCreateRequest,
    ) -> Result<Option<Mentor>, TransportError>;

    async fn follow_mentor(&self, id: &str) -> Result<Option<Mentor>, TransportError>;

    async fn list_tasks(&self) -> Result<Vec<Task>, TransportError>;

    async fn create_task(&self, request: &TaskRequest) -> Result<Option<Task>, TransportError>;

    async fn update_task(
        &self,
        id: &str,
        request: &TaskRequest,
    ) -> Result<Option<Task>, TransportError>;

    async fn delete_task(&self, id: &str) -> Result<(), TransportError>;

    async fn update_task_progress(
        &self,
        id: &str,
        progress: Progress,
    ) -> Result<Option<Task>, TransportError>;
}

#[async_trait]
impl MentorApi for ApiClient {
    async fn list_categories(&self) -> Result<Vec<Category>, TransportError> {
        ApiClient::list_categories(self).await
    }

    async fn list_mentors(&self) -> Result<Vec<Mentor>, TransportError> {
        ApiClient::list_mentors(self).await
    }

    async fn create_mentor(
        &self,
        request: &MentorCreateRequest,
    ) -> Result<Option<Mentor>, TransportError> {
        ApiClient::create_mentor(self, request).await
    }

    async fn follow_mentor(&self, id: &str) -> Result<Option<Mentor>, TransportError> {
        ApiClient::follow_mentor(self, id).await
    }

    async fn list_tasks(&self) -> Result<Vec<Task>, TransportError> {
        ApiClient::list_tasks(self).await
    }

    async fn create_task(&self, request: &TaskRequest) -> Result<Option<Task>, TransportError> {
        ApiClient::create_task(self, request).await
    }

    async fn update_task(
        &self,
        id: &str,
        request: &TaskRequest,
    ) -> Result<Option<Task>, TransportError> {
        ApiClient::update_task(self, id, request).await
    }

    async fn delete_task(&self, id: &str) -> Result<(), TransportError> {
        ApiClient::delete_task(self, id).await
    }

    async fn update_task_progress(
        &self,
        id: &str,
        progress: Progress,
    ) -> Result<Option<Task>, TransportError> {
        ApiClient::update_task_progress(self, id, progress).await
    }
}
