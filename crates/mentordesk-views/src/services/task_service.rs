//! Task backend: async CRUD and progress writes.
//! All network work runs off the view's thread; results sent via mpsc.

use std::sync::mpsc::Sender;
use std::sync::Arc;

use mentordesk_services::{Category, MentorApi, Progress, Task, TaskRequest};
use tokio::runtime::Handle;

use super::category_service;
use crate::error::SyncError;

/// Messages sent from async operations back to the task board
#[derive(Debug)]
pub enum TaskServiceMessage {
    /// Result of fetching all tasks
    FetchDone {
        generation: u64,
        result: Result<Vec<Task>, SyncError>,
    },
    /// Result of fetching filter categories
    CategoriesDone {
        generation: u64,
        result: Result<Vec<Category>, SyncError>,
    },
    /// Result of a debounced progress write
    ProgressDone {
        task_id: String,
        seq: u64,
        progress: Progress,
        result: Result<Option<Task>, SyncError>,
    },
    /// Result of creating a task
    CreateDone(Result<Option<Task>, SyncError>),
    /// Result of editing a task
    UpdateDone {
        task_id: String,
        result: Result<Option<Task>, SyncError>,
    },
    /// Result of deleting a task
    DeleteDone {
        task_id: String,
        result: Result<(), SyncError>,
    },
}

/// Request to fetch tasks asynchronously.
/// Sends `FetchDone` on the channel when complete.
pub fn request_fetch(
    tx: &Sender<TaskServiceMessage>,
    runtime: &Handle,
    api: Arc<dyn MentorApi>,
    generation: u64,
) {
    let tx = tx.clone();
    runtime.spawn(async move {
        let result = api.list_tasks().await.map_err(SyncError::from);
        let _ = tx.send(TaskServiceMessage::FetchDone { generation, result });
    });
}

/// Request to fetch categories for the task filter.
/// Sends `CategoriesDone` on the channel when complete.
pub fn request_categories(
    tx: &Sender<TaskServiceMessage>,
    runtime: &Handle,
    api: Arc<dyn MentorApi>,
    generation: u64,
) {
    category_service::request_categories(tx, runtime, api, move |result| {
        TaskServiceMessage::CategoriesDone { generation, result }
    });
}

/// Persist a progress value. Awaited by the debouncer once the row goes quiet.
/// Sends `ProgressDone` on the channel when complete.
pub async fn persist_progress(
    tx: Sender<TaskServiceMessage>,
    api: Arc<dyn MentorApi>,
    task_id: String,
    seq: u64,
    progress: Progress,
) {
    tracing::debug!("Persisting progress {} for task {} (#{})", progress, task_id, seq);
    let result = api
        .update_task_progress(&task_id, progress)
        .await
        .map_err(SyncError::from);
    let _ = tx.send(TaskServiceMessage::ProgressDone {
        task_id,
        seq,
        progress,
        result,
    });
}

/// Request to create a task asynchronously.
/// Sends `CreateDone` on the channel when complete.
pub fn request_create(
    tx: &Sender<TaskServiceMessage>,
    runtime: &Handle,
    api: Arc<dyn MentorApi>,
    request: TaskRequest,
) {
    let tx = tx.clone();
    runtime.spawn(async move {
        let result = api.create_task(&request).await.map_err(SyncError::from);
        let _ = tx.send(TaskServiceMessage::CreateDone(result));
    });
}

/// Request to update a task asynchronously.
/// Sends `UpdateDone` on the channel when complete.
pub fn request_update(
    tx: &Sender<TaskServiceMessage>,
    runtime: &Handle,
    api: Arc<dyn MentorApi>,
    task_id: String,
    request: TaskRequest,
) {
    let tx = tx.clone();
    runtime.spawn(async move {
        let result = api
            .update_task(&task_id, &request)
            .await
            .map_err(SyncError::from);
        let _ = tx.send(TaskServiceMessage::UpdateDone { task_id, result });
    });
}

/// Request to delete a task asynchronously.
/// Sends `DeleteDone` on the channel when complete.
pub fn request_delete(
    tx: &Sender<TaskServiceMessage>,
    runtime: &Handle,
    api: Arc<dyn MentorApi>,
    task_id: String,
) {
    let tx = tx.clone();
    runtime.spawn(async move {
        let result = api.delete_task(&task_id).await.map_err(SyncError::from);
        let _ = tx.send(TaskServiceMessage::DeleteDone { task_id, result });
    });
}
