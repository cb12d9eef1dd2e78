//! Mentor backend: async fetch, follow and create.
//! All network work runs off the view's thread; results sent via mpsc.

use std::sync::mpsc::Sender;
use std::sync::Arc;

use mentordesk_services::{Category, Mentor, MentorApi, MentorCreateRequest};
use tokio::runtime::Handle;

use super::category_service;
use crate::error::SyncError;

/// Messages sent from async operations back to the mentor directory
#[derive(Debug)]
pub enum MentorServiceMessage {
    /// Result of fetching all mentors
    FetchDone {
        generation: u64,
        result: Result<Vec<Mentor>, SyncError>,
    },
    /// Result of fetching filter categories
    CategoriesDone {
        generation: u64,
        result: Result<Vec<Category>, SyncError>,
    },
    /// Result of following a mentor
    FollowDone {
        mentor_id: String,
        result: Result<Option<Mentor>, SyncError>,
    },
    /// Result of creating a mentor profile
    CreateDone(Result<Option<Mentor>, SyncError>),
}

/// Request to fetch mentors asynchronously.
/// Sends `FetchDone` on the channel when complete.
pub fn request_fetch(
    tx: &Sender<MentorServiceMessage>,
    runtime: &Handle,
    api: Arc<dyn MentorApi>,
    generation: u64,
) {
    let tx = tx.clone();
    runtime.spawn(async move {
        let result = api.list_mentors().await.map_err(SyncError::from);
        let _ = tx.send(MentorServiceMessage::FetchDone { generation, result });
    });
}

/// Request to fetch categories for the profession filter.
/// Sends `CategoriesDone` on the channel when complete.
pub fn request_categories(
    tx: &Sender<MentorServiceMessage>,
    runtime: &Handle,
    api: Arc<dyn MentorApi>,
    generation: u64,
) {
    category_service::request_categories(tx, runtime, api, move |result| {
        MentorServiceMessage::CategoriesDone { generation, result }
    });
}

/// Request to follow a mentor asynchronously.
/// Sends `FollowDone` on the channel when complete.
pub fn request_follow(
    tx: &Sender<MentorServiceMessage>,
    runtime: &Handle,
    api: Arc<dyn MentorApi>,
    mentor_id: String,
) {
    let tx = tx.clone();
    runtime.spawn(async move {
        let result = api.follow_mentor(&mentor_id).await.map_err(SyncError::from);
        let _ = tx.send(MentorServiceMessage::FollowDone { mentor_id, result });
    });
}

/// Request to create a mentor profile asynchronously.
/// Sends `CreateDone` on the channel when complete.
pub fn request_create(
    tx: &Sender<MentorServiceMessage>,
    runtime: &Handle,
    api: Arc<dyn MentorApi>,
    request: MentorCreateRequest,
) {
    let tx = tx.clone();
    runtime.spawn(async move {
        let result = api.create_mentor(&request).await.map_err(SyncError::from);
        let _ = tx.send(MentorServiceMessage::CreateDone(result));
    });
}
