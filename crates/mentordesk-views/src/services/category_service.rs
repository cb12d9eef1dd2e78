//! Category fetch shared by both views. The caller picks the message variant.

use std::sync::mpsc::Sender;
use std::sync::Arc;

use mentordesk_services::{Category, MentorApi};
use tokio::runtime::Handle;

use crate::error::SyncError;

/// Request the category list asynchronously.
/// Sends `wrap(result)` on the channel when complete.
pub fn request_categories<M, F>(tx: &Sender<M>, runtime: &Handle, api: Arc<dyn MentorApi>, wrap: F)
where
    M: Send + 'static,
    F: FnOnce(Result<Vec<Category>, SyncError>) -> M + Send + 'static,
{
    let tx = tx.clone();
    runtime.spawn(async move {
        let result = api.list_categories().await.map_err(SyncError::from);
        let _ = tx.send(wrap(result));
    });
}
