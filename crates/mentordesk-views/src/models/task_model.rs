//! Task board: fetch, filter, edit, delete and drag progress on tasks.

use std::collections::HashMap;
use std::sync::mpsc;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use mentordesk_core::{LoadState, SyncConfig};
use mentordesk_services::{Category, MentorApi, Priority, Progress, Task, TaskRequest};
use tokio::runtime::Handle;

use crate::collection::EntityCollection;
use crate::debounce::ProgressDebouncer;
use crate::error::SyncError;
use crate::query::{derive_view, TaskSort, ViewQuery};
use crate::services::task_service::{self, TaskServiceMessage};

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Countdown shown on each task card.
///
/// Whole days are rounded up, so anything due later today reads
/// "1 Days Left". A task without a deadline counts as due `now`.
pub fn deadline_label(task: &Task, now: DateTime<Utc>) -> String {
    let due = task.deadline.unwrap_or(now);
    let diff_ms = due.timestamp_millis() - now.timestamp_millis();
    let days = diff_ms.div_euclid(DAY_MS) + i64::from(diff_ms.rem_euclid(DAY_MS) != 0);
    if days > 0 {
        format!("{} Days Left", days)
    } else {
        "Overdue".to_string()
    }
}

/// Form state shared by the create and edit modals.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub category: String,
    pub priority: Priority,
    /// `YYYY-MM-DD`, or empty.
    pub deadline: String,
}

impl TaskDraft {
    /// Pre-fill the edit form from an existing task.
    pub fn from_task(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            description: task.description.clone(),
            category: task.category.clone(),
            priority: task.priority,
            deadline: task
                .deadline
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
        }
    }

    pub fn can_submit(&self) -> bool {
        !self.title.trim().is_empty() && !self.description.trim().is_empty()
    }

    pub fn to_request(&self) -> TaskRequest {
        TaskRequest {
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            category: self.category.clone(),
            priority: self.priority,
            deadline: self.deadline.trim().to_string(),
        }
    }
}

/// View-owned state for the tasks page.
///
/// Progress drags update the row immediately and persist through a
/// per-row debouncer; everything else follows the same
/// spawn-then-`poll_channel` flow as the mentor directory.
pub struct TaskBoard {
    api: Arc<dyn MentorApi>,
    runtime: Handle,
    sync: SyncConfig,
    tx: mpsc::Sender<TaskServiceMessage>,
    rx: mpsc::Receiver<TaskServiceMessage>,
    tasks: EntityCollection<Task>,
    categories: Vec<Category>,
    query: ViewQuery<TaskSort>,
    load_state: LoadState,
    generation: u64,
    category_generation: u64,
    in_flight: usize,
    debouncer: ProgressDebouncer,
    /// Progress before the current drag burst, per row.
    progress_before: HashMap<String, Progress>,
    /// Latest dragged value per row, and once its write is answered, the
    /// fetch generation at that moment. Refetched rows keep these values
    /// until a fetch started after the answer lands.
    pending_progress: HashMap<String, (Progress, Option<u64>)>,
    /// Rows removed locally while their delete is in flight.
    deleted: HashMap<String, (usize, Task)>,
    error_message: Option<String>,
    last_error: Option<SyncError>,
    /// Kept apart from `last_error` so a task fetch can't clear it.
    category_error: Option<(String, SyncError)>,
    create_draft: TaskDraft,
    create_open: bool,
    editing: Option<(String, TaskDraft)>,
}

impl TaskBoard {
    pub fn new(api: Arc<dyn MentorApi>, runtime: Handle, sync: SyncConfig) -> Self {
        let (tx, rx) = mpsc::channel();
        let debouncer = ProgressDebouncer::new(sync.progress_debounce(), runtime.clone());
        Self {
            api,
            runtime,
            sync,
            tx,
            rx,
            tasks: EntityCollection::new(),
            categories: Vec::new(),
            query: ViewQuery::default(),
            load_state: LoadState::Idle,
            generation: 0,
            category_generation: 0,
            in_flight: 0,
            debouncer,
            progress_before: HashMap::new(),
            pending_progress: HashMap::new(),
            deleted: HashMap::new(),
            error_message: None,
            last_error: None,
            category_error: None,
            create_draft: TaskDraft::default(),
            create_open: false,
            editing: None,
        }
    }

    /// Initial fetch of tasks and categories. No-op unless `Idle`.
    pub fn mount(&mut self) {
        if !self.load_state.can_mount() {
            return;
        }
        self.fetch_tasks();
        self.fetch_categories();
    }

    /// Re-enter `Loading` after a failed fetch.
    pub fn retry(&mut self) {
        if !self.load_state.can_retry() {
            tracing::debug!("TaskBoard: retry ignored in {:?}", self.load_state);
            return;
        }
        self.refresh();
    }

    /// Refetch tasks and categories regardless of state.
    pub fn refresh(&mut self) {
        self.fetch_tasks();
        self.fetch_categories();
    }

    fn fetch_tasks(&mut self) {
        self.generation += 1;
        self.load_state = self.load_state.on_fetch_started();
        self.in_flight += 1;
        tracing::info!("Fetching tasks (#{})", self.generation);
        task_service::request_fetch(&self.tx, &self.runtime, self.api.clone(), self.generation);
    }

    fn fetch_categories(&mut self) {
        self.category_generation += 1;
        self.in_flight += 1;
        task_service::request_categories(
            &self.tx,
            &self.runtime,
            self.api.clone(),
            self.category_generation,
        );
    }

    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.query.search_term = term.into();
        self.on_query_changed();
    }

    pub fn set_category_filter(&mut self, category: impl Into<String>) {
        self.query.category = category.into();
        self.on_query_changed();
    }

    pub fn set_sort(&mut self, sort: TaskSort) {
        self.query.sort = sort;
        self.on_query_changed();
    }

    /// Advance to the next sort key, as the sort toggle does.
    pub fn cycle_sort(&mut self) -> TaskSort {
        self.set_sort(self.query.sort.next());
        self.query.sort
    }

    fn on_query_changed(&mut self) {
        if self.load_state.can_retry() {
            self.refresh();
        }
    }

    pub fn query(&self) -> &ViewQuery<TaskSort> {
        &self.query
    }

    /// Rows to render, filtered and sorted by the current query.
    pub fn visible(&self) -> Vec<&Task> {
        derive_view(self.tasks.items(), &self.query)
    }

    pub fn tasks(&self) -> &[Task] {
        self.tasks.items()
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.get(id)
    }

    /// Categories that apply to tasks.
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Slider input. The row changes now; the write goes out once the row
    /// has been quiet for the debounce delay. Returns the clamped value.
    pub fn drag_progress(&mut self, task_id: &str, value: i64) -> Result<Progress, SyncError> {
        let current = self
            .tasks
            .get(task_id)
            .map(|t| t.progress)
            .ok_or_else(|| SyncError::UnknownEntity(task_id.to_string()))?;

        let progress = Progress::clamped(value);
        self.progress_before
            .entry(task_id.to_string())
            .or_insert(current);
        self.tasks.update(task_id, |t| t.progress = progress);
        self.pending_progress
            .insert(task_id.to_string(), (progress, None));

        let tx = self.tx.clone();
        let api = self.api.clone();
        let id = task_id.to_string();
        self.debouncer.schedule(task_id, move |seq| {
            task_service::persist_progress(tx, api, id, seq, progress)
        });
        Ok(progress)
    }

    /// Rows with a progress write scheduled or in flight.
    pub fn pending_persists(&self) -> usize {
        self.debouncer.pending_count()
    }

    pub fn open_create(&mut self) {
        self.create_open = true;
    }

    /// Close the modal and discard the draft.
    pub fn close_create(&mut self) {
        self.create_open = false;
        self.create_draft = TaskDraft::default();
    }

    pub fn is_create_open(&self) -> bool {
        self.create_open
    }

    pub fn create_draft(&self) -> &TaskDraft {
        &self.create_draft
    }

    pub fn create_draft_mut(&mut self) -> &mut TaskDraft {
        &mut self.create_draft
    }

    pub fn submit_create(&mut self) -> Result<(), SyncError> {
        if !self.create_draft.can_submit() {
            return Err(SyncError::Incomplete);
        }
        let request = self.create_draft.to_request();
        tracing::info!("Creating task '{}'", request.title);
        self.in_flight += 1;
        task_service::request_create(&self.tx, &self.runtime, self.api.clone(), request);
        Ok(())
    }

    /// Open the edit modal pre-filled from the task.
    pub fn open_edit(&mut self, task_id: &str) -> Result<(), SyncError> {
        let draft = self
            .tasks
            .get(task_id)
            .map(TaskDraft::from_task)
            .ok_or_else(|| SyncError::UnknownEntity(task_id.to_string()))?;
        self.editing = Some((task_id.to_string(), draft));
        Ok(())
    }

    pub fn close_edit(&mut self) {
        self.editing = None;
    }

    /// Id of the task being edited and its draft.
    pub fn editing(&self) -> Option<(&str, &TaskDraft)> {
        self.editing.as_ref().map(|(id, draft)| (id.as_str(), draft))
    }

    pub fn edit_draft_mut(&mut self) -> Option<&mut TaskDraft> {
        self.editing.as_mut().map(|(_, draft)| draft)
    }

    pub fn submit_edit(&mut self) -> Result<(), SyncError> {
        let (task_id, request) = match &self.editing {
            Some((id, draft)) if draft.can_submit() => (id.clone(), draft.to_request()),
            _ => return Err(SyncError::Incomplete),
        };
        tracing::info!("Updating task {}", task_id);
        self.in_flight += 1;
        task_service::request_update(&self.tx, &self.runtime, self.api.clone(), task_id, request);
        Ok(())
    }

    /// Remove the row now and ask the server to delete it. Any progress
    /// write still waiting for the row is dropped.
    pub fn delete_task(&mut self, task_id: &str) -> Result<(), SyncError> {
        let removed = self
            .tasks
            .remove(task_id)
            .ok_or_else(|| SyncError::UnknownEntity(task_id.to_string()))?;

        self.debouncer.cancel(task_id);
        self.progress_before.remove(task_id);
        self.pending_progress.remove(task_id);
        self.deleted.insert(task_id.to_string(), removed);

        tracing::info!("Deleting task {}", task_id);
        self.in_flight += 1;
        task_service::request_delete(
            &self.tx,
            &self.runtime,
            self.api.clone(),
            task_id.to_string(),
        );
        Ok(())
    }

    /// Apply every completed request. Returns how many messages were handled.
    pub fn poll_channel(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(msg) = self.rx.try_recv() {
            // Progress writes are tracked by the debouncer instead.
            if !matches!(msg, TaskServiceMessage::ProgressDone { .. }) {
                self.in_flight = self.in_flight.saturating_sub(1);
            }
            self.handle_message(msg);
            handled += 1;
        }
        handled
    }

    fn handle_message(&mut self, msg: TaskServiceMessage) {
        match msg {
            TaskServiceMessage::FetchDone { generation, result } => {
                if generation != self.generation {
                    tracing::debug!("Ignoring stale task fetch #{}", generation);
                    return;
                }
                match result {
                    Ok(tasks) => {
                        tracing::info!("Loaded {} tasks", tasks.len());
                        self.tasks.replace_all(tasks);
                        self.reapply_local_changes(generation);
                        self.load_state = self.load_state.on_fetch_done(true);
                        self.clear_error();
                    }
                    Err(e) => {
                        tracing::error!("Failed to load tasks: {}", e);
                        self.tasks.clear();
                        self.load_state = self.load_state.on_fetch_done(false);
                        self.set_error(e);
                    }
                }
            }
            TaskServiceMessage::CategoriesDone { generation, result } => {
                if generation != self.category_generation {
                    return;
                }
                match result {
                    Ok(categories) => {
                        self.categories = categories
                            .into_iter()
                            .filter(|c| c.kind.applies_to_tasks())
                            .collect();
                        self.category_error = None;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load categories: {}", e);
                        self.categories.clear();
                        self.category_error = Some((e.message(), e));
                    }
                }
            }
            TaskServiceMessage::ProgressDone {
                task_id,
                seq,
                progress,
                result,
            } => {
                if !self.debouncer.complete(&task_id, seq) {
                    tracing::debug!("Ignoring superseded progress write for {}", task_id);
                    return;
                }
                let before = self.progress_before.remove(&task_id);
                match result {
                    Ok(updated) => {
                        if let Some(pending) = self.pending_progress.get_mut(&task_id) {
                            pending.1 = Some(self.generation);
                        }
                        tracing::info!("Saved progress {} for task {}", progress, task_id);
                        if let Some(task) = updated {
                            self.tasks.upsert_existing(task);
                        }
                        self.clear_error();
                    }
                    Err(e) => {
                        tracing::error!("Failed to save progress for task {}: {}", task_id, e);
                        self.pending_progress.remove(&task_id);
                        if self.sync.rollback_on_failure {
                            if let Some(before) = before {
                                self.tasks.update(&task_id, |t| t.progress = before);
                            }
                        }
                        self.set_error(e);
                    }
                }
            }
            TaskServiceMessage::CreateDone(result) => match result {
                Ok(_) => {
                    tracing::info!("Task created");
                    self.close_create();
                    self.clear_error();
                    self.fetch_tasks();
                }
                Err(e) => {
                    tracing::error!("Failed to create task: {}", e);
                    self.set_error(e);
                }
            },
            TaskServiceMessage::UpdateDone { task_id, result } => match result {
                Ok(_) => {
                    tracing::info!("Task {} updated", task_id);
                    self.close_edit();
                    self.clear_error();
                    self.fetch_tasks();
                }
                Err(e) => {
                    tracing::error!("Failed to update task {}: {}", task_id, e);
                    self.set_error(e);
                }
            },
            TaskServiceMessage::DeleteDone { task_id, result } => {
                let removed = self.deleted.remove(&task_id);
                match result {
                    Ok(()) => {
                        tracing::info!("Task {} deleted", task_id);
                        self.clear_error();
                        self.fetch_tasks();
                    }
                    Err(e) => {
                        tracing::error!("Failed to delete task {}: {}", task_id, e);
                        if self.sync.rollback_on_failure {
                            if let Some((index, task)) = removed {
                                self.tasks.restore_at(index, task);
                            }
                        }
                        self.set_error(e);
                    }
                }
            }
        }
    }

    /// A fetch that may have read the server before the latest drags or
    /// deletes must not undo them.
    fn reapply_local_changes(&mut self, generation: u64) {
        self.pending_progress
            .retain(|_, (_, answered)| !matches!(answered, Some(g) if *g < generation));
        for (task_id, (progress, _)) in &self.pending_progress {
            let progress = *progress;
            self.tasks.update(task_id, |t| t.progress = progress);
        }
        for task_id in self.deleted.keys() {
            self.tasks.remove(task_id);
        }
    }

    /// No request outstanding, no progress write pending, not loading.
    pub fn is_settled(&self) -> bool {
        self.in_flight == 0 && !self.debouncer.has_pending() && !self.load_state.is_loading()
    }

    pub fn load_state(&self) -> LoadState {
        self.load_state
    }

    /// Banner text for the most recent failure, if any. A failed category
    /// fetch shows when nothing else has failed.
    pub fn error_message(&self) -> Option<&str> {
        self.error_message
            .as_deref()
            .or_else(|| self.category_error.as_ref().map(|(message, _)| message.as_str()))
    }

    /// Most recent task fetch or mutation failure.
    pub fn last_error(&self) -> Option<&SyncError> {
        self.last_error.as_ref()
    }

    pub fn category_error(&self) -> Option<&SyncError> {
        self.category_error.as_ref().map(|(_, e)| e)
    }

    fn set_error(&mut self, e: SyncError) {
        self.error_message = Some(e.message());
        self.last_error = Some(e);
    }

    fn clear_error(&mut self) {
        self.error_message = None;
        self.last_error = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn task_due(deadline: Option<DateTime<Utc>>) -> Task {
        Task {
            id: "t1".to_string(),
            title: "Review PR".to_string(),
            description: "Check the diff".to_string(),
            category: "Dev".to_string(),
            priority: Priority::High,
            progress: Progress::clamped(30),
            deadline,
            status: None,
            assigned_to: Vec::new(),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn deadline_label_rounds_up() {
        let task = task_due(Some(now() + Duration::hours(36)));
        assert_eq!(deadline_label(&task, now()), "2 Days Left");

        let task = task_due(Some(now() + Duration::days(3)));
        assert_eq!(deadline_label(&task, now()), "3 Days Left");

        let task = task_due(Some(now() + Duration::minutes(5)));
        assert_eq!(deadline_label(&task, now()), "1 Days Left");
    }

    #[test]
    fn deadline_label_overdue() {
        let task = task_due(Some(now() - Duration::hours(1)));
        assert_eq!(deadline_label(&task, now()), "Overdue");

        let task = task_due(Some(now()));
        assert_eq!(deadline_label(&task, now()), "Overdue");

        assert_eq!(deadline_label(&task_due(None), now()), "Overdue");
    }

    #[test]
    fn draft_from_task_formats_deadline() {
        let task = task_due(Some(Utc.with_ymd_and_hms(2024, 6, 10, 0, 0, 0).unwrap()));
        let draft = TaskDraft::from_task(&task);

        assert_eq!(draft.deadline, "2024-06-10");
        assert_eq!(draft.priority, Priority::High);
        assert!(draft.can_submit());

        let request = draft.to_request();
        assert_eq!(request.title, "Review PR");
        assert_eq!(request.deadline, "2024-06-10");
    }

    #[test]
    fn draft_requires_title_and_description() {
        let mut draft = TaskDraft {
            title: "Title".to_string(),
            ..TaskDraft::default()
        };
        assert!(!draft.can_submit());

        draft.description = "  ".to_string();
        assert!(!draft.can_submit());

        draft.description = "Body".to_string();
        assert!(draft.can_submit());
        assert_eq!(draft.priority, Priority::Medium);
    }
}
