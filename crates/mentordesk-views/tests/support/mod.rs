//! In-memory `MentorApi` for driving the views without a server.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mentordesk_core::SyncConfig;
use mentordesk_services::{
    Category, Mentor, MentorApi, MentorCreateRequest, Priority, Progress, Task, TaskRequest,
    TransportError,
};
use parking_lot::Mutex;
use tokio::time::Instant;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    ListCategories,
    ListMentors,
    CreateMentor(MentorCreateRequest),
    Follow(String),
    ListTasks,
    CreateTask(TaskRequest),
    UpdateTask(String, TaskRequest),
    DeleteTask(String),
    UpdateProgress(String, u8),
}

#[derive(Default)]
pub struct FakeState {
    pub mentors: Vec<Mentor>,
    pub tasks: Vec<Task>,
    pub categories: Vec<Category>,
    /// Returned by list endpoints while set.
    pub fetch_error: Option<TransportError>,
    /// Returned by `list_categories` alone while set.
    pub category_error: Option<TransportError>,
    /// Returned by mutations while set.
    pub mutation_error: Option<TransportError>,
    /// Latency for successive `list_tasks` calls; empty means immediate.
    pub task_fetch_delays: VecDeque<Duration>,
    /// Latency for successive `list_mentors` calls.
    pub mentor_fetch_delays: VecDeque<Duration>,
    /// Latency for successive progress writes; the write applies afterwards.
    pub progress_delays: VecDeque<Duration>,
    /// Latency for successive deletes.
    pub delete_delays: VecDeque<Duration>,
    pub calls: Vec<(Instant, Call)>,
}

#[derive(Default)]
pub struct FakeApi {
    pub state: Mutex<FakeState>,
}

impl FakeApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_tasks(tasks: Vec<Task>) -> Arc<Self> {
        let api = Self::new();
        api.state.lock().tasks = tasks;
        api
    }

    pub fn with_mentors(mentors: Vec<Mentor>) -> Arc<Self> {
        let api = Self::new();
        api.state.lock().mentors = mentors;
        api
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.iter().map(|(_, c)| c.clone()).collect()
    }

    pub fn timed_calls(&self) -> Vec<(Instant, Call)> {
        self.state.lock().calls.clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.state.lock().calls.iter().filter(|(_, c)| pred(c)).count()
    }

    fn record(&self, call: Call) {
        self.state.lock().calls.push((Instant::now(), call));
    }

    fn fetch_result<T>(&self, items: impl FnOnce(&FakeState) -> Vec<T>) -> Result<Vec<T>, TransportError> {
        let state = self.state.lock();
        match &state.fetch_error {
            Some(e) => Err(e.clone()),
            None => Ok(items(&*state)),
        }
    }

    fn mutation_error(&self) -> Option<TransportError> {
        self.state.lock().mutation_error.clone()
    }
}

#[async_trait]
impl MentorApi for FakeApi {
    async fn list_categories(&self) -> Result<Vec<Category>, TransportError> {
        self.record(Call::ListCategories);
        if let Some(e) = self.state.lock().category_error.clone() {
            return Err(e);
        }
        self.fetch_result(|s| s.categories.clone())
    }

    async fn list_mentors(&self) -> Result<Vec<Mentor>, TransportError> {
        self.record(Call::ListMentors);
        let result = self.fetch_result(|s| s.mentors.clone());
        let delay = self.state.lock().mentor_fetch_delays.pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        result
    }

    async fn create_mentor(
        &self,
        request: &MentorCreateRequest,
    ) -> Result<Option<Mentor>, TransportError> {
        self.record(Call::CreateMentor(request.clone()));
        if let Some(e) = self.mutation_error() {
            return Err(e);
        }
        let mut state = self.state.lock();
        let created = mentor(&format!("m{}", state.mentors.len() + 1), &request.profession, 0.0, 0);
        state.mentors.push(created.clone());
        Ok(Some(created))
    }

    async fn follow_mentor(&self, id: &str) -> Result<Option<Mentor>, TransportError> {
        self.record(Call::Follow(id.to_string()));
        if let Some(e) = self.mutation_error() {
            return Err(e);
        }
        let mut state = self.state.lock();
        match state.mentors.iter_mut().find(|m| m.id == id) {
            Some(m) => {
                m.total_followers += 1;
                Ok(Some(m.clone()))
            }
            None => Err(TransportError::Status { status: 404 }),
        }
    }

    async fn list_tasks(&self) -> Result<Vec<Task>, TransportError> {
        self.record(Call::ListTasks);
        let result = self.fetch_result(|s| s.tasks.clone());
        let delay = self.state.lock().task_fetch_delays.pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        result
    }

    async fn create_task(&self, request: &TaskRequest) -> Result<Option<Task>, TransportError> {
        self.record(Call::CreateTask(request.clone()));
        if let Some(e) = self.mutation_error() {
            return Err(e);
        }
        let mut state = self.state.lock();
        let mut created = task(&format!("t{}", state.tasks.len() + 1), &request.title, &request.category);
        created.description = request.description.clone();
        created.priority = request.priority;
        state.tasks.push(created.clone());
        Ok(Some(created))
    }

    async fn update_task(
        &self,
        id: &str,
        request: &TaskRequest,
    ) -> Result<Option<Task>, TransportError> {
        self.record(Call::UpdateTask(id.to_string(), request.clone()));
        if let Some(e) = self.mutation_error() {
            return Err(e);
        }
        let mut state = self.state.lock();
        match state.tasks.iter_mut().find(|t| t.id == id) {
            Some(t) => {
                t.title = request.title.clone();
                t.description = request.description.clone();
                t.category = request.category.clone();
                t.priority = request.priority;
                Ok(Some(t.clone()))
            }
            None => Err(TransportError::Status { status: 404 }),
        }
    }

    async fn delete_task(&self, id: &str) -> Result<(), TransportError> {
        self.record(Call::DeleteTask(id.to_string()));
        let delay = self.state.lock().delete_delays.pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(e) = self.mutation_error() {
            return Err(e);
        }
        self.state.lock().tasks.retain(|t| t.id != id);
        Ok(())
    }

    async fn update_task_progress(
        &self,
        id: &str,
        progress: Progress,
    ) -> Result<Option<Task>, TransportError> {
        self.record(Call::UpdateProgress(id.to_string(), progress.value()));
        let delay = self.state.lock().progress_delays.pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(e) = self.mutation_error() {
            return Err(e);
        }
        let mut state = self.state.lock();
        Ok(state.tasks.iter_mut().find(|t| t.id == id).map(|t| {
            t.progress = progress;
            t.clone()
        }))
    }
}

pub fn task(id: &str, title: &str, category: &str) -> Task {
    Task {
        id: id.to_string(),
        title: title.to_string(),
        description: format!("{} description", title),
        category: category.to_string(),
        priority: Priority::Medium,
        progress: Progress::MIN,
        deadline: None,
        status: None,
        assigned_to: Vec::new(),
    }
}

pub fn mentor(id: &str, profession: &str, rating: f64, followers: u64) -> Mentor {
    Mentor {
        id: id.to_string(),
        profession: profession.to_string(),
        specialization: String::new(),
        bio: String::new(),
        company: None,
        position: None,
        location: None,
        availability_status: None,
        is_verified: false,
        is_featured: false,
        total_tasks_completed: 0,
        total_reviews: 0,
        average_rating: rating,
        total_followers: followers,
    }
}

pub fn sync_config(rollback_on_failure: bool) -> SyncConfig {
    SyncConfig {
        rollback_on_failure,
        ..SyncConfig::default()
    }
}

/// Step the paused clock until `settled` reports true, polling the view
/// between steps.
pub async fn drive<V>(view: &mut V, poll: impl Fn(&mut V) -> usize, settled: impl Fn(&V) -> bool) {
    for _ in 0..1000 {
        poll(view);
        if settled(view) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("view did not settle");
}
