//! Mentor directory: fetch, filter, follow and create mentors.

use std::sync::mpsc;
use std::sync::Arc;

use mentordesk_core::{LoadState, SyncConfig};
use mentordesk_services::{Category, Mentor, MentorApi, MentorCreateRequest};
use tokio::runtime::Handle;

use crate::collection::EntityCollection;
use crate::error::SyncError;
use crate::query::{derive_view, MentorSort, ViewQuery};
use crate::services::mentor_service::{self, MentorServiceMessage};

/// Form state for "become a mentor".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MentorDraft {
    pub profession: String,
    pub specialization: String,
    pub bio: String,
}

impl MentorDraft {
    pub fn can_submit(&self) -> bool {
        !self.profession.trim().is_empty()
    }

    pub fn to_request(&self) -> MentorCreateRequest {
        MentorCreateRequest {
            profession: self.profession.trim().to_string(),
            specialization: self.specialization.trim().to_string(),
            bio: self.bio.trim().to_string(),
        }
    }
}

/// View-owned state for the mentors page.
///
/// Driven from one thread: commands spawn requests on `runtime`, and
/// `poll_channel` applies whatever has completed since the last call.
pub struct MentorDirectory {
    api: Arc<dyn MentorApi>,
    runtime: Handle,
    sync: SyncConfig,
    tx: mpsc::Sender<MentorServiceMessage>,
    rx: mpsc::Receiver<MentorServiceMessage>,
    mentors: EntityCollection<Mentor>,
    categories: Vec<Category>,
    query: ViewQuery<MentorSort>,
    load_state: LoadState,
    generation: u64,
    category_generation: u64,
    in_flight: usize,
    /// Follows a fetched count may not include yet: the mentor, and once
    /// answered, the fetch generation at that moment. Only a fetch started
    /// after the answer is trusted to have counted it.
    unconfirmed_follows: Vec<(String, Option<u64>)>,
    error_message: Option<String>,
    last_error: Option<SyncError>,
    /// Kept apart from `last_error` so a mentor fetch can't clear it.
    category_error: Option<(String, SyncError)>,
    draft: MentorDraft,
    create_open: bool,
}

impl MentorDirectory {
    pub fn new(api: Arc<dyn MentorApi>, runtime: Handle, sync: SyncConfig) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            api,
            runtime,
            sync,
            tx,
            rx,
            mentors: EntityCollection::new(),
            categories: Vec::new(),
            query: ViewQuery::default(),
            load_state: LoadState::Idle,
            generation: 0,
            category_generation: 0,
            in_flight: 0,
            unconfirmed_follows: Vec::new(),
            error_message: None,
            last_error: None,
            category_error: None,
            draft: MentorDraft::default(),
            create_open: false,
        }
    }

    /// Initial fetch of mentors and categories. No-op unless `Idle`.
    pub fn mount(&mut self) {
        if !self.load_state.can_mount() {
            return;
        }
        self.fetch_mentors();
        self.fetch_categories();
    }

    /// Re-enter `Loading` after a failed fetch.
    pub fn retry(&mut self) {
        if !self.load_state.can_retry() {
            tracing::debug!("MentorDirectory: retry ignored in {:?}", self.load_state);
            return;
        }
        self.refresh();
    }

    /// Refetch mentors and categories regardless of state.
    pub fn refresh(&mut self) {
        self.fetch_mentors();
        self.fetch_categories();
    }

    fn fetch_mentors(&mut self) {
        self.generation += 1;
        self.load_state = self.load_state.on_fetch_started();
        self.in_flight += 1;
        tracing::info!("Fetching mentors (#{})", self.generation);
        mentor_service::request_fetch(&self.tx, &self.runtime, self.api.clone(), self.generation);
    }

    fn fetch_categories(&mut self) {
        self.category_generation += 1;
        self.in_flight += 1;
        mentor_service::request_categories(
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

    pub fn set_sort(&mut self, sort: MentorSort) {
        self.query.sort = sort;
        self.on_query_changed();
    }

    /// Advance to the next sort key, as the sort toggle does.
    pub fn cycle_sort(&mut self) -> MentorSort {
        self.set_sort(self.query.sort.next());
        self.query.sort
    }

    /// Filtering is client-side; only a failed view goes back to the network.
    fn on_query_changed(&mut self) {
        if self.load_state.can_retry() {
            self.refresh();
        }
    }

    pub fn query(&self) -> &ViewQuery<MentorSort> {
        &self.query
    }

    /// Rows to render, filtered and sorted by the current query.
    pub fn visible(&self) -> Vec<&Mentor> {
        derive_view(self.mentors.items(), &self.query)
    }

    pub fn mentors(&self) -> &[Mentor] {
        self.mentors.items()
    }

    pub fn get(&self, id: &str) -> Option<&Mentor> {
        self.mentors.get(id)
    }

    /// Categories that apply to mentors.
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Follow a mentor: bump the follower count now, then tell the server.
    pub fn follow(&mut self, mentor_id: &str) -> Result<(), SyncError> {
        let bumped = self.mentors.update(mentor_id, |m| {
            m.total_followers = m.total_followers.saturating_add(1);
        });
        if !bumped {
            return Err(SyncError::UnknownEntity(mentor_id.to_string()));
        }

        tracing::info!("Following mentor {}", mentor_id);
        self.unconfirmed_follows.push((mentor_id.to_string(), None));
        self.in_flight += 1;
        mentor_service::request_follow(
            &self.tx,
            &self.runtime,
            self.api.clone(),
            mentor_id.to_string(),
        );
        Ok(())
    }

    pub fn open_create(&mut self) {
        self.create_open = true;
    }

    /// Close the modal and discard the draft.
    pub fn close_create(&mut self) {
        self.create_open = false;
        self.draft = MentorDraft::default();
    }

    pub fn is_create_open(&self) -> bool {
        self.create_open
    }

    pub fn draft(&self) -> &MentorDraft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut MentorDraft {
        &mut self.draft
    }

    pub fn can_submit(&self) -> bool {
        self.draft.can_submit()
    }

    /// Send the draft. A draft without a profession is rejected locally.
    pub fn submit_create(&mut self) -> Result<(), SyncError> {
        if !self.draft.can_submit() {
            return Err(SyncError::Incomplete);
        }
        let request = self.draft.to_request();
        tracing::info!("Creating mentor profile ({})", request.profession);
        self.in_flight += 1;
        mentor_service::request_create(&self.tx, &self.runtime, self.api.clone(), request);
        Ok(())
    }

    /// Apply every completed request. Returns how many messages were handled.
    pub fn poll_channel(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(msg) = self.rx.try_recv() {
            self.in_flight = self.in_flight.saturating_sub(1);
            self.handle_message(msg);
            handled += 1;
        }
        handled
    }

    fn handle_message(&mut self, msg: MentorServiceMessage) {
        match msg {
            MentorServiceMessage::FetchDone { generation, result } => {
                if generation != self.generation {
                    tracing::debug!("Ignoring stale mentor fetch #{}", generation);
                    return;
                }
                match result {
                    Ok(mentors) => {
                        tracing::info!("Loaded {} mentors", mentors.len());
                        self.mentors.replace_all(mentors);
                        self.unconfirmed_follows
                            .retain(|(_, answered)| !matches!(answered, Some(g) if *g < generation));
                        for (mentor_id, _) in &self.unconfirmed_follows {
                            self.mentors.update(mentor_id, |m| {
                                m.total_followers = m.total_followers.saturating_add(1);
                            });
                        }
                        self.load_state = self.load_state.on_fetch_done(true);
                        self.clear_error();
                    }
                    Err(e) => {
                        tracing::error!("Failed to load mentors: {}", e);
                        self.mentors.clear();
                        self.load_state = self.load_state.on_fetch_done(false);
                        self.set_error(e);
                    }
                }
            }
            MentorServiceMessage::CategoriesDone { generation, result } => {
                if generation != self.category_generation {
                    return;
                }
                match result {
                    Ok(categories) => {
                        self.categories = categories
                            .into_iter()
                            .filter(|c| c.kind.applies_to_mentors())
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
            MentorServiceMessage::FollowDone { mentor_id, result } => {
                let entry = self
                    .unconfirmed_follows
                    .iter()
                    .position(|(id, answered)| *id == mentor_id && answered.is_none());
                match result {
                    Ok(updated) => {
                        if let Some(index) = entry {
                            self.unconfirmed_follows[index].1 = Some(self.generation);
                        }
                        if let Some(mentor) = updated {
                            self.mentors.upsert_existing(mentor);
                            let unanswered = self
                                .unconfirmed_follows
                                .iter()
                                .filter(|(id, answered)| *id == mentor_id && answered.is_none())
                                .count() as u64;
                            self.mentors.update(&mentor_id, |m| {
                                m.total_followers = m.total_followers.saturating_add(unanswered);
                            });
                        }
                        self.clear_error();
                    }
                    Err(e) => {
                        if let Some(index) = entry {
                            self.unconfirmed_follows.remove(index);
                        }
                        tracing::error!("Failed to follow mentor {}: {}", mentor_id, e);
                        if self.sync.rollback_on_failure {
                            self.mentors.update(&mentor_id, |m| {
                                m.total_followers = m.total_followers.saturating_sub(1);
                            });
                        }
                        self.set_error(e);
                    }
                }
            }
            MentorServiceMessage::CreateDone(result) => match result {
                Ok(_) => {
                    tracing::info!("Mentor profile created");
                    self.close_create();
                    self.clear_error();
                    self.fetch_mentors();
                }
                Err(e) => {
                    tracing::error!("Failed to create mentor profile: {}", e);
                    self.set_error(e);
                }
            },
        }
    }

    /// No request outstanding and not loading.
    pub fn is_settled(&self) -> bool {
        self.in_flight == 0 && !self.load_state.is_loading()
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

    /// Most recent mentor fetch or mutation failure.
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
