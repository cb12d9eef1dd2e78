//! Scenario tests for MentorDirectory against the in-memory API.

mod support;

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use mentordesk_core::{AppError, LoadState, NetworkError};
use mentordesk_services::TransportError;
use mentordesk_views::{MentorDirectory, MentorSort, SyncError};
use support::{drive, mentor, sync_config, Call, FakeApi};
use tokio::runtime::Handle;

async fn settle(directory: &mut MentorDirectory) {
    drive(directory, MentorDirectory::poll_channel, MentorDirectory::is_settled).await;
}

async fn mounted(api: Arc<FakeApi>, rollback: bool) -> MentorDirectory {
    let mut directory = MentorDirectory::new(api, Handle::current(), sync_config(rollback));
    directory.mount();
    settle(&mut directory).await;
    directory
}

fn seeded() -> Arc<FakeApi> {
    let mut designer = mentor("m1", "Designer", 4.2, 10);
    designer.bio = "Product design for fintech".into();
    FakeApi::with_mentors(vec![
        designer,
        mentor("m2", "Engineer", 4.9, 3),
        mentor("m3", "Engineer", 3.1, 25),
    ])
}

#[tokio::test(start_paused = true)]
async fn follow_increments_followers() {
    let api = seeded();
    let mut directory = mounted(api.clone(), false).await;

    directory.follow("m1").unwrap();
    assert_eq!(directory.get("m1").unwrap().total_followers, 11);

    settle(&mut directory).await;
    assert_eq!(directory.get("m1").unwrap().total_followers, 11);
    assert_eq!(api.count(|c| *c == Call::Follow("m1".into())), 1);
    assert!(directory.error_message().is_none());
}

#[tokio::test(start_paused = true)]
async fn failed_follow_keeps_optimistic_count_by_default() {
    let api = seeded();
    let mut directory = mounted(api.clone(), false).await;
    api.state.lock().mutation_error = Some(TransportError::Status { status: 500 });

    directory.follow("m1").unwrap();
    settle(&mut directory).await;

    assert_eq!(directory.get("m1").unwrap().total_followers, 11);
    assert_eq!(directory.error_message(), Some("HTTP error: status 500"));
}

#[tokio::test(start_paused = true)]
async fn failed_follow_rolls_back_when_enabled() {
    let api = seeded();
    let mut directory = mounted(api.clone(), true).await;
    api.state.lock().mutation_error = Some(TransportError::Status { status: 500 });

    directory.follow("m1").unwrap();
    settle(&mut directory).await;

    assert_eq!(directory.get("m1").unwrap().total_followers, 10);

    let err = AppError::from(directory.last_error().cloned().unwrap());
    assert!(matches!(
        err,
        AppError::Network(NetworkError::ServerError { status: 500, .. })
    ));
}

#[tokio::test(start_paused = true)]
async fn follow_unknown_mentor_is_rejected() {
    let api = seeded();
    let mut directory = mounted(api.clone(), false).await;

    assert_eq!(
        directory.follow("nobody"),
        Err(SyncError::UnknownEntity("nobody".into()))
    );
    assert_eq!(api.count(|c| matches!(c, Call::Follow(_))), 0);
}

#[tokio::test(start_paused = true)]
async fn filter_and_sort_stay_client_side() {
    let api = seeded();
    let mut directory = mounted(api.clone(), false).await;

    let ids = |d: &MentorDirectory| -> Vec<String> { d.visible().iter().map(|m| m.id.clone()).collect() };

    assert_eq!(ids(&directory), ["m3", "m1", "m2"]);

    directory.set_sort(MentorSort::Rating);
    assert_eq!(ids(&directory), ["m2", "m1", "m3"]);

    directory.set_category_filter("Engineer");
    assert_eq!(ids(&directory), ["m2", "m3"]);

    directory.set_category_filter("all");
    directory.set_search_term("FINTECH");
    assert_eq!(ids(&directory), ["m1"]);

    settle(&mut directory).await;
    assert_eq!(api.count(|c| *c == Call::ListMentors), 1);
}

#[tokio::test(start_paused = true)]
async fn create_profile_refetches() {
    let api = seeded();
    let mut directory = mounted(api.clone(), false).await;

    directory.open_create();
    assert!(!directory.can_submit());
    assert_eq!(directory.submit_create(), Err(SyncError::Incomplete));

    directory.draft_mut().profession = "Data Scientist".into();
    directory.draft_mut().specialization = "Forecasting".into();
    directory.submit_create().unwrap();
    settle(&mut directory).await;

    assert!(!directory.is_create_open());
    assert_eq!(directory.draft().profession, "");
    assert_eq!(directory.mentors().len(), 4);
    assert_eq!(api.count(|c| *c == Call::ListMentors), 2);
}

#[tokio::test(start_paused = true)]
async fn failed_fetch_then_retry() {
    let api = seeded();
    api.state.lock().fetch_error = Some(TransportError::Timeout("30s".into()));

    let mut directory = mounted(api.clone(), false).await;
    assert_eq!(directory.load_state(), LoadState::Failed);
    assert!(directory.mentors().is_empty());
    assert!(directory.categories().is_empty());
    assert!(directory.error_message().is_some());

    api.state.lock().fetch_error = None;
    directory.retry();
    settle(&mut directory).await;

    assert_eq!(directory.load_state(), LoadState::Loaded);
    assert_eq!(directory.mentors().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn refetch_started_before_follow_keeps_the_follow() {
    let api = seeded();
    let mut directory = mounted(api.clone(), false).await;
    api.state.lock().mentor_fetch_delays = VecDeque::from([Duration::from_millis(500)]);

    directory.refresh();
    tokio::time::sleep(Duration::from_millis(100)).await;
    directory.follow("m1").unwrap();

    settle(&mut directory).await;
    assert_eq!(directory.get("m1").unwrap().total_followers, 11);

    // The server count is trusted once a fetch starts after the follow.
    directory.refresh();
    settle(&mut directory).await;
    assert_eq!(directory.get("m1").unwrap().total_followers, 11);
    assert_eq!(api.count(|c| *c == Call::ListMentors), 3);
}

#[tokio::test(start_paused = true)]
async fn category_failure_survives_later_mentor_load() {
    let api = seeded();
    {
        let mut state = api.state.lock();
        state.category_error = Some(TransportError::Network("connection reset".into()));
        state.mentor_fetch_delays = VecDeque::from([Duration::from_millis(100)]);
    }

    let directory = mounted(api.clone(), false).await;

    assert_eq!(directory.load_state(), LoadState::Loaded);
    assert_eq!(directory.mentors().len(), 3);
    assert!(directory.last_error().is_none());
    assert!(directory.category_error().is_some());
    assert!(directory
        .error_message()
        .is_some_and(|m| m.contains("connection reset")));
}
