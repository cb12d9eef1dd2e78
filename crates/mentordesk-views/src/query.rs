//! Filter/sort pipeline shared by the mentor and task views.
//!
//! Pure and synchronous: takes a borrowed slice and returns an ordered list
//! of references. The source collection is never touched.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use mentordesk_services::{Mentor, Task};

/// Category filter value that disables category filtering.
pub const ALL_CATEGORIES: &str = "all";

/// Search term + category filter + sort key for one view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewQuery<S> {
    pub search_term: String,
    pub category: String,
    pub sort: S,
}

impl<S: Default> Default for ViewQuery<S> {
    fn default() -> Self {
        Self {
            search_term: String::new(),
            category: ALL_CATEGORIES.to_string(),
            sort: S::default(),
        }
    }
}

/// A record that can flow through the pipeline.
pub trait Listable {
    type Sort: Copy;

    /// Field compared against the category filter.
    fn category_key(&self) -> &str;

    /// Fields searched by the search box.
    fn search_fields(&self) -> Vec<&str>;

    fn compare(a: &Self, b: &Self, sort: Self::Sort) -> Ordering;
}

/// Task sort keys, in the order the sort toggle cycles through them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskSort {
    #[default]
    Deadline,
    Priority,
    Progress,
}

impl TaskSort {
    pub fn next(self) -> Self {
        match self {
            TaskSort::Deadline => TaskSort::Priority,
            TaskSort::Priority => TaskSort::Progress,
            TaskSort::Progress => TaskSort::Deadline,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TaskSort::Deadline => "Deadline",
            TaskSort::Priority => "Priority",
            TaskSort::Progress => "Progress",
        }
    }
}

impl FromStr for TaskSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "deadline" => Ok(TaskSort::Deadline),
            "priority" => Ok(TaskSort::Priority),
            "progress" => Ok(TaskSort::Progress),
            other => Err(format!(
                "unknown task sort '{}' (expected deadline, priority or progress)",
                other
            )),
        }
    }
}

impl fmt::Display for TaskSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Mentor sort keys. `Popular` and `Followers` order identically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MentorSort {
    #[default]
    Popular,
    Rating,
    Followers,
}

impl MentorSort {
    pub fn next(self) -> Self {
        match self {
            MentorSort::Popular => MentorSort::Rating,
            MentorSort::Rating => MentorSort::Followers,
            MentorSort::Followers => MentorSort::Popular,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MentorSort::Popular => "Popular",
            MentorSort::Rating => "Rating",
            MentorSort::Followers => "Followers",
        }
    }
}

impl FromStr for MentorSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "popular" => Ok(MentorSort::Popular),
            "rating" => Ok(MentorSort::Rating),
            "followers" => Ok(MentorSort::Followers),
            other => Err(format!(
                "unknown mentor sort '{}' (expected popular, rating or followers)",
                other
            )),
        }
    }
}

impl fmt::Display for MentorSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Listable for Task {
    type Sort = TaskSort;

    fn category_key(&self) -> &str {
        &self.category
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![&self.title, &self.description]
    }

    fn compare(a: &Self, b: &Self, sort: TaskSort) -> Ordering {
        match sort {
            TaskSort::Priority => b.priority.rank().cmp(&a.priority.rank()),
            TaskSort::Progress => b.progress.cmp(&a.progress),
            // Missing deadlines go last.
            TaskSort::Deadline => match (a.deadline, b.deadline) {
                (Some(a), Some(b)) => a.timestamp_millis().cmp(&b.timestamp_millis()),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
        }
    }
}

impl Listable for Mentor {
    type Sort = MentorSort;

    fn category_key(&self) -> &str {
        &self.profession
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![&self.profession, &self.specialization, &self.bio]
    }

    fn compare(a: &Self, b: &Self, sort: MentorSort) -> Ordering {
        match sort {
            MentorSort::Rating => b.average_rating.total_cmp(&a.average_rating),
            MentorSort::Popular | MentorSort::Followers => b.total_followers.cmp(&a.total_followers),
        }
    }
}

/// Filter by category and search term, then stable-sort by the query's key.
pub fn derive_view<'a, T: Listable>(items: &'a [T], query: &ViewQuery<T::Sort>) -> Vec<&'a T> {
    let needle = query.search_term.to_lowercase();
    let mut rows: Vec<&T> = items
        .iter()
        .filter(|item| matches_category(*item, &query.category))
        .filter(|item| matches_search(*item, &needle))
        .collect();
    rows.sort_by(|a, b| T::compare(a, b, query.sort));
    rows
}

fn matches_category<T: Listable>(item: &T, category: &str) -> bool {
    category == ALL_CATEGORIES || item.category_key() == category
}

/// `needle` must already be lowercase; empty matches everything.
fn matches_search<T: Listable>(item: &T, needle: &str) -> bool {
    needle.is_empty()
        || item
            .search_fields()
            .iter()
            .any(|field| field.to_lowercase().contains(needle))
}
