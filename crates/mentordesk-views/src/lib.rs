pub mod collection;
pub mod debounce;
pub mod error;
mod error_mapping;
pub mod models;
pub mod query;
pub mod services;

pub use collection::{Entity, EntityCollection};
pub use debounce::ProgressDebouncer;
pub use error::SyncError;
pub use models::mentor_model::{MentorDirectory, MentorDraft};
pub use models::task_model::{deadline_label, TaskBoard, TaskDraft};
pub use query::{derive_view, Listable, MentorSort, TaskSort, ViewQuery, ALL_CATEGORIES};
