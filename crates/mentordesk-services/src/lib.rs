pub mod api;
pub mod client;
pub mod error;
pub mod types;

pub use api::MentorApi;
pub use client::{coerce_list, ApiClient};
pub use error::TransportError;
pub use types::{
    parse_deadline, Category, CategoryKind, Mentor, MentorCreateRequest, Priority, Progress,
    ProgressUpdateRequest, Task, TaskRequest,
};
