pub mod category_service;
pub mod mentor_service;
pub mod task_service;

pub use mentor_service::{
    request_create as request_mentor_create, request_fetch as request_mentor_fetch,
    request_follow, MentorServiceMessage,
};
pub use task_service::{
    persist_progress, request_create as request_task_create,
    request_delete as request_task_delete, request_fetch as request_task_fetch,
    request_update as request_task_update, TaskServiceMessage,
};
