pub mod mentor_model;
pub mod task_model;
