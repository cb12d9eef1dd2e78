//! Maps view errors to mentordesk_core::AppError for consistent user-facing messages.

mod transport;
