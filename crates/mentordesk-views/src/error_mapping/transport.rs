use crate::error::SyncError;
use mentordesk_core::{AppError, ConfigError, NetworkError};
use mentordesk_services::TransportError;

impl From<SyncError> for AppError {
    fn from(e: SyncError) -> Self {
        match e {
            SyncError::Transport(t) => match t {
                TransportError::Status { status } => AppError::Network(NetworkError::ServerError {
                    status,
                    message: t.to_string(),
                }),
                TransportError::Timeout(_) => AppError::Network(NetworkError::Timeout),
                TransportError::Network(s) => AppError::Network(NetworkError::ConnectionFailed(s)),
                TransportError::Decode(s) => AppError::Network(NetworkError::InvalidResponse(s)),
                TransportError::InvalidUrl(s) => AppError::Config(ConfigError::Invalid(s)),
            },
            SyncError::UnknownEntity(id) => AppError::Service(format!("No item with id {}", id)),
            SyncError::Incomplete => AppError::Service("Draft is missing required fields".into()),
        }
    }
}
