use mentordesk_services::TransportError;

/// Error type for view operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// The request reached the transport layer and failed there.
    Transport(TransportError),
    /// No row with this id in the view's collection.
    UnknownEntity(String),
    /// The draft is missing a required field.
    Incomplete,
}

impl SyncError {
    /// Text for the view's error banner.
    pub fn message(&self) -> String {
        self.to_string()
    }
}

impl std::fmt::Display for SyncError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncError::Transport(e) => write!(f, "{}", e),
            SyncError::UnknownEntity(id) => write!(f, "No item with id {}", id),
            SyncError::Incomplete => write!(f, "Please fill in all required fields"),
        }
    }
}

impl std::error::Error for SyncError {}

impl From<TransportError> for SyncError {
    fn from(e: TransportError) -> Self {
        SyncError::Transport(e)
    }
}
