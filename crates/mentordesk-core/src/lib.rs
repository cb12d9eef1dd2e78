pub mod config;
pub mod error;
pub mod load_state;

pub use config::{ApiConfig, Config, SyncConfig, ValidationResult};
pub use error::{AppError, ConfigError, NetworkError};
pub use load_state::LoadState;

use anyhow::Result;

/// Initialize logging for the MentorDesk binaries.
pub fn init() -> Result<()> {
    // Initialize tracing/logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {}", e))?;

    tracing::info!("MentorDesk core initialized");
    Ok(())
}
