//! Configuration for tagsync.
//!
//! A [`SyncConfig`] holds retry defaults and per-service [`ServiceProfile`]s. Profiles
//! for the services tagsync knows about ship built in (see [`builtin`]); a TOML file
//! and `TAGSYNC__*` environment variables can override any of them.
//!
//! ```toml
//! [retry]
//! window_secs = 120
//! initial_delay_ms = 500
//! max_delay_ms = 10000
//!
//! [services.ec2]
//! reserved_patterns = ["^aws:"]
//! not_found_codes = [".NotFound"]
//! retry_window_secs = 300
//! ```

pub mod builtin;
pub mod loader;
mod settings;

pub use loader::{DEFAULT_CONFIG_FILE, ENV_PREFIX, load_config};
pub use settings::{RetrySettings, ServiceProfile, SyncConfig};

/// Error types for configuration operations
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl ConfigError {
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;
