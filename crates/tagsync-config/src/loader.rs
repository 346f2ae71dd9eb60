use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use tracing::debug;

use crate::settings::SyncConfig;
use crate::{ConfigError, Result};

/// File read when no explicit path is given.
pub const DEFAULT_CONFIG_FILE: &str = "tagsync.toml";

/// Prefix for environment overrides, e.g. `TAGSYNC__RETRY__WINDOW_SECS=300`.
pub const ENV_PREFIX: &str = "TAGSYNC";

/// Loads configuration from an optional TOML file and the environment.
///
/// A missing file is not an error: defaults and built-in profiles apply.
pub fn load_config(path: Option<&Path>) -> Result<SyncConfig> {
    let mut builder = Config::builder();

    let file = path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    if file.exists() {
        debug!(path = %file.display(), "Loading tagsync configuration file");
        builder = builder.add_source(File::from(file));
    } else if path.is_some() {
        return Err(ConfigError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("config file not found: {}", file.display()),
        )));
    }

    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .try_parsing(true)
            .separator("__"),
    );

    let cfg = builder
        .build()
        .map_err(|e| ConfigError::parse(format!("config build error: {e}")))?;
    let merged: SyncConfig = cfg
        .try_deserialize()
        .map_err(|e| ConfigError::parse(format!("config deserialize error: {e}")))?;

    merged.validate()?;
    Ok(merged)
}
