use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tagsync_core::{ChangeMode, PROVIDER_NAMESPACE_PATTERN};

use crate::builtin;
use crate::{ConfigError, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub retry: RetrySettings,
    /// Per-service profiles. An entry replaces the built-in profile of the same name.
    #[serde(default)]
    pub services: BTreeMap<String, ServiceProfile>,
}

impl SyncConfig {
    /// Parses a TOML document and validates it.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let cfg: SyncConfig = toml::from_str(content).map_err(|e| ConfigError::parse(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        self.retry.validate()?;
        for (name, profile) in &self.services {
            if name.trim().is_empty() {
                return Err(ConfigError::validation("service names must not be empty"));
            }
            profile
                .validate()
                .map_err(|e| ConfigError::validation(format!("services.{name}: {e}")))?;
        }
        Ok(())
    }

    /// Looks up a profile, preferring configured services over built-in ones.
    pub fn service(&self, name: &str) -> Option<ServiceProfile> {
        self.services
            .get(name)
            .cloned()
            .or_else(|| builtin::profile(name))
    }

    /// Every known service: built-in and configured, merged and sorted.
    pub fn services(&self) -> BTreeMap<String, ServiceProfile> {
        let mut all = builtin::profiles();
        all.extend(self.services.clone());
        all
    }

    /// Retry window for a profile: its own override, or the global default.
    pub fn retry_window(&self, profile: &ServiceProfile) -> Duration {
        profile
            .retry_window_secs
            .map(Duration::from_secs)
            .unwrap_or_else(|| self.retry.window())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    /// How long a call keeps retrying while the resource is not visible yet.
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_window_secs() -> u64 {
    120
}
fn default_initial_delay_ms() -> u64 {
    500
}
fn default_max_delay_ms() -> u64 {
    10_000
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            window_secs: default_window_secs(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl RetrySettings {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    fn validate(&self) -> Result<()> {
        if self.initial_delay_ms == 0 {
            return Err(ConfigError::validation("retry.initial_delay_ms must be > 0"));
        }
        if self.initial_delay_ms > self.max_delay_ms {
            return Err(ConfigError::validation(
                "retry.initial_delay_ms must be <= retry.max_delay_ms",
            ));
        }
        Ok(())
    }
}

/// How tags are handled for one remote service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceProfile {
    /// Regular expressions matching reserved keys.
    #[serde(default = "default_reserved_patterns")]
    pub reserved_patterns: Vec<String>,
    /// Keys reserved by exact name.
    #[serde(default)]
    pub reserved_names: Vec<String>,
    /// Substrings of remote error codes meaning "resource not visible yet".
    #[serde(default)]
    pub not_found_codes: Vec<String>,
    #[serde(default)]
    pub change_mode: ChangeMode,
    /// Overrides `retry.window_secs`; `0` disables retries.
    #[serde(default)]
    pub retry_window_secs: Option<u64>,
}

fn default_reserved_patterns() -> Vec<String> {
    vec![PROVIDER_NAMESPACE_PATTERN.to_string()]
}

impl Default for ServiceProfile {
    fn default() -> Self {
        Self {
            reserved_patterns: default_reserved_patterns(),
            reserved_names: Vec::new(),
            not_found_codes: Vec::new(),
            change_mode: ChangeMode::default(),
            retry_window_secs: None,
        }
    }
}

impl ServiceProfile {
    pub fn with_reserved_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reserved_patterns = patterns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_reserved_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reserved_names = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_not_found_codes<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.not_found_codes = codes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_change_mode(mut self, mode: ChangeMode) -> Self {
        self.change_mode = mode;
        self
    }

    pub fn with_retry_window_secs(mut self, secs: u64) -> Self {
        self.retry_window_secs = Some(secs);
        self
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if self.reserved_patterns.iter().any(|p| p.is_empty()) {
            return Err("reserved_patterns must not contain empty patterns".into());
        }
        if self.reserved_names.iter().any(|n| n.is_empty()) {
            return Err("reserved_names must not contain empty names".into());
        }
        if self.not_found_codes.iter().any(|c| c.is_empty()) {
            return Err("not_found_codes must not contain empty codes".into());
        }
        Ok(())
    }
}
