pub mod plan;
pub mod rehearse;
pub mod services;

use anyhow::{Context, Result};
use tagsync_config::SyncConfig;
use tagsync_engine::ServiceBinding;

/// Resolves a service name to a binding, preferring configured profiles.
pub(crate) fn binding_for(config: &SyncConfig, service: &str) -> Result<ServiceBinding> {
    let profile = config.service(service).with_context(|| {
        format!("Unknown service: {service}. Run `tagsync services` to list known services")
    })?;
    ServiceBinding::from_profile(service, &profile, config)
        .with_context(|| format!("Invalid profile for service {service}"))
}
