//! Applying tag changes to one resource.

use std::future::Future;
use std::sync::Arc;

use tagsync_core::{ApiError, Plan, TagOperation, TagSet, TagSyncError, TagSyncResult};
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use crate::api::DynTagApi;
use crate::binding::ServiceBinding;
use crate::retry::{RetryError, retry_transient};

/// What a synchronization changed remotely.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncOutcome {
    /// Keys removed from the resource.
    pub deleted: Vec<String>,
    /// Keys created or overwritten on the resource.
    pub upserted: Vec<String>,
    /// Remote calls made, retries included.
    pub attempts: u32,
}

impl SyncOutcome {
    /// Returns `true` when no remote call was needed.
    pub fn is_noop(&self) -> bool {
        self.attempts == 0
    }
}

/// Converges a resource's remote tags from the previously applied desired set to the
/// current one.
///
/// Holds only shared immutable state, so one synchronizer can serve many resources
/// concurrently.
#[derive(Clone)]
pub struct TagSynchronizer {
    binding: Arc<ServiceBinding>,
    api: DynTagApi,
    cancel: Option<watch::Receiver<bool>>,
}

impl TagSynchronizer {
    pub fn new(binding: impl Into<Arc<ServiceBinding>>, api: DynTagApi) -> Self {
        Self {
            binding: binding.into(),
            api,
            cancel: None,
        }
    }

    /// Stops retry loops once `cancel` holds `true`.
    pub fn with_cancellation(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn binding(&self) -> &ServiceBinding {
        &self.binding
    }

    /// The filtered plan `sync` would apply, without calling the remote API.
    pub fn plan(&self, previous: &TagSet, current: &TagSet) -> Plan {
        self.binding.plan(previous, current)
    }

    /// Applies the difference between `previous` and `current` to `resource_id`.
    ///
    /// Deletes are sent before upserts, each as one batched call retried on its own
    /// while the service reports the resource as not found. A failed delete skips the
    /// upsert. Repeating a call after a failure is safe.
    #[instrument(skip_all, fields(service = %self.binding.name, resource_id = %resource_id))]
    pub async fn sync(
        &self,
        resource_id: &str,
        previous: &TagSet,
        current: &TagSet,
    ) -> TagSyncResult<SyncOutcome> {
        let mut outcome = SyncOutcome::default();
        if previous == current {
            debug!("Desired tags unchanged");
            return Ok(outcome);
        }

        let plan = self.plan(previous, current);
        if plan.is_empty() {
            debug!("Only reserved tags changed, nothing to apply");
            return Ok(outcome);
        }
        debug!(%plan, "Applying tag plan");

        let mut cancel = self.cancel.clone();

        if !plan.to_delete.is_empty() {
            let keys = &plan.to_delete;
            outcome.attempts += self
                .call(resource_id, TagOperation::Delete, &mut cancel, || {
                    self.api.delete_tags(resource_id, keys)
                })
                .await?;
            outcome.deleted = keys.iter().cloned().collect();
        }

        if !plan.to_upsert.is_empty() {
            let tags = &plan.to_upsert;
            outcome.attempts += self
                .call(resource_id, TagOperation::Upsert, &mut cancel, || {
                    self.api.create_or_update_tags(resource_id, tags)
                })
                .await?;
            outcome.upserted = tags.keys().map(str::to_string).collect();
        }

        info!(
            deleted = outcome.deleted.len(),
            upserted = outcome.upserted.len(),
            attempts = outcome.attempts,
            "Tags synchronized"
        );
        Ok(outcome)
    }

    async fn call<F, Fut>(
        &self,
        resource_id: &str,
        operation: TagOperation,
        cancel: &mut Option<watch::Receiver<bool>>,
        call: F,
    ) -> TagSyncResult<u32>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<(), ApiError>>,
    {
        let binding = &self.binding;
        retry_transient(&binding.retry, |err| binding.is_transient(err), cancel, call)
            .await
            .map_err(|err| match err {
                RetryError::Permanent(source) => {
                    warn!(%operation, error = %source, "Tag call failed");
                    TagSyncError::api(resource_id, operation, source)
                }
                RetryError::Exhausted {
                    last,
                    attempts,
                    elapsed,
                } => {
                    warn!(
                        %operation,
                        attempts,
                        elapsed_ms = elapsed.as_millis() as u64,
                        error = %last,
                        "Resource still not visible, giving up"
                    );
                    TagSyncError::RetryWindowElapsed {
                        resource_id: resource_id.to_string(),
                        operation,
                        attempts,
                        elapsed,
                        source: last,
                    }
                }
                RetryError::Cancelled => {
                    debug!(%operation, "Tag sync cancelled");
                    TagSyncError::Cancelled {
                        resource_id: resource_id.to_string(),
                        operation,
                    }
                }
            })
    }
}

impl std::fmt::Debug for TagSynchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TagSynchronizer")
            .field("binding", &self.binding)
            .field("cancellable", &self.cancel.is_some())
            .finish()
    }
}
