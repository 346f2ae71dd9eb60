//! In-memory [`TagApi`] for tests and rehearsals.
//!
//! Resources can be made to appear late (answering "not found" until a given instant)
//! and one-shot failures can be queued, so retry behavior is observable without a
//! real service.

use std::collections::{BTreeSet, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use dashmap::DashMap;
use tagsync_core::{ApiError, Tag, TagOperation, TagSet};
use tokio::time::Instant;

use crate::api::TagApi;

/// Error code returned for resources the store does not know (yet).
pub const RESOURCE_NOT_FOUND: &str = "ResourceNotFoundException";

/// One recorded remote call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagCall {
    pub resource_id: String,
    pub operation: TagOperation,
    /// Keys sent with the call, sorted.
    pub keys: Vec<String>,
    pub succeeded: bool,
}

#[derive(Debug, Clone)]
struct StoredResource {
    tags: TagSet,
    visible_after: Option<Instant>,
}

impl StoredResource {
    fn is_visible(&self, now: Instant) -> bool {
        self.visible_after.is_none_or(|at| now >= at)
    }
}

/// Tag storage keyed by resource id, backed by [`DashMap`].
#[derive(Debug, Default)]
pub struct InMemoryTagApi {
    resources: DashMap<String, StoredResource>,
    failures: DashMap<String, VecDeque<ApiError>>,
    calls: Mutex<Vec<TagCall>>,
}

impl InMemoryTagApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a resource that is visible immediately.
    pub fn insert_resource(&self, resource_id: impl Into<String>, tags: TagSet) {
        self.resources.insert(
            resource_id.into(),
            StoredResource {
                tags,
                visible_after: None,
            },
        );
    }

    /// Registers a resource that answers "not found" until `visible_after`.
    pub fn insert_pending_resource(
        &self,
        resource_id: impl Into<String>,
        tags: TagSet,
        visible_after: Instant,
    ) {
        self.resources.insert(
            resource_id.into(),
            StoredResource {
                tags,
                visible_after: Some(visible_after),
            },
        );
    }

    /// Queues a failure returned by the next call against `resource_id`.
    pub fn fail_next(&self, resource_id: impl Into<String>, error: ApiError) {
        self.failures.entry(resource_id.into()).or_default().push_back(error);
    }

    /// Current tags of a resource, regardless of its visibility.
    pub fn tags(&self, resource_id: &str) -> Option<TagSet> {
        self.resources.get(resource_id).map(|r| r.tags.clone())
    }

    pub fn calls(&self) -> Vec<TagCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn record(&self, resource_id: &str, operation: TagOperation, keys: Vec<String>, succeeded: bool) {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(TagCall {
                resource_id: resource_id.to_string(),
                operation,
                keys,
                succeeded,
            });
    }

    /// Runs `apply` against a visible resource, after any queued failure.
    fn with_resource(
        &self,
        resource_id: &str,
        apply: impl FnOnce(&mut TagSet),
    ) -> Result<(), ApiError> {
        if let Some(error) = self
            .failures
            .get_mut(resource_id)
            .and_then(|mut queue| queue.pop_front())
        {
            return Err(error);
        }

        let now = Instant::now();
        match self.resources.get_mut(resource_id) {
            Some(mut resource) if resource.is_visible(now) => {
                apply(&mut resource.tags);
                Ok(())
            }
            _ => Err(ApiError::new(
                RESOURCE_NOT_FOUND,
                format!("Requested resource not found: {resource_id}"),
            )),
        }
    }
}

#[async_trait]
impl TagApi for InMemoryTagApi {
    async fn create_or_update_tags(&self, resource_id: &str, tags: &TagSet) -> Result<(), ApiError> {
        let result = self.with_resource(resource_id, |current| {
            for (key, value) in tags.iter() {
                if let Ok(tag) = Tag::new(key, value) {
                    current.insert(tag);
                }
            }
        });
        let keys = tags.keys().map(str::to_string).collect();
        self.record(resource_id, TagOperation::Upsert, keys, result.is_ok());
        result
    }

    async fn delete_tags(&self, resource_id: &str, keys: &BTreeSet<String>) -> Result<(), ApiError> {
        let result = self.with_resource(resource_id, |current| {
            for key in keys {
                current.remove(key);
            }
        });
        self.record(
            resource_id,
            TagOperation::Delete,
            keys.iter().cloned().collect(),
            result.is_ok(),
        );
        result
    }
}
