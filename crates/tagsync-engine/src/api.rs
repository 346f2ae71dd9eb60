use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use tagsync_core::{ApiError, TagSet};

/// Tagging capability of one remote service.
///
/// Implementations own their request/response marshaling (see
/// [`tagsync_core::shape`]) and any call-level timeout. Both operations must be
/// idempotent: writing an existing pair or deleting an absent key succeeds.
#[async_trait]
pub trait TagApi: Send + Sync {
    /// Creates or overwrites the given key/value pairs on a resource.
    async fn create_or_update_tags(&self, resource_id: &str, tags: &TagSet)
        -> Result<(), ApiError>;

    /// Removes the given keys from a resource.
    async fn delete_tags(&self, resource_id: &str, keys: &BTreeSet<String>)
        -> Result<(), ApiError>;
}

/// Type alias for a shared tag API trait object.
pub type DynTagApi = Arc<dyn TagApi>;
