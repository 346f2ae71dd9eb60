//! # tagsync-engine
//!
//! Applies tag plans to remote services.
//!
//! A [`TagSynchronizer`] pairs a [`ServiceBinding`] (reserved keys, change mode, retry
//! policy) with a [`TagApi`] implementation and converges one resource's tags from the
//! previously applied desired set to the current one.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use tagsync_core::TagSet;
//! use tagsync_engine::{InMemoryTagApi, ServiceBinding, TagSynchronizer};
//!
//! # tokio_test::block_on(async {
//! let api = Arc::new(InMemoryTagApi::new());
//! api.insert_resource("i-0abc", TagSet::from_pairs([("env", "dev")]).unwrap());
//!
//! let sync = TagSynchronizer::new(ServiceBinding::new("ec2"), api.clone());
//! let previous = TagSet::from_pairs([("env", "dev")]).unwrap();
//! let current = TagSet::from_pairs([("env", "prod")]).unwrap();
//!
//! let outcome = sync.sync("i-0abc", &previous, &current).await.unwrap();
//! assert_eq!(outcome.upserted, vec!["env".to_string()]);
//! assert_eq!(api.tags("i-0abc"), Some(current));
//! # });
//! ```

mod api;
pub mod binding;
pub mod memory;
pub mod retry;
mod sync;

pub use api::{DynTagApi, TagApi};
pub use binding::{NotFoundMatcher, ServiceBinding};
pub use memory::{InMemoryTagApi, TagCall};
pub use retry::RetryPolicy;
pub use sync::{SyncOutcome, TagSynchronizer};
