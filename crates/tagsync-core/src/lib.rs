//! # tagsync-core
//!
//! The pure half of tag reconciliation.
//!
//! - [`TagSet`]: validated key/value metadata for one resource
//! - [`Plan::diff`]: observed vs. desired tags to upserts and deletes
//! - [`ReservedKeyFilter`]: provider- and service-owned keys that are never read or written
//! - [`TagShape`]: per-service wire records and the filtered translation to/from [`TagSet`]
//!
//! Nothing here performs I/O; applying a plan is the job of `tagsync-engine`.
//!
//! ## Example
//!
//! ```
//! use tagsync_core::{ChangeMode, Plan, ReservedKeyFilter, TagSet};
//!
//! let observed = TagSet::from_pairs([("a", "1"), ("b", "2"), ("c", "3")]).unwrap();
//! let desired = TagSet::from_pairs([("a", "1"), ("b", "9"), ("d", "4")]).unwrap();
//!
//! let filter = ReservedKeyFilter::provider_namespace();
//! let plan = Plan::diff(&filter.retain(&observed), &filter.retain(&desired), ChangeMode::Overwrite);
//!
//! assert_eq!(plan.to_upsert, TagSet::from_pairs([("b", "9"), ("d", "4")]).unwrap());
//! assert!(plan.to_delete.contains("c"));
//! ```

mod error;
pub mod filter;
pub mod plan;
pub mod shape;
mod tag;

pub use error::{ApiError, ErrorCategory, TagOperation, TagSyncError};
pub use filter::{PROVIDER_NAMESPACE_PATTERN, ReservedKeyFilter};
pub use plan::{ChangeMode, Plan, diff};
pub use shape::{KeyValueTag, KmsTag, TagShape, tags_from_wire, tags_to_wire};
pub use tag::{Tag, TagSet};

/// Type alias for a tag sync result.
pub type TagSyncResult<T> = Result<T, TagSyncError>;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::{ApiError, ErrorCategory, TagOperation, TagSyncError};
    pub use crate::filter::ReservedKeyFilter;
    pub use crate::plan::{ChangeMode, Plan};
    pub use crate::shape::{KeyValueTag, KmsTag, TagShape};
    pub use crate::tag::{Tag, TagSet};
    pub use crate::TagSyncResult;
}
