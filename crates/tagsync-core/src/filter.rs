//! Reserved tag key filtering.
//!
//! Cloud providers and some services own part of the tag namespace (`aws:*`,
//! `elasticbeanstalk:*`, a literal `Name`, ...). Those keys must never be read into a
//! comparison nor written back. Each service binding carries its own filter.

use std::collections::BTreeSet;

use regex::RegexSet;
use tracing::debug;

use crate::error::TagSyncError;
use crate::tag::TagSet;

/// Regular expression matching the cloud provider's own tag namespace.
pub const PROVIDER_NAMESPACE_PATTERN: &str = "^aws:";

/// Decides which tag keys are reserved.
///
/// Patterns are compiled once into a [`RegexSet`] when the filter is built; literal
/// names are compared exactly.
#[derive(Debug, Clone)]
pub struct ReservedKeyFilter {
    patterns: RegexSet,
    names: BTreeSet<String>,
}

impl ReservedKeyFilter {
    /// Builds a filter from regular-expression patterns and literal reserved names.
    pub fn new<P, N>(patterns: P, names: N) -> Result<Self, TagSyncError>
    where
        P: IntoIterator,
        P::Item: AsRef<str>,
        N: IntoIterator,
        N::Item: Into<String>,
    {
        let patterns: Vec<String> = patterns
            .into_iter()
            .map(|p| p.as_ref().to_string())
            .collect();

        // Compile individually first so the error names the offending pattern.
        for pattern in &patterns {
            if let Err(e) = regex::Regex::new(pattern) {
                return Err(TagSyncError::invalid_pattern(pattern, e.to_string()));
            }
        }
        let set = RegexSet::new(&patterns)
            .map_err(|e| TagSyncError::invalid_pattern(patterns.join(", "), e.to_string()))?;

        Ok(Self {
            patterns: set,
            names: names.into_iter().map(Into::into).collect(),
        })
    }

    /// A filter that reserves nothing.
    pub fn none() -> Self {
        Self {
            patterns: RegexSet::empty(),
            names: BTreeSet::new(),
        }
    }

    /// A filter reserving only the provider namespace (`aws:` prefix).
    pub fn provider_namespace() -> Self {
        Self {
            patterns: RegexSet::new([PROVIDER_NAMESPACE_PATTERN])
                .unwrap_or_else(|_| RegexSet::empty()),
            names: BTreeSet::new(),
        }
    }

    pub fn is_reserved(&self, key: &str) -> bool {
        self.names.contains(key) || self.patterns.is_match(key)
    }

    /// The source patterns, in the order they were given.
    pub fn patterns(&self) -> &[String] {
        self.patterns.patterns()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Returns a copy of `tags` without reserved keys.
    pub fn retain(&self, tags: &TagSet) -> TagSet {
        self.split(tags).0
    }

    /// Splits `tags` into `(kept, reserved)`.
    pub fn split(&self, tags: &TagSet) -> (TagSet, TagSet) {
        let mut kept = tags.clone();
        let mut reserved = TagSet::new();
        kept.retain(|key, value| {
            if self.is_reserved(key) {
                debug!(key, value, "Ignoring reserved tag");
                // key is non-empty because it came from a TagSet
                if let Ok(tag) = crate::tag::Tag::new(key, value) {
                    reserved.insert(tag);
                }
                false
            } else {
                true
            }
        });
        (kept, reserved)
    }
}

impl Default for ReservedKeyFilter {
    fn default() -> Self {
        Self::provider_namespace()
    }
}
