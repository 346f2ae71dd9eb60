//! Tags and tag sets.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TagSyncError;

/// A key/value metadata pair attached to one resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawTag")]
pub struct Tag {
    key: String,
    value: String,
}

#[derive(Deserialize)]
struct RawTag {
    key: String,
    #[serde(default)]
    value: String,
}

impl TryFrom<RawTag> for Tag {
    type Error = TagSyncError;

    fn try_from(raw: RawTag) -> Result<Self, Self::Error> {
        Tag::new(raw.key, raw.value)
    }
}

impl Tag {
    /// Creates a tag. The key must not be empty; the value may be.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Result<Self, TagSyncError> {
        let key = key.into();
        if key.is_empty() {
            return Err(TagSyncError::invalid_tag("tag key must not be empty"));
        }
        Ok(Self {
            key,
            value: value.into(),
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn into_parts(self) -> (String, String) {
        (self.key, self.value)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

/// Mapping from tag key to value for one resource.
///
/// Keys are unique and never empty. Iteration is ordered by key so plans, logs and
/// serialized output are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, String>", into = "BTreeMap<String, String>")]
pub struct TagSet {
    tags: BTreeMap<String, String>,
}

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a tag set from key/value pairs, rejecting empty keys.
    ///
    /// A repeated key keeps the last value.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, TagSyncError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut set = Self::new();
        for (key, value) in pairs {
            set.insert(Tag::new(key, value)?);
        }
        Ok(set)
    }

    /// Inserts a tag, returning the previous value for its key.
    pub fn insert(&mut self, tag: Tag) -> Option<String> {
        let (key, value) = tag.into_parts();
        self.tags.insert(key, value)
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.tags.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.tags.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Iterates `(key, value)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.tags.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.tags.keys().map(String::as_str)
    }

    /// Keeps only the entries for which `keep` returns `true`.
    pub fn retain(&mut self, mut keep: impl FnMut(&str, &str) -> bool) {
        self.tags.retain(|k, v| keep(k, v));
    }
}

impl TryFrom<BTreeMap<String, String>> for TagSet {
    type Error = TagSyncError;

    fn try_from(tags: BTreeMap<String, String>) -> Result<Self, Self::Error> {
        if tags.contains_key("") {
            return Err(TagSyncError::invalid_tag("tag key must not be empty"));
        }
        Ok(Self { tags })
    }
}

impl TryFrom<HashMap<String, String>> for TagSet {
    type Error = TagSyncError;

    fn try_from(tags: HashMap<String, String>) -> Result<Self, Self::Error> {
        Self::from_pairs(tags)
    }
}

impl From<TagSet> for BTreeMap<String, String> {
    fn from(set: TagSet) -> Self {
        set.tags
    }
}

impl FromIterator<Tag> for TagSet {
    fn from_iter<I: IntoIterator<Item = Tag>>(iter: I) -> Self {
        let mut set = Self::new();
        for tag in iter {
            set.insert(tag);
        }
        set
    }
}

impl Extend<Tag> for TagSet {
    fn extend<I: IntoIterator<Item = Tag>>(&mut self, iter: I) {
        for tag in iter {
            self.insert(tag);
        }
    }
}

impl fmt::Display for TagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (k, v)) in self.tags.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{k}={v}")?;
        }
        write!(f, "}}")
    }
}
