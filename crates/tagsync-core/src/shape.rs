//! Per-service tag record shapes.
//!
//! Services disagree on how a tag looks on the wire. Most use `{"Key", "Value"}`
//! records, KMS uses `{"TagKey", "TagValue"}`, and some accept a bare map. A binding
//! translates between its wire shape and [`TagSet`] through [`TagShape`], and the
//! reserved-key filter is applied in both directions at that boundary.

use serde::{Deserialize, Serialize};

use crate::error::TagSyncError;
use crate::filter::ReservedKeyFilter;
use crate::tag::{Tag, TagSet};

/// A service-specific tag record.
pub trait TagShape: Sized {
    fn key(&self) -> &str;

    fn value(&self) -> &str;

    fn from_key_value(key: String, value: String) -> Self;
}

/// `{"Key": .., "Value": ..}`, used by EC2, ELBv2, ACM, DynamoDB, CloudTrail and most
/// other services.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct KeyValueTag {
    pub key: String,
    #[serde(default)]
    pub value: String,
}

impl TagShape for KeyValueTag {
    fn key(&self) -> &str {
        &self.key
    }

    fn value(&self) -> &str {
        &self.value
    }

    fn from_key_value(key: String, value: String) -> Self {
        Self { key, value }
    }
}

/// `{"TagKey": .., "TagValue": ..}`, used by KMS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct KmsTag {
    pub tag_key: String,
    #[serde(default)]
    pub tag_value: String,
}

impl TagShape for KmsTag {
    fn key(&self) -> &str {
        &self.tag_key
    }

    fn value(&self) -> &str {
        &self.tag_value
    }

    fn from_key_value(key: String, value: String) -> Self {
        Self {
            tag_key: key,
            tag_value: value,
        }
    }
}

/// Reads wire records into a tag set, dropping reserved keys.
pub fn tags_from_wire<S: TagShape>(
    items: &[S],
    filter: &ReservedKeyFilter,
) -> Result<TagSet, TagSyncError> {
    let mut set = TagSet::new();
    for item in items {
        if filter.is_reserved(item.key()) {
            continue;
        }
        set.insert(Tag::new(item.key(), item.value())?);
    }
    Ok(set)
}

/// Writes a tag set as wire records, never emitting reserved keys.
pub fn tags_to_wire<S: TagShape>(tags: &TagSet, filter: &ReservedKeyFilter) -> Vec<S> {
    tags.iter()
        .filter(|(key, _)| !filter.is_reserved(key))
        .map(|(key, value)| S::from_key_value(key.to_string(), value.to_string()))
        .collect()
}
