//! Reading and writing tag documents.
//!
//! A document is JSON in one of three shapes: a `{"key": "value"}` object, a list of
//! `{"Key", "Value"}` records, or a list of `{"TagKey", "TagValue"}` records.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use tagsync_core::{KeyValueTag, KmsTag, ReservedKeyFilter, TagSet, tags_from_wire, tags_to_wire};

use crate::cli::WireShape;

#[derive(Deserialize)]
#[serde(untagged)]
enum TagDocument {
    Map(BTreeMap<String, String>),
    KeyValue(Vec<KeyValueTag>),
    Kms(Vec<KmsTag>),
}

/// Parses a tag document. Every key is kept; reserved keys are handled by the binding.
pub fn parse_tags(content: &str) -> Result<TagSet> {
    let document: TagDocument = serde_json::from_str(content).context(
        "Tag document must be a JSON object or a list of Key/Value or TagKey/TagValue records",
    )?;

    let keep_all = ReservedKeyFilter::none();
    let tags = match document {
        TagDocument::Map(map) => TagSet::try_from(map)?,
        TagDocument::KeyValue(records) => tags_from_wire(&records, &keep_all)?,
        TagDocument::Kms(records) => tags_from_wire(&records, &keep_all)?,
    };
    Ok(tags)
}

/// Reads a tag document from `path`; no path means no tags.
pub fn read_tags(path: Option<&Path>) -> Result<TagSet> {
    match path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            parse_tags(&content).with_context(|| format!("Invalid tag document {}", path.display()))
        }
        None => Ok(TagSet::new()),
    }
}

/// Reads a tag document from `path`, or from stdin when no path is given.
pub fn read_tags_or_stdin(path: Option<&Path>) -> Result<TagSet> {
    if path.is_some() {
        return read_tags(path);
    }
    let mut content = String::new();
    std::io::stdin()
        .read_to_string(&mut content)
        .context("Failed to read tag document from stdin")?;
    parse_tags(&content).context("Invalid tag document on stdin")
}

/// Renders tags in the requested wire shape, leaving out reserved keys.
pub fn to_wire_json(tags: &TagSet, shape: WireShape, filter: &ReservedKeyFilter) -> Result<Value> {
    let value = match shape {
        WireShape::Map => serde_json::to_value(filter.retain(tags))?,
        WireShape::KeyValue => serde_json::to_value(tags_to_wire::<KeyValueTag>(tags, filter))?,
        WireShape::Kms => serde_json::to_value(tags_to_wire::<KmsTag>(tags, filter))?,
    };
    Ok(value)
}
