//! Tag differencing.
//!
//! [`Plan::diff`] compares an observed tag set with a desired one and returns the
//! upserts and deletes that converge the first onto the second. It is a pure
//! function: no I/O, no filtering, no failure modes.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::filter::ReservedKeyFilter;
use crate::tag::{Tag, TagSet};

/// How a key whose value changed is applied remotely.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeMode {
    /// The upsert overwrites the old value; no delete is issued for the key.
    #[default]
    Overwrite,
    /// The remote API needs the old pair removed before the new one is written, so the
    /// key appears in both the delete and the upsert set.
    DeleteBeforeRecreate,
}

impl fmt::Display for ChangeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Overwrite => write!(f, "overwrite"),
            Self::DeleteBeforeRecreate => write!(f, "delete_before_recreate"),
        }
    }
}

/// The tag mutations needed to converge remote state to desired state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub to_upsert: TagSet,
    pub to_delete: BTreeSet<String>,
}

/// Computes a plan in [`ChangeMode::Overwrite`] mode.
pub fn diff(observed: &TagSet, desired: &TagSet) -> Plan {
    Plan::diff(observed, desired, ChangeMode::Overwrite)
}

impl Plan {
    /// Compares `observed` with `desired`.
    ///
    /// - desired keys that are missing or carry another value are upserted;
    /// - observed keys missing from desired are deleted;
    /// - in [`ChangeMode::DeleteBeforeRecreate`], changed keys are deleted as well.
    pub fn diff(observed: &TagSet, desired: &TagSet, mode: ChangeMode) -> Self {
        let mut plan = Self::default();

        for (key, value) in desired.iter() {
            if observed.get(key) != Some(value) {
                // keys from a TagSet are never empty
                if let Ok(tag) = Tag::new(key, value) {
                    plan.to_upsert.insert(tag);
                }
            }
        }

        for (key, old_value) in observed.iter() {
            let remove = match desired.get(key) {
                None => true,
                Some(new_value) => {
                    mode == ChangeMode::DeleteBeforeRecreate && new_value != old_value
                }
            };
            if remove {
                plan.to_delete.insert(key.to_string());
            }
        }

        plan
    }

    /// Returns `true` when nothing needs to be sent to the remote API.
    pub fn is_empty(&self) -> bool {
        self.to_upsert.is_empty() && self.to_delete.is_empty()
    }

    /// Drops reserved keys from both halves of the plan.
    pub fn without_reserved(mut self, filter: &ReservedKeyFilter) -> Self {
        self.to_upsert.retain(|key, _| !filter.is_reserved(key));
        self.to_delete.retain(|key| !filter.is_reserved(key));
        self
    }

    /// Keys touched by the plan, upserts and deletes combined.
    pub fn touched_keys(&self) -> BTreeSet<&str> {
        self.to_upsert
            .keys()
            .chain(self.to_delete.iter().map(String::as_str))
            .collect()
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} upsert(s), {} delete(s)",
            self.to_upsert.len(),
            self.to_delete.len()
        )
    }
}
