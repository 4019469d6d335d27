//! The document stored in the shared `permissions` table.
//!
//! One row per permission bucket. Its value maps a secondary key (usually a
//! role) to the permission names granted under it. A secondary key never
//! maps to an empty list: removing its last permission drops the field.

use crate::model::values::{union, union_all, without};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Secondary key to permission names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionDocument(BTreeMap<String, Vec<String>>);

impl PermissionDocument {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Permissions under `key`, empty if the field is absent.
    #[must_use]
    pub fn get(&self, key: &str) -> &[String] {
        self.0.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// De-duplicated union of the permissions under each of `keys`.
    #[must_use]
    pub fn union<S: AsRef<str>>(&self, keys: &[S]) -> Vec<String> {
        union_all(
            keys.iter()
                .flat_map(|key| self.get(key.as_ref()).iter().cloned()),
        )
    }

    /// Merge `values` into the field `key`, new values first.
    ///
    /// Merging nothing into an absent field leaves the field absent.
    pub fn merge(&mut self, key: &str, values: &[String]) {
        let merged = match self.0.get(key) {
            Some(existing) => union(values, existing),
            None => union_all(values.iter().cloned()),
        };
        if !merged.is_empty() {
            self.0.insert(key.to_string(), merged);
        }
    }

    /// Take `values` out of the field `key`, dropping the field once empty.
    pub fn remove_values(&mut self, key: &str, values: &[String]) {
        let remaining = without(self.get(key), values);
        if remaining.is_empty() {
            self.0.remove(key);
        } else {
            self.0.insert(key.to_string(), remaining);
        }
    }

    /// Drop each of `keys` from the document.
    pub fn remove_keys(&mut self, keys: &[String]) {
        for key in keys {
            self.0.remove(key);
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Secondary keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}
