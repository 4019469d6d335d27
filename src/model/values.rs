//! Value sequences and the set algebra applied to them.
//!
//! Callers may pass a single scalar or a sequence; both normalize to an
//! ordered [`Values`]. Scalars are strings or integers and are stored as
//! text, since the physical `value` column is an array of text.

use crate::error::Error;
use crate::validate::values_from_json;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// An ordered sequence of scalar values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "serde_json::Value", into = "Vec<String>")]
pub struct Values(Vec<String>);

impl Values {
    #[must_use]
    pub fn new(values: Vec<String>) -> Self {
        Self(values)
    }

    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<String> {
        self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }
}

impl<'a> IntoIterator for &'a Values {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl From<Values> for Vec<String> {
    fn from(values: Values) -> Self {
        values.0
    }
}

impl TryFrom<serde_json::Value> for Values {
    type Error = Error;

    fn try_from(value: serde_json::Value) -> Result<Self, Error> {
        values_from_json(&value)
    }
}

// Scalars wrap into a singleton.

impl From<&str> for Values {
    fn from(value: &str) -> Self {
        Self(vec![value.to_string()])
    }
}

impl From<String> for Values {
    fn from(value: String) -> Self {
        Self(vec![value])
    }
}

impl From<&String> for Values {
    fn from(value: &String) -> Self {
        Self(vec![value.clone()])
    }
}

macro_rules! impl_from_integer {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Values {
                fn from(value: $ty) -> Self {
                    Self(vec![value.to_string()])
                }
            }
        )*
    };
}

impl_from_integer!(i32, i64, u32, u64);

// Sequences keep their order.

impl From<Vec<String>> for Values {
    fn from(values: Vec<String>) -> Self {
        Self(values)
    }
}

impl From<Vec<&str>> for Values {
    fn from(values: Vec<&str>) -> Self {
        Self(values.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for Values {
    fn from(values: &[&str]) -> Self {
        Self(values.iter().map(|v| (*v).to_string()).collect())
    }
}

impl From<&[String]> for Values {
    fn from(values: &[String]) -> Self {
        Self(values.to_vec())
    }
}

impl<const N: usize> From<[&str; N]> for Values {
    fn from(values: [&str; N]) -> Self {
        Self(values.iter().map(|v| (*v).to_string()).collect())
    }
}

impl FromIterator<String> for Values {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// De-duplicate a flattened sequence, keeping each value's first occurrence.
pub fn union_all<I>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    values
        .into_iter()
        .filter(|v| seen.insert(v.clone()))
        .collect()
}

/// Set union of `first` and `second`; values from `first` come first.
#[must_use]
pub fn union(first: &[String], second: &[String]) -> Vec<String> {
    union_all(first.iter().chain(second).cloned())
}

/// `existing` with every occurrence of each `removed` value taken out.
#[must_use]
pub fn without(existing: &[String], removed: &[String]) -> Vec<String> {
    existing
        .iter()
        .filter(|v| !removed.contains(v))
        .cloned()
        .collect()
}
