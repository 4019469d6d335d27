//! Transaction batches.
//!
//! A [`Batch`] is an ordered list of deferred write operations. Appending
//! does not touch storage; the operations run, in append order, when the
//! batch is committed through the backend.
//!
//! A batch is *not* an SQL transaction. Commit stops at the first failing
//! unit and reports it, but units that already ran stay written. Callers
//! that need all-or-nothing must compensate themselves.

use crate::error::{Error, Result};
use crate::model::{Bucket, Values};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One deferred unit of work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum Operation {
    /// Union `values` into the set at `key`.
    Add {
        bucket: Bucket,
        #[serde(deserialize_with = "crate::validate::deserialize_key")]
        key: String,
        values: Values,
    },
    /// Take `values` out of the set at `key`.
    Remove {
        bucket: Bucket,
        #[serde(deserialize_with = "crate::validate::deserialize_key")]
        key: String,
        values: Values,
    },
    /// Delete whole keys.
    Del { bucket: Bucket, keys: Values },
}

impl Operation {
    /// Short name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Add { .. } => "add",
            Self::Remove { .. } => "remove",
            Self::Del { .. } => "del",
        }
    }

    #[must_use]
    pub const fn bucket(&self) -> &Bucket {
        match self {
            Self::Add { bucket, .. } | Self::Remove { bucket, .. } | Self::Del { bucket, .. } => {
                bucket
            }
        }
    }
}

/// Lifecycle of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    /// Accepting operations.
    Open,
    /// Executing operations in order.
    Committing,
    /// Every operation ran.
    Committed,
    /// Operation at index `unit` failed; later operations never ran.
    Failed { unit: usize },
}

impl fmt::Display for BatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => f.write_str("open"),
            Self::Committing => f.write_str("committing"),
            Self::Committed => f.write_str("committed"),
            Self::Failed { unit } => write!(f, "failed at unit {unit}"),
        }
    }
}

/// An ordered list of deferred operations.
#[derive(Debug, Clone)]
pub struct Batch {
    operations: Vec<Operation>,
    state: BatchState,
}

impl Default for Batch {
    fn default() -> Self {
        Self::new()
    }
}

impl Batch {
    #[must_use]
    pub fn new() -> Self {
        Self {
            operations: Vec::new(),
            state: BatchState::Open,
        }
    }

    /// Append an operation.
    ///
    /// # Errors
    ///
    /// Returns `BatchClosed` once the batch has been committed.
    pub fn push(&mut self, operation: Operation) -> Result<()> {
        self.ensure_open()?;
        self.operations.push(operation);
        Ok(())
    }

    #[must_use]
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    #[must_use]
    pub const fn state(&self) -> BatchState {
        self.state
    }

    /// Index of the failed unit, if the commit failed.
    #[must_use]
    pub const fn failed_unit(&self) -> Option<usize> {
        match self.state {
            BatchState::Failed { unit } => Some(unit),
            _ => None,
        }
    }

    pub(crate) fn ensure_open(&self) -> Result<()> {
        if self.state == BatchState::Open {
            Ok(())
        } else {
            Err(Error::BatchClosed {
                state: self.state.to_string(),
            })
        }
    }

    pub(crate) fn set_state(&mut self, state: BatchState) {
        self.state = state;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PlainKind;

    fn add(key: &str) -> Operation {
        Operation::Add {
            bucket: Bucket::from(PlainKind::Users),
            key: key.to_string(),
            values: Values::from("admin"),
        }
    }

    #[test]
    fn test_push_keeps_order() {
        let mut batch = Batch::new();
        batch.push(add("a")).unwrap();
        batch.push(add("b")).unwrap();
        let keys: Vec<&str> = batch
            .operations()
            .iter()
            .map(|op| match op {
                Operation::Add { key, .. } => key.as_str(),
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(keys, ["a", "b"]);
        assert_eq!(batch.state(), BatchState::Open);
    }

    #[test]
    fn test_closed_batch_rejects_push() {
        let mut batch = Batch::new();
        batch.set_state(BatchState::Committed);
        let err = batch.push(add("a")).unwrap_err();
        assert!(matches!(err, Error::BatchClosed { .. }));
        assert!(batch.is_empty());
    }

    #[test]
    fn test_failed_unit() {
        let mut batch = Batch::new();
        assert_eq!(batch.failed_unit(), None);
        batch.set_state(BatchState::Failed { unit: 1 });
        assert_eq!(batch.failed_unit(), Some(1));
        assert_eq!(batch.state().to_string(), "failed at unit 1");
    }

    #[test]
    fn test_operation_from_json() {
        let op: Operation = serde_json::from_str(
            r#"{"op": "add", "bucket": "resources_allows_x", "key": 7, "values": "read"}"#,
        )
        .unwrap();
        assert_eq!(
            op,
            Operation::Add {
                bucket: Bucket::Permission("resources_allows_x".to_string()),
                key: "7".to_string(),
                values: Values::from("read"),
            }
        );

        let op: Operation =
            serde_json::from_str(r#"{"op": "del", "bucket": "users", "keys": ["a", "b"]}"#)
                .unwrap();
        assert_eq!(op.name(), "del");
    }

    #[test]
    fn test_operation_rejects_bad_shapes() {
        assert!(serde_json::from_str::<Operation>(
            r#"{"op": "add", "bucket": "users", "key": true, "values": "x"}"#
        )
        .is_err());
        assert!(serde_json::from_str::<Operation>(
            r#"{"op": "add", "bucket": "widgets", "key": "k", "values": "x"}"#
        )
        .is_err());
        assert!(serde_json::from_str::<Operation>(
            r#"{"op": "add", "bucket": "users", "key": "k", "values": [null]}"#
        )
        .is_err());
    }
}
