//! Data models for aclstore.
//!
//! - [`Bucket`] / [`BucketKind`] / [`PlainKind`] - logical buckets and their routing variant
//! - [`Values`] - a normalized, ordered sequence of stored scalars
//! - [`PermissionDocument`] - the nested mapping stored for permission buckets

pub mod bucket;
pub mod permission;
pub mod values;

pub use bucket::{Bucket, BucketKind, PERMISSION_MARKER, PlainKind};
pub use permission::PermissionDocument;
pub use values::Values;
