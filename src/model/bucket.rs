//! Bucket identifiers.
//!
//! Every operation is addressed by a [`Bucket`]. The routing decision
//! between a plain set bucket and a permission bucket is made once, when
//! the caller turns a bucket identifier into a `Bucket`, and is carried by
//! the variant from then on.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Substring that marks a bucket identifier as a permission bucket.
pub const PERMISSION_MARKER: &str = "allows";

/// The six physical buckets, in their fixed provisioning order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BucketKind {
    Meta,
    Parents,
    Permissions,
    Resources,
    Roles,
    Users,
}

impl BucketKind {
    /// All buckets in provisioning order.
    pub const ALL: [Self; 6] = [
        Self::Meta,
        Self::Parents,
        Self::Permissions,
        Self::Resources,
        Self::Roles,
        Self::Users,
    ];

    /// Canonical lowercase name, also the default table name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Meta => "meta",
            Self::Parents => "parents",
            Self::Permissions => "permissions",
            Self::Resources => "resources",
            Self::Roles => "roles",
            Self::Users => "users",
        }
    }

    /// Look up a bucket by its canonical name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }

    /// Whether rows of this bucket hold a JSON document instead of a value array.
    #[must_use]
    pub const fn is_document(&self) -> bool {
        matches!(self, Self::Permissions)
    }
}

impl fmt::Display for BucketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BucketKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s).ok_or_else(|| Error::InvalidBucket {
            name: s.to_string(),
        })
    }
}

/// The five buckets that hold plain value sets.
///
/// `permissions` has no variant here: its table only holds documents and is
/// reached through a [`Bucket::Permission`] name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PlainKind {
    Meta,
    Parents,
    Resources,
    Roles,
    Users,
}

impl PlainKind {
    pub const ALL: [Self; 5] = [
        Self::Meta,
        Self::Parents,
        Self::Resources,
        Self::Roles,
        Self::Users,
    ];

    /// The physical bucket behind this kind.
    #[must_use]
    pub const fn kind(self) -> BucketKind {
        match self {
            Self::Meta => BucketKind::Meta,
            Self::Parents => BucketKind::Parents,
            Self::Resources => BucketKind::Resources,
            Self::Roles => BucketKind::Roles,
            Self::Users => BucketKind::Users,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        self.kind().as_str()
    }
}

impl TryFrom<BucketKind> for PlainKind {
    type Error = Error;

    fn try_from(kind: BucketKind) -> Result<Self> {
        match kind {
            BucketKind::Meta => Ok(Self::Meta),
            BucketKind::Parents => Ok(Self::Parents),
            BucketKind::Resources => Ok(Self::Resources),
            BucketKind::Roles => Ok(Self::Roles),
            BucketKind::Users => Ok(Self::Users),
            BucketKind::Permissions => Err(Error::InvalidBucket {
                name: kind.as_str().to_string(),
            }),
        }
    }
}

/// A resolved bucket address.
///
/// `Plain` buckets store one row per key in their own table.
/// `Permission` buckets all share the `permissions` table; the bucket name
/// is the row's primary key and the operation key selects a field inside
/// the row's document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Bucket {
    Plain(PlainKind),
    Permission(String),
}

impl From<PlainKind> for Bucket {
    fn from(kind: PlainKind) -> Self {
        Self::Plain(kind)
    }
}

impl Bucket {
    /// Address a plain set bucket.
    ///
    /// # Errors
    ///
    /// Returns `InvalidBucket` for `permissions`, which only holds documents
    /// and is reached through a permission bucket name.
    pub fn plain(kind: BucketKind) -> Result<Self> {
        PlainKind::try_from(kind).map(Self::Plain)
    }

    /// Address a permission bucket by name, e.g. `resources_allows_article`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidBucket` if the name is empty.
    pub fn permission(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::InvalidBucket { name });
        }
        Ok(Self::Permission(name))
    }

    /// Classify a bucket identifier.
    ///
    /// Identifiers containing [`PERMISSION_MARKER`] become permission
    /// buckets; anything else must name one of the plain buckets.
    ///
    /// # Errors
    ///
    /// Returns `InvalidBucket` for unknown or empty identifiers.
    pub fn parse(name: &str) -> Result<Self> {
        if name.contains(PERMISSION_MARKER) {
            return Self::permission(name);
        }
        Self::plain(name.parse()?)
    }

    /// The identifier this bucket was declared with.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Plain(kind) => kind.as_str(),
            Self::Permission(name) => name,
        }
    }

    /// The physical bucket that stores this bucket's rows.
    #[must_use]
    pub const fn kind(&self) -> BucketKind {
        match self {
            Self::Plain(plain) => plain.kind(),
            Self::Permission(_) => BucketKind::Permissions,
        }
    }

    #[must_use]
    pub const fn is_permission(&self) -> bool {
        matches!(self, Self::Permission(_))
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Bucket {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Bucket {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Bucket> for String {
    fn from(bucket: Bucket) -> Self {
        match bucket {
            Bucket::Plain(kind) => kind.as_str().to_string(),
            Bucket::Permission(name) => name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_buckets() {
        for name in ["meta", "parents", "resources", "roles", "users"] {
            let bucket = Bucket::parse(name).unwrap();
            assert!(!bucket.is_permission());
            assert_eq!(bucket.name(), name);
        }
    }

    #[test]
    fn test_parse_permission_bucket() {
        let bucket = Bucket::parse("resources_allows_article").unwrap();
        assert_eq!(bucket, Bucket::Permission("resources_allows_article".to_string()));
        assert_eq!(bucket.kind(), BucketKind::Permissions);
    }

    #[test]
    fn test_marker_anywhere_in_name() {
        assert!(Bucket::parse("allows_x").unwrap().is_permission());
        assert!(Bucket::parse("x_allows").unwrap().is_permission());
    }

    #[test]
    fn test_rejects_unknown_and_direct_permissions() {
        assert!(matches!(
            Bucket::parse("widgets"),
            Err(Error::InvalidBucket { .. })
        ));
        assert!(matches!(
            Bucket::parse("permissions"),
            Err(Error::InvalidBucket { .. })
        ));
        assert!(Bucket::parse("").is_err());
    }

    #[test]
    fn test_plain_kinds_exclude_permissions() {
        assert!(matches!(
            Bucket::plain(BucketKind::Permissions),
            Err(Error::InvalidBucket { .. })
        ));
        let kinds: Vec<BucketKind> = PlainKind::ALL.iter().map(|p| p.kind()).collect();
        assert!(!kinds.contains(&BucketKind::Permissions));
        assert_eq!(kinds.len(), BucketKind::ALL.len() - 1);
        for kind in PlainKind::ALL {
            assert_eq!(Bucket::from(kind).kind(), kind.kind());
            assert!(!Bucket::from(kind).is_permission());
        }
    }

    #[test]
    fn test_provisioning_order() {
        let names: Vec<&str> = BucketKind::ALL.iter().map(BucketKind::as_str).collect();
        assert_eq!(
            names,
            ["meta", "parents", "permissions", "resources", "roles", "users"]
        );
    }

    #[test]
    fn test_serde_as_string() {
        let bucket: Bucket = serde_json::from_str("\"roles\"").unwrap();
        assert_eq!(bucket, Bucket::Plain(PlainKind::Roles));
        assert_eq!(serde_json::to_string(&bucket).unwrap(), "\"roles\"");
        assert!(serde_json::from_str::<Bucket>("\"nope\"").is_err());
    }
}
