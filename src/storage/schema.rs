//! Bucket schema definitions.
//!
//! Every bucket table has a text primary key `key` and a `value` column.
//! Plain buckets declare `value` as an array of text; the `permissions`
//! bucket declares it as a JSON document. Two timestamp columns are added
//! when a table is created.
//!
//! Column types are dialect-neutral here; a [`Dialect`] renders them.
//!
//! [`Dialect`]: crate::storage::migrations::Dialect

use crate::model::BucketKind;

/// Dialect-neutral column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    TextArray,
    Json,
    Date,
}

/// One column of a bucket table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: &'static str,
    pub ty: ColumnType,
    pub primary_key: bool,
    pub not_null: bool,
}

impl ColumnDef {
    const fn new(name: &'static str, ty: ColumnType) -> Self {
        Self {
            name,
            ty,
            primary_key: false,
            not_null: false,
        }
    }

    const fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.not_null = true;
        self
    }

    const fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }
}

pub const KEY_COLUMN: &str = "key";
pub const VALUE_COLUMN: &str = "value";
pub const CREATED_AT_COLUMN: &str = "created_at";
pub const UPDATED_AT_COLUMN: &str = "updated_at";

/// The `key` / `value` columns declared for `kind`.
#[must_use]
pub const fn bucket_schema(kind: BucketKind) -> [ColumnDef; 2] {
    let value_type = if kind.is_document() {
        ColumnType::Json
    } else {
        ColumnType::TextArray
    };
    [
        ColumnDef::new(KEY_COLUMN, ColumnType::Text).primary_key(),
        ColumnDef::new(VALUE_COLUMN, value_type),
    ]
}

/// Timestamp columns added to every bucket table (Unix milliseconds in SQLite).
#[must_use]
pub const fn timestamp_columns() -> [ColumnDef; 2] {
    [
        ColumnDef::new(CREATED_AT_COLUMN, ColumnType::Date).not_null(),
        ColumnDef::new(UPDATED_AT_COLUMN, ColumnType::Date).not_null(),
    ]
}

/// Full column list for creating the table of `kind`.
#[must_use]
pub fn table_columns(kind: BucketKind) -> Vec<ColumnDef> {
    bucket_schema(kind)
        .into_iter()
        .chain(timestamp_columns())
        .collect()
}
