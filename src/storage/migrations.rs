//! Table creation and removal for the six bucket tables.
//!
//! [`up`] creates, and [`down`] drops, one table per bucket in the fixed
//! order `meta, parents, permissions, resources, roles, users`, using the
//! table names from a [`BucketRegistry`] (prefix and overrides applied).
//!
//! Both functions are pure with respect to the registry: they only issue
//! calls against a [`QueryInterface`], so the same plan can be executed on
//! SQLite ([`SqliteQueryInterface`]) or rendered as a script for another
//! database ([`ScriptQueryInterface`] with [`PostgresDialect`]).

use crate::error::Result;
use crate::model::BucketKind;
use crate::storage::registry::BucketRegistry;
use crate::storage::schema::{ColumnDef, ColumnType, table_columns};
use rusqlite::Connection;
use tracing::{debug, info};

/// Renders dialect-neutral column types.
pub trait Dialect {
    /// Short dialect name for logs and output.
    fn name(&self) -> &'static str;

    /// SQL type for `ty`.
    fn column_type(&self, ty: ColumnType) -> &'static str;
}

/// SQLite has no array or JSON types: both are stored as JSON text, and
/// timestamps as Unix milliseconds.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDialect;

impl Dialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn column_type(&self, ty: ColumnType) -> &'static str {
        match ty {
            ColumnType::Text | ColumnType::TextArray | ColumnType::Json => "TEXT",
            ColumnType::Date => "INTEGER",
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDialect;

impl Dialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn column_type(&self, ty: ColumnType) -> &'static str {
        match ty {
            ColumnType::Text => "TEXT",
            ColumnType::TextArray => "TEXT[]",
            ColumnType::Json => "JSON",
            ColumnType::Date => "TIMESTAMP WITH TIME ZONE",
        }
    }
}

/// A column with its type already rendered for one dialect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableColumn {
    pub name: &'static str,
    pub sql_type: &'static str,
    pub primary_key: bool,
    pub not_null: bool,
}

impl TableColumn {
    fn render(column: &ColumnDef, dialect: &dyn Dialect) -> Self {
        Self {
            name: column.name,
            sql_type: dialect.column_type(column.ty),
            primary_key: column.primary_key,
            not_null: column.not_null,
        }
    }
}

/// Executor for table creation and removal.
pub trait QueryInterface {
    /// Create `table` with `columns` if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the executor fails.
    fn create_table(&mut self, table: &str, columns: &[TableColumn]) -> Result<()>;

    /// Drop `table` if it exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the executor fails.
    fn drop_table(&mut self, table: &str) -> Result<()>;
}

/// Create every bucket table in provisioning order.
///
/// # Errors
///
/// Returns the first error reported by `query`; later tables are not created.
pub fn up<Q>(query: &mut Q, dialect: &dyn Dialect, registry: &BucketRegistry) -> Result<()>
where
    Q: QueryInterface + ?Sized,
{
    for kind in BucketKind::ALL {
        let table = registry.table(kind);
        let columns: Vec<TableColumn> = table_columns(kind)
            .iter()
            .map(|c| TableColumn::render(c, dialect))
            .collect();

        debug!(bucket = %kind, table, dialect = dialect.name(), "Creating table");
        query.create_table(table, &columns)?;
    }
    Ok(())
}

/// Drop every bucket table, in the same order as [`up`].
///
/// # Errors
///
/// Returns the first error reported by `query`.
pub fn down<Q>(query: &mut Q, registry: &BucketRegistry) -> Result<()>
where
    Q: QueryInterface + ?Sized,
{
    for kind in BucketKind::ALL {
        let table = registry.table(kind);
        debug!(bucket = %kind, table, "Dropping table");
        query.drop_table(table)?;
    }
    Ok(())
}

/// Quote an identifier for SQL.
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// `CREATE TABLE IF NOT EXISTS` statement for `table`.
#[must_use]
pub fn create_table_sql(table: &str, columns: &[TableColumn]) -> String {
    let body: Vec<String> = columns
        .iter()
        .map(|c| {
            let mut def = format!("{} {}", quote_ident(c.name), c.sql_type);
            if c.primary_key {
                def.push_str(" PRIMARY KEY");
            } else if c.not_null {
                def.push_str(" NOT NULL");
            }
            def
        })
        .collect();
    format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        quote_ident(table),
        body.join(", ")
    )
}

/// `DROP TABLE IF EXISTS` statement for `table`.
#[must_use]
pub fn drop_table_sql(table: &str) -> String {
    format!("DROP TABLE IF EXISTS {}", quote_ident(table))
}

/// Executes table DDL on a SQLite connection.
pub struct SqliteQueryInterface<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteQueryInterface<'a> {
    #[must_use]
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl QueryInterface for SqliteQueryInterface<'_> {
    fn create_table(&mut self, table: &str, columns: &[TableColumn]) -> Result<()> {
        self.conn.execute(&create_table_sql(table, columns), [])?;
        info!(table, "Table ready");
        Ok(())
    }

    fn drop_table(&mut self, table: &str) -> Result<()> {
        self.conn.execute(&drop_table_sql(table), [])?;
        info!(table, "Table dropped");
        Ok(())
    }
}

/// Records table DDL as SQL statements instead of executing it.
#[derive(Debug, Default)]
pub struct ScriptQueryInterface {
    pub statements: Vec<String>,
    /// Table names in the order they were created or dropped.
    pub tables: Vec<String>,
}

impl ScriptQueryInterface {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The statements as one script, each terminated by `;`.
    #[must_use]
    pub fn script(&self) -> String {
        self.statements
            .iter()
            .map(|s| format!("{s};\n"))
            .collect()
    }
}

impl QueryInterface for ScriptQueryInterface {
    fn create_table(&mut self, table: &str, columns: &[TableColumn]) -> Result<()> {
        self.statements.push(create_table_sql(table, columns));
        self.tables.push(table.to_string());
        Ok(())
    }

    fn drop_table(&mut self, table: &str) -> Result<()> {
        self.statements.push(drop_table_sql(table));
        self.tables.push(table.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AdapterConfig, BucketNames};

    fn registry(config: &AdapterConfig) -> BucketRegistry {
        BucketRegistry::configure(&config.table_prefix, &config.buckets)
    }

    #[test]
    fn test_up_emits_fixed_order() {
        let mut script = ScriptQueryInterface::new();
        up(&mut script, &SqliteDialect, &registry(&AdapterConfig::default())).unwrap();
        assert_eq!(
            script.tables,
            ["meta", "parents", "permissions", "resources", "roles", "users"]
        );
    }

    #[test]
    fn test_up_honors_override_in_place() {
        let config = AdapterConfig::default()
            .with_buckets(BucketNames::default().with_override(BucketKind::Roles, "roles_x"));
        let mut script = ScriptQueryInterface::new();
        up(&mut script, &SqliteDialect, &registry(&config)).unwrap();
        assert_eq!(
            script.tables,
            ["meta", "parents", "permissions", "resources", "roles_x", "users"]
        );
    }

    #[test]
    fn test_prefix_applies_to_every_table() {
        let config = AdapterConfig::default().with_prefix("acl_");
        let mut script = ScriptQueryInterface::new();
        up(&mut script, &SqliteDialect, &registry(&config)).unwrap();
        assert!(script.tables.iter().all(|t| t.starts_with("acl_")));
        assert_eq!(script.tables[2], "acl_permissions");
    }

    #[test]
    fn test_down_drops_in_same_order() {
        let config = AdapterConfig::default()
            .with_buckets(BucketNames::default().with_override(BucketKind::Roles, "roles_x"));
        let mut script = ScriptQueryInterface::new();
        down(&mut script, &registry(&config)).unwrap();
        assert_eq!(
            script.tables,
            ["meta", "parents", "permissions", "resources", "roles_x", "users"]
        );
        assert!(script.statements[0].starts_with("DROP TABLE IF EXISTS"));
    }

    #[test]
    fn test_postgres_types() {
        let mut script = ScriptQueryInterface::new();
        up(&mut script, &PostgresDialect, &registry(&AdapterConfig::default())).unwrap();
        assert!(script.statements[0].contains("\"value\" TEXT[]"));
        assert!(script.statements[2].contains("\"value\" JSON"));
        assert!(script.statements[2].contains("\"created_at\" TIMESTAMP WITH TIME ZONE NOT NULL"));
    }

    #[test]
    fn test_sqlite_up_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        let registry = registry(&AdapterConfig::default());

        up(&mut SqliteQueryInterface::new(&conn), &SqliteDialect, &registry).unwrap();
        up(&mut SqliteQueryInterface::new(&conn), &SqliteDialect, &registry).unwrap();

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 6);
    }

    #[test]
    fn test_sqlite_down_removes_tables() {
        let conn = Connection::open_in_memory().unwrap();
        let registry = registry(&AdapterConfig::default());

        up(&mut SqliteQueryInterface::new(&conn), &SqliteDialect, &registry).unwrap();
        down(&mut SqliteQueryInterface::new(&conn), &registry).unwrap();

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 0);
    }
}
