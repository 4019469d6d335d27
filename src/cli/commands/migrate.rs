//! Migration commands: create or drop the bucket tables.
//!
//! By default the DDL is printed for the chosen dialect. With `--execute`
//! it runs against the SQLite database instead.

use crate::cli::commands::StorageOptions;
use crate::cli::{DialectArg, MigrateArgs, MigrateCommands};
use crate::error::{Error, Result};
use crate::storage::BucketRegistry;
use crate::storage::migrations::{
    Dialect, PostgresDialect, QueryInterface, ScriptQueryInterface, SqliteDialect,
    SqliteQueryInterface, down, up,
};
use crate::storage::SqliteBackend;
use serde::Serialize;

#[derive(Serialize)]
struct MigrateOutput<'a> {
    direction: &'a str,
    dialect: &'a str,
    tables: Vec<String>,
    executed: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    statements: Vec<String>,
}

/// Execute migrate commands.
///
/// # Errors
///
/// Returns an error if an override is malformed, or if executing the DDL fails.
pub fn execute(opts: &StorageOptions<'_>, command: &MigrateCommands, json: bool) -> Result<()> {
    match command {
        MigrateCommands::Up(args) => run(opts, args, Direction::Up, json),
        MigrateCommands::Down(args) => run(opts, args, Direction::Down, json),
    }
}

#[derive(Clone, Copy)]
enum Direction {
    Up,
    Down,
}

impl Direction {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
        }
    }
}

fn run(opts: &StorageOptions<'_>, args: &MigrateArgs, direction: Direction, json: bool) -> Result<()> {
    let mut config = opts.load_config()?;
    for pair in &args.overrides {
        config.buckets.apply_override(pair)?;
    }
    config.validate()?;
    let registry = BucketRegistry::configure(&config.table_prefix, &config.buckets);

    let dialect: &dyn Dialect = match args.dialect {
        DialectArg::Sqlite => &SqliteDialect,
        DialectArg::Postgres => &PostgresDialect,
    };

    // Record the plan first; it also names the tables for the report.
    let mut script = ScriptQueryInterface::new();
    apply(&mut script, dialect, &registry, direction)?;

    if args.execute {
        if args.dialect != DialectArg::Sqlite {
            return Err(Error::InvalidArgument(
                "--execute only supports the sqlite dialect".to_string(),
            ));
        }
        let db_path = opts.db_path()?;
        let storage = SqliteBackend::open(&db_path, &config.with_auto_provision(false))?;
        apply(
            &mut SqliteQueryInterface::new(storage.conn()),
            dialect,
            &registry,
            direction,
        )?;
    }

    if json {
        let output = MigrateOutput {
            direction: direction.as_str(),
            dialect: dialect.name(),
            tables: script.tables,
            executed: args.execute,
            statements: if args.execute {
                Vec::new()
            } else {
                script.statements
            },
        };
        println!("{}", serde_json::to_string(&output)?);
    } else if args.execute {
        if !crate::is_silent() {
            println!("migrate {}: {}", direction.as_str(), script.tables.join(", "));
        }
    } else {
        print!("{}", script.script());
    }

    Ok(())
}

fn apply<Q: QueryInterface>(
    query: &mut Q,
    dialect: &dyn Dialect,
    registry: &BucketRegistry,
    direction: Direction,
) -> Result<()> {
    match direction {
        Direction::Up => up(query, dialect, registry),
        Direction::Down => down(query, registry),
    }
}
