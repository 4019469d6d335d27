//! CLI definitions using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

pub mod commands;

/// aclstore - relational set storage for ACL engines
#[derive(Parser, Debug)]
#[command(name = "aclstore", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Database path (default: ~/.aclstore/data/aclstore.db)
    #[arg(long, global = true, env = "ACLSTORE_DB")]
    pub db: Option<PathBuf>,

    /// Adapter configuration file (JSON)
    #[arg(long, global = true, env = "ACLSTORE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Table name prefix (overrides the configuration file)
    #[arg(long, global = true)]
    pub prefix: Option<String>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Print only the values, one per line
    #[arg(long, global = true)]
    pub silent: bool,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the database and its bucket tables
    Init {
        /// Reinitialize an existing database file
        #[arg(long)]
        force: bool,
    },

    /// Print version information
    Version,

    /// Read the values stored at a key
    Get {
        /// Bucket name (e.g. roles, resources_allows_article)
        bucket: String,
        /// Key to read
        key: String,
    },

    /// Read the union of the values stored at several keys
    Union {
        /// Bucket name
        bucket: String,
        /// Keys to read
        #[arg(required = true)]
        keys: Vec<String>,
    },

    /// Add values to the set at a key
    Add(SetArgs),

    /// Remove values from the set at a key
    Remove(SetArgs),

    /// Delete keys from a bucket
    Del {
        /// Bucket name
        bucket: String,
        /// Keys to delete
        #[arg(required = true)]
        keys: Vec<String>,
    },

    /// Commit a batch of operations read from a JSON file (or stdin)
    Apply {
        /// JSON file with an array of operations; reads stdin when omitted
        file: Option<PathBuf>,
    },

    /// Delete every row from every bucket
    Clean {
        /// Confirm the reset
        #[arg(long)]
        yes: bool,
    },

    /// Create or drop the bucket tables
    Migrate {
        #[command(subcommand)]
        command: MigrateCommands,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Bucket, key and values for `add` / `remove`.
#[derive(Args, Debug)]
pub struct SetArgs {
    /// Bucket name
    pub bucket: String,
    /// Key whose set is changed
    pub key: String,
    /// Values to add or remove
    #[arg(required = true)]
    pub values: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum MigrateCommands {
    /// Create the bucket tables
    Up(MigrateArgs),
    /// Drop the bucket tables
    Down(MigrateArgs),
}

#[derive(Args, Debug)]
pub struct MigrateArgs {
    /// SQL dialect for the printed script
    #[arg(long, value_enum, default_value_t)]
    pub dialect: DialectArg,

    /// Table name override, as bucket=table (repeatable)
    #[arg(long = "override", value_name = "BUCKET=TABLE")]
    pub overrides: Vec<String>,

    /// Run against the database instead of printing SQL (sqlite only)
    #[arg(long)]
    pub execute: bool,
}

/// SQL dialect for migration scripts.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DialectArg {
    #[default]
    Sqlite,
    Postgres,
}

/// Supported shells for completions.
#[derive(clap::ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}
