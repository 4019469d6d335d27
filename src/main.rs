//! aclstore CLI entry point.

use aclstore::cli::commands::{self, StorageOptions};
use aclstore::cli::{Cli, Commands};
use aclstore::error::Error;
use clap::Parser;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.silent {
        aclstore::SILENT.store(true, std::sync::atomic::Ordering::Relaxed);
    }
    if cli.no_color {
        colored::control::set_override(false);
    }

    // Set up tracing based on verbosity
    init_tracing(cli.verbose, cli.quiet);

    // Resolve effective JSON mode: --json OR non-TTY stdout
    let json = cli.json || !std::io::IsTerminal::is_terminal(&std::io::stdout());

    match run(&cli, json) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if json {
                eprintln!("{}", e.to_structured_json());
            } else if !cli.quiet {
                if let Some(hint) = e.hint() {
                    eprintln!("Error: {e}\n  Hint: {hint}");
                } else {
                    eprintln!("Error: {e}");
                }
            }
            ExitCode::from(e.exit_code())
        }
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    use tracing_subscriber::EnvFilter;

    if quiet {
        return;
    }

    // Honor RUST_LOG if set, otherwise use verbosity flag
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        match verbose {
            0 => EnvFilter::new("warn"),
            1 => EnvFilter::new("info"),
            2 => EnvFilter::new("debug,rusqlite=info"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn run(cli: &Cli, json: bool) -> Result<(), Error> {
    let opts = StorageOptions {
        db: cli.db.as_ref(),
        config: cli.config.as_ref(),
        prefix: cli.prefix.as_deref(),
        verbose: cli.verbose >= 2,
    };

    match &cli.command {
        Commands::Init { force } => commands::init::execute(&opts, *force, json),
        Commands::Version => commands::version::execute(json),

        // Reads
        Commands::Get { bucket, key } => commands::query::get(&opts, bucket, key, json),
        Commands::Union { bucket, keys } => commands::query::union(&opts, bucket, keys, json),

        // Writes
        Commands::Add(args) => commands::write::add(&opts, args, json),
        Commands::Remove(args) => commands::write::remove(&opts, args, json),
        Commands::Del { bucket, keys } => commands::write::del(&opts, bucket, keys, json),
        Commands::Apply { file } => commands::apply::execute(&opts, file.as_deref(), json),

        // Maintenance
        Commands::Clean { yes } => commands::clean::execute(&opts, *yes, json),
        Commands::Migrate { command } => commands::migrate::execute(&opts, command, json),

        // Shell completions
        Commands::Completions { shell } => commands::completions::execute(shell),
    }
}
