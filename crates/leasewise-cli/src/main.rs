//! `lease` -- CLI binary for the leasewise VM rightsizing advisor.
//!
//! Provides the following subcommands:
//!
//! - `lease ask` -- Answer a cost question through the advisor pipeline.
//! - `lease report` -- Print the financial summary from the savings ledger.
//! - `lease clear` -- Delete the savings ledger.
//! - `lease status` -- Show configuration and dataset diagnostics.

use clap::{Parser, Subcommand};

mod commands;

/// leasewise VM rightsizing advisor CLI.
#[derive(Parser)]
#[command(name = "lease", about = "VM rightsizing cost advisor", version)]
struct Cli {
    /// Enable verbose (debug-level) logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file path (default: leasewise.toml in the working directory).
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Answer a cost question through the three-stage advisor pipeline.
    Ask {
        /// The question to answer.
        query: String,

        /// Print every stage's output, not just the final answer.
        #[arg(short, long)]
        trace: bool,
    },

    /// Print the financial summary and top opportunities from the ledger.
    Report {
        /// How many top opportunities to list.
        #[arg(short, long, default_value_t = 5)]
        top: usize,
    },

    /// Delete the savings ledger.
    Clear,

    /// Show configuration and dataset diagnostics.
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = commands::load_config(cli.config.as_deref())?;
    match cli.command {
        Commands::Ask { query, trace } => commands::ask(&config, &query, trace).await?,
        Commands::Report { top } => commands::report(&config, top)?,
        Commands::Clear => commands::clear(&config)?,
        Commands::Status => commands::status(&config).await?,
    }
    Ok(())
}
