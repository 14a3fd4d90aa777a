//! favicache command-line entry point.
//!
//! Every command prints JSON on stdout; logs go to stderr.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use favicache_core::AppConfig;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "favicache")]
#[command(version, about = "Resolve and cache website favicons", long_about = None)]
struct Cli {
    /// Provider mode (none, direct, google, duckduckgo, raycast, chain)
    #[arg(short = 'p', long, global = true)]
    provider: Option<String>,

    /// Cache database path
    #[arg(long, value_name = "FILE", global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the addresses that would be tried for a URL
    Candidates { url: String },

    /// Probe candidates until one loads
    Resolve {
        url: String,

        /// Ignore any cached outcome
        #[arg(short, long)]
        force: bool,
    },

    /// Inspect or trim the cache
    #[command(subcommand)]
    Cache(CacheCommand),
}

#[derive(Subcommand)]
enum CacheCommand {
    /// Show one domain's entry, or every entry
    Show { url: Option<String> },

    /// Remove entries
    Purge(commands::PurgeArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = apply_overrides(AppConfig::load()?, &cli);

    let output = match cli.command {
        Command::Candidates { url } => commands::candidates(&config, &url),
        Command::Resolve { url, force } => commands::resolve(&config, &url, force).await?,
        Command::Cache(CacheCommand::Show { url }) => commands::show(&config, url.as_deref())?,
        Command::Cache(CacheCommand::Purge(args)) => commands::purge(&config, &args)?,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn apply_overrides(mut config: AppConfig, cli: &Cli) -> AppConfig {
    if let Some(provider) = &cli.provider {
        config.provider = provider.clone();
    }
    if let Some(db) = &cli.db {
        config.db_path = db.clone();
    }
    config
}
