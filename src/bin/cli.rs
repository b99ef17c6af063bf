//! Local command line for the purchase-order robot.
//!
//! Runs any pipeline stage against S3 or, with `--storage-dir`, against a
//! local directory, which is how stages are exercised during development.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use po_robot::config::Settings;
use po_robot::error::Result;
use po_robot::pipeline::{self, names, Invocation, RegionSplitRule};
use po_robot::storage::{LocalStore, ObjectStore, S3Store};

/// po-robot - purchase-order dispatch pipeline
#[derive(Parser, Debug)]
#[command(name = "po-robot", version, about = "Purchase-order dispatch pipeline")]
struct Cli {
    /// Run against a local directory instead of S3
    #[arg(long)]
    storage_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scrape the portal: MOV data plus the bulk order archive
    Scrape,

    /// Normalize the raw supplier name mapping
    Convert,

    /// Assemble the day's mail bag and discrepancy report
    Assemble,

    /// First mutator pass: supplier-specific file transforms
    MutateOne,

    /// Second mutator pass: region splits from a rules file
    MutateTwo {
        /// JSON file holding an array of region split rules
        #[arg(long)]
        rules: PathBuf,
    },

    /// Send supplier mails and the run summary
    Mail {
        /// Mailing context: test-intern, test-bolt, test-sorin or live
        #[arg(long)]
        context: String,
    },

    /// Archive processed inputs and purge working prefixes
    Cleanup,

    /// Probe the portal backend health endpoint
    Check,
}

impl Command {
    fn into_invocation(self) -> Result<Invocation> {
        let (function, mailing_context, region_splits) = match self {
            Command::Scrape => (names::SCRAPER, None, Vec::new()),
            Command::Convert => (names::CONVERTER, None, Vec::new()),
            Command::Assemble => (names::BAGGER, None, Vec::new()),
            Command::MutateOne => (names::MUTATE_ONE, None, Vec::new()),
            Command::MutateTwo { rules } => {
                let raw = std::fs::read(&rules)?;
                let rules: Vec<RegionSplitRule> = serde_json::from_slice(&raw)?;
                (names::MUTATE_TWO, None, rules)
            }
            Command::Mail { context } => (names::MAILER, Some(context), Vec::new()),
            Command::Cleanup => (names::CLEANER, None, Vec::new()),
            Command::Check => (names::CHECK, None, Vec::new()),
        };
        Ok(Invocation {
            function: function.to_string(),
            mailing_context,
            region_splits,
        })
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let settings = Settings::from_env();
    let store: Box<dyn ObjectStore> = match &cli.storage_dir {
        Some(dir) => Box::new(LocalStore::new(dir)),
        None => Box::new(S3Store::from_env(settings.bucket.clone()).await),
    };

    let invocation = cli.command.into_invocation()?;
    let reply = pipeline::dispatch(store.as_ref(), &settings, &invocation).await;

    println!("{}", serde_json::to_string_pretty(&reply)?);
    if !reply.is_success() {
        std::process::exit(1);
    }
    Ok(())
}
