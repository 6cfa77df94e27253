//! Market digest CLI
//!
//! Fetches the THS global headline snapshot, asks an LLM for a markdown
//! analysis and publishes it.
//!
//! # Usage
//!
//! ```bash
//! export ANTHROPIC_API_KEY="..."        # or OPENAI_API_KEY / OPENAI_API_BASE
//!
//! market-digest                         # full run (fetch -> report -> publish)
//! market-digest fetch                   # snapshot only
//! market-digest report data/ths_finance/2026-01-05.json
//! market-digest publish reports/ths_finance/2026-01-05.md
//! market-digest --config other.json run
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand};
use digest_pipeline::{
    DigestConfig, Fetcher, Pipeline, Publisher, Reporter, channel_from_config,
};
use digest_utils::init_logging;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "market-digest", version)]
#[command(about = "Daily global market digest: fetch, summarize, publish", long_about = None)]
struct Cli {
    /// Configuration file; defaults apply when it does not exist
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the whole pipeline (default)
    Run,
    /// Fetch and save today's snapshot
    Fetch,
    /// Generate today's report from a snapshot file
    Report {
        /// Snapshot JSON file
        snapshot: PathBuf,
    },
    /// Publish a report file
    Publish {
        /// Report markdown file
        report: PathBuf,
    },
}

fn load_config(path: &Path) -> anyhow::Result<(DigestConfig, bool)> {
    if path.exists() {
        let config = DigestConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
        Ok((config, true))
    } else {
        Ok((DigestConfig::default(), false))
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (config, from_file) = load_config(&cli.config)?;
    let _logging = init_logging(&config.logging).context("Failed to initialize logging")?;

    if from_file {
        info!(config = %cli.config.display(), "Loaded configuration");
    } else {
        warn!(config = %cli.config.display(), "Configuration file not found, using defaults");
    }

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => {
            let pipeline =
                Pipeline::from_config(&config).context("Failed to set up the pipeline")?;
            let summary = pipeline.run().await?;
            println!("{}", summary.report_path.display());
        }
        Command::Fetch => {
            let fetcher = Fetcher::from_config(&config).context("Failed to set up the fetcher")?;
            let path = fetcher.fetch_and_save().await?;
            println!("{}", path.display());
        }
        Command::Report { snapshot } => {
            let reporter =
                Reporter::from_config(&config).context("Failed to set up the reporter")?;
            let path = reporter.generate_report(&snapshot).await?;
            println!("{}", path.display());
        }
        Command::Publish { report } => {
            let channel = channel_from_config(&config.publish)
                .context("Failed to set up the publish channel")?;
            Publisher::new(channel).publish(&report).await?;
        }
    }

    Ok(())
}
