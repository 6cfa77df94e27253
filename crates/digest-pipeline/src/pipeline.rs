//! FETCH -> REPORT -> PUBLISH orchestration

use crate::config::DigestConfig;
use crate::error::{ConfigError, PipelineError};
use crate::fetcher::Fetcher;
use crate::paths;
use crate::publisher::{Publisher, channel_from_config};
use crate::reporter::Reporter;
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use tracing::{error, info, instrument};

/// Pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Fetch,
    Report,
    Publish,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fetch => "fetch",
            Self::Report => "report",
            Self::Publish => "publish",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a successful run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub date: NaiveDate,
    pub snapshot_path: PathBuf,
    pub report_path: PathBuf,
    /// Number of records in the snapshot
    pub records: usize,
    /// Channel the report went out on
    pub channel: String,
}

/// Runs fetch, report and publish in sequence, stopping at the first failure
///
/// Every run starts from the fetch stage; there is no resumption.
#[derive(Clone)]
pub struct Pipeline {
    fetcher: Fetcher,
    reporter: Reporter,
    publisher: Publisher,
}

impl Pipeline {
    pub fn new(fetcher: Fetcher, reporter: Reporter, publisher: Publisher) -> Self {
        Self {
            fetcher,
            reporter,
            publisher,
        }
    }

    /// Wire the production components described by `config`
    pub fn from_config(config: &DigestConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(
            Fetcher::from_config(config)?,
            Reporter::from_config(config)?,
            Publisher::new(channel_from_config(&config.publish)?),
        ))
    }

    pub fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    pub fn reporter(&self) -> &Reporter {
        &self.reporter
    }

    pub fn publisher(&self) -> &Publisher {
        &self.publisher
    }

    /// Run every stage for today
    pub async fn run(&self) -> Result<RunSummary, PipelineError> {
        self.run_for(paths::today()).await
    }

    /// Run every stage, filing the snapshot and report under `date`
    #[instrument(skip(self))]
    pub async fn run_for(&self, date: NaiveDate) -> Result<RunSummary, PipelineError> {
        info!("Starting market digest run");

        let result = self.run_stages(date).await;
        match &result {
            Ok(summary) => info!(
                snapshot = %summary.snapshot_path.display(),
                report = %summary.report_path.display(),
                records = summary.records,
                channel = %summary.channel,
                "Market digest run completed"
            ),
            Err(e) => error!(stage = %e.stage(), error = %e, "Market digest run failed"),
        }
        result
    }

    async fn run_stages(&self, date: NaiveDate) -> Result<RunSummary, PipelineError> {
        let snapshot = self.fetcher.fetch_snapshot(date).await?;
        let report_path = self
            .reporter
            .generate_report_for(&snapshot.path, date)
            .await?;
        self.publisher.publish_for(&report_path, date).await?;

        Ok(RunSummary {
            date,
            snapshot_path: snapshot.path,
            report_path,
            records: snapshot.records,
            channel: self.publisher.channel_name().to_string(),
        })
    }
}
