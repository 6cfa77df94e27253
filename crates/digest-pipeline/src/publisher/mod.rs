//! Report publishing
//!
//! The [`Publisher`] reads a finished report and hands it to a
//! [`PublishChannel`]. Channels are interchangeable; the pipeline never knows
//! which platform sits behind one.

mod log_only;
mod webhook;

pub use log_only::LogOnlyChannel;
pub use webhook::WebhookChannel;

use crate::config::{ChannelKind, PublishConfig};
use crate::error::{ChannelError, ConfigError, PublishError};
use crate::paths;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// Destination a report is delivered to
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PublishChannel: Send + Sync {
    /// Short identifier used in logs and run summaries
    fn name(&self) -> &'static str;

    /// Deliver the content of the report filed under `date`
    async fn deliver(&self, date: NaiveDate, content: &str) -> Result<(), ChannelError>;
}

/// Build the channel selected in `config`
pub fn channel_from_config(config: &PublishConfig) -> Result<Arc<dyn PublishChannel>, ConfigError> {
    match config.channel {
        ChannelKind::Log => Ok(Arc::new(LogOnlyChannel::new())),
        ChannelKind::Webhook => {
            let url = config.webhook_url.as_deref().ok_or_else(|| {
                ConfigError::Invalid("publish.webhook_url is required for the webhook channel".into())
            })?;
            let channel = WebhookChannel::new(url, config.timeout_secs)?.with_title(&config.title);
            Ok(Arc::new(channel))
        }
    }
}

/// Reads reports and delivers them through a channel
#[derive(Clone)]
pub struct Publisher {
    channel: Arc<dyn PublishChannel>,
}

impl Publisher {
    pub fn new(channel: Arc<dyn PublishChannel>) -> Self {
        Self { channel }
    }

    /// Name of the underlying channel
    pub fn channel_name(&self) -> &'static str {
        self.channel.name()
    }

    /// Read `report` and deliver its content
    ///
    /// The report date comes from the `YYYY-MM-DD` file stem, or today when
    /// the name carries no date.
    pub async fn publish(&self, report: &Path) -> Result<(), PublishError> {
        let date = paths::file_date(report).unwrap_or_else(|| {
            let today = paths::today();
            warn!(report = %report.display(), %today, "Report name carries no date, using today");
            today
        });
        self.publish_for(report, date).await
    }

    /// Read `report` and deliver it as the report for `date`
    #[instrument(skip(self), fields(channel = self.channel.name()))]
    pub async fn publish_for(&self, report: &Path, date: NaiveDate) -> Result<(), PublishError> {
        let result = self.try_publish(report, date).await;
        match &result {
            Ok(()) => info!(report = %report.display(), "Published report"),
            Err(e) => error!(operation = "publish", error = %e, "Failed to publish report"),
        }
        result
    }

    async fn try_publish(&self, report: &Path, date: NaiveDate) -> Result<(), PublishError> {
        let content = tokio::fs::read_to_string(report)
            .await
            .map_err(|source| PublishError::Read {
                path: report.to_path_buf(),
                source,
            })?;

        self.channel.deliver(date, &content).await?;
        Ok(())
    }
}
