use super::PublishChannel;
use crate::error::ChannelError;
use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::{debug, info};

/// Channel that records the delivery in the log and sends nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct LogOnlyChannel;

impl LogOnlyChannel {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PublishChannel for LogOnlyChannel {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn deliver(&self, date: NaiveDate, content: &str) -> Result<(), ChannelError> {
        let heading = content.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
        info!(
            %date,
            chars = content.chars().count(),
            heading, "Report delivered to log channel"
        );
        debug!(content, "Delivered report content");
        Ok(())
    }
}
