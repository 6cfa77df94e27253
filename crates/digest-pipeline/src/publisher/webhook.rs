use super::PublishChannel;
use crate::error::ChannelError;
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, instrument};

const DEFAULT_TITLE: &str = "全球市场日报";

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    title: String,
    content: &'a str,
}

/// Channel that POSTs `{"title": ..., "content": ...}` to a URL
///
/// Any non-2xx answer counts as a failed delivery.
pub struct WebhookChannel {
    client: Client,
    url: String,
    title: String,
}

impl WebhookChannel {
    pub fn new(url: impl Into<String>, timeout_secs: u64) -> reqwest::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            client,
            url: url.into(),
            title: DEFAULT_TITLE.to_string(),
        })
    }

    /// Title prefix; the report date is appended
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn payload<'a>(&self, date: NaiveDate, content: &'a str) -> WebhookPayload<'a> {
        WebhookPayload {
            title: format!("{} {}", self.title, date.format("%Y-%m-%d")),
            content,
        }
    }
}

#[async_trait]
impl PublishChannel for WebhookChannel {
    fn name(&self) -> &'static str {
        "webhook"
    }

    #[instrument(skip(self, content), fields(url = %self.url))]
    async fn deliver(&self, date: NaiveDate, content: &str) -> Result<(), ChannelError> {
        let response = self
            .client
            .post(&self.url)
            .json(&self.payload(date, content))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChannelError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        debug!(status = status.as_u16(), "Webhook accepted report");
        Ok(())
    }
}
