//! 10jqka (THS) global stock headline feed

use super::{MarketDataSource, Record};
use crate::error::SourceError;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use reqwest::Client;
use reqwest::header::USER_AGENT;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument};

const THS_GLOBAL_NEWS_URL: &str = "https://news.10jqka.com.cn/tapp/news/push/stock/";
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const SHANGHAI_OFFSET_SECS: i32 = 8 * 3600;
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Items requested per fetch
pub const DEFAULT_PAGE_SIZE: u32 = 400;

#[derive(Debug, Deserialize)]
struct NewsResponse {
    data: NewsData,
}

#[derive(Debug, Deserialize)]
struct NewsData {
    #[serde(default)]
    list: Vec<NewsItem>,
}

#[derive(Debug, Deserialize)]
struct NewsItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    digest: String,
    /// Unix seconds; the feed sends it as a string
    ctime: Value,
    #[serde(default)]
    url: String,
}

/// Headline feed of news.10jqka.com.cn
///
/// Each item becomes a record with the keys `标题` (title), `内容` (digest),
/// `发布时间` (publish time, Asia/Shanghai) and `链接` (url), oldest first.
pub struct ThsGlobalNewsSource {
    client: Client,
    base_url: String,
    page_size: u32,
}

impl ThsGlobalNewsSource {
    /// Create a source requesting `page_size` items with the given request timeout
    pub fn new(page_size: u32, timeout_secs: u64) -> reqwest::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: THS_GLOBAL_NEWS_URL.to_string(),
            page_size,
        })
    }

    /// Point the source at a different endpoint
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn request_url(&self) -> String {
        format!(
            "{}?page=1&tag=&track=website&pagesize={}",
            self.base_url, self.page_size
        )
    }
}

#[async_trait]
impl MarketDataSource for ThsGlobalNewsSource {
    fn name(&self) -> &str {
        "ths"
    }

    #[instrument(skip(self), fields(page_size = self.page_size))]
    async fn fetch_global_market_snapshot(&self) -> Result<Vec<Record>, SourceError> {
        let url = self.request_url();
        debug!(url = %url, "Requesting THS global headlines");

        let response = self
            .client
            .get(&url)
            .header(USER_AGENT, BROWSER_USER_AGENT)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Status { status, body });
        }

        let body = response.text().await?;
        let records = parse_news(&body)?;
        debug!(records = records.len(), "Parsed THS global headlines");
        Ok(records)
    }
}

/// Turn a feed response body into records, oldest first
pub fn parse_news(body: &str) -> Result<Vec<Record>, SourceError> {
    let response: NewsResponse = serde_json::from_str(body)
        .map_err(|e| SourceError::InvalidResponse(format!("unexpected body: {e}")))?;

    let mut items = response
        .data
        .list
        .into_iter()
        .map(|item| {
            let ctime = parse_ctime(&item.ctime).ok_or_else(|| {
                SourceError::InvalidResponse(format!("invalid ctime {}", item.ctime))
            })?;
            Ok((ctime, item))
        })
        .collect::<Result<Vec<_>, SourceError>>()?;

    items.sort_by_key(|(ctime, _)| *ctime);

    items
        .into_iter()
        .map(|(ctime, item)| to_record(ctime, item))
        .collect()
}

fn parse_ctime(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn to_record(ctime: i64, item: NewsItem) -> Result<Record, SourceError> {
    let published = format_shanghai_time(ctime)
        .ok_or_else(|| SourceError::InvalidResponse(format!("ctime {ctime} out of range")))?;

    let mut record = Record::new();
    record.insert("标题".to_string(), Value::String(item.title));
    record.insert("内容".to_string(), Value::String(item.digest));
    record.insert("发布时间".to_string(), Value::String(published));
    record.insert("链接".to_string(), Value::String(item.url));
    Ok(record)
}

fn format_shanghai_time(secs: i64) -> Option<String> {
    let offset = FixedOffset::east_opt(SHANGHAI_OFFSET_SECS)?;
    let time = DateTime::from_timestamp(secs, 0)?.with_timezone(&offset);
    Some(time.format(TIME_FORMAT).to_string())
}
