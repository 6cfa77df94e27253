//! Snapshot fetching

use crate::config::DigestConfig;
use crate::error::{ConfigError, FetchError};
use crate::paths;
use crate::source::{MarketDataSource, ThsGlobalNewsSource};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, instrument};

/// A snapshot written to disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedSnapshot {
    pub path: PathBuf,
    pub records: usize,
}

/// Pulls the market snapshot and stores it as `<data_dir>/YYYY-MM-DD.json`
#[derive(Clone)]
pub struct Fetcher {
    source: Arc<dyn MarketDataSource>,
    data_dir: PathBuf,
}

impl Fetcher {
    pub fn new(source: Arc<dyn MarketDataSource>, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            source,
            data_dir: data_dir.into(),
        }
    }

    /// Fetcher over the THS headline feed, configured from `config`
    pub fn from_config(config: &DigestConfig) -> Result<Self, ConfigError> {
        let source = ThsGlobalNewsSource::new(config.source.page_size, config.source.timeout_secs)?;
        Ok(Self::new(Arc::new(source), &config.data_dir))
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Fetch today's snapshot and return the file it was written to
    ///
    /// Fetching twice on the same day replaces the earlier file.
    pub async fn fetch_and_save(&self) -> Result<PathBuf, FetchError> {
        self.fetch_snapshot(paths::today())
            .await
            .map(|snapshot| snapshot.path)
    }

    /// Fetch the snapshot and file it under `date`
    #[instrument(skip(self), fields(source = self.source.name()))]
    pub async fn fetch_snapshot(&self, date: NaiveDate) -> Result<SavedSnapshot, FetchError> {
        let result = self.try_fetch(date).await;
        match &result {
            Ok(snapshot) => info!(
                path = %snapshot.path.display(),
                records = snapshot.records,
                "Saved market snapshot"
            ),
            Err(e) => error!(operation = "fetch_and_save", error = %e, "Failed to fetch market snapshot"),
        }
        result
    }

    async fn try_fetch(&self, date: NaiveDate) -> Result<SavedSnapshot, FetchError> {
        let records = self.source.fetch_global_market_snapshot().await?;
        let json = serde_json::to_string(&records)?;

        let path = paths::dated_file(&self.data_dir, date, "json");
        paths::write_text(&path, &json)
            .await
            .map_err(|source| FetchError::Io {
                path: path.clone(),
                source,
            })?;

        Ok(SavedSnapshot {
            path,
            records: records.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SourceError;
    use crate::source::Record;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// Source returning the queued batches in order
    struct QueuedSource {
        batches: Mutex<Vec<Result<Vec<Record>, SourceError>>>,
    }

    impl QueuedSource {
        fn new(batches: Vec<Result<Vec<Record>, SourceError>>) -> Arc<Self> {
            Arc::new(Self {
                batches: Mutex::new(batches.into_iter().rev().collect()),
            })
        }
    }

    #[async_trait]
    impl MarketDataSource for QueuedSource {
        fn name(&self) -> &str {
            "queued"
        }

        async fn fetch_global_market_snapshot(&self) -> Result<Vec<Record>, SourceError> {
            self.batches.lock().unwrap().pop().unwrap()
        }
    }

    fn record(value: serde_json::Value) -> Record {
        value.as_object().unwrap().clone()
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 5).unwrap()
    }

    #[tokio::test]
    async fn test_saves_compact_unescaped_json() {
        let dir = tempfile::tempdir().unwrap();
        let source = QueuedSource::new(vec![Ok(vec![record(
            json!({"标题": "美股收涨", "发布时间": "2026-01-05 08:00:00"}),
        )])]);
        let fetcher = Fetcher::new(source, dir.path().join("data"));

        let snapshot = fetcher.fetch_snapshot(date()).await.unwrap();

        assert_eq!(snapshot.path, dir.path().join("data").join("2026-01-05.json"));
        assert_eq!(snapshot.records, 1);
        assert_eq!(
            std::fs::read_to_string(&snapshot.path).unwrap(),
            r#"[{"标题":"美股收涨","发布时间":"2026-01-05 08:00:00"}]"#
        );
    }

    #[tokio::test]
    async fn test_same_day_fetch_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let source = QueuedSource::new(vec![
            Ok(vec![record(json!({"name": "AAA"})), record(json!({"name": "BBB"}))]),
            Ok(vec![record(json!({"name": "CCC"}))]),
        ]);
        let fetcher = Fetcher::new(source, dir.path());

        let first = fetcher.fetch_snapshot(date()).await.unwrap();
        let second = fetcher.fetch_snapshot(date()).await.unwrap();

        assert_eq!(first.path, second.path);
        assert_eq!(
            std::fs::read_to_string(&second.path).unwrap(),
            r#"[{"name":"CCC"}]"#
        );
    }

    #[tokio::test]
    async fn test_empty_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = Fetcher::new(QueuedSource::new(vec![Ok(Vec::new())]), dir.path());

        let path = fetcher.fetch_and_save().await.unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "[]");
    }

    #[tokio::test]
    async fn test_source_failure_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let source = QueuedSource::new(vec![Err(SourceError::Unavailable("timeout".into()))]);
        let fetcher = Fetcher::new(source, dir.path().join("data"));

        let result = fetcher.fetch_snapshot(date()).await;

        assert!(matches!(result, Err(FetchError::Source(_))));
        assert!(!dir.path().join("data").exists());
    }
}
