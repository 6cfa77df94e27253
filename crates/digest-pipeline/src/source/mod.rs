//! Market data sources

mod ths;

pub use ths::{DEFAULT_PAGE_SIZE, ThsGlobalNewsSource, parse_news};

use crate::error::SourceError;
use async_trait::async_trait;
use serde_json::{Map, Value};

/// One item of a snapshot; keys keep the order the source produced them in
pub type Record = Map<String, Value>;

/// Provider of the global market snapshot
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Short identifier used in logs
    fn name(&self) -> &str;

    /// Fetch the current snapshot
    async fn fetch_global_market_snapshot(&self) -> Result<Vec<Record>, SourceError>;
}
