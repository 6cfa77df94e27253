//! Daily global market digest
//!
//! Three sequential steps, each usable on its own:
//!
//! - [`Fetcher`]: pull the global stock headline snapshot from a
//!   [`MarketDataSource`] into `<data_dir>/YYYY-MM-DD.json`
//! - [`Reporter`]: render the prompt template with the snapshot as `data`, ask
//!   a [`LanguageModel`] for an analysis, write `<report_dir>/YYYY-MM-DD.md`
//! - [`Publisher`]: deliver the report through a [`PublishChannel`]
//!
//! [`Pipeline`] chains them and stops at the first failure.
//!
//! # Example
//!
//! ```no_run
//! use digest_pipeline::{DigestConfig, Pipeline};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = DigestConfig::from_file("config.json")?;
//! let pipeline = Pipeline::from_config(&config)?;
//! let summary = pipeline.run().await?;
//! println!("report written to {}", summary.report_path.display());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod fetcher;
pub mod model;
pub mod paths;
pub mod pipeline;
pub mod publisher;
pub mod reporter;
pub mod source;

pub use config::{ChannelKind, DigestConfig, LlmConfig, LlmProviderKind, PublishConfig, SourceConfig};
pub use error::{
    ChannelError, ConfigError, FetchError, PipelineError, PublishError, ReportError, SourceError,
};
pub use fetcher::{Fetcher, SavedSnapshot};
pub use model::{LanguageModel, ProviderModel};
pub use pipeline::{Pipeline, RunSummary, Stage};
pub use publisher::{LogOnlyChannel, PublishChannel, Publisher, WebhookChannel, channel_from_config};
pub use reporter::{DATA_PLACEHOLDER, Reporter};
pub use source::{MarketDataSource, Record, ThsGlobalNewsSource};
