//! Shared utilities for market-digest
//!
//! This crate provides common functionality used across the workspace,
//! including logging setup and configuration file loading.

pub mod config;
pub mod logging;
pub mod rotating;

pub use config::{ConfigFileError, load_json};
pub use logging::{LogConfig, LoggingError, LoggingGuard, init_logging};
pub use rotating::RotatingFileWriter;
