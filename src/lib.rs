//! Proxy Harvest - public proxy discovery and validation
//!
//! Crawls public proxy listings, merges their candidates into one ordered,
//! de-duplicated list and checks each candidate through a bounded worker
//! pool, reporting the proxies that answered and how fast.

pub mod config;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod proxy;

pub use config::Config;
pub use error::{ConfigError, SourceError};
pub use pipeline::{Pipeline, PipelineOutcome};
pub use proxy::*;

/// Application result type
pub type Result<T> = anyhow::Result<T>;
