//! Proxy module for discovering and checking proxies
//!
//! This module provides functionality for:
//! - Extracting `host:port` candidates from HTML pages and plain-text lists
//! - Crawling listing sources with per-source failure isolation
//! - Merging candidates across sources in first-seen order
//! - Checking proxy validity with a bounded, order-preserving worker pool
//! - Writing the working-proxy report

pub mod aggregator;
pub mod checker;
pub mod crawler;
pub mod models;
pub mod parser;
pub mod report;

pub use aggregator::{Aggregation, ProxyAggregator};
pub use checker::{CheckerConfig, ProxyChecker, StatusPolicy};
pub use crawler::{CrawlResult, CrawlerConfig, ProxyCrawler};
pub use models::{ProxyAddress, ProxyCheckResult, ProxyCheckStatus, ProxySource, SourceStrategy};
pub use parser::{AddressParser, ExtractionStrategy, FlatText, StructuredCell};
pub use report::{WorkingProxy, WorkingProxyReport};
