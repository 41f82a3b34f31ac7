//! Error types shared by the library

use thiserror::Error;

/// Failure to retrieve one upstream proxy source.
///
/// Always recovered by the aggregator: the failing source contributes no
/// candidates and the run continues with the remaining sources.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("request to {url} timed out")]
    Timeout { url: String },
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} answered with HTTP {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("failed to read body from {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl SourceError {
    pub(crate) fn from_request(url: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SourceError::Timeout {
                url: url.to_string(),
            }
        } else if let Some(status) = err.status() {
            SourceError::Status {
                url: url.to_string(),
                status,
            }
        } else {
            SourceError::Transport {
                url: url.to_string(),
                source: err,
            }
        }
    }
}

/// Invalid startup configuration. Fatal before any network I/O happens.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("target URL is empty")]
    MissingTarget,
    #[error("target URL {url:?} is invalid: {reason}")]
    InvalidTarget { url: String, reason: String },
    #[error("no proxy sources configured")]
    NoSources,
    #[error("concurrency must be at least 1")]
    ZeroConcurrency,
    #[error("invalid source definition {line:?}: {reason}")]
    InvalidSource { line: String, reason: String },
}
