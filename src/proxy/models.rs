//! Proxy data models

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Candidate proxy endpoint in canonical `host:port` form.
///
/// The wrapped string carries no scheme prefix and no whitespace, so two
/// candidates are the same proxy exactly when their strings are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProxyAddress(String);

impl ProxyAddress {
    /// Normalize a raw token into a candidate address.
    ///
    /// Leading/trailing whitespace and any `scheme://` prefix are removed,
    /// and only the first whitespace-separated token is kept. Returns `None`
    /// when nothing `host:port`-like is left.
    pub fn normalize(raw: &str) -> Option<Self> {
        let token = raw.split_whitespace().next()?;
        let token = match token.find("://") {
            Some(idx) => &token[idx + 3..],
            None => token,
        };
        let token = token.trim_end_matches('/');

        let (host, port) = token.rsplit_once(':')?;
        if host.is_empty() || port.is_empty() {
            return None;
        }

        Some(Self(token.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn host(&self) -> &str {
        self.0.rsplit_once(':').map_or(self.0.as_str(), |(host, _)| host)
    }

    /// Port part, if it is a valid non-zero TCP port
    pub fn port(&self) -> Option<u16> {
        let port: u16 = self.0.rsplit_once(':')?.1.parse().ok()?;
        (port != 0).then_some(port)
    }

    /// URL used to hand this candidate to an HTTP client as a forward proxy
    pub fn proxy_url(&self) -> String {
        format!("http://{}", self.0)
    }
}

impl fmt::Display for ProxyAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How the body of a source is turned into candidates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SourceStrategy {
    /// Web page scraped with the address parser
    #[default]
    HtmlScrape,
    /// Plain text, one `host:port` per line
    LineList,
}

impl fmt::Display for SourceStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceStrategy::HtmlScrape => write!(f, "html-scrape"),
            SourceStrategy::LineList => write!(f, "line-list"),
        }
    }
}

impl FromStr for SourceStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "html-scrape" | "html" => Ok(SourceStrategy::HtmlScrape),
            "line-list" | "list" => Ok(SourceStrategy::LineList),
            other => Err(ConfigError::InvalidSource {
                line: other.to_string(),
                reason: "strategy must be html-scrape or line-list".to_string(),
            }),
        }
    }
}

/// Upstream location that lists proxies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxySource {
    /// Name used in logs
    pub name: String,
    /// URL to fetch proxies from
    pub url: String,
    /// Extraction strategy for the fetched body
    pub strategy: SourceStrategy,
}

impl ProxySource {
    pub fn new(name: &str, url: &str, strategy: SourceStrategy) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            strategy,
        }
    }

    /// Source named after the host part of its URL
    pub fn from_url(url: &str, strategy: SourceStrategy) -> Self {
        let name = reqwest::Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_else(|| url.to_string());
        Self {
            name,
            url: url.to_string(),
            strategy,
        }
    }

    /// Parse one `<strategy> <url>` line of a sources file
    pub fn parse_line(line: &str) -> Result<Option<Self>, ConfigError> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }

        let mut parts = line.split_whitespace();
        let (Some(strategy), Some(url), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(ConfigError::InvalidSource {
                line: line.to_string(),
                reason: "expected `<strategy> <url>`".to_string(),
            });
        };

        let strategy = strategy.parse::<SourceStrategy>().map_err(|_| ConfigError::InvalidSource {
            line: line.to_string(),
            reason: "strategy must be html-scrape or line-list".to_string(),
        })?;

        Ok(Some(Self::from_url(url, strategy)))
    }

    /// Built-in list of public proxy listings
    pub fn defaults() -> Vec<ProxySource> {
        vec![
            ProxySource::new(
                "spys.one",
                "https://spys.one/free-proxy-list/IR/",
                SourceStrategy::HtmlScrape,
            ),
            ProxySource::new(
                "free-proxy-list.net",
                "https://free-proxy-list.net/",
                SourceStrategy::HtmlScrape,
            ),
            ProxySource::new(
                "sslproxies",
                "https://www.sslproxies.org/",
                SourceStrategy::HtmlScrape,
            ),
            ProxySource::new("us-proxy.org", "https://www.us-proxy.org/", SourceStrategy::HtmlScrape),
            ProxySource::new(
                "proxyscrape",
                "https://api.proxyscrape.com/v2/?request=getproxies&protocol=http&timeout=10000&country=all&ssl=all&anonymity=all",
                SourceStrategy::LineList,
            ),
        ]
    }
}

/// Outcome of a single check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProxyCheckStatus {
    Working,
    Failed(String),
    Timeout,
}

/// Validation result for one candidate. Latency is present iff the proxy works.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyCheckResult {
    proxy: ProxyAddress,
    status: ProxyCheckStatus,
    latency: Option<Duration>,
}

impl ProxyCheckResult {
    pub fn working(proxy: ProxyAddress, latency: Duration) -> Self {
        Self {
            proxy,
            status: ProxyCheckStatus::Working,
            latency: Some(latency),
        }
    }

    pub fn failed(proxy: ProxyAddress, error: String) -> Self {
        Self {
            proxy,
            status: ProxyCheckStatus::Failed(error),
            latency: None,
        }
    }

    pub fn timeout(proxy: ProxyAddress) -> Self {
        Self {
            proxy,
            status: ProxyCheckStatus::Timeout,
            latency: None,
        }
    }

    pub fn proxy(&self) -> &ProxyAddress {
        &self.proxy
    }

    pub fn status(&self) -> &ProxyCheckStatus {
        &self.status
    }

    pub fn latency(&self) -> Option<Duration> {
        self.latency
    }

    pub fn is_working(&self) -> bool {
        matches!(self.status, ProxyCheckStatus::Working)
    }
}
