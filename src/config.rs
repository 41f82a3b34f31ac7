//! Run configuration
//!
//! A [`Config`] is built once at startup from defaults, the `TARGET_URL`
//! environment variable and command line flags, then handed to the
//! pipeline, which only ever reads it.

use crate::error::ConfigError;
use crate::proxy::checker::{
    CheckerConfig, StatusPolicy, DEFAULT_CONCURRENCY, DEFAULT_TEST_URL, DEFAULT_TIMEOUT_SECS,
};
use crate::proxy::crawler::{CrawlerConfig, DEFAULT_FETCH_TIMEOUT_SECS, DEFAULT_USER_AGENT};
use crate::proxy::models::ProxySource;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Environment variable the CLI reads the check target from
pub const TARGET_URL_ENV: &str = "TARGET_URL";

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Sources in the order their candidates are merged
    pub sources: Vec<ProxySource>,
    /// URL every candidate is checked against
    pub target_url: String,
    /// Hard timeout for one check
    pub check_timeout: Duration,
    /// Timeout for one source fetch
    pub fetch_timeout: Duration,
    /// Checks in flight at once
    pub concurrency: usize,
    /// Which check statuses count as working
    pub status_policy: StatusPolicy,
    /// User agent for source fetches
    pub user_agent: String,
    /// Ignore certificate errors of the target while probing
    pub accept_invalid_certs: bool,
    /// Validate at most this many candidates
    pub max_proxies: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sources: ProxySource::defaults(),
            target_url: DEFAULT_TEST_URL.to_string(),
            check_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            concurrency: DEFAULT_CONCURRENCY,
            status_policy: StatusPolicy::default(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_invalid_certs: true,
            max_proxies: None,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sources(mut self, sources: Vec<ProxySource>) -> Self {
        self.sources = sources;
        self
    }

    pub fn with_target_url(mut self, url: String) -> Self {
        self.target_url = url;
        self
    }

    pub fn with_check_timeout(mut self, timeout: Duration) -> Self {
        self.check_timeout = timeout;
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_status_policy(mut self, policy: StatusPolicy) -> Self {
        self.status_policy = policy;
        self
    }

    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = user_agent;
        self
    }

    pub fn with_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    pub fn with_max_proxies(mut self, max: Option<usize>) -> Self {
        self.max_proxies = max;
        self
    }

    /// Reject configurations the pipeline cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_target()?;
        if self.sources.is_empty() {
            return Err(ConfigError::NoSources);
        }
        Ok(())
    }

    /// Check only what validating a fixed candidate list needs: target and concurrency
    pub fn validate_target(&self) -> Result<(), ConfigError> {
        let target = self.target_url.trim();
        if target.is_empty() {
            return Err(ConfigError::MissingTarget);
        }

        let url = reqwest::Url::parse(target).map_err(|e| ConfigError::InvalidTarget {
            url: target.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidTarget {
                url: target.to_string(),
                reason: format!("unsupported scheme {:?}", url.scheme()),
            });
        }

        if self.concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }

        Ok(())
    }

    pub fn crawler_config(&self) -> CrawlerConfig {
        CrawlerConfig::new()
            .with_timeout(self.fetch_timeout)
            .with_user_agent(self.user_agent.clone())
    }

    pub fn checker_config(&self) -> CheckerConfig {
        CheckerConfig::new()
            .with_timeout(self.check_timeout)
            .with_concurrency(self.concurrency)
            .with_test_url(self.target_url.trim().to_string())
            .with_status_policy(self.status_policy)
            .with_accept_invalid_certs(self.accept_invalid_certs)
    }
}

/// Read a sources file: one `<strategy> <url>` per line, `#` starts a comment
pub fn load_sources_file<P: AsRef<Path>>(path: P) -> crate::Result<Vec<ProxySource>> {
    let content = fs::read_to_string(path)?;
    parse_sources(&content).map_err(Into::into)
}

pub fn parse_sources(content: &str) -> Result<Vec<ProxySource>, ConfigError> {
    let mut sources = Vec::new();
    for line in content.lines() {
        if let Some(source) = ProxySource::parse_line(line)? {
            sources.push(source);
        }
    }
    Ok(sources)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::models::SourceStrategy;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert_eq!(config.target_url, DEFAULT_TEST_URL);
        assert_eq!(config.check_timeout, Duration::from_secs(8));
        assert_eq!(config.fetch_timeout, Duration::from_secs(15));
        assert_eq!(config.status_policy, StatusPolicy::OkOnly);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_target() {
        let config = Config::new().with_target_url("  ".to_string());
        assert_eq!(config.validate(), Err(ConfigError::MissingTarget));

        let config = Config::new().with_target_url("not a url".to_string());
        assert!(matches!(config.validate(), Err(ConfigError::InvalidTarget { .. })));

        let config = Config::new().with_target_url("ftp://example.com/".to_string());
        assert!(matches!(config.validate(), Err(ConfigError::InvalidTarget { .. })));

        let config = Config::new().with_target_url("https://example.com/".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_sources_and_concurrency() {
        let config = Config::new().with_sources(Vec::new());
        assert_eq!(config.validate(), Err(ConfigError::NoSources));

        let config = Config::new().with_concurrency(0);
        assert_eq!(config.validate(), Err(ConfigError::ZeroConcurrency));
    }

    #[test]
    fn test_validate_target_ignores_sources() {
        let config = Config::new().with_sources(Vec::new());
        assert!(config.validate_target().is_ok());

        let config = Config::new().with_sources(Vec::new()).with_concurrency(0);
        assert_eq!(config.validate_target(), Err(ConfigError::ZeroConcurrency));

        let config = Config::new().with_sources(Vec::new()).with_target_url(String::new());
        assert_eq!(config.validate_target(), Err(ConfigError::MissingTarget));
    }

    #[test]
    fn test_derived_component_configs() {
        let config = Config::new()
            .with_target_url(" https://example.com/ ".to_string())
            .with_check_timeout(Duration::from_secs(3))
            .with_fetch_timeout(Duration::from_secs(4))
            .with_concurrency(7)
            .with_status_policy(StatusPolicy::SuccessOrRedirect);

        let checker = config.checker_config();
        assert_eq!(checker.test_url, "https://example.com/");
        assert_eq!(checker.timeout, Duration::from_secs(3));
        assert_eq!(checker.concurrency, 7);
        assert_eq!(checker.status_policy, StatusPolicy::SuccessOrRedirect);

        let crawler = config.crawler_config();
        assert_eq!(crawler.timeout, Duration::from_secs(4));
        assert_eq!(crawler.user_agent, DEFAULT_USER_AGENT);
    }

    #[test]
    fn test_parse_sources() {
        let content = r#"
# plain lists
line-list https://example.com/http.txt

html-scrape https://example.org/free-proxies
"#;
        let sources = parse_sources(content).unwrap();
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].strategy, SourceStrategy::LineList);
        assert_eq!(sources[1].name, "example.org");

        assert!(parse_sources("gopher https://example.com").is_err());
    }
}
