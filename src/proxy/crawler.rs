//! Proxy crawler module for fetching proxy sources
//!
//! Each [`ProxySource`] is fetched with a bounded timeout and a browser-like
//! set of headers, then turned into candidates with the strategy the source
//! declares. A failing source never aborts the crawl; it is reported as a
//! failed [`CrawlResult`] with no proxies.

use crate::error::SourceError;
use crate::proxy::models::{ProxyAddress, ProxySource, SourceStrategy};
use crate::proxy::parser::{parse_line_list, AddressParser};
use futures::future::join_all;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::Client;
use std::time::Duration;
use tracing::{info, warn};

/// Default timeout for source fetches in seconds
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 15;

/// Default user agent for HTTP requests
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0 Safari/537.36";

const DEFAULT_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,text/plain;q=0.8,*/*;q=0.7";
const DEFAULT_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.8";

/// Result of crawling a single source
#[derive(Debug, Clone)]
pub struct CrawlResult {
    /// The source that was crawled
    pub source: String,
    /// Proxies extracted from the source
    pub proxies: Vec<ProxyAddress>,
    /// Error message if crawling failed
    pub error: Option<String>,
}

impl CrawlResult {
    /// Create a successful crawl result
    pub fn success(source: String, proxies: Vec<ProxyAddress>) -> Self {
        Self {
            source,
            proxies,
            error: None,
        }
    }

    /// Create a failed crawl result
    pub fn failure(source: String, error: String) -> Self {
        Self {
            source,
            proxies: Vec::new(),
            error: Some(error),
        }
    }

    /// Check if the crawl was successful
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Configuration for proxy crawler
#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    /// Timeout for one source fetch, body included
    pub timeout: Duration,
    /// User agent for HTTP requests
    pub user_agent: String,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl CrawlerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = user_agent;
        self
    }
}

/// Proxy crawler for fetching candidates from listing sources
pub struct ProxyCrawler {
    config: CrawlerConfig,
    client: Client,
    parser: AddressParser,
}

impl ProxyCrawler {
    /// Create a new proxy crawler with default configuration
    pub fn new() -> Result<Self, SourceError> {
        Self::with_config(CrawlerConfig::default())
    }

    /// Create a new proxy crawler with custom configuration
    pub fn with_config(config: CrawlerConfig) -> Result<Self, SourceError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(DEFAULT_ACCEPT));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(DEFAULT_ACCEPT_LANGUAGE));

        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .default_headers(headers)
            .build()
            .map_err(SourceError::Client)?;

        Ok(Self {
            config,
            client,
            parser: AddressParser::new(),
        })
    }

    pub fn config(&self) -> &CrawlerConfig {
        &self.config
    }

    /// Fetch the raw body of a source URL. Non-2xx answers are errors.
    pub async fn fetch(&self, url: &str) -> Result<String, SourceError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SourceError::from_request(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                url: url.to_string(),
                status,
            });
        }

        response.text().await.map_err(|e| {
            if e.is_timeout() {
                SourceError::Timeout {
                    url: url.to_string(),
                }
            } else {
                SourceError::Body {
                    url: url.to_string(),
                    source: e,
                }
            }
        })
    }

    /// Turn a fetched body into candidates according to the strategy
    pub fn extract(&self, body: &str, strategy: SourceStrategy) -> Vec<ProxyAddress> {
        match strategy {
            SourceStrategy::HtmlScrape => self.parser.parse(body),
            SourceStrategy::LineList => parse_line_list(body),
        }
    }

    /// Fetch and parse proxies from a ProxySource
    pub async fn crawl_source(&self, source: &ProxySource) -> Result<Vec<ProxyAddress>, SourceError> {
        let body = self.fetch(&source.url).await?;
        Ok(self.extract(&body, source.strategy))
    }

    /// Fetch all sources concurrently, returning one result per source in input order
    pub async fn crawl_sources_with_results(&self, sources: &[ProxySource]) -> Vec<CrawlResult> {
        let crawls = sources.iter().map(|source| async move {
            match self.crawl_source(source).await {
                Ok(proxies) => {
                    info!(
                        source = %source.name,
                        strategy = %source.strategy,
                        count = proxies.len(),
                        "crawled source"
                    );
                    CrawlResult::success(source.name.clone(), proxies)
                }
                Err(e) => {
                    warn!(source = %source.name, error = %e, "failed to crawl source");
                    CrawlResult::failure(source.name.clone(), e.to_string())
                }
            }
        });

        join_all(crawls).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn strings(addrs: &[ProxyAddress]) -> Vec<&str> {
        addrs.iter().map(|a| a.as_str()).collect()
    }

    #[test]
    fn test_crawler_config_default() {
        let config = CrawlerConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS));
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
    }

    #[test]
    fn test_crawler_config_builder() {
        let config = CrawlerConfig::new()
            .with_timeout(Duration::from_secs(60))
            .with_user_agent("Custom Agent".to_string());

        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.user_agent, "Custom Agent");
    }

    #[test]
    fn test_crawl_result_failure() {
        let result =
            CrawlResult::failure("test-source".to_string(), "Connection failed".to_string());
        assert!(!result.is_success());
        assert!(result.proxies.is_empty());
        assert_eq!(result.error, Some("Connection failed".to_string()));
    }

    #[test]
    fn test_extract_by_strategy() {
        let crawler = ProxyCrawler::new().unwrap();
        let body = "<html><body><td>1.2.3.4:80</td>\n5.6.7.8:3128\n</body></html>";

        let scraped = crawler.extract(body, SourceStrategy::HtmlScrape);
        assert_eq!(strings(&scraped), vec!["1.2.3.4:80", "5.6.7.8:3128"]);

        // lines are taken as-is, markup and all
        let listed = crawler.extract("1.2.3.4:80\n\nhost.example:8080\n", SourceStrategy::LineList);
        assert_eq!(strings(&listed), vec!["1.2.3.4:80", "host.example:8080"]);
    }

    #[tokio::test]
    async fn test_crawl_html_source_sends_browser_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/list"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "<table><tr><td>10.0.0.1:8080</td></tr><tr><td>10.0.0.2:3128</td></tr></table>",
            ))
            .mount(&server)
            .await;

        let crawler = ProxyCrawler::new().unwrap();
        let source = ProxySource::new("mock", &format!("{}/list", server.uri()), SourceStrategy::HtmlScrape);
        let proxies = crawler.crawl_source(&source).await.unwrap();
        assert_eq!(strings(&proxies), vec!["10.0.0.1:8080", "10.0.0.2:3128"]);

        let requests = server.received_requests().await.unwrap();
        let headers = &requests[0].headers;
        assert_eq!(headers.get("user-agent").unwrap().to_str().unwrap(), DEFAULT_USER_AGENT);
        assert_eq!(
            headers.get("accept-language").unwrap().to_str().unwrap(),
            DEFAULT_ACCEPT_LANGUAGE
        );
    }

    #[tokio::test]
    async fn test_crawl_non_success_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("1.2.3.4:80"))
            .mount(&server)
            .await;

        let crawler = ProxyCrawler::new().unwrap();
        let source = ProxySource::new("down", &server.uri(), SourceStrategy::LineList);
        let err = crawler.crawl_source(&source).await.unwrap_err();
        assert!(matches!(err, SourceError::Status { status, .. } if status.as_u16() == 503));
    }

    #[tokio::test]
    async fn test_crawl_timeout_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("1.2.3.4:80")
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let crawler =
            ProxyCrawler::with_config(CrawlerConfig::new().with_timeout(Duration::from_millis(200)))
                .unwrap();
        let source = ProxySource::new("slow", &server.uri(), SourceStrategy::LineList);
        let err = crawler.crawl_source(&source).await.unwrap_err();
        assert!(matches!(err, SourceError::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_crawl_sources_keeps_order_and_isolates_failures() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/a"))
            .respond_with(ResponseTemplate::new(200).set_body_string("1.1.1.1:80\n"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/b"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let crawler = ProxyCrawler::new().unwrap();
        let sources = vec![
            ProxySource::new("a", &format!("{}/a", server.uri()), SourceStrategy::LineList),
            ProxySource::new("b", &format!("{}/b", server.uri()), SourceStrategy::LineList),
        ];
        let results = crawler.crawl_sources_with_results(&sources).await;

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].source, "a");
        assert!(results[0].is_success());
        assert_eq!(strings(&results[0].proxies), vec!["1.1.1.1:80"]);
        assert_eq!(results[1].source, "b");
        assert!(!results[1].is_success());
        assert!(results[1].proxies.is_empty());
    }
}
