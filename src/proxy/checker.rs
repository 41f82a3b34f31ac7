//! Proxy checker module for checking proxy validity

use crate::proxy::models::{ProxyAddress, ProxyCheckResult};
use futures::stream::{self, StreamExt};
use reqwest::{redirect, Client, Proxy as ReqwestProxy, StatusCode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Default timeout for proxy checks in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 8;

/// Default number of checks in flight
pub const DEFAULT_CONCURRENCY: usize = 32;

/// Default URL to test proxies against.
///
/// An example endpoint only; real runs usually point `TARGET_URL` at the
/// site the proxies are meant for.
pub const DEFAULT_TEST_URL: &str = "http://httpbin.org/ip";

/// Which check responses count as a working proxy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum StatusPolicy {
    /// Only `200 OK`
    #[default]
    OkOnly,
    /// Any 2xx or 3xx status
    SuccessOrRedirect,
}

impl StatusPolicy {
    pub fn accepts(&self, status: StatusCode) -> bool {
        match self {
            StatusPolicy::OkOnly => status == StatusCode::OK,
            StatusPolicy::SuccessOrRedirect => status.is_success() || status.is_redirection(),
        }
    }
}

impl fmt::Display for StatusPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusPolicy::OkOnly => write!(f, "ok-only"),
            StatusPolicy::SuccessOrRedirect => write!(f, "success-or-redirect"),
        }
    }
}

impl FromStr for StatusPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ok-only" | "200" => Ok(StatusPolicy::OkOnly),
            "success-or-redirect" | "2xx-3xx" => Ok(StatusPolicy::SuccessOrRedirect),
            _ => Err(format!(
                "Invalid status policy: {}. Use: ok-only, success-or-redirect",
                s
            )),
        }
    }
}

/// Configuration for proxy checker
#[derive(Debug, Clone)]
pub struct CheckerConfig {
    /// Hard timeout for each check
    pub timeout: Duration,
    /// Number of concurrent checks
    pub concurrency: usize,
    /// URL to test proxies against
    pub test_url: String,
    /// Which statuses mean the proxy works
    pub status_policy: StatusPolicy,
    /// Ignore certificate errors of the target
    pub accept_invalid_certs: bool,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            concurrency: DEFAULT_CONCURRENCY,
            test_url: DEFAULT_TEST_URL.to_string(),
            status_policy: StatusPolicy::default(),
            accept_invalid_certs: true,
        }
    }
}

impl CheckerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_test_url(mut self, url: String) -> Self {
        self.test_url = url;
        self
    }

    pub fn with_status_policy(mut self, policy: StatusPolicy) -> Self {
        self.status_policy = policy;
        self
    }

    pub fn with_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }
}

/// Proxy checker for validating proxies
#[derive(Debug, Clone, Default)]
pub struct ProxyChecker {
    config: CheckerConfig,
}

impl ProxyChecker {
    /// Create a new proxy checker with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new proxy checker with custom configuration
    pub fn with_config(config: CheckerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CheckerConfig {
        &self.config
    }

    /// Check a single proxy with one GET to the test URL.
    ///
    /// Never fails: every error is folded into a non-working result.
    pub async fn check_proxy(&self, proxy: &ProxyAddress) -> ProxyCheckResult {
        let client = match self.create_client(proxy) {
            Ok(client) => client,
            Err(e) => return ProxyCheckResult::failed(proxy.clone(), e.to_string()),
        };

        let start = Instant::now();
        let response = tokio::time::timeout(
            self.config.timeout,
            client.get(&self.config.test_url).send(),
        )
        .await;
        let elapsed = start.elapsed();

        let result = match response {
            Ok(Ok(response)) if self.config.status_policy.accepts(response.status()) => {
                ProxyCheckResult::working(proxy.clone(), elapsed)
            }
            Ok(Ok(response)) => ProxyCheckResult::failed(
                proxy.clone(),
                format!("HTTP status: {}", response.status()),
            ),
            Ok(Err(e)) if e.is_timeout() => ProxyCheckResult::timeout(proxy.clone()),
            Ok(Err(e)) => ProxyCheckResult::failed(proxy.clone(), e.to_string()),
            Err(_) => ProxyCheckResult::timeout(proxy.clone()),
        };

        if result.is_working() {
            info!(proxy = %proxy, latency_ms = elapsed.as_millis() as u64, "proxy working");
        } else {
            debug!(proxy = %proxy, status = ?result.status(), "proxy not working");
        }

        result
    }

    /// Check proxies with at most `concurrency` checks in flight.
    ///
    /// Results come back in input order regardless of which check finishes first.
    pub async fn check_proxies(&self, proxies: Vec<ProxyAddress>) -> Vec<ProxyCheckResult> {
        let concurrency = self.config.concurrency.max(1);

        stream::iter(proxies)
            .map(|proxy| async move { self.check_proxy(&proxy).await })
            .buffered(concurrency)
            .collect::<Vec<_>>()
            .await
    }

    /// Check proxies and separate into good and bad results
    pub async fn check_and_separate(
        &self,
        proxies: Vec<ProxyAddress>,
    ) -> (Vec<ProxyCheckResult>, Vec<ProxyCheckResult>) {
        let results = self.check_proxies(proxies).await;

        results.into_iter().partition(|r| r.is_working())
    }

    /// Fresh client per check: no pooled connections, no cookies, no redirects
    fn create_client(&self, proxy: &ProxyAddress) -> reqwest::Result<Client> {
        let reqwest_proxy = ReqwestProxy::all(proxy.proxy_url())?;

        Client::builder()
            .proxy(reqwest_proxy)
            .timeout(self.config.timeout)
            .redirect(redirect::Policy::none())
            .pool_max_idle_per_host(0)
            .danger_accept_invalid_certs(self.config.accept_invalid_certs)
            .build()
    }
}
