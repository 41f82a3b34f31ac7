//! Working-proxy report and its persistence

use crate::proxy::models::{ProxyAddress, ProxyCheckResult};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Default file the report is written to
pub const DEFAULT_REPORT_FILE: &str = "working_proxies.json";

/// One working proxy as written to the report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkingProxy {
    /// `host:port` of the proxy
    pub proxy: String,
    /// Request latency in seconds, rounded to milliseconds
    pub latency: f64,
    /// Proxy protocol; always `http`
    pub scheme: String,
    /// URL the proxy was checked against
    pub target: String,
}

impl WorkingProxy {
    pub fn new(proxy: &ProxyAddress, latency: Duration, target: &str) -> Self {
        Self {
            proxy: proxy.to_string(),
            latency: round_secs(latency),
            scheme: "http".to_string(),
            target: target.to_string(),
        }
    }
}

fn round_secs(latency: Duration) -> f64 {
    (latency.as_secs_f64() * 1000.0).round() / 1000.0
}

/// Working proxies in validation order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkingProxyReport {
    entries: Vec<WorkingProxy>,
}

impl WorkingProxyReport {
    /// Keep the working results, in the order they were given
    pub fn from_results(results: &[ProxyCheckResult], target: &str) -> Self {
        let entries = results
            .iter()
            .filter_map(|r| {
                let latency = r.latency()?;
                r.is_working()
                    .then(|| WorkingProxy::new(r.proxy(), latency, target))
            })
            .collect();

        Self { entries }
    }

    pub fn entries(&self) -> &[WorkingProxy] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the report as a pretty-printed JSON array
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Write one `host:port` per line
    pub fn save_plain<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = self
            .entries
            .iter()
            .map(|e| e.proxy.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        fs::write(path, content)?;
        Ok(())
    }
}
