//! Discovery and validation pass

use crate::config::Config;
use crate::proxy::aggregator::{aggregate, Aggregation, ProxyAggregator};
use crate::proxy::checker::ProxyChecker;
use crate::proxy::crawler::ProxyCrawler;
use crate::proxy::models::{ProxyAddress, ProxyCheckResult};
use crate::proxy::report::WorkingProxyReport;
use crate::Result;
use tracing::info;

/// Everything one run produced
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub aggregation: Aggregation,
    /// One result per validated candidate, in candidate order
    pub results: Vec<ProxyCheckResult>,
    pub report: WorkingProxyReport,
}

/// Crawl → merge → check, driven by one immutable [`Config`]
pub struct Pipeline {
    config: Config,
    crawler: ProxyCrawler,
    checker: ProxyChecker,
}

impl Pipeline {
    /// Validate the configuration and build the crawler and checker from it
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        Self::build(config)
    }

    /// Pipeline for validating a candidate list given up front; sources may be empty
    pub fn for_candidates(config: Config) -> Result<Self> {
        config.validate_target()?;
        Self::build(config)
    }

    fn build(config: Config) -> Result<Self> {
        let crawler = ProxyCrawler::with_config(config.crawler_config())?;
        let checker = ProxyChecker::with_config(config.checker_config());

        Ok(Self {
            config,
            crawler,
            checker,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Crawl every source and return the unique candidates, capped at `max_proxies`
    pub async fn discover(&self) -> Aggregation {
        let mut aggregation = aggregate(&self.crawler, &self.config.sources).await;
        self.cap(&mut aggregation.candidates);
        aggregation
    }

    /// De-duplicate a given candidate list in first-seen order, capped at `max_proxies`
    pub fn prepare(&self, proxies: Vec<ProxyAddress>) -> Vec<ProxyAddress> {
        let mut aggregator = ProxyAggregator::new();
        aggregator.extend(proxies);
        let mut candidates = aggregator.into_candidates();
        self.cap(&mut candidates);
        candidates
    }

    fn cap(&self, candidates: &mut Vec<ProxyAddress>) {
        if let Some(max) = self.config.max_proxies {
            if candidates.len() > max {
                info!(max, found = candidates.len(), "capping candidates");
                candidates.truncate(max);
            }
        }
    }

    /// Check candidates; results keep the candidate order
    pub async fn validate(&self, candidates: Vec<ProxyAddress>) -> Vec<ProxyCheckResult> {
        info!(
            candidates = candidates.len(),
            concurrency = self.config.concurrency,
            policy = %self.config.status_policy,
            target = %self.config.target_url,
            "validating candidates"
        );
        self.checker.check_proxies(candidates).await
    }

    /// Build the report for a set of validation results
    pub fn report(&self, results: &[ProxyCheckResult]) -> WorkingProxyReport {
        WorkingProxyReport::from_results(results, self.checker.config().test_url.as_str())
    }

    /// One full discovery and validation pass
    pub async fn run(&self) -> PipelineOutcome {
        let aggregation = self.discover().await;
        let results = self.validate(aggregation.candidates.clone()).await;
        let report = self.report(&results);

        info!(
            checked = results.len(),
            working = report.len(),
            "validation finished"
        );

        PipelineOutcome {
            aggregation,
            results,
            report,
        }
    }
}
