//! Merging of per-source candidate lists

use crate::proxy::crawler::{CrawlResult, ProxyCrawler};
use crate::proxy::models::{ProxyAddress, ProxySource};
use std::collections::HashSet;
use tracing::info;

/// Ordered, de-duplicated candidate list built from several sources.
///
/// Single owner of the seen-set: sources may be fetched concurrently, but
/// their outputs are fed in here one after another in configured order.
#[derive(Debug, Default)]
pub struct ProxyAggregator {
    seen: HashSet<ProxyAddress>,
    candidates: Vec<ProxyAddress>,
}

impl ProxyAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append every address not seen before, returning how many were new
    pub fn extend<I>(&mut self, proxies: I) -> usize
    where
        I: IntoIterator<Item = ProxyAddress>,
    {
        let before = self.candidates.len();
        for proxy in proxies {
            if self.seen.insert(proxy.clone()) {
                self.candidates.push(proxy);
            }
        }
        self.candidates.len() - before
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn candidates(&self) -> &[ProxyAddress] {
        &self.candidates
    }

    pub fn into_candidates(self) -> Vec<ProxyAddress> {
        self.candidates
    }
}

/// Outcome of crawling and merging all sources
#[derive(Debug, Clone)]
pub struct Aggregation {
    /// Unique candidates in cross-source first-seen order
    pub candidates: Vec<ProxyAddress>,
    /// Per-source results, in configured source order
    pub sources: Vec<CrawlResult>,
}

impl Aggregation {
    pub fn failed_sources(&self) -> usize {
        self.sources.iter().filter(|r| !r.is_success()).count()
    }
}

/// Merge crawl results in the order given
pub fn merge(results: &[CrawlResult]) -> Vec<ProxyAddress> {
    let mut aggregator = ProxyAggregator::new();
    for result in results {
        aggregator.extend(result.proxies.iter().cloned());
    }
    aggregator.into_candidates()
}

/// Crawl every source and merge the outputs into one candidate list
pub async fn aggregate(crawler: &ProxyCrawler, sources: &[ProxySource]) -> Aggregation {
    let results = crawler.crawl_sources_with_results(sources).await;
    let candidates = merge(&results);

    info!(
        sources = results.len(),
        failed = results.iter().filter(|r| !r.is_success()).count(),
        unique = candidates.len(),
        "aggregated candidates"
    );

    Aggregation {
        candidates,
        sources: results,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::crawler::CrawlerConfig;
    use crate::proxy::models::SourceStrategy;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn addrs(items: &[&str]) -> Vec<ProxyAddress> {
        items
            .iter()
            .map(|s| ProxyAddress::normalize(s).unwrap())
            .collect()
    }

    fn strings(addrs: &[ProxyAddress]) -> Vec<&str> {
        addrs.iter().map(|a| a.as_str()).collect()
    }

    #[test]
    fn test_extend_counts_new_entries() {
        let mut aggregator = ProxyAggregator::new();
        assert!(aggregator.is_empty());
        assert_eq!(aggregator.extend(addrs(&["1.1.1.1:80", "2.2.2.2:81"])), 2);
        assert_eq!(aggregator.extend(addrs(&["2.2.2.2:81", "3.3.3.3:82"])), 1);
        assert_eq!(aggregator.len(), 3);
    }

    #[test]
    fn test_merge_keeps_first_occurrence_position() {
        let results = vec![
            CrawlResult::success("a".into(), addrs(&["9.9.9.9:99", "1.2.3.4:8080"])),
            CrawlResult::success("b".into(), addrs(&["1.2.3.4:8080", "5.5.5.5:55"])),
        ];
        assert_eq!(
            strings(&merge(&results)),
            vec!["9.9.9.9:99", "1.2.3.4:8080", "5.5.5.5:55"]
        );
    }

    #[test]
    fn test_merge_ignores_failed_sources() {
        let results = vec![
            CrawlResult::success("a".into(), addrs(&["1.1.1.1:80"])),
            CrawlResult::success("b".into(), addrs(&["1.1.1.1:80", "2.2.2.2:81"])),
            CrawlResult::failure("c".into(), "HTTP 500".into()),
        ];
        assert_eq!(strings(&merge(&results)), vec!["1.1.1.1:80", "2.2.2.2:81"]);
    }

    #[tokio::test]
    async fn test_aggregate_survives_timed_out_source() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("1.2.3.4:80")
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/ok"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<p>5.6.7.8:3128</p>"))
            .mount(&server)
            .await;

        let crawler =
            ProxyCrawler::with_config(CrawlerConfig::new().with_timeout(Duration::from_millis(300)))
                .unwrap();
        let sources = vec![
            ProxySource::new("slow", &format!("{}/slow", server.uri()), SourceStrategy::LineList),
            ProxySource::new("ok", &format!("{}/ok", server.uri()), SourceStrategy::HtmlScrape),
        ];

        let aggregation = aggregate(&crawler, &sources).await;
        assert_eq!(strings(&aggregation.candidates), vec!["5.6.7.8:3128"]);
        assert_eq!(aggregation.failed_sources(), 1);
    }
}
