//! Address parser for extracting proxy candidates from fetched pages
//!
//! Pages are scanned with a list of [`ExtractionStrategy`] values tried in
//! order; the first strategy that finds anything wins. The default order is
//! a whole-document text scan followed by a cell-by-cell table scan, which
//! catches pages that split an address across markup inside one cell.

use crate::proxy::models::ProxyAddress;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashSet;

/// IPv4 address with every octet in 0..=255, followed by `:port`
static IP_PORT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(?:(?:25[0-5]|2[0-4][0-9]|1[0-9]{2}|[1-9]?[0-9])\.){3}(?:25[0-5]|2[0-4][0-9]|1[0-9]{2}|[1-9]?[0-9]):[0-9]+\b",
    )
    .expect("Invalid IP:PORT regex")
});

static TD_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("td").expect("Invalid td selector"));

/// Find every valid `ipv4:port` token in a piece of text, in order
fn scan_text(text: &str) -> impl Iterator<Item = ProxyAddress> + '_ {
    IP_PORT_REGEX.find_iter(text).filter_map(|m| {
        let addr = ProxyAddress::normalize(m.as_str())?;
        addr.port()?;
        Some(addr)
    })
}

/// One way of pulling candidates out of a parsed document
pub trait ExtractionStrategy: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Candidates in document order. May contain duplicates.
    fn extract(&self, document: &Html) -> Vec<ProxyAddress>;
}

/// Scan the document text with tags collapsed to spaces
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatText;

impl ExtractionStrategy for FlatText {
    fn name(&self) -> &'static str {
        "flat-text"
    }

    fn extract(&self, document: &Html) -> Vec<ProxyAddress> {
        let text = document.root_element().text().collect::<Vec<_>>().join(" ");
        scan_text(&text).collect()
    }
}

/// Scan each leaf table cell on its own, with its text fragments glued together
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuredCell;

impl ExtractionStrategy for StructuredCell {
    fn name(&self) -> &'static str {
        "structured-cell"
    }

    fn extract(&self, document: &Html) -> Vec<ProxyAddress> {
        document
            .select(&TD_SELECTOR)
            .filter(|cell| {
                // leaf cells only, nested tables are visited through their own cells
                !cell
                    .descendants()
                    .skip(1)
                    .any(|node| node.value().as_element().is_some_and(|e| e.name() == "td"))
            })
            .filter_map(|cell| {
                let text: String = cell.text().map(str::trim).collect();
                let first = scan_text(&text).next();
                first
            })
            .collect()
    }
}

/// Parser turning page bodies into ordered, de-duplicated candidates
pub struct AddressParser {
    strategies: Vec<Box<dyn ExtractionStrategy>>,
}

impl AddressParser {
    /// Parser with the default strategy chain: flat text, then table cells
    pub fn new() -> Self {
        Self::with_strategies(vec![Box::new(FlatText), Box::new(StructuredCell)])
    }

    /// Parser with a custom strategy chain, tried in the given order
    pub fn with_strategies(strategies: Vec<Box<dyn ExtractionStrategy>>) -> Self {
        Self { strategies }
    }

    /// Names of the configured strategies, in order
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Extract candidates from an HTML (or plain text) body.
    ///
    /// Never fails: broken markup is repaired by the HTML parser and a body
    /// without any address yields an empty list.
    pub fn parse(&self, body: &str) -> Vec<ProxyAddress> {
        let document = Html::parse_document(body);

        for strategy in &self.strategies {
            let found = dedup_in_order(strategy.extract(&document));
            if !found.is_empty() {
                tracing::debug!(
                    strategy = strategy.name(),
                    count = found.len(),
                    "extracted candidates"
                );
                return found;
            }
        }

        Vec::new()
    }
}

impl Default for AddressParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Read a plain-text proxy list: every non-blank line with a `:` is a candidate
pub fn parse_line_list(body: &str) -> Vec<ProxyAddress> {
    body.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && line.contains(':'))
        .filter_map(ProxyAddress::normalize)
        .collect()
}

fn dedup_in_order(candidates: Vec<ProxyAddress>) -> Vec<ProxyAddress> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|addr| seen.insert(addr.clone()))
        .collect()
}
