use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use proxy_harvest::{
    config::{load_sources_file, TARGET_URL_ENV},
    logging,
    proxy::{
        checker::DEFAULT_TEST_URL, parser::parse_line_list, report::DEFAULT_REPORT_FILE,
        ProxyCheckResult, ProxySource, SourceStrategy, StatusPolicy, WorkingProxyReport,
    },
    Config, Pipeline,
};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Discover public HTTP proxies and keep the ones that work
#[derive(Parser)]
#[command(name = "proxy-harvest")]
#[command(about = "Discover public HTTP proxies and keep the ones that work")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    options: Options,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl sources and validate every candidate (default)
    Run,
    /// Crawl sources and print the unique candidates without probing them
    Crawl {
        /// Output file for candidates (one per line)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate candidates read from a file (one host:port per line)
    Check {
        /// Input file containing proxies
        input: PathBuf,
    },
}

#[derive(Args)]
struct Options {
    /// URL to request through each proxy
    #[arg(long, env = TARGET_URL_ENV, default_value = DEFAULT_TEST_URL, global = true)]
    target_url: String,

    /// HTML page to scrape for proxies (repeatable)
    #[arg(long = "html", global = true)]
    html: Vec<String>,

    /// Plain-text proxy list URL (repeatable)
    #[arg(long = "list", global = true)]
    list: Vec<String>,

    /// File of `<strategy> <url>` source lines
    #[arg(long, global = true)]
    sources_file: Option<PathBuf>,

    /// Do not crawl the built-in sources
    #[arg(long, global = true)]
    no_defaults: bool,

    /// Number of concurrent checks
    #[arg(short = 'n', long, default_value = "32", global = true)]
    concurrency: usize,

    /// Check timeout in seconds
    #[arg(long, default_value = "8", global = true)]
    timeout: u64,

    /// Source fetch timeout in seconds
    #[arg(long, default_value = "15", global = true)]
    fetch_timeout: u64,

    /// Which check statuses count as working (ok-only, success-or-redirect)
    #[arg(long, default_value = "ok-only", global = true)]
    policy: StatusPolicy,

    /// Validate at most this many candidates
    #[arg(long, global = true)]
    max_proxies: Option<usize>,

    /// Fail checks on invalid target certificates
    #[arg(long, global = true)]
    strict_tls: bool,

    /// Output file for working proxies
    #[arg(short, long, default_value = DEFAULT_REPORT_FILE, global = true)]
    report: PathBuf,

    /// Write working proxies as plain host:port lines instead of JSON
    #[arg(long, global = true)]
    plain: bool,
}

impl Options {
    fn sources(&self) -> Result<Vec<ProxySource>> {
        let mut sources = if self.no_defaults {
            Vec::new()
        } else {
            ProxySource::defaults()
        };

        if let Some(path) = &self.sources_file {
            let loaded = load_sources_file(path)
                .with_context(|| format!("failed to load sources from {:?}", path))?;
            sources.extend(loaded);
        }
        sources.extend(self.html.iter().map(|url| ProxySource::from_url(url, SourceStrategy::HtmlScrape)));
        sources.extend(self.list.iter().map(|url| ProxySource::from_url(url, SourceStrategy::LineList)));

        Ok(sources)
    }

    fn config(&self) -> Result<Config> {
        Ok(Config::new()
            .with_sources(self.sources()?)
            .with_target_url(self.target_url.clone())
            .with_check_timeout(Duration::from_secs(self.timeout))
            .with_fetch_timeout(Duration::from_secs(self.fetch_timeout))
            .with_concurrency(self.concurrency)
            .with_status_policy(self.policy)
            .with_accept_invalid_certs(!self.strict_tls)
            .with_max_proxies(self.max_proxies))
    }

    fn save(&self, report: &WorkingProxyReport) -> Result<()> {
        if self.plain {
            report.save_plain(&self.report)?;
        } else {
            report.save_json(&self.report)?;
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose)?;

    let config = cli.options.config()?;
    let pipeline = match cli.command {
        Some(Commands::Check { .. }) => Pipeline::for_candidates(config),
        _ => Pipeline::new(config),
    }
    .context("invalid configuration")?;

    match cli.command {
        Some(Commands::Run) | None => {
            println!("Scraping proxies...");
            let aggregation = pipeline.discover().await;
            println!("Total proxies found: {}", aggregation.candidates.len());

            let results = pipeline.validate(aggregation.candidates).await;
            print_results(&results);

            let report = pipeline.report(&results);
            cli.options.save(&report)?;
            print_summary(&report, &cli.options.report);
        }
        Some(Commands::Crawl { output }) => {
            let aggregation = pipeline.discover().await;
            for result in &aggregation.sources {
                match &result.error {
                    None => println!("Found {} proxies from {}", result.proxies.len(), result.source),
                    Some(error) => eprintln!("Error crawling {}: {}", result.source, error),
                }
            }
            println!("\nTotal unique proxies: {}", aggregation.candidates.len());

            let lines: Vec<_> = aggregation.candidates.iter().map(|a| a.as_str()).collect();
            if let Some(output_path) = output {
                std::fs::write(&output_path, lines.join("\n"))?;
                println!("Saved proxies to {:?}", output_path);
            } else {
                for line in lines {
                    println!("{}", line);
                }
            }
        }
        Some(Commands::Check { input }) => {
            let content = std::fs::read_to_string(&input)
                .with_context(|| format!("failed to read {:?}", input))?;
            let candidates = pipeline.prepare(parse_line_list(&content));

            println!("Loaded {} proxies from {:?}", candidates.len(), input);
            let results = pipeline.validate(candidates).await;
            print_results(&results);

            let report = pipeline.report(&results);
            cli.options.save(&report)?;
            print_summary(&report, &cli.options.report);
        }
    }

    Ok(())
}

fn print_results(results: &[ProxyCheckResult]) {
    for result in results {
        match result.latency() {
            Some(latency) => println!("[OK] {} - {:.3}s", result.proxy(), latency.as_secs_f64()),
            None => println!("[FAIL] {}", result.proxy()),
        }
    }
}

fn print_summary(report: &WorkingProxyReport, path: &Path) {
    println!("\nSummary:");
    println!("Working proxies: {}", report.len());
    println!("Results saved to {:?}", path);
}
