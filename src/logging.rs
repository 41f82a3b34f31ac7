//! Tracing subscriber setup for the binary

use anyhow::anyhow;
use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber, writing to stderr.
///
/// `RUST_LOG` wins when set; otherwise the crate logs at info, or debug
/// when `verbose` is on.
pub fn init(verbose: bool) -> crate::Result<()> {
    let default_directive = if verbose {
        "proxy_harvest=debug"
    } else {
        "proxy_harvest=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("failed to initialise logging: {}", e))
}
