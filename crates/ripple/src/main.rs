//! Ripple CLI binary.

use anyhow::Result;
use ripple::cli::Cli;
use tracing_subscriber::EnvFilter;

/// Main entry point for the ripple CLI.
///
/// Uses tokio's current_thread runtime: plan execution is sequential by
/// construction and the analyzer's concurrent reads are I/O-free.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Controlled via RUST_LOG, e.g. RUST_LOG=ripple=debug.
    // stdout is reserved for command output.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ripple=info")),
        )
        .with_target(false)
        .init();

    tracing::debug!("Starting ripple CLI");

    let cli = Cli::parse_args();
    cli.execute().await?;

    tracing::debug!("Ripple CLI completed successfully");
    Ok(())
}
