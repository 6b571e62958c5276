//! Tabular harness - main entry point

use clap::Parser;
use tabular_harness::cli::{dispatch, Cli};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tabular_harness=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    dispatch(Cli::parse())
}
