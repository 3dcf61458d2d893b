//! Cadence - headless music playback from the command line.

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use cadence::cli;

fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    // Logs go to stderr so they don't tear the status line
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("cadence=info")))
        .init();

    cli::run_command(&args)
}
