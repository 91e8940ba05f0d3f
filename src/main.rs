//! sitepipe - static-site asset pipeline
//!
//! Composes HTML pages from layouts and partials, compiles SCSS, minifies
//! scripts, optimizes images (with WebP and AVIF variants), copies fonts
//! and serves the result with live reload while watching the sources.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use sitepipe_lib::Cli;

/// Initialize the logging/tracing system
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("sitepipe=debug,sitepipe_lib=debug,tower_http=debug"))
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("sitepipe=info,sitepipe_lib=info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    cli.execute().await
}
