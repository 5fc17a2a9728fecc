//! ticket-scanner CLI entry point.

mod cli;

use clap::Parser;
use cli::Cli;
use ticket_scanner::{
    CommandDecoder, DecoderSource, HttpVerifier, LineDecoder, ScannerBuilder,
};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    // Parse CLI arguments
    let cli = Cli::parse();

    // Build configuration; the file may set the log level
    let json_logs = cli.json_logs;
    let config = cli.into_config()?;

    // Initialize tracing; stdout belongs to the renderer.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    if json_logs {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr))
            .with(filter)
            .init();
    }

    info!("ticket-scanner v{}", env!("CARGO_PKG_VERSION"));

    let verifier = HttpVerifier::from_config(&config)?;
    let source = config.decoder.source;
    let camera = CommandDecoder::from_config(&config.decoder);

    let mut scanner = ScannerBuilder::new(config, verifier).build();

    // Run until the decoder stops or Ctrl-C
    let stats = match source {
        DecoderSource::Camera => scanner.run(camera).await?,
        DecoderSource::Stdin => scanner.run(LineDecoder::stdin()).await?,
    };

    info!("Checked {} tickets", stats.completed());
    Ok(())
}
