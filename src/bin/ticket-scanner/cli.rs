//! Command-line interface definition.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use ticket_scanner::config::{DecoderSource, OutputFormat, ScannerConfig};

/// Check-in scanner: verifies scanned QR tickets against the event server.
#[derive(Parser, Debug)]
#[command(name = "ticket-scanner")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Base URL of the check-in server.
    #[arg(long, env = "TICKET_SCANNER_SERVER_URL")]
    pub server_url: Option<String>,

    /// Where decoded payloads come from.
    #[arg(long, value_enum, env = "TICKET_SCANNER_SOURCE")]
    pub source: Option<CliSource>,

    /// Camera device passed to the decoder program.
    #[arg(long, env = "TICKET_SCANNER_DEVICE")]
    pub device: Option<String>,

    /// Decoder program for the camera source.
    #[arg(long, env = "TICKET_SCANNER_DECODER")]
    pub decoder_command: Option<String>,

    /// Maximum repeat reads of one code per second from the camera (0 = unlimited).
    #[arg(long)]
    pub fps: Option<u32>,

    /// Ignore the same ticket for this many milliseconds.
    #[arg(long)]
    pub debounce_ms: Option<u64>,

    /// Verification request timeout in seconds (0 = none).
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Output format.
    #[arg(long, value_enum)]
    pub output: Option<CliOutput>,

    /// Log level. `RUST_LOG` takes precedence.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Emit logs as JSON.
    #[arg(long)]
    pub json_logs: bool,

    /// Path to configuration file.
    #[arg(long, short)]
    pub config: Option<PathBuf>,
}

/// Payload source CLI enum.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CliSource {
    /// Camera decoder process.
    Camera,
    /// One payload per line on stdin.
    Stdin,
}

/// Output format CLI enum.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CliOutput {
    /// Human-readable text.
    Text,
    /// JSON lines.
    Json,
}

impl Cli {
    /// Convert CLI arguments into a `ScannerConfig`.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file is specified but cannot be loaded.
    pub fn into_config(self) -> color_eyre::Result<ScannerConfig> {
        // Explicit file, then the platform default if it exists.
        let mut config = match self.config {
            Some(ref path) => ScannerConfig::from_file(path)?,
            None => match ScannerConfig::default_path().filter(|p| p.exists()) {
                Some(path) => ScannerConfig::from_file(&path)?,
                None => ScannerConfig::default(),
            },
        };

        // Override with CLI arguments
        if let Some(url) = self.server_url {
            config.server_url = url;
        }
        if let Some(source) = self.source {
            config.decoder.source = source.into();
        }
        if let Some(device) = self.device {
            config.decoder.device = device;
        }
        if let Some(command) = self.decoder_command {
            config.decoder.command = command;
        }
        if let Some(fps) = self.fps {
            config.decoder.fps = fps;
        }
        if let Some(ms) = self.debounce_ms {
            config.debounce_ms = ms;
        }
        if let Some(secs) = self.timeout_secs {
            config.request_timeout_secs = secs;
        }
        if let Some(output) = self.output {
            config.output = output.into();
        }
        if let Some(level) = self.log_level {
            config.log_level = level;
        }

        Ok(config)
    }
}

impl From<CliSource> for DecoderSource {
    fn from(s: CliSource) -> Self {
        match s {
            CliSource::Camera => DecoderSource::Camera,
            CliSource::Stdin => DecoderSource::Stdin,
        }
    }
}

impl From<CliOutput> for OutputFormat {
    fn from(o: CliOutput) -> Self {
        match o {
            CliOutput::Text => OutputFormat::Text,
            CliOutput::Json => OutputFormat::Json,
        }
    }
}
