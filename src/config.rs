//! Configuration for ticket-scanner.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Where decoded payloads come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecoderSource {
    /// External camera decoder process.
    #[default]
    Camera,
    /// One payload per line on stdin (keyboard-wedge scanners, piped files).
    Stdin,
}

/// Rendering surface for scan results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable terminal output.
    #[default]
    Text,
    /// One JSON object per rendered state.
    Json,
}

/// Scanner configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Base URL of the check-in server. `/verify` is appended.
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// Window in which an identical payload is ignored, in milliseconds.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Verification request timeout in seconds (0 disables the timeout).
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Output format.
    #[serde(default)]
    pub output: OutputFormat,

    /// Decoder configuration.
    #[serde(default)]
    pub decoder: DecoderConfig,

    /// Log level.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Decoder configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecoderConfig {
    /// Payload source.
    #[serde(default)]
    pub source: DecoderSource,

    /// Decoder program for the camera source.
    #[serde(default = "default_decoder_command")]
    pub command: String,

    /// Arguments passed to the decoder program before the device.
    #[serde(default = "default_decoder_args")]
    pub args: Vec<String>,

    /// Camera device, facing the attendee.
    #[serde(default = "default_device")]
    pub device: String,

    /// Maximum repeat reads of one payload forwarded per second
    /// (0 = unlimited). Different payloads always pass.
    #[serde(default = "default_fps")]
    pub fps: u32,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            debounce_ms: default_debounce_ms(),
            request_timeout_secs: default_request_timeout(),
            output: OutputFormat::default(),
            decoder: DecoderConfig::default(),
            log_level: default_log_level(),
        }
    }
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            source: DecoderSource::default(),
            command: default_decoder_command(),
            args: default_decoder_args(),
            device: default_device(),
            fps: default_fps(),
        }
    }
}

fn default_server_url() -> String {
    "http://127.0.0.1:5000".to_string()
}

const fn default_debounce_ms() -> u64 {
    1500
}

const fn default_request_timeout() -> u64 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_decoder_command() -> String {
    "zbarcam".to_string()
}

fn default_decoder_args() -> Vec<String> {
    ["--raw", "--nodisplay", "--quiet"]
        .iter()
        .map(ToString::to_string)
        .collect()
}

fn default_device() -> String {
    "/dev/video0".to_string()
}

const fn default_fps() -> u32 {
    10
}

impl ScannerConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Save configuration to a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn to_file(&self, path: &Path) -> crate::Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Platform config file location, e.g. `~/.config/ticket-scanner/config.toml`.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "ticket-scanner")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Debounce window as a duration.
    #[must_use]
    pub fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Request timeout, if one is configured.
    #[must_use]
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }

    /// Full URL of the verification endpoint.
    #[must_use]
    pub fn verify_url(&self) -> String {
        format!("{}/verify", self.server_url.trim_end_matches('/'))
    }
}
