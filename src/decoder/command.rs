//! External camera decoder process.

use crate::config::DecoderConfig;
use crate::decoder::{min_interval, pump_lines, Decoder, ScanStream, CHANNEL_CAPACITY};
use crate::error::{Error, Result};
use std::process::Stdio;
use tokio::io::BufReader;
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Runs a camera decoder program and reads one payload per stdout line.
///
/// The default program is `zbarcam --raw --nodisplay --quiet /dev/video0`.
/// The process holds the camera for the whole session and is killed when
/// the session ends.
#[derive(Debug, Clone)]
pub struct CommandDecoder {
    program: String,
    args: Vec<String>,
    max_per_sec: u32,
}

impl CommandDecoder {
    /// Create a decoder running `program` with `args`.
    #[must_use]
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            max_per_sec: 0,
        }
    }

    /// Build from configuration. The device is appended after the args.
    #[must_use]
    pub fn from_config(config: &DecoderConfig) -> Self {
        let mut args = config.args.clone();
        if !config.device.is_empty() {
            args.push(config.device.clone());
        }
        Self::new(config.command.clone(), args).with_max_rate(config.fps)
    }

    /// Forward repeat reads of the same payload at most `max_per_sec` times
    /// per second (0 = unlimited).
    #[must_use]
    pub fn with_max_rate(mut self, max_per_sec: u32) -> Self {
        self.max_per_sec = max_per_sec;
        self
    }

    /// The program and arguments that will be run.
    #[must_use]
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Decoder for CommandDecoder {
    fn start(self) -> Result<ScanStream> {
        let command_line = self.command_line();

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::CameraUnavailable(format!("failed to run `{command_line}`: {e}")))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::CameraUnavailable("decoder stdout not captured".to_string()))?;

        info!("Camera decoder started: {command_line}");

        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let interval = min_interval(self.max_per_sec);

        tokio::spawn(async move {
            // The receiver goes away when the session ends, even while the
            // decoder sits on a frame with no code in it.
            let pumped = tokio::select! {
                forwarded = pump_lines(BufReader::new(stdout), interval, &tx) => Some(forwarded),
                () = tx.closed() => None,
            };
            let Some(forwarded) = pumped.filter(|_| !tx.is_closed()) else {
                stop(child).await;
                return;
            };

            let exited = tokio::select! {
                status = child.wait() => Some(status),
                () = tx.closed() => None,
            };
            let Some(exited) = exited else {
                stop(child).await;
                return;
            };

            match exited {
                Ok(status) if status.success() => {
                    info!("Camera decoder exited after {forwarded} scans");
                }
                Ok(status) => {
                    warn!("Camera decoder exited with {status}");
                    // Exiting before the first decode means the camera never opened.
                    let err = if forwarded == 0 {
                        Error::CameraUnavailable(format!("`{command_line}` exited with {status}"))
                    } else {
                        Error::Decoder(format!("`{command_line}` exited with {status}"))
                    };
                    let _ = tx.send(Err(err)).await;
                }
                Err(e) => {
                    let _ = tx.send(Err(Error::Decoder(e.to_string()))).await;
                }
            }
        });

        Ok(rx)
    }
}

/// Kill the decoder and reap it so the camera device is released.
async fn stop(mut child: Child) {
    debug!("Session ended, stopping camera decoder");
    if let Err(e) = child.kill().await {
        warn!("Failed to stop camera decoder: {e}");
    }
}
