//! Line-oriented decoder input.

use crate::decoder::{min_interval, pump_lines, Decoder, ScanStream, CHANNEL_CAPACITY};
use crate::error::Result;
use tokio::io::{AsyncBufRead, BufReader, Stdin};
use tokio::sync::mpsc;
use tracing::info;

/// Reads one payload per line from an async reader.
///
/// Handheld scanners in keyboard mode type the payload followed by Enter,
/// so stdin works as a source. Blank lines are skipped.
pub struct LineDecoder<R> {
    reader: R,
    max_per_sec: u32,
}

impl<R> LineDecoder<R>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    /// Create a decoder over `reader` with no rate limit.
    #[must_use]
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            max_per_sec: 0,
        }
    }

    /// Forward repeats of the same payload at most `max_per_sec` times per
    /// second (0 = unlimited).
    #[must_use]
    pub fn with_max_rate(mut self, max_per_sec: u32) -> Self {
        self.max_per_sec = max_per_sec;
        self
    }
}

impl LineDecoder<BufReader<Stdin>> {
    /// Read payloads from stdin.
    #[must_use]
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

impl<R> Decoder for LineDecoder<R>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    fn start(self) -> Result<ScanStream> {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let interval = min_interval(self.max_per_sec);

        tokio::spawn(async move {
            let forwarded = pump_lines(self.reader, interval, &tx).await;
            info!("Line input closed after {forwarded} scans");
        });

        Ok(rx)
    }
}
