//! Sources of decoded QR payloads.
//!
//! A decoder is started once and then produces [`ScanEvent`]s for as long
//! as the session runs. Two sources are provided:
//!
//! - [`CommandDecoder`]: an external camera decoder process (e.g. `zbarcam`)
//!   printing one payload per line
//! - [`LineDecoder`]: any async line source, such as stdin fed by a
//!   keyboard-wedge scanner

mod command;
mod line;

pub use command::CommandDecoder;
pub use line::LineDecoder;

use crate::error::Result;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

/// Capacity of the decoder channel.
const CHANNEL_CAPACITY: usize = 64;

/// A decoded payload and the moment it was observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanEvent {
    /// Decoded text, unvalidated.
    pub text: String,
    /// Observation time.
    pub observed_at: Instant,
}

impl ScanEvent {
    /// A scan observed now.
    #[must_use]
    pub fn now(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            observed_at: Instant::now(),
        }
    }
}

/// Stream of scans. An `Err` item means the decoder died and no more scans
/// will follow.
pub type ScanStream = mpsc::Receiver<Result<ScanEvent>>;

/// Something that produces decoded payloads.
pub trait Decoder: Send + 'static {
    /// Start decoding in continuous mode. Must be called inside a Tokio
    /// runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if the decoder cannot be started.
    fn start(self) -> Result<ScanStream>;
}

/// Minimum spacing between forwarded repeats of one payload for a target
/// rate.
fn min_interval(max_per_sec: u32) -> Option<Duration> {
    (max_per_sec > 0).then(|| Duration::from_secs(1) / max_per_sec)
}

/// Read payload lines from `reader` into `tx` until EOF or until the
/// receiver goes away. Returns the number of payloads forwarded.
///
/// With an `interval`, a line equal to the previous forwarded one is
/// dropped until `interval` has passed. A different payload is always
/// forwarded.
async fn pump_lines<R>(
    mut reader: R,
    interval: Option<Duration>,
    tx: &mpsc::Sender<Result<ScanEvent>>,
) -> u64
where
    R: AsyncBufRead + Unpin,
{
    let mut forwarded = 0;
    let mut last: Option<(Vec<u8>, Instant)> = None;
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                warn!("Decoder read failed: {e}");
                break;
            }
        }

        while matches!(buf.last(), Some(b'\n' | b'\r')) {
            buf.pop();
        }
        if buf.is_empty() {
            continue;
        }

        let now = Instant::now();
        if let (Some(interval), Some((prev_text, prev_at))) = (interval, &last) {
            if *prev_text == buf && now.duration_since(*prev_at) < interval {
                trace!("Dropping repeat decode above frame rate");
                continue;
            }
        }
        last = Some((buf.clone(), now));

        let event = ScanEvent {
            text: String::from_utf8_lossy(&buf).into_owned(),
            observed_at: now,
        };
        if tx.send(Ok(event)).await.is_err() {
            debug!("Scan receiver closed, stopping decoder");
            break;
        }
        forwarded += 1;
    }

    forwarded
}
