//! Scanner event system.

use crate::display::DisplayState;
use tokio::sync::broadcast;

/// Events emitted by the scanner.
#[derive(Debug, Clone)]
pub enum ScannerEvent {
    /// Decoder started and the session is listening for scans.
    Started,

    /// Session is shutting down.
    ShuttingDown,

    /// A scan passed the debounce and a verification was requested.
    ScanAccepted {
        /// Sequence number of the scan.
        seq: u64,
        /// Decoded payload.
        text: String,
    },

    /// A repeat read was dropped inside the debounce window.
    ScanDebounced {
        /// Decoded payload.
        text: String,
    },

    /// A new display state was rendered.
    Rendered {
        /// Sequence number of the scan the state belongs to.
        seq: u64,
        /// The rendered state.
        state: DisplayState,
    },

    /// An outcome arrived after a newer scan was accepted and was dropped.
    Superseded {
        /// Sequence number of the stale scan.
        seq: u64,
    },

    /// The decoder could not be started.
    DecoderFailed {
        /// Error message.
        message: String,
    },
}

/// Channel for receiving scanner events.
pub type ScannerEventsChannel = broadcast::Receiver<ScannerEvent>;

/// Sender for scanner events.
pub type ScannerEventsSender = broadcast::Sender<ScannerEvent>;

/// Create a new event channel pair.
#[must_use]
pub fn create_event_channel() -> (ScannerEventsSender, ScannerEventsChannel) {
    broadcast::channel(256)
}
