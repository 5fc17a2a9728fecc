//! Display state and rendering surfaces.

use chrono::Local;
use parking_lot::Mutex;
use serde::Serialize;
use std::io::Write;
use tracing::warn;

/// Glyph shown for an absent detail field.
pub const PLACEHOLDER: &str = "—";

/// Detail note for a granted ticket.
pub const NOTE_RECORDED: &str = "recorded as used";
/// Detail note when the server cannot be reached.
pub const NOTE_UNREACHABLE: &str = "could not reach server";
/// Detail note when the camera decoder cannot start.
pub const NOTE_CAMERA: &str = "check camera permissions";
/// Detail note while a verification is pending.
pub const NOTE_CHECKING: &str = "Verifying QR with server...";

/// Status indicator mode. Exactly one is shown at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusMode {
    /// Waiting for, or checking, a scan.
    Idle,
    /// Entry granted.
    Valid,
    /// Ticket already consumed.
    Used,
    /// Rejected, or something went wrong.
    Invalid,
}

impl StatusMode {
    /// Short tag used by the terminal renderer.
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Self::Idle => "IDLE",
            Self::Valid => "VALID",
            Self::Used => "USED",
            Self::Invalid => "INVALID",
        }
    }
}

/// Everything shown on the rendering surface.
///
/// Each transition builds a fresh value; states are never merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayState {
    /// Status indicator mode.
    pub mode: StatusMode,
    /// Human-readable status label.
    pub status_text: String,
    /// Ticket holder name.
    pub name: Option<String>,
    /// Event name.
    pub event: Option<String>,
    /// Ticket identifier.
    pub ticket: Option<String>,
    /// Extra note below the details.
    pub extra: Option<String>,
}

impl DisplayState {
    /// Build a state. Empty strings are treated as absent.
    #[must_use]
    pub fn new(
        mode: StatusMode,
        status_text: impl Into<String>,
        name: Option<String>,
        event: Option<String>,
        ticket: Option<String>,
        extra: Option<String>,
    ) -> Self {
        Self {
            mode,
            status_text: status_text.into(),
            name: non_empty(name),
            event: non_empty(event),
            ticket: non_empty(ticket),
            extra: non_empty(extra),
        }
    }

    /// Shown before the first scan.
    #[must_use]
    pub fn ready() -> Self {
        Self::new(StatusMode::Idle, "Ready to scan", None, None, None, None)
    }

    /// Shown while a verification is in flight.
    #[must_use]
    pub fn checking() -> Self {
        Self::new(
            StatusMode::Idle,
            "Checking ticket...",
            None,
            None,
            None,
            Some(NOTE_CHECKING.to_string()),
        )
    }

    /// Shown when the decoder cannot start.
    #[must_use]
    pub fn camera_unavailable() -> Self {
        Self::new(
            StatusMode::Invalid,
            "Cannot access camera",
            None,
            None,
            None,
            Some(NOTE_CAMERA.to_string()),
        )
    }

    /// Name, or the placeholder.
    #[must_use]
    pub fn name_or_placeholder(&self) -> &str {
        self.name.as_deref().unwrap_or(PLACEHOLDER)
    }

    /// Event, or the placeholder.
    #[must_use]
    pub fn event_or_placeholder(&self) -> &str {
        self.event.as_deref().unwrap_or(PLACEHOLDER)
    }

    /// Ticket id, or the placeholder.
    #[must_use]
    pub fn ticket_or_placeholder(&self) -> &str {
        self.ticket.as_deref().unwrap_or(PLACEHOLDER)
    }

    /// Extra note, or an empty string.
    #[must_use]
    pub fn extra_or_empty(&self) -> &str {
        self.extra.as_deref().unwrap_or("")
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// A surface that shows the current display state.
pub trait Renderer: Send + Sync + 'static {
    /// Replace whatever is shown with `state`.
    fn render(&self, state: &DisplayState);
}

/// Plain-text renderer for a terminal at the gate.
pub struct TerminalRenderer {
    out: Mutex<Box<dyn Write + Send>>,
}

impl TerminalRenderer {
    /// Render to stdout.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(Box::new(std::io::stdout()))
    }

    /// Render to an arbitrary writer.
    #[must_use]
    pub fn new(out: Box<dyn Write + Send>) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    fn write_state(out: &mut dyn Write, state: &DisplayState) -> std::io::Result<()> {
        writeln!(
            out,
            "[{}] {:<7} {}",
            Local::now().format("%H:%M:%S"),
            state.mode.tag(),
            state.status_text
        )?;
        writeln!(out, "    Name:   {}", state.name_or_placeholder())?;
        writeln!(out, "    Event:  {}", state.event_or_placeholder())?;
        writeln!(out, "    Ticket: {}", state.ticket_or_placeholder())?;
        if let Some(extra) = &state.extra {
            writeln!(out, "    {extra}")?;
        }
        out.flush()
    }
}

impl Renderer for TerminalRenderer {
    fn render(&self, state: &DisplayState) {
        let mut out = self.out.lock();
        if let Err(e) = Self::write_state(&mut **out, state) {
            warn!("Failed to render scan result: {e}");
        }
    }
}

/// Line-delimited JSON renderer for kiosk front ends.
pub struct JsonRenderer {
    out: Mutex<Box<dyn Write + Send>>,
}

#[derive(Serialize)]
struct JsonLine<'a> {
    #[serde(flatten)]
    state: &'a DisplayState,
    rendered_at: chrono::DateTime<chrono::Utc>,
}

impl JsonRenderer {
    /// Render to stdout.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(Box::new(std::io::stdout()))
    }

    /// Render to an arbitrary writer.
    #[must_use]
    pub fn new(out: Box<dyn Write + Send>) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    fn write_line(out: &mut dyn Write, line: &JsonLine<'_>) -> std::io::Result<()> {
        serde_json::to_writer(&mut *out, line)?;
        writeln!(out)?;
        out.flush()
    }
}

impl Renderer for JsonRenderer {
    fn render(&self, state: &DisplayState) {
        let line = JsonLine {
            state,
            rendered_at: chrono::Utc::now(),
        };
        let mut out = self.out.lock();
        if let Err(e) = Self::write_line(&mut **out, &line) {
            warn!("Failed to render scan result: {e}");
        }
    }
}
