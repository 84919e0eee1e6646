//! Shared output helpers for CLI commands.

use std::io::Write;

use anyhow::{Context, Result};
use pomo_engine::{EngineError, ErrorKind};
use serde::Serialize;

/// Exit code for input the engine rejected.
pub const EXIT_INVALID_INPUT: u8 = 2;
/// Exit code when another session is already running.
pub const EXIT_CONFLICT: u8 = 3;

/// Writes `value` as pretty JSON followed by a newline.
pub fn write_json<W: Write, T: Serialize + ?Sized>(writer: &mut W, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *writer, value).context("failed to serialize output")?;
    writeln!(writer)?;
    Ok(())
}

/// Formats seconds as `mm:ss`, or `h:mm:ss` from one hour up.
pub fn format_clock(seconds: i64) -> String {
    let seconds = seconds.max(0);
    let (hours, minutes, secs) = (seconds / 3600, seconds % 3600 / 60, seconds % 60);
    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes:02}:{secs:02}")
    }
}

/// JSON error body: the message plus the offending field for input errors.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<&'static str>,
}

impl ErrorBody {
    pub fn from_error(err: &anyhow::Error) -> Self {
        match err.downcast_ref::<EngineError>() {
            Some(engine) => Self {
                error: engine.to_string(),
                field: engine.field(),
            },
            None => Self {
                error: format!("{err:#}"),
                field: None,
            },
        }
    }
}

/// Maps a failure to the process exit code.
pub fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<EngineError>().map(EngineError::kind) {
        Some(ErrorKind::SessionConflict) => EXIT_CONFLICT,
        Some(
            ErrorKind::InvalidDuration
            | ErrorKind::InvalidTag
            | ErrorKind::InvalidInput
            | ErrorKind::OwnerRequired,
        ) => EXIT_INVALID_INPUT,
        Some(ErrorKind::Storage) | None => 1,
    }
}
