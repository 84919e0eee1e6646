//! Core domain logic for the pomodoro timer.
//!
//! This crate contains the storage-independent pieces:
//! - Validation of start requests (durations and tags)
//! - Sessions and the remaining-time arithmetic derived from them
//! - State snapshots, daily rollup windows and the long-break policy
//! - Named focus/break presets

pub mod preset;
pub mod session;
pub mod snapshot;
pub mod stats;
pub mod types;
pub mod validation;

pub use preset::{DEFAULT_PRESET, Preset, builtin_presets};
pub use session::{CreatedSession, NewSession, Session, SessionId, format_utc};
pub use snapshot::{Ack, StateSnapshot};
pub use stats::{
    DailyEntry, DailyTotals, LONG_BREAK_MINUTES, LONG_BREAK_THRESHOLD, StatsWindow, TagStats,
    fill_window, suggests_long_break,
};
pub use types::{
    DURATION_FIELD, Mode, OwnerId, PlannedDuration, SessionKind, SessionStatus, TAG_FIELD, Tag,
    ValidationError,
};
pub use validation::{
    BREAK_DEFAULT_MINUTES, FOCUS_DEFAULT_MINUTES, MAX_DURATION_MINUTES, MAX_TAG_CHARS,
    MIN_DURATION_MINUTES, StartRequest, ValidStart, validate_duration, validate_tag,
};
