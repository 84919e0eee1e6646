//! Timer sessions and the time arithmetic derived from them.
//!
//! Nothing here reads the clock: every time-dependent answer takes `now`
//! explicitly, so callers decide when "now" is.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{OwnerId, PlannedDuration, SessionKind, SessionStatus, Tag};

/// Storage-assigned session identifier.
pub type SessionId = i64;

/// A focus or break interval.
///
/// `planned_end_at` is always `started_at + planned_duration`; `ended_at` is
/// set exactly once, when the session leaves [`SessionStatus::Active`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub owner: Option<OwnerId>,
    pub kind: SessionKind,
    #[serde(rename = "planned_duration_seconds")]
    pub planned_duration: PlannedDuration,
    pub started_at: DateTime<Utc>,
    pub planned_end_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub status: SessionStatus,
    pub tag: Option<Tag>,
}

impl Session {
    /// Whole seconds left until the planned end, rounded down.
    ///
    /// Zero or negative once the planned end is less than a second away.
    pub fn remaining_seconds_at(&self, now: DateTime<Utc>) -> i64 {
        self.planned_end_at.signed_duration_since(now).num_seconds()
    }

    /// Whether an active session has run out of time at `now`.
    ///
    /// A session with less than one whole second left counts as finished so
    /// that an active snapshot never reports zero remaining seconds.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.remaining_seconds_at(now) <= 0
    }

    pub const fn is_active(&self) -> bool {
        matches!(self.status, SessionStatus::Active)
    }
}

/// A session about to be inserted; the id is assigned by storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSession {
    pub owner: Option<OwnerId>,
    pub kind: SessionKind,
    pub planned_duration: PlannedDuration,
    pub started_at: DateTime<Utc>,
    pub tag: Option<Tag>,
}

impl NewSession {
    pub fn planned_end_at(&self) -> DateTime<Utc> {
        self.started_at + self.planned_duration.as_chrono()
    }
}

/// Response body for a successful start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedSession {
    pub id: SessionId,
    pub kind: SessionKind,
    /// RFC 3339 UTC timestamp with a `Z` suffix.
    pub planned_end_at: String,
    pub planned_duration_seconds: i64,
    pub tag: Option<Tag>,
}

impl From<&Session> for CreatedSession {
    fn from(session: &Session) -> Self {
        Self {
            id: session.id,
            kind: session.kind,
            planned_end_at: format_utc(session.planned_end_at),
            planned_duration_seconds: session.planned_duration.seconds(),
            tag: session.tag.clone(),
        }
    }
}

/// Formats a timestamp as RFC 3339 with millisecond precision and `Z`.
pub fn format_utc(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}
