//! The state snapshot returned by state queries and pushed to observers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::Session;
use crate::stats::{DailyTotals, suggests_long_break};
use crate::types::Mode;

/// Present-moment view of one owner's timer and today's totals.
///
/// Optional fields are omitted from JSON when absent: the planned duration
/// while idle, and the cycle fields when the long-break feature is off.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub mode: Mode,
    pub remaining_seconds: i64,
    pub completed_focus_count: i64,
    pub total_focus_seconds: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub planned_duration_seconds: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cycle_count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggest_long_break: Option<bool>,
}

impl StateSnapshot {
    /// Builds a snapshot from the running session (if still running at `now`)
    /// and today's totals.
    ///
    /// Callers complete expired sessions before building, so `active` is
    /// expected to have time left; an expired one is reported as idle.
    pub fn build(
        active: Option<&Session>,
        totals: DailyTotals,
        long_break: bool,
        now: DateTime<Utc>,
    ) -> Self {
        let running = active.filter(|session| !session.is_expired_at(now));
        let (mode, remaining_seconds, planned_duration_seconds) = match running {
            Some(session) => (
                Mode::from(session.kind),
                session.remaining_seconds_at(now),
                Some(session.planned_duration.seconds()),
            ),
            None => (Mode::Idle, 0, None),
        };
        let (cycle_count, suggest_long_break) = if long_break {
            (
                Some(totals.cycle_count),
                Some(suggests_long_break(totals.cycle_count, mode)),
            )
        } else {
            (None, None)
        };
        Self {
            mode,
            remaining_seconds,
            completed_focus_count: totals.completed_focus_count,
            total_focus_seconds: totals.total_focus_seconds,
            planned_duration_seconds,
            cycle_count,
            suggest_long_break,
        }
    }

    pub const fn is_idle(&self) -> bool {
        matches!(self.mode, Mode::Idle)
    }
}

/// Acknowledgement for operations with no other result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    pub status: String,
}

impl Ack {
    pub fn stopped() -> Self {
        Self {
            status: "stopped".to_string(),
        }
    }

    pub fn declined() -> Self {
        Self {
            status: "declined".to_string(),
        }
    }
}
