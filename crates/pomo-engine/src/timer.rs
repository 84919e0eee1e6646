//! Timer operations: start, stop, complete, and state queries.
//!
//! Every operation has an `_at` variant taking the current time explicitly;
//! the plain variant passes `Utc::now()`.
//!
//! State queries have one visible side effect: an active session found past
//! its planned end is completed (and counted) before the snapshot is built.
//! Nothing else settles expired sessions: until a state query or an explicit
//! completion sees it, such a session still blocks a start and `stop` aborts it.

use chrono::{DateTime, Utc};
use pomo_core::{
    Ack, LONG_BREAK_MINUTES, OwnerId, PlannedDuration, Session, SessionId, SessionKind,
    StartRequest, StateSnapshot, ValidStart,
};

use crate::engine::Engine;
use crate::error::EngineError;
use crate::notify::ChangeCause;

/// How a completion was triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    Explicit,
    Expiry,
}

impl Trigger {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Explicit => "explicit",
            Self::Expiry => "expiry",
        }
    }
}

impl Engine {
    /// Starts a focus session (25 minutes unless the request says otherwise).
    pub fn start_focus(
        &mut self,
        owner: Option<&OwnerId>,
        request: &StartRequest,
    ) -> Result<Session, EngineError> {
        self.start_focus_at(owner, request, Utc::now())
    }

    pub fn start_focus_at(
        &mut self,
        owner: Option<&OwnerId>,
        request: &StartRequest,
        now: DateTime<Utc>,
    ) -> Result<Session, EngineError> {
        self.start_at(owner, SessionKind::Focus, request, now)
    }

    /// Starts a break (5 minutes unless the request says otherwise).
    pub fn start_break(
        &mut self,
        owner: Option<&OwnerId>,
        request: &StartRequest,
    ) -> Result<Session, EngineError> {
        self.start_break_at(owner, request, Utc::now())
    }

    pub fn start_break_at(
        &mut self,
        owner: Option<&OwnerId>,
        request: &StartRequest,
        now: DateTime<Utc>,
    ) -> Result<Session, EngineError> {
        self.start_at(owner, SessionKind::Break, request, now)
    }

    /// Starts a 15-minute break and zeroes today's cycle count.
    ///
    /// The reset and the insert share one transaction: on conflict the cycle
    /// count is left as it was.
    pub fn start_long_break(&mut self, owner: Option<&OwnerId>) -> Result<Session, EngineError> {
        self.start_long_break_at(owner, Utc::now())
    }

    pub fn start_long_break_at(
        &mut self,
        owner: Option<&OwnerId>,
        now: DateTime<Utc>,
    ) -> Result<Session, EngineError> {
        let owner = self.scope(owner)?;
        let start = ValidStart {
            duration: PlannedDuration::from_minutes(LONG_BREAK_MINUTES)?,
            tag: None,
        };
        self.insert(owner, SessionKind::Break, start, true, now)
    }

    /// Zeroes today's cycle count without starting anything.
    pub fn decline_long_break(&mut self, owner: Option<&OwnerId>) -> Result<Ack, EngineError> {
        self.decline_long_break_at(owner, Utc::now())
    }

    pub fn decline_long_break_at(
        &mut self,
        owner: Option<&OwnerId>,
        now: DateTime<Utc>,
    ) -> Result<Ack, EngineError> {
        let owner = self.scope(owner)?;
        let reset = self.db.reset_cycle_count(owner, now.date_naive())?;
        tracing::info!(event = "long_break_declined", owner = ?owner, reset, "long break declined");
        self.notify(owner, ChangeCause::LongBreakDeclined, now);
        Ok(Ack::declined())
    }

    /// Aborts the active session, if any.
    ///
    /// Never fails for lack of a session, and always notifies observers.
    pub fn stop(&mut self, owner: Option<&OwnerId>) -> Result<Ack, EngineError> {
        self.stop_at(owner, Utc::now())
    }

    pub fn stop_at(
        &mut self,
        owner: Option<&OwnerId>,
        now: DateTime<Utc>,
    ) -> Result<Ack, EngineError> {
        let owner = self.scope(owner)?;
        let aborted = self.db.abort_active_session(owner, now)?;
        match &aborted {
            Some(session) => tracing::info!(
                event = "session_stop",
                session_id = session.id,
                kind = %session.kind,
                duration = session.planned_duration.seconds(),
                status = %session.status,
                "session stopped"
            ),
            None => tracing::debug!(owner = ?owner, "stop with no active session"),
        }
        self.notify(
            owner,
            ChangeCause::Stopped {
                session_id: aborted.map(|session| session.id),
            },
            now,
        );
        Ok(Ack::stopped())
    }

    /// Completes an active session belonging to `owner`.
    ///
    /// Returns `None` (and changes nothing) for unknown, foreign or finished
    /// sessions. Focus completions are added to today's totals.
    pub fn complete_session(
        &mut self,
        owner: Option<&OwnerId>,
        id: SessionId,
    ) -> Result<Option<Session>, EngineError> {
        self.complete_session_at(owner, id, Utc::now())
    }

    pub fn complete_session_at(
        &mut self,
        owner: Option<&OwnerId>,
        id: SessionId,
        now: DateTime<Utc>,
    ) -> Result<Option<Session>, EngineError> {
        let owner = self.scope(owner)?;
        self.complete(owner, id, Trigger::Explicit, now)
    }

    /// Returns the present-moment state for `owner`.
    ///
    /// If the active session's planned end has passed, it is completed first
    /// (stats included) and the snapshot reports idle.
    pub fn get_state(&mut self, owner: Option<&OwnerId>) -> Result<StateSnapshot, EngineError> {
        self.get_state_at(owner, Utc::now())
    }

    pub fn get_state_at(
        &mut self,
        owner: Option<&OwnerId>,
        now: DateTime<Utc>,
    ) -> Result<StateSnapshot, EngineError> {
        let owner = self.scope(owner)?;
        self.settle_expired(owner, now)?;
        self.snapshot_at(owner, now)
    }

    /// Looks up one of `owner`'s sessions.
    pub fn get_session(
        &self,
        owner: Option<&OwnerId>,
        id: SessionId,
    ) -> Result<Option<Session>, EngineError> {
        let owner = self.scope(owner)?;
        Ok(self.db.get_session(owner, id)?)
    }

    fn start_at(
        &mut self,
        owner: Option<&OwnerId>,
        kind: SessionKind,
        request: &StartRequest,
        now: DateTime<Utc>,
    ) -> Result<Session, EngineError> {
        let owner = self.scope(owner)?;
        let start = request.validate(kind)?;
        self.insert(owner, kind, start, false, now)
    }

    fn insert(
        &mut self,
        owner: Option<&OwnerId>,
        kind: SessionKind,
        start: ValidStart,
        long_break: bool,
        now: DateTime<Utc>,
    ) -> Result<Session, EngineError> {
        let new = pomo_core::NewSession {
            owner: owner.cloned(),
            kind,
            planned_duration: start.duration,
            started_at: now,
            tag: start.tag,
        };
        let reset_cycle_on = long_break.then(|| now.date_naive());
        let session = self.db.start_session(&new, reset_cycle_on).map_err(|err| {
            let err = EngineError::from(err);
            if matches!(err, EngineError::SessionConflict) {
                tracing::info!(event = "session_conflict", owner = ?owner, %kind, "active session already exists");
            }
            err
        })?;
        tracing::info!(
            event = "session_start",
            session_id = session.id,
            kind = %session.kind,
            duration = session.planned_duration.seconds(),
            tag = session.tag.as_ref().map(pomo_core::Tag::as_str),
            long_break,
            "session started"
        );
        self.notify(
            owner,
            ChangeCause::Started {
                session_id: session.id,
            },
            now,
        );
        Ok(session)
    }

    fn complete(
        &mut self,
        owner: Option<&OwnerId>,
        id: SessionId,
        trigger: Trigger,
        now: DateTime<Utc>,
    ) -> Result<Option<Session>, EngineError> {
        let Some(session) = self.db.complete_session(owner, id, now)? else {
            tracing::debug!(session_id = id, "complete ignored: session not active");
            return Ok(None);
        };
        tracing::info!(
            event = "session_complete",
            session_id = session.id,
            kind = %session.kind,
            duration = session.planned_duration.seconds(),
            status = %session.status,
            trigger = trigger.as_str(),
            "session completed"
        );
        let cause = match trigger {
            Trigger::Explicit => ChangeCause::Completed {
                session_id: session.id,
            },
            Trigger::Expiry => ChangeCause::Expired {
                session_id: session.id,
            },
        };
        self.notify(owner, cause, now);
        Ok(Some(session))
    }

    /// Completes the active session if its planned end has passed.
    fn settle_expired(
        &mut self,
        owner: Option<&OwnerId>,
        now: DateTime<Utc>,
    ) -> Result<Option<Session>, EngineError> {
        let Some(active) = self.db.active_session(owner)? else {
            return Ok(None);
        };
        if !active.is_expired_at(now) {
            return Ok(None);
        }
        self.complete(owner, active.id, Trigger::Expiry, now)
    }
}
