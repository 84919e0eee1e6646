//! The engine value shared by the timer and aggregation operations.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use pomo_core::{OwnerId, StateSnapshot};
use pomo_db::Database;

use crate::error::EngineError;
use crate::notify::{ChangeCause, StateChange, StateObserver};

/// Feature switches for an engine instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    /// Require an owner on every call and scope all data to it.
    pub multi_user: bool,
    /// Track cycle counts in snapshots and suggest long breaks.
    pub long_break: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            multi_user: false,
            long_break: true,
        }
    }
}

/// Session/state engine over a [`Database`].
///
/// The engine keeps no timers of its own. Remaining time and expiry are
/// derived from the stored planned end whenever state is queried, so an
/// engine can be created per request without losing anything.
pub struct Engine {
    pub(crate) db: Database,
    pub(crate) options: EngineOptions,
    observers: Vec<Arc<dyn StateObserver>>,
}

impl Engine {
    pub fn new(db: Database, options: EngineOptions) -> Self {
        Self {
            db,
            options,
            observers: Vec::new(),
        }
    }

    /// Registers an observer for state changes.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn StateObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn add_observer(&mut self, observer: Arc<dyn StateObserver>) {
        self.observers.push(observer);
    }

    pub const fn options(&self) -> EngineOptions {
        self.options
    }

    pub const fn database(&self) -> &Database {
        &self.db
    }

    /// Checks the owner against the multi-user setting.
    pub(crate) fn scope<'a>(
        &self,
        owner: Option<&'a OwnerId>,
    ) -> Result<Option<&'a OwnerId>, EngineError> {
        if self.options.multi_user && owner.is_none() {
            return Err(EngineError::OwnerRequired);
        }
        Ok(owner)
    }

    /// Builds the snapshot for `owner` from stored state, without completing
    /// anything.
    pub(crate) fn snapshot_at(
        &self,
        owner: Option<&OwnerId>,
        now: DateTime<Utc>,
    ) -> Result<StateSnapshot, EngineError> {
        let active = self.db.active_session(owner)?;
        let totals = self
            .db
            .daily_totals(owner, now.date_naive())?
            .unwrap_or_default();
        Ok(StateSnapshot::build(
            active.as_ref(),
            totals,
            self.options.long_break,
            now,
        ))
    }

    /// Publishes the current snapshot to every observer.
    ///
    /// Failures are logged and swallowed: the mutation that triggered the
    /// notification has already been committed.
    pub(crate) fn notify(&self, owner: Option<&OwnerId>, cause: ChangeCause, now: DateTime<Utc>) {
        if self.observers.is_empty() {
            return;
        }
        let snapshot = match self.snapshot_at(owner, now) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                tracing::warn!(error = %err, ?cause, "failed to build snapshot for observers");
                return;
            }
        };
        self.publish(&StateChange {
            owner: owner.cloned(),
            cause,
            snapshot,
        });
    }

    pub(crate) fn publish(&self, change: &StateChange) {
        for observer in &self.observers {
            observer.state_changed(change);
        }
    }
}
