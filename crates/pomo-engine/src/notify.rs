//! State-change notifications.
//!
//! The engine hands every fresh snapshot to its observers after a mutation.
//! Delivery is fire-and-forget: observers cannot fail or roll back the change
//! that triggered them, and the engine never waits on a subscriber.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use pomo_core::{OwnerId, SessionId, StateSnapshot};
use serde::Serialize;
use tokio::sync::broadcast;

/// Default number of changes buffered per owner channel.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 16;

/// What caused a state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum ChangeCause {
    Started { session_id: SessionId },
    Stopped { session_id: Option<SessionId> },
    Completed { session_id: SessionId },
    /// Completed by a state query that found the session past its planned end.
    Expired { session_id: SessionId },
    LongBreakDeclined,
}

/// A state change for one owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateChange {
    pub owner: Option<OwnerId>,
    pub cause: ChangeCause,
    pub snapshot: StateSnapshot,
}

/// Receives state changes from the engine.
///
/// Called synchronously on the caller's thread once the change is committed.
/// Implementations must not block or panic: a panic unwinds into the engine
/// caller with the change already stored, and the remaining observers miss it.
pub trait StateObserver: Send + Sync {
    fn state_changed(&self, change: &StateChange);
}

/// Fans state changes out to per-owner broadcast channels.
///
/// Transports subscribe to an owner's channel and forward what they receive
/// over their own connections. Changes for owners with no subscribers are
/// dropped.
#[derive(Debug)]
pub struct BroadcastHub {
    capacity: usize,
    channels: Mutex<HashMap<Option<OwnerId>, broadcast::Sender<StateChange>>>,
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}

impl BroadcastHub {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            channels: Mutex::new(HashMap::new()),
        }
    }

    /// Subscribes to changes for `owner` (`None` in single-tenant mode).
    pub fn subscribe(&self, owner: Option<&OwnerId>) -> broadcast::Receiver<StateChange> {
        let mut channels = self.channels.lock().unwrap_or_else(PoisonError::into_inner);
        channels
            .entry(owner.cloned())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// Number of live subscribers for `owner`.
    pub fn subscriber_count(&self, owner: Option<&OwnerId>) -> usize {
        let channels = self.channels.lock().unwrap_or_else(PoisonError::into_inner);
        channels
            .get(&owner.cloned())
            .map_or(0, broadcast::Sender::receiver_count)
    }
}

impl StateObserver for BroadcastHub {
    fn state_changed(&self, change: &StateChange) {
        let mut channels = self.channels.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(sender) = channels.get(&change.owner) else {
            return;
        };
        if sender.send(change.clone()).is_err() {
            // Every receiver is gone; forget the channel.
            channels.remove(&change.owner);
            tracing::trace!(owner = ?change.owner, "dropped change without subscribers");
        }
    }
}
