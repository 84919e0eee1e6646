//! Session/state engine for the pomodoro timer.
//!
//! This crate ties the domain types to storage:
//! - Timer operations: starting, stopping and completing sessions, with lazy
//!   expiry on state queries
//! - Aggregation: weekly/monthly rollups, per-tag totals, recent tags
//! - Notifications: observers and a per-owner broadcast hub
//!
//! Each operation takes an optional owner. In single-tenant mode pass `None`;
//! with [`EngineOptions::multi_user`] set, an owner is required.

mod aggregate;
mod engine;
mod error;
pub mod notify;
mod timer;

pub use aggregate::DEFAULT_RECENT_TAGS_LIMIT;
pub use engine::{Engine, EngineOptions};
pub use error::{EngineError, ErrorKind};
pub use notify::{BroadcastHub, ChangeCause, StateChange, StateObserver};
