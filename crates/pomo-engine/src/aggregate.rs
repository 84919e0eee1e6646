//! Rollups over stored daily totals and sessions.
//!
//! These are read-only: an expired but uncompleted session is not settled
//! here and will be counted once a state query completes it.

use chrono::{DateTime, Utc};
use pomo_core::{DailyEntry, OwnerId, StatsWindow, Tag, TagStats, fill_window};

use crate::engine::Engine;
use crate::error::EngineError;

/// Number of tags returned by [`Engine::recent_tags`] when callers have no
/// preference.
pub const DEFAULT_RECENT_TAGS_LIMIT: usize = 10;

impl Engine {
    /// Last 7 days ending today, oldest first.
    pub fn weekly_stats(&self, owner: Option<&OwnerId>) -> Result<Vec<DailyEntry>, EngineError> {
        self.window_stats_at(owner, StatsWindow::Week, Utc::now())
    }

    /// Last 30 days ending today, oldest first.
    pub fn monthly_stats(&self, owner: Option<&OwnerId>) -> Result<Vec<DailyEntry>, EngineError> {
        self.window_stats_at(owner, StatsWindow::Month, Utc::now())
    }

    /// One entry per day of `window` ending on `now`'s date; days without
    /// stats are zero-filled.
    pub fn window_stats_at(
        &self,
        owner: Option<&OwnerId>,
        window: StatsWindow,
        now: DateTime<Utc>,
    ) -> Result<Vec<DailyEntry>, EngineError> {
        let owner = self.scope(owner)?;
        let today = now.date_naive();
        let rows = self
            .db
            .daily_totals_in_range(owner, window.start(today), today)?;
        Ok(fill_window(today, window, &rows))
    }

    /// Completed focus totals grouped by tag: untagged first, then tags in ascending order.
    pub fn stats_by_tag(&self, owner: Option<&OwnerId>) -> Result<Vec<TagStats>, EngineError> {
        let owner = self.scope(owner)?;
        Ok(self.db.stats_by_tag(owner)?)
    }

    /// Distinct tags, most recently used first.
    pub fn recent_tags(
        &self,
        owner: Option<&OwnerId>,
        limit: usize,
    ) -> Result<Vec<Tag>, EngineError> {
        let owner = self.scope(owner)?;
        Ok(self.db.recent_tags(owner, limit)?)
    }
}
