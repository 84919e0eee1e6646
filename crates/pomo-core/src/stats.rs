//! Daily aggregates, trailing windows, and the long-break policy.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::{Mode, Tag};

/// Completed focus sessions needed before a long break is suggested.
pub const LONG_BREAK_THRESHOLD: i64 = 4;

/// Fixed length of a long break, in minutes.
pub const LONG_BREAK_MINUTES: u32 = 15;

/// Accumulated focus totals for one owner on one UTC day.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyTotals {
    pub completed_focus_count: i64,
    pub total_focus_seconds: i64,
    /// Focus sessions completed since the last long break or decline.
    pub cycle_count: i64,
}

/// Whether the snapshot should suggest a long break.
pub const fn suggests_long_break(cycle_count: i64, mode: Mode) -> bool {
    cycle_count >= LONG_BREAK_THRESHOLD && matches!(mode, Mode::Idle)
}

/// Trailing window lengths for rollups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatsWindow {
    Week,
    Month,
}

impl StatsWindow {
    /// Number of calendar days covered, today included.
    pub const fn days(self) -> i64 {
        match self {
            Self::Week => 7,
            Self::Month => 30,
        }
    }

    /// First day of the window ending on `today`.
    pub fn start(self, today: NaiveDate) -> NaiveDate {
        today - chrono::Duration::days(self.days() - 1)
    }
}

/// One day in a weekly or monthly rollup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyEntry {
    pub date: NaiveDate,
    pub focus_count: i64,
    pub total_seconds: i64,
    /// `1.0` on any day with a completed focus session, otherwise `0.0`.
    pub completion_rate: f64,
}

impl DailyEntry {
    fn from_totals(date: NaiveDate, totals: DailyTotals) -> Self {
        let completion_rate = if totals.completed_focus_count > 0 {
            1.0
        } else {
            0.0
        };
        Self {
            date,
            focus_count: totals.completed_focus_count,
            total_seconds: totals.total_focus_seconds,
            completion_rate,
        }
    }
}

/// Builds one entry per day of `window`, oldest first, ending on `today`.
///
/// Days missing from `rows` are reported as zeros. Rows outside the window
/// are ignored.
pub fn fill_window(
    today: NaiveDate,
    window: StatsWindow,
    rows: &[(NaiveDate, DailyTotals)],
) -> Vec<DailyEntry> {
    let by_date: HashMap<NaiveDate, DailyTotals> = rows.iter().copied().collect();
    let start = window.start(today);
    start
        .iter_days()
        .take_while(|date| *date <= today)
        .map(|date| {
            let totals = by_date.get(&date).copied().unwrap_or_default();
            DailyEntry::from_totals(date, totals)
        })
        .collect()
}

/// Completed focus totals for one tag; `tag` is `None` for untagged sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagStats {
    pub tag: Option<Tag>,
    pub completed_focus_count: i64,
    pub total_focus_seconds: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn week_window_is_seven_ascending_days_ending_today() {
        let today = date(2025, 3, 2);
        let entries = fill_window(today, StatsWindow::Week, &[]);

        assert_eq!(entries.len(), 7);
        assert_eq!(entries[0].date, date(2025, 2, 24));
        assert_eq!(entries[6].date, today);
        assert!(entries.windows(2).all(|w| w[0].date < w[1].date));
        assert!(entries.iter().all(|e| e.focus_count == 0
            && e.total_seconds == 0
            && e.completion_rate.abs() < f64::EPSILON));
    }

    #[test]
    fn month_window_has_thirty_days() {
        let today = date(2025, 1, 15);
        let entries = fill_window(today, StatsWindow::Month, &[]);
        assert_eq!(entries.len(), 30);
        assert_eq!(entries[0].date, date(2024, 12, 17));
    }

    #[test]
    fn window_fills_known_days_and_ignores_outside_rows() {
        let today = date(2025, 1, 10);
        let rows = [
            (
                date(2025, 1, 9),
                DailyTotals {
                    completed_focus_count: 2,
                    total_focus_seconds: 3300,
                    cycle_count: 2,
                },
            ),
            (
                date(2024, 12, 1),
                DailyTotals {
                    completed_focus_count: 9,
                    total_focus_seconds: 9,
                    cycle_count: 0,
                },
            ),
        ];
        let entries = fill_window(today, StatsWindow::Week, &rows);

        assert_eq!(entries.len(), 7);
        assert_eq!(entries[5].focus_count, 2);
        assert_eq!(entries[5].total_seconds, 3300);
        assert!((entries[5].completion_rate - 1.0).abs() < f64::EPSILON);
        assert_eq!(entries.iter().map(|e| e.focus_count).sum::<i64>(), 2);
    }

    #[test]
    fn long_break_suggested_only_when_idle() {
        assert!(!suggests_long_break(3, Mode::Idle));
        assert!(suggests_long_break(4, Mode::Idle));
        assert!(suggests_long_break(7, Mode::Idle));
        assert!(!suggests_long_break(4, Mode::Focus));
        assert!(!suggests_long_break(4, Mode::Break));
    }

    #[test]
    fn daily_entry_serializes_iso_date() {
        let entries = fill_window(date(2025, 1, 1), StatsWindow::Week, &[]);
        let json = serde_json::to_value(&entries[6]).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "date": "2025-01-01",
                "focus_count": 0,
                "total_seconds": 0,
                "completion_rate": 0.0,
            })
        );
    }
}
