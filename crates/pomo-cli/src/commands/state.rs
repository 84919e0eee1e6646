//! State command showing the running timer and today's totals.

use std::io::Write;

use anyhow::Result;
use pomo_core::{LONG_BREAK_THRESHOLD, OwnerId, StateSnapshot};
use pomo_engine::Engine;

use super::output::{format_clock, write_json};

pub fn run<W: Write>(
    writer: &mut W,
    engine: &mut Engine,
    owner: Option<&OwnerId>,
    json: bool,
) -> Result<()> {
    let snapshot = engine.get_state(owner)?;
    render(writer, &snapshot, json)
}

pub fn render<W: Write>(writer: &mut W, snapshot: &StateSnapshot, json: bool) -> Result<()> {
    if json {
        return write_json(writer, snapshot);
    }

    writeln!(writer, "Mode:      {}", snapshot.mode)?;
    if let Some(planned) = snapshot.planned_duration_seconds {
        writeln!(
            writer,
            "Remaining: {} of {}",
            format_clock(snapshot.remaining_seconds),
            format_clock(planned)
        )?;
    }
    let plural = if snapshot.completed_focus_count == 1 { "" } else { "s" };
    writeln!(
        writer,
        "Today:     {} focus session{plural}, {} focused",
        snapshot.completed_focus_count,
        format_clock(snapshot.total_focus_seconds)
    )?;
    if let Some(cycle) = snapshot.cycle_count {
        writeln!(writer, "Cycle:     {cycle} of {LONG_BREAK_THRESHOLD}")?;
    }
    if snapshot.suggest_long_break == Some(true) {
        writeln!(
            writer,
            "Time for a long break: run `pomo long-break`, or `pomo decline` to keep going."
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use insta::assert_snapshot;
    use pomo_core::Mode;
    use pomo_db::Database;
    use pomo_engine::EngineOptions;

    fn idle() -> StateSnapshot {
        StateSnapshot {
            mode: Mode::Idle,
            remaining_seconds: 0,
            completed_focus_count: 0,
            total_focus_seconds: 0,
            planned_duration_seconds: None,
            cycle_count: Some(0),
            suggest_long_break: Some(false),
        }
    }

    fn render_to_string(snapshot: &StateSnapshot, json: bool) -> String {
        let mut output = Vec::new();
        render(&mut output, snapshot, json).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn renders_idle_state() {
        assert_snapshot!(render_to_string(&idle(), false), @r"
        Mode:      idle
        Today:     0 focus sessions, 00:00 focused
        Cycle:     0 of 4
        ");
    }

    #[test]
    fn renders_running_focus() {
        let snapshot = StateSnapshot {
            mode: Mode::Focus,
            remaining_seconds: 1234,
            completed_focus_count: 1,
            total_focus_seconds: 1500,
            planned_duration_seconds: Some(1500),
            cycle_count: Some(1),
            suggest_long_break: Some(false),
        };
        assert_snapshot!(render_to_string(&snapshot, false), @r"
        Mode:      focus
        Remaining: 20:34 of 25:00
        Today:     1 focus session, 25:00 focused
        Cycle:     1 of 4
        ");
    }

    #[test]
    fn renders_long_break_suggestion() {
        let snapshot = StateSnapshot {
            completed_focus_count: 4,
            total_focus_seconds: 6000,
            cycle_count: Some(4),
            suggest_long_break: Some(true),
            ..idle()
        };
        assert_snapshot!(render_to_string(&snapshot, false), @r"
        Mode:      idle
        Today:     4 focus sessions, 1:40:00 focused
        Cycle:     4 of 4
        Time for a long break: run `pomo long-break`, or `pomo decline` to keep going.
        ");
    }

    #[test]
    fn json_omits_cycle_fields_when_disabled() {
        let snapshot = StateSnapshot {
            cycle_count: None,
            suggest_long_break: None,
            ..idle()
        };
        let body: serde_json::Value =
            serde_json::from_str(&render_to_string(&snapshot, true)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "mode": "idle",
                "remaining_seconds": 0,
                "completed_focus_count": 0,
                "total_focus_seconds": 0,
            })
        );
    }

    #[test]
    fn run_reads_engine_state() {
        let mut engine = Engine::new(Database::open_in_memory().unwrap(), EngineOptions::default());
        let mut output = Vec::new();
        run(&mut output, &mut engine, None, true).unwrap();
        let body: serde_json::Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(body["mode"], "idle");
        assert_eq!(body["cycle_count"], 0);
        assert_eq!(body["suggest_long_break"], false);
    }
}
