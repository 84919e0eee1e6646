//! Stats and tags commands.

use std::io::Write;

use anyhow::Result;
use pomo_core::{DailyEntry, OwnerId, Tag, TagStats};
use pomo_engine::Engine;

use super::output::{format_clock, write_json};
use crate::cli::StatsCommand;

const UNTAGGED: &str = "(untagged)";

pub fn run<W: Write>(
    writer: &mut W,
    engine: &Engine,
    owner: Option<&OwnerId>,
    command: StatsCommand,
    json: bool,
) -> Result<()> {
    match command {
        StatsCommand::Week => render_daily(writer, &engine.weekly_stats(owner)?, json),
        StatsCommand::Month => render_daily(writer, &engine.monthly_stats(owner)?, json),
        StatsCommand::Tags => render_tags(writer, &engine.stats_by_tag(owner)?, json),
    }
}

/// Lists recently used tags, newest first.
pub fn recent_tags<W: Write>(
    writer: &mut W,
    engine: &Engine,
    owner: Option<&OwnerId>,
    limit: usize,
    json: bool,
) -> Result<()> {
    let tags = engine.recent_tags(owner, limit)?;
    if json {
        return write_json(writer, &tags);
    }
    if tags.is_empty() {
        writeln!(writer, "No tags used yet.")?;
    }
    for tag in &tags {
        writeln!(writer, "{tag}")?;
    }
    Ok(())
}

pub fn render_daily<W: Write>(writer: &mut W, entries: &[DailyEntry], json: bool) -> Result<()> {
    if json {
        return write_json(writer, entries);
    }
    writeln!(writer, "{:<10}  {:>5}  {:>8}", "Date", "Focus", "Time")?;
    for entry in entries {
        let mark = if entry.completion_rate > 0.0 { "  *" } else { "" };
        writeln!(
            writer,
            "{:<10}  {:>5}  {:>8}{mark}",
            entry.date.format("%Y-%m-%d"),
            entry.focus_count,
            format_clock(entry.total_seconds)
        )?;
    }
    let sessions: i64 = entries.iter().map(|e| e.focus_count).sum();
    let seconds: i64 = entries.iter().map(|e| e.total_seconds).sum();
    writeln!(
        writer,
        "{:<10}  {:>5}  {:>8}",
        "Total",
        sessions,
        format_clock(seconds)
    )?;
    Ok(())
}

pub fn render_tags<W: Write>(writer: &mut W, stats: &[TagStats], json: bool) -> Result<()> {
    if json {
        return write_json(writer, stats);
    }
    if stats.is_empty() {
        writeln!(writer, "No completed focus sessions.")?;
        return Ok(());
    }
    let width = stats
        .iter()
        .map(|s| s.tag.as_ref().map_or(UNTAGGED.len(), |t| t.as_str().chars().count()))
        .max()
        .unwrap_or(0)
        .max("Tag".len());
    writeln!(writer, "{:<width$}  {:>5}  {:>8}", "Tag", "Focus", "Time")?;
    for entry in stats {
        let name = entry.tag.as_ref().map_or(UNTAGGED, Tag::as_str);
        writeln!(
            writer,
            "{name:<width$}  {:>5}  {:>8}",
            entry.completed_focus_count,
            format_clock(entry.total_focus_seconds)
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::NaiveDate;
    use insta::assert_snapshot;
    use pomo_db::Database;
    use pomo_engine::EngineOptions;

    fn entry(day: u32, focus_count: i64, total_seconds: i64) -> DailyEntry {
        DailyEntry {
            date: NaiveDate::from_ymd_opt(2025, 1, day).unwrap(),
            focus_count,
            total_seconds,
            completion_rate: if focus_count > 0 { 1.0 } else { 0.0 },
        }
    }

    #[test]
    fn renders_daily_table() {
        let entries = vec![entry(13, 0, 0), entry(14, 2, 3300), entry(15, 1, 1500)];
        let mut output = Vec::new();
        render_daily(&mut output, &entries, false).unwrap();
        assert_snapshot!(String::from_utf8(output).unwrap(), @r"
        Date        Focus      Time
        2025-01-13      0     00:00
        2025-01-14      2     55:00  *
        2025-01-15      1     25:00  *
        Total           3   1:20:00
        ");
    }

    #[test]
    fn daily_json_uses_wire_keys() {
        let mut output = Vec::new();
        render_daily(&mut output, &[entry(14, 2, 3300)], true).unwrap();
        let body: serde_json::Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(
            body,
            serde_json::json!([{
                "date": "2025-01-14",
                "focus_count": 2,
                "total_seconds": 3300,
                "completion_rate": 1.0,
            }])
        );
    }

    #[test]
    fn renders_tag_table() {
        let stats = vec![
            TagStats {
                tag: None,
                completed_focus_count: 1,
                total_focus_seconds: 1500,
            },
            TagStats {
                tag: Some(Tag::new("Writing").unwrap()),
                completed_focus_count: 2,
                total_focus_seconds: 3000,
            },
        ];
        let mut output = Vec::new();
        render_tags(&mut output, &stats, false).unwrap();
        assert_snapshot!(String::from_utf8(output).unwrap(), @r"
        Tag         Focus      Time
        (untagged)      1     25:00
        Writing         2     50:00
        ");
    }

    #[test]
    fn weekly_stats_have_seven_rows() {
        let engine = Engine::new(Database::open_in_memory().unwrap(), EngineOptions::default());
        let mut output = Vec::new();
        run(&mut output, &engine, None, StatsCommand::Week, true).unwrap();
        let body: Vec<DailyEntry> = serde_json::from_slice(&output).unwrap();
        assert_eq!(body.len(), 7);
        assert!(body.iter().all(|e| e.focus_count == 0));
    }

    #[test]
    fn recent_tags_when_empty() {
        let engine = Engine::new(Database::open_in_memory().unwrap(), EngineOptions::default());
        let mut output = Vec::new();
        recent_tags(&mut output, &engine, None, 10, false).unwrap();
        assert_eq!(String::from_utf8(output).unwrap(), "No tags used yet.\n");
    }
}
