//! Presets command listing the configured focus/break pairs.

use std::io::Write;

use anyhow::Result;
use serde::Serialize;

use super::output::write_json;
use crate::Config;

#[derive(Debug, Serialize)]
struct PresetRow<'a> {
    name: &'a str,
    focus: u32,
    #[serde(rename = "break")]
    break_minutes: u32,
    label: &'a str,
    default: bool,
}

pub fn run<W: Write>(writer: &mut W, config: &Config, json: bool) -> Result<()> {
    let rows: Vec<PresetRow<'_>> = config
        .presets
        .iter()
        .map(|(name, preset)| PresetRow {
            name,
            focus: preset.focus,
            break_minutes: preset.break_minutes,
            label: &preset.label,
            default: *name == config.default_preset,
        })
        .collect();

    if json {
        return write_json(writer, &rows);
    }
    for row in rows {
        let marker = if row.default { " (default)" } else { "" };
        writeln!(
            writer,
            "{:<8} {:>3}/{:<3} {}{marker}",
            row.name, row.focus, row.break_minutes, row.label
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use insta::assert_snapshot;

    #[test]
    fn lists_builtin_presets() {
        let mut output = Vec::new();
        run(&mut output, &Config::default(), false).unwrap();
        assert_snapshot!(String::from_utf8(output).unwrap(), @r"
        default   25/5   25/5 (standard) (default)
        long      50/10  50/10 (long)
        short     15/3   15/3 (short)
        ");
    }

    #[test]
    fn json_marks_default() {
        let config = Config {
            default_preset: "short".to_string(),
            ..Config::default()
        };
        let mut output = Vec::new();
        run(&mut output, &config, true).unwrap();
        let body: serde_json::Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(body[2]["name"], "short");
        assert_eq!(body[2]["default"], true);
        assert_eq!(body[2]["break"], 3);
        assert_eq!(body[0]["default"], false);
    }
}
