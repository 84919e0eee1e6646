//! Session commands: start, break, long-break, decline, stop, complete, show.

use std::io::Write;

use anyhow::{Result, bail};
use clap::Args;
use pomo_core::{
    Ack, CreatedSession, OwnerId, Session, SessionId, SessionKind, StartRequest, ValidationError,
    format_utc,
};
use pomo_engine::{Engine, EngineError};
use serde::Serialize;
use serde_json::Value;

use super::output::{format_clock, write_json};
use crate::Config;

#[derive(Debug, Args)]
pub struct StartArgs {
    /// Session length in minutes (1-240); defaults to the preset.
    #[arg(short, long, conflicts_with = "preset", allow_hyphen_values = true)]
    pub minutes: Option<String>,
    /// Label for the session (at most 50 characters).
    #[arg(short, long)]
    pub tag: Option<String>,
    /// Preset to take the length from.
    #[arg(short, long)]
    pub preset: Option<String>,
}

/// Builds the engine request for a start command.
///
/// `--minutes` is passed through as a JSON number when it parses as one and as
/// a string otherwise, so the engine reports non-numeric input itself.
pub fn build_request(
    config: &Config,
    kind: SessionKind,
    args: &StartArgs,
) -> Result<StartRequest, ValidationError> {
    let duration_minutes = match &args.minutes {
        Some(raw) => parse_minutes(raw),
        None => Value::from(config.preset(args.preset.as_deref())?.minutes_for(kind)),
    };
    Ok(StartRequest {
        duration_minutes: Some(duration_minutes),
        tag: args.tag.clone().map(Value::String),
    })
}

fn parse_minutes(raw: &str) -> Value {
    serde_json::from_str::<Value>(raw.trim())
        .ok()
        .filter(Value::is_number)
        .unwrap_or_else(|| Value::String(raw.to_string()))
}

/// Runs `start` or `break`.
pub fn start<W: Write>(
    writer: &mut W,
    engine: &mut Engine,
    owner: Option<&OwnerId>,
    config: &Config,
    kind: SessionKind,
    args: &StartArgs,
    json: bool,
) -> Result<()> {
    let request = build_request(config, kind, args).map_err(EngineError::from)?;
    let session = match kind {
        SessionKind::Focus => engine.start_focus(owner, &request)?,
        SessionKind::Break => engine.start_break(owner, &request)?,
    };
    render_created(writer, &CreatedSession::from(&session), json)
}

pub fn long_break<W: Write>(
    writer: &mut W,
    engine: &mut Engine,
    owner: Option<&OwnerId>,
    json: bool,
) -> Result<()> {
    let session = engine.start_long_break(owner)?;
    render_created(writer, &CreatedSession::from(&session), json)
}

pub fn decline<W: Write>(
    writer: &mut W,
    engine: &mut Engine,
    owner: Option<&OwnerId>,
    json: bool,
) -> Result<()> {
    let ack = engine.decline_long_break(owner)?;
    if json {
        return write_json(writer, &ack);
    }
    writeln!(writer, "Long break declined; cycle count reset.")?;
    Ok(())
}

pub fn stop<W: Write>(
    writer: &mut W,
    engine: &mut Engine,
    owner: Option<&OwnerId>,
    json: bool,
) -> Result<()> {
    let ack: Ack = engine.stop(owner)?;
    if json {
        return write_json(writer, &ack);
    }
    writeln!(writer, "Stopped.")?;
    Ok(())
}

#[derive(Debug, Serialize)]
struct CompleteOutput {
    id: SessionId,
    completed: bool,
}

pub fn complete<W: Write>(
    writer: &mut W,
    engine: &mut Engine,
    owner: Option<&OwnerId>,
    id: SessionId,
    json: bool,
) -> Result<()> {
    let completed = engine.complete_session(owner, id)?;
    if json {
        return write_json(
            writer,
            &CompleteOutput {
                id,
                completed: completed.is_some(),
            },
        );
    }
    match completed {
        Some(session) => writeln!(writer, "Completed {} session #{id}.", session.kind)?,
        None => writeln!(writer, "Session #{id} is not running; nothing to complete.")?,
    }
    Ok(())
}

pub fn show<W: Write>(
    writer: &mut W,
    engine: &Engine,
    owner: Option<&OwnerId>,
    id: SessionId,
    json: bool,
) -> Result<()> {
    let Some(session) = engine.get_session(owner, id)? else {
        bail!("session {id} not found");
    };
    render_session(writer, &session, json)
}

pub fn render_created<W: Write>(writer: &mut W, created: &CreatedSession, json: bool) -> Result<()> {
    if json {
        return write_json(writer, created);
    }
    writeln!(
        writer,
        "Started {} session #{} ({}), ends at {}",
        created.kind,
        created.id,
        format_clock(created.planned_duration_seconds),
        created.planned_end_at
    )?;
    if let Some(tag) = &created.tag {
        writeln!(writer, "Tag: {tag}")?;
    }
    Ok(())
}

pub fn render_session<W: Write>(writer: &mut W, session: &Session, json: bool) -> Result<()> {
    if json {
        return write_json(writer, session);
    }
    writeln!(writer, "Session #{}", session.id)?;
    writeln!(writer, "Kind:     {}", session.kind)?;
    writeln!(writer, "Status:   {}", session.status)?;
    writeln!(
        writer,
        "Duration: {}",
        format_clock(session.planned_duration.seconds())
    )?;
    writeln!(writer, "Started:  {}", format_utc(session.started_at))?;
    writeln!(writer, "Ends:     {}", format_utc(session.planned_end_at))?;
    let ended = session
        .ended_at
        .map_or_else(|| "-".to_string(), format_utc);
    writeln!(writer, "Ended:    {ended}")?;
    let tag = session.tag.as_ref().map_or("-", pomo_core::Tag::as_str);
    writeln!(writer, "Tag:      {tag}")?;
    Ok(())
}
