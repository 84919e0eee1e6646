//! Storage layer for the pomodoro timer.
//!
//! Provides persistence for timer sessions and per-day focus totals using `rusqlite`.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! A `Database` can be moved between threads but not shared without external
//! synchronization. Separate `Database` instances opened on the same file are safe to
//! use concurrently: every write runs in a `BEGIN IMMEDIATE` transaction and
//! connections wait up to [`BUSY_TIMEOUT`] for the write lock.
//!
//! # Schema
//!
//! ## Owners
//!
//! The `owner` column is `NOT NULL`. Single-tenant rows use the empty string, which
//! can never collide with an [`OwnerId`] because owner IDs are non-empty.
//!
//! ## One active session per owner
//!
//! A partial unique index over `sessions(owner) WHERE status = 'active'` makes a
//! second active session for the same owner impossible, whatever the caller does.
//! Starting a session also checks for an active one inside the same write
//! transaction, so the usual conflict is reported without relying on the
//! constraint error.
//!
//! ## Timestamp Format
//!
//! Timestamps are stored as TEXT in RFC 3339 format with millisecond precision and a
//! `Z` suffix (e.g., `2025-01-15T10:30:00.000Z`), so lexicographic order matches
//! chronological order. Dates are stored as `YYYY-MM-DD` on the UTC calendar.
//!
//! ## Daily totals
//!
//! Totals are only ever changed with SQL arithmetic (`x = x + ?`) inside the
//! transaction that completes the session, never read-modify-write in Rust.

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use pomo_core::{
    DailyTotals, NewSession, OwnerId, PlannedDuration, Session, SessionId, SessionKind,
    SessionStatus, Tag, TagStats, format_utc,
};
use rusqlite::{
    Connection, ErrorCode, OptionalExtension, Row, Transaction, TransactionBehavior, params,
};
use thiserror::Error;

/// How long a connection waits for another writer before giving up.
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SESSION_COLUMNS: &str =
    "id, owner, kind, planned_duration_sec, started_at, planned_end_at, ended_at, status, tag";

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// The owner already has an active session.
    #[error("an active session already exists for owner {owner:?}")]
    ActiveSessionExists { owner: String },
    /// Failed to parse a stored timestamp.
    #[error("invalid timestamp for session {session_id}: {timestamp}")]
    TimestampParse {
        session_id: SessionId,
        timestamp: String,
        #[source]
        source: chrono::ParseError,
    },
    /// A stored column held a value the domain types reject.
    #[error("invalid {table}.{column} value: {message}")]
    InvalidColumn {
        table: &'static str,
        column: &'static str,
        message: String,
    },
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.busy_timeout(BUSY_TIMEOUT)?;
        self.conn.execute_batch(
            "
            -- Sessions table: one row per focus or break interval
            -- owner: '' in single-tenant mode
            -- kind: 'focus' | 'break'
            -- status: 'active' | 'completed' | 'aborted'
            CREATE TABLE IF NOT EXISTS sessions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                owner TEXT NOT NULL DEFAULT '',
                kind TEXT NOT NULL CHECK (kind IN ('focus', 'break')),
                planned_duration_sec INTEGER NOT NULL CHECK (planned_duration_sec > 0),
                started_at TEXT NOT NULL,
                planned_end_at TEXT NOT NULL,
                ended_at TEXT,
                status TEXT NOT NULL DEFAULT 'active'
                    CHECK (status IN ('active', 'completed', 'aborted')),
                tag TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_sessions_owner_status ON sessions(owner, status);
            CREATE INDEX IF NOT EXISTS idx_sessions_owner_started ON sessions(owner, started_at);
            CREATE INDEX IF NOT EXISTS idx_sessions_owner_tag ON sessions(owner, tag);
            CREATE UNIQUE INDEX IF NOT EXISTS idx_sessions_one_active
                ON sessions(owner) WHERE status = 'active';

            CREATE TABLE IF NOT EXISTS daily_stats (
                owner TEXT NOT NULL DEFAULT '',
                date TEXT NOT NULL,
                total_focus_seconds INTEGER NOT NULL DEFAULT 0,
                completed_focus_count INTEGER NOT NULL DEFAULT 0,
                cycle_count INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (owner, date)
            );
            ",
        )?;
        Ok(())
    }

    fn write_transaction(&mut self) -> Result<Transaction<'_>, DbError> {
        Ok(self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?)
    }

    /// Inserts a new active session.
    ///
    /// Fails with [`DbError::ActiveSessionExists`] if the owner already has an
    /// active session; nothing is written in that case. When `reset_cycle_on` is
    /// set, that day's cycle count is zeroed in the same transaction as the insert.
    pub fn start_session(
        &mut self,
        new: &NewSession,
        reset_cycle_on: Option<NaiveDate>,
    ) -> Result<Session, DbError> {
        let owner = owner_key(new.owner.as_ref());
        let tx = self.write_transaction()?;

        let existing: Option<SessionId> = tx
            .query_row(
                "SELECT id FROM sessions WHERE owner = ? AND status = 'active'",
                [owner],
                |row| row.get(0),
            )
            .optional()?;
        if existing.is_some() {
            return Err(DbError::ActiveSessionExists {
                owner: owner.to_string(),
            });
        }

        if let Some(date) = reset_cycle_on {
            tx.execute(
                "UPDATE daily_stats SET cycle_count = 0 WHERE owner = ? AND date = ?",
                params![owner, format_date(date)],
            )?;
        }

        let inserted = tx.query_row(
            &format!(
                "
                INSERT INTO sessions
                (owner, kind, planned_duration_sec, started_at, planned_end_at, status, tag)
                VALUES (?, ?, ?, ?, ?, 'active', ?)
                RETURNING {SESSION_COLUMNS}
                "
            ),
            params![
                owner,
                new.kind.as_str(),
                new.planned_duration.seconds(),
                format_utc(new.started_at),
                format_utc(new.planned_end_at()),
                new.tag.as_ref().map(Tag::as_str),
            ],
            SessionRow::from_row,
        );
        let row = match inserted {
            Ok(row) => row,
            Err(err) if is_constraint_violation(&err) => {
                return Err(DbError::ActiveSessionExists {
                    owner: owner.to_string(),
                });
            }
            Err(err) => return Err(err.into()),
        };
        tx.commit()?;
        row.into_session()
    }

    /// Returns the owner's active session, if any.
    pub fn active_session(&self, owner: Option<&OwnerId>) -> Result<Option<Session>, DbError> {
        let row = self
            .conn
            .query_row(
                &format!(
                    "SELECT {SESSION_COLUMNS} FROM sessions WHERE owner = ? AND status = 'active'"
                ),
                [owner_key(owner)],
                SessionRow::from_row,
            )
            .optional()?;
        row.map(SessionRow::into_session).transpose()
    }

    /// Returns a session by ID if it belongs to `owner`.
    pub fn get_session(
        &self,
        owner: Option<&OwnerId>,
        id: SessionId,
    ) -> Result<Option<Session>, DbError> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE id = ? AND owner = ?"),
                params![id, owner_key(owner)],
                SessionRow::from_row,
            )
            .optional()?;
        row.map(SessionRow::into_session).transpose()
    }

    /// Marks the owner's active session as aborted.
    ///
    /// Returns the aborted session, or `None` when nothing was active.
    pub fn abort_active_session(
        &mut self,
        owner: Option<&OwnerId>,
        ended_at: DateTime<Utc>,
    ) -> Result<Option<Session>, DbError> {
        let tx = self.write_transaction()?;
        let row = tx
            .query_row(
                &format!(
                    "
                    UPDATE sessions
                    SET status = 'aborted', ended_at = ?
                    WHERE owner = ? AND status = 'active'
                    RETURNING {SESSION_COLUMNS}
                    "
                ),
                params![format_utc(ended_at), owner_key(owner)],
                SessionRow::from_row,
            )
            .optional()?;
        tx.commit()?;
        row.map(SessionRow::into_session).transpose()
    }

    /// Marks an active session as completed and, for focus sessions, adds it to
    /// the totals for `ended_at`'s UTC day.
    ///
    /// Returns `None` without writing anything if the session does not exist,
    /// belongs to another owner, or is no longer active.
    pub fn complete_session(
        &mut self,
        owner: Option<&OwnerId>,
        id: SessionId,
        ended_at: DateTime<Utc>,
    ) -> Result<Option<Session>, DbError> {
        let owner = owner_key(owner);
        let tx = self.write_transaction()?;
        let row = tx
            .query_row(
                &format!(
                    "
                    UPDATE sessions
                    SET status = 'completed', ended_at = ?
                    WHERE id = ? AND owner = ? AND status = 'active'
                    RETURNING {SESSION_COLUMNS}
                    "
                ),
                params![format_utc(ended_at), id, owner],
                SessionRow::from_row,
            )
            .optional()?;
        let Some(row) = row else {
            return Ok(None);
        };
        let session = row.into_session()?;

        if session.kind == SessionKind::Focus {
            tx.execute(
                "
                INSERT INTO daily_stats
                (owner, date, total_focus_seconds, completed_focus_count, cycle_count)
                VALUES (?, ?, ?, 1, 1)
                ON CONFLICT(owner, date) DO UPDATE SET
                    total_focus_seconds = total_focus_seconds + excluded.total_focus_seconds,
                    completed_focus_count = completed_focus_count + 1,
                    cycle_count = cycle_count + 1
                ",
                params![
                    owner,
                    format_date(ended_at.date_naive()),
                    session.planned_duration.seconds(),
                ],
            )?;
        }
        tx.commit()?;
        tracing::debug!(session_id = session.id, kind = %session.kind, "session row completed");
        Ok(Some(session))
    }

    /// Zeroes the cycle count for one day.
    ///
    /// Returns `false` when the owner has no row for that day.
    pub fn reset_cycle_count(
        &mut self,
        owner: Option<&OwnerId>,
        date: NaiveDate,
    ) -> Result<bool, DbError> {
        let tx = self.write_transaction()?;
        let changed = tx.execute(
            "UPDATE daily_stats SET cycle_count = 0 WHERE owner = ? AND date = ?",
            params![owner_key(owner), format_date(date)],
        )?;
        tx.commit()?;
        Ok(changed > 0)
    }

    /// Returns the totals for one day, if a row exists.
    pub fn daily_totals(
        &self,
        owner: Option<&OwnerId>,
        date: NaiveDate,
    ) -> Result<Option<DailyTotals>, DbError> {
        let totals = self
            .conn
            .query_row(
                "
                SELECT completed_focus_count, total_focus_seconds, cycle_count
                FROM daily_stats
                WHERE owner = ? AND date = ?
                ",
                params![owner_key(owner), format_date(date)],
                |row| {
                    Ok(DailyTotals {
                        completed_focus_count: row.get(0)?,
                        total_focus_seconds: row.get(1)?,
                        cycle_count: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(totals)
    }

    /// Lists daily totals with `start <= date <= end`, ordered by date.
    pub fn daily_totals_in_range(
        &self,
        owner: Option<&OwnerId>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<(NaiveDate, DailyTotals)>, DbError> {
        if end < start {
            return Ok(Vec::new());
        }
        let mut stmt = self.conn.prepare(
            "
            SELECT date, completed_focus_count, total_focus_seconds, cycle_count
            FROM daily_stats
            WHERE owner = ? AND date >= ? AND date <= ?
            ORDER BY date ASC
            ",
        )?;
        let rows = stmt.query_map(
            params![owner_key(owner), format_date(start), format_date(end)],
            |row| {
                let date: String = row.get(0)?;
                let totals = DailyTotals {
                    completed_focus_count: row.get(1)?,
                    total_focus_seconds: row.get(2)?,
                    cycle_count: row.get(3)?,
                };
                Ok((date, totals))
            },
        )?;
        let mut days = Vec::new();
        for row in rows {
            let (date, totals) = row?;
            days.push((parse_date(&date)?, totals));
        }
        Ok(days)
    }

    /// Groups completed focus sessions by tag.
    ///
    /// Untagged sessions form their own group with `tag: None`, listed first;
    /// tagged groups follow in ascending tag order.
    pub fn stats_by_tag(&self, owner: Option<&OwnerId>) -> Result<Vec<TagStats>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT tag, COUNT(*), COALESCE(SUM(planned_duration_sec), 0)
            FROM sessions
            WHERE owner = ? AND kind = 'focus' AND status = 'completed'
            GROUP BY tag
            ORDER BY tag IS NOT NULL, tag ASC
            ",
        )?;
        let rows = stmt.query_map([owner_key(owner)], |row| {
            let tag: Option<String> = row.get(0)?;
            let count: i64 = row.get(1)?;
            let seconds: i64 = row.get(2)?;
            Ok((tag, count, seconds))
        })?;
        let mut groups = Vec::new();
        for row in rows {
            let (tag, completed_focus_count, total_focus_seconds) = row?;
            groups.push(TagStats {
                tag: tag.map(parse_tag).transpose()?,
                completed_focus_count,
                total_focus_seconds,
            });
        }
        Ok(groups)
    }

    /// Lists distinct tags, most recently started first.
    pub fn recent_tags(&self, owner: Option<&OwnerId>, limit: usize) -> Result<Vec<Tag>, DbError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let mut stmt = self.conn.prepare(
            "
            SELECT tag
            FROM sessions
            WHERE owner = ? AND tag IS NOT NULL
            GROUP BY tag
            ORDER BY MAX(started_at) DESC, MAX(id) DESC
            LIMIT ?
            ",
        )?;
        let rows = stmt.query_map(params![owner_key(owner), limit], |row| {
            row.get::<_, String>(0)
        })?;
        let mut tags = Vec::new();
        for row in rows {
            tags.push(parse_tag(row?)?);
        }
        Ok(tags)
    }

    /// Counts the owner's sessions with status `active`.
    pub fn count_active_sessions(&self, owner: Option<&OwnerId>) -> Result<i64, DbError> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*) FROM sessions WHERE owner = ? AND status = 'active'",
            [owner_key(owner)],
            |row| row.get(0),
        )?)
    }
}

/// A session row as stored, before conversion to domain types.
#[derive(Debug)]
struct SessionRow {
    id: SessionId,
    owner: String,
    kind: String,
    planned_duration_sec: i64,
    started_at: String,
    planned_end_at: String,
    ended_at: Option<String>,
    status: String,
    tag: Option<String>,
}

impl SessionRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            owner: row.get(1)?,
            kind: row.get(2)?,
            planned_duration_sec: row.get(3)?,
            started_at: row.get(4)?,
            planned_end_at: row.get(5)?,
            ended_at: row.get(6)?,
            status: row.get(7)?,
            tag: row.get(8)?,
        })
    }

    fn into_session(self) -> Result<Session, DbError> {
        let owner = if self.owner.is_empty() {
            None
        } else {
            Some(OwnerId::new(self.owner).map_err(|err| invalid("owner", &err))?)
        };
        let kind: SessionKind = self.kind.parse().map_err(|err| invalid("kind", &err))?;
        let status: SessionStatus = self.status.parse().map_err(|err| invalid("status", &err))?;
        let planned_duration = PlannedDuration::from_seconds(self.planned_duration_sec)
            .map_err(|err| invalid("planned_duration_sec", &err))?;
        let ended_at = self
            .ended_at
            .as_deref()
            .map(|ts| parse_timestamp(ts, self.id))
            .transpose()?;
        Ok(Session {
            id: self.id,
            owner,
            kind,
            planned_duration,
            started_at: parse_timestamp(&self.started_at, self.id)?,
            planned_end_at: parse_timestamp(&self.planned_end_at, self.id)?,
            ended_at,
            status,
            tag: self.tag.map(parse_tag).transpose()?,
        })
    }
}

fn invalid(column: &'static str, err: &impl std::fmt::Display) -> DbError {
    DbError::InvalidColumn {
        table: "sessions",
        column,
        message: err.to_string(),
    }
}

fn owner_key(owner: Option<&OwnerId>) -> &str {
    owner.map_or("", OwnerId::as_str)
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(failure, _) if failure.code == ErrorCode::ConstraintViolation
    )
}

fn parse_tag(tag: String) -> Result<Tag, DbError> {
    Tag::new(tag).map_err(|err| invalid("tag", &err))
}

fn parse_timestamp(timestamp: &str, session_id: SessionId) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(timestamp)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|source| DbError::TimestampParse {
            session_id,
            timestamp: timestamp.to_string(),
            source,
        })
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn parse_date(date: &str) -> Result<NaiveDate, DbError> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|err| DbError::InvalidColumn {
        table: "daily_stats",
        column: "date",
        message: err.to_string(),
    })
}
