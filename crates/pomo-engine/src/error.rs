//! Engine errors and their caller-facing classification.

use pomo_core::ValidationError;
use pomo_db::DbError;
use serde::Serialize;
use thiserror::Error;

/// Errors returned by engine operations.
///
/// No-op conditions (stopping while idle, completing an unknown or finished
/// session) are not errors.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The request carried an invalid duration or tag.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The owner already has an active session; it must be stopped first.
    #[error("Active session already exists")]
    SessionConflict,
    /// Multi-user mode is on and no owner was given.
    #[error("an owner is required in multi-user mode")]
    OwnerRequired,
    /// The storage layer failed.
    #[error("storage error: {0}")]
    Storage(#[source] DbError),
}

impl From<DbError> for EngineError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::ActiveSessionExists { .. } => Self::SessionConflict,
            other => Self::Storage(other),
        }
    }
}

/// Coarse error categories a transport maps to its own status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidDuration,
    InvalidTag,
    InvalidInput,
    SessionConflict,
    OwnerRequired,
    Storage,
}

impl EngineError {
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(ValidationError::InvalidDuration { .. }) => ErrorKind::InvalidDuration,
            Self::Validation(ValidationError::InvalidTag { .. }) => ErrorKind::InvalidTag,
            Self::Validation(_) => ErrorKind::InvalidInput,
            Self::SessionConflict => ErrorKind::SessionConflict,
            Self::OwnerRequired => ErrorKind::OwnerRequired,
            Self::Storage(_) => ErrorKind::Storage,
        }
    }

    /// The request field at fault, for input errors.
    pub const fn field(&self) -> Option<&'static str> {
        match self {
            Self::Validation(err) => Some(err.field()),
            _ => None,
        }
    }

    /// Whether the caller should fix its input rather than retry.
    pub const fn is_input_error(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::InvalidDuration | ErrorKind::InvalidTag | ErrorKind::InvalidInput
        )
    }
}
