//! Core type definitions with validation.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Request field carrying the session length.
pub const DURATION_FIELD: &str = "duration_minutes";

/// Request field carrying the session label.
pub const TAG_FIELD: &str = "tag";

/// Validation errors for core types and request inputs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// A duration was non-numeric or outside the allowed range.
    #[error("{reason}")]
    InvalidDuration { field: &'static str, reason: String },

    /// A tag had the wrong type or was too long.
    #[error("{reason}")]
    InvalidTag { field: &'static str, reason: String },

    /// A stored or parsed enum value was not recognised.
    #[error("invalid {field}: {value}")]
    UnknownValue { field: &'static str, value: String },
}

impl ValidationError {
    /// The name of the offending input field.
    pub const fn field(&self) -> &'static str {
        match self {
            Self::Empty { field }
            | Self::InvalidDuration { field, .. }
            | Self::InvalidTag { field, .. }
            | Self::UnknownValue { field, .. } => *field,
        }
    }
}

/// Generates a lowercase string enum with `as_str`, `Display` and `FromStr`.
macro_rules! define_str_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $field_name:literal {
            $($(#[$vmeta:meta])* $variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            /// String representation for storage and JSON.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    _ => Err(ValidationError::UnknownValue {
                        field: $field_name,
                        value: s.to_string(),
                    }),
                }
            }
        }
    };
}

define_str_enum!(
    /// What a timed interval is for. Immutable once a session is created.
    SessionKind, "session kind" {
        /// A timed work interval.
        Focus => "focus",
        /// A timed rest interval (short or long).
        Break => "break",
    }
);

define_str_enum!(
    /// Lifecycle state of a session.
    ///
    /// `Active` is the only non-terminal value; a session leaves it exactly once.
    SessionStatus, "session status" {
        Active => "active",
        Completed => "completed",
        Aborted => "aborted",
    }
);

define_str_enum!(
    /// What the timer is doing right now, as reported in state snapshots.
    Mode, "mode" {
        Idle => "idle",
        Focus => "focus",
        Break => "break",
    }
);

impl From<SessionKind> for Mode {
    fn from(kind: SessionKind) -> Self {
        match kind {
            SessionKind::Focus => Self::Focus,
            SessionKind::Break => Self::Break,
        }
    }
}

/// Generates a validated string newtype with common trait implementations.
macro_rules! define_validated_string {
    (
        $(#[$meta:meta])*
        $name:ident, $validate:path
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new value after validation.
            pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
                let value = value.into();
                $validate(&value)?;
                Ok(Self(value))
            }

            /// Returns the value as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

fn check_owner(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::Empty { field: "owner" });
    }
    Ok(())
}

define_validated_string!(
    /// Identity of the user a session or daily stat row belongs to.
    ///
    /// Owner IDs are never empty; single-tenant deployments pass no owner at all.
    OwnerId, check_owner
);

define_validated_string!(
    /// Free-text session label, at most [`crate::MAX_TAG_CHARS`] characters.
    Tag, crate::validation::check_tag_length
);

/// A validated planned session length, stored in whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlannedDuration(i64);

impl PlannedDuration {
    /// Wraps a number of seconds that already passed validation.
    pub(crate) const fn from_seconds_unchecked(seconds: i64) -> Self {
        Self(seconds)
    }

    /// Creates a duration from a stored number of seconds.
    pub fn from_seconds(seconds: i64) -> Result<Self, ValidationError> {
        #[expect(
            clippy::cast_precision_loss,
            reason = "stored durations are at most a few hours"
        )]
        let minutes = seconds as f64 / 60.0;
        crate::validation::duration_from_minutes(minutes)
    }

    /// Creates a duration from whole minutes, applying the minute bounds.
    pub fn from_minutes(minutes: u32) -> Result<Self, ValidationError> {
        crate::validation::duration_from_minutes(f64::from(minutes))
    }

    /// Length in seconds.
    #[must_use]
    pub const fn seconds(self) -> i64 {
        self.0
    }

    /// Length as a chrono duration.
    #[must_use]
    pub fn as_chrono(self) -> chrono::Duration {
        chrono::Duration::seconds(self.0)
    }
}

impl fmt::Display for PlannedDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}
