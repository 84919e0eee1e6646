//! Input validation for start requests.
//!
//! Transports hand over the raw JSON values they received, so a duration sent
//! as `"25"` is rejected as non-numeric instead of being coerced.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{
    DURATION_FIELD, PlannedDuration, SessionKind, TAG_FIELD, Tag, ValidationError,
};

/// Shortest allowed session, in minutes.
pub const MIN_DURATION_MINUTES: u32 = 1;

/// Longest allowed session, in minutes.
pub const MAX_DURATION_MINUTES: u32 = 240;

/// Longest allowed tag, in characters.
pub const MAX_TAG_CHARS: usize = 50;

/// Default focus length when a request omits the duration.
pub const FOCUS_DEFAULT_MINUTES: u32 = 25;

/// Default break length when a request omits the duration.
pub const BREAK_DEFAULT_MINUTES: u32 = 5;

/// Validates a raw duration value and converts it to whole seconds.
///
/// Integers and floats in `[1, 240]` are accepted; fractional minutes are
/// rounded to the nearest second. Anything else, including numeric strings,
/// booleans and null, fails with [`ValidationError::InvalidDuration`].
pub fn validate_duration(minutes: &Value) -> Result<PlannedDuration, ValidationError> {
    let Some(minutes) = minutes.as_f64() else {
        return Err(invalid_duration("Duration must be a number".to_string()));
    };
    duration_from_minutes(minutes)
}

pub(crate) fn duration_from_minutes(minutes: f64) -> Result<PlannedDuration, ValidationError> {
    if minutes.is_nan() {
        return Err(invalid_duration("Duration must be a number".to_string()));
    }
    if minutes < f64::from(MIN_DURATION_MINUTES) {
        return Err(invalid_duration(format!(
            "Duration must be at least {MIN_DURATION_MINUTES} minute(s)"
        )));
    }
    if minutes > f64::from(MAX_DURATION_MINUTES) {
        return Err(invalid_duration(format!(
            "Duration must be at most {MAX_DURATION_MINUTES} minutes"
        )));
    }
    #[expect(
        clippy::cast_possible_truncation,
        reason = "bounded to 240 minutes above"
    )]
    let seconds = (minutes * 60.0).round() as i64;
    Ok(PlannedDuration::from_seconds_unchecked(seconds))
}

fn invalid_duration(reason: String) -> ValidationError {
    ValidationError::InvalidDuration {
        field: DURATION_FIELD,
        reason,
    }
}

/// Validates a raw tag value.
///
/// Null is always valid and means "no tag"; so is the empty string, which
/// form submissions send for an untouched field. Non-strings and strings
/// longer than [`MAX_TAG_CHARS`] fail with [`ValidationError::InvalidTag`].
pub fn validate_tag(tag: &Value) -> Result<Option<Tag>, ValidationError> {
    match tag {
        Value::Null => Ok(None),
        Value::String(s) if s.is_empty() => Ok(None),
        Value::String(s) => Tag::new(s.as_str()).map(Some),
        _ => Err(ValidationError::InvalidTag {
            field: TAG_FIELD,
            reason: "Tag must be a string".to_string(),
        }),
    }
}

pub(crate) fn check_tag_length(tag: &str) -> Result<(), ValidationError> {
    if tag.chars().count() > MAX_TAG_CHARS {
        return Err(ValidationError::InvalidTag {
            field: TAG_FIELD,
            reason: format!("Tag must be at most {MAX_TAG_CHARS} characters"),
        });
    }
    Ok(())
}

/// A start request as received from a transport, not yet validated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StartRequest {
    #[serde(default, deserialize_with = "present")]
    pub duration_minutes: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub tag: Option<Value>,
}

/// Keeps an explicit `null` as `Some(Value::Null)` so it is validated rather
/// than treated as a missing field.
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// A start request that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidStart {
    pub duration: PlannedDuration,
    pub tag: Option<Tag>,
}

impl StartRequest {
    /// A request for a whole number of minutes and no tag.
    #[must_use]
    pub fn minutes(minutes: u32) -> Self {
        Self {
            duration_minutes: Some(Value::from(minutes)),
            tag: None,
        }
    }

    /// Attaches a tag to the request.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(Value::String(tag.into()));
        self
    }

    /// Validates duration then tag, filling in the default for `kind` when
    /// no duration was given.
    pub fn validate(&self, kind: SessionKind) -> Result<ValidStart, ValidationError> {
        let duration = match &self.duration_minutes {
            Some(minutes) => validate_duration(minutes)?,
            None => PlannedDuration::from_minutes(default_minutes(kind))?,
        };
        let tag = match &self.tag {
            Some(tag) => validate_tag(tag)?,
            None => None,
        };
        Ok(ValidStart { duration, tag })
    }
}

/// Default length in minutes for a session of `kind`.
pub const fn default_minutes(kind: SessionKind) -> u32 {
    match kind {
        SessionKind::Focus => FOCUS_DEFAULT_MINUTES,
        SessionKind::Break => BREAK_DEFAULT_MINUTES,
    }
}
