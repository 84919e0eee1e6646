//! Named focus/break length pairs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{PlannedDuration, SessionKind, ValidationError};

/// Name of the preset used when none is configured.
pub const DEFAULT_PRESET: &str = "default";

/// A focus/break pairing, in whole minutes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preset {
    pub focus: u32,
    #[serde(rename = "break")]
    pub break_minutes: u32,
    #[serde(default)]
    pub label: String,
}

impl Preset {
    fn new(focus: u32, break_minutes: u32, label: &str) -> Self {
        Self {
            focus,
            break_minutes,
            label: label.to_string(),
        }
    }

    /// Minutes this preset assigns to a session of `kind`.
    pub const fn minutes_for(&self, kind: SessionKind) -> u32 {
        match kind {
            SessionKind::Focus => self.focus,
            SessionKind::Break => self.break_minutes,
        }
    }

    /// Checks both lengths against the duration bounds.
    pub fn validate(&self) -> Result<(), ValidationError> {
        PlannedDuration::from_minutes(self.focus)?;
        PlannedDuration::from_minutes(self.break_minutes)?;
        Ok(())
    }
}

/// The built-in presets: 25/5, 50/10 and 15/3.
pub fn builtin_presets() -> BTreeMap<String, Preset> {
    BTreeMap::from([
        (
            DEFAULT_PRESET.to_string(),
            Preset::new(25, 5, "25/5 (standard)"),
        ),
        ("long".to_string(), Preset::new(50, 10, "50/10 (long)")),
        ("short".to_string(), Preset::new(15, 3, "15/3 (short)")),
    ])
}
