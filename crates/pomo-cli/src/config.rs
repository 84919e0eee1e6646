//! Configuration loading and management.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use pomo_core::{DEFAULT_PRESET, OwnerId, Preset, ValidationError, builtin_presets};
use pomo_engine::EngineOptions;
use serde::{Deserialize, Serialize};

/// Field name reported when a preset lookup fails.
pub const PRESET_FIELD: &str = "preset";

/// Log line format for the tracing subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the database file.
    pub database_path: PathBuf,
    /// Owner used when `--owner` is not given.
    #[serde(default)]
    pub owner: Option<String>,
    /// Require an owner on every command.
    pub multi_user: bool,
    /// Track cycles and suggest long breaks.
    pub long_break: bool,
    /// Preset used by `start`/`break` when no minutes are given.
    pub default_preset: String,
    /// Named focus/break pairs; configured entries add to or replace the built-ins.
    pub presets: BTreeMap<String, Preset>,
    pub log_format: LogFormat,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_path", &self.database_path)
            .field("owner", &self.owner)
            .field("multi_user", &self.multi_user)
            .field("long_break", &self.long_break)
            .field("default_preset", &self.default_preset)
            .field("presets", &self.presets.keys().collect::<Vec<_>>())
            .field("log_format", &self.log_format)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        let defaults = EngineOptions::default();
        Self {
            database_path: data_dir.join("pomo.db"),
            owner: None,
            multi_user: defaults.multi_user,
            long_break: defaults.long_break,
            default_preset: DEFAULT_PRESET.to_string(),
            presets: builtin_presets(),
            log_format: LogFormat::default(),
        }
    }
}

impl Config {
    /// Loads configuration from default locations.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load() -> Result<Self, figment::Error> {
        Self::load_from(None)
    }

    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (POMO_*)
        figment = figment.merge(Env::prefixed("POMO_"));

        figment.extract()
    }

    pub const fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            multi_user: self.multi_user,
            long_break: self.long_break,
        }
    }

    /// Looks up a preset by name, falling back to `default_preset`.
    pub fn preset(&self, name: Option<&str>) -> Result<&Preset, ValidationError> {
        let name = name.unwrap_or(&self.default_preset);
        self.presets
            .get(name)
            .ok_or_else(|| ValidationError::UnknownValue {
                field: PRESET_FIELD,
                value: name.to_string(),
            })
    }

    /// Resolves the owner: an explicit override wins over the configured one.
    pub fn owner_id(&self, explicit: Option<&str>) -> Result<Option<OwnerId>, ValidationError> {
        explicit
            .or(self.owner.as_deref())
            .map(OwnerId::new)
            .transpose()
    }

    /// Checks that every preset is in range and the default preset exists.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for preset in self.presets.values() {
            preset.validate()?;
        }
        self.preset(None).map(|_| ())
    }
}

/// Returns the platform-specific config directory for pomo.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("pomo"))
}

/// Returns the platform-specific data directory for pomo.
///
/// On Linux: `~/.local/share/pomo`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("pomo"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dirs_data_path_ends_with_pomo() {
        let path = dirs_data_path().unwrap();
        assert_eq!(path.file_name().unwrap(), "pomo");
    }

    #[test]
    fn test_default_config_uses_data_dir_for_db() {
        let config = Config::default();
        let data_dir = dirs_data_path().unwrap();
        assert_eq!(config.database_path, data_dir.join("pomo.db"));
        assert!(!config.multi_user);
        assert!(config.long_break);
        assert_eq!(config.log_format, LogFormat::Text);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_file_adds_presets_and_overrides() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
database_path = "/tmp/pomo-test.db"
default_preset = "deep"
long_break = false
log_format = "json"

[presets.deep]
focus = 90
break = 20
"#,
        )
        .unwrap();

        let config = Config::load_from(Some(&path)).unwrap();
        assert_eq!(config.database_path, PathBuf::from("/tmp/pomo-test.db"));
        assert!(!config.long_break);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.preset(None).unwrap().focus, 90);
        assert_eq!(config.preset(Some("short")).unwrap().focus, 15);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_preset_is_a_validation_error() {
        let config = Config::default();
        let err = config.preset(Some("marathon")).unwrap_err();
        assert_eq!(err.field(), "preset");

        let config = Config {
            default_preset: "missing".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_explicit_owner_wins() {
        let config = Config {
            owner: Some("alice".to_string()),
            ..Config::default()
        };
        assert_eq!(
            config.owner_id(None).unwrap().unwrap().as_str(),
            "alice"
        );
        assert_eq!(
            config.owner_id(Some("bob")).unwrap().unwrap().as_str(),
            "bob"
        );
        assert!(config.owner_id(Some("")).is_err());
        assert_eq!(Config::default().owner_id(None).unwrap(), None);
    }
}
