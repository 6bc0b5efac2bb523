//! User settings for relocation passes
//!
//! Stored as JSON under the XDG config dir. Every field is optional in the
//! file; environment variables and then command-line flags override it.

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn, Level};

use crate::display::ContainmentPolicy;
use crate::geometry::RoundingMode;
use crate::relocate::RelocateOptions;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// How scaled coordinates snap to pixels
    #[serde(default)]
    pub rounding: RoundingMode,

    /// Which display owns a window spanning several
    #[serde(default)]
    pub containment: ContainmentPolicy,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            rounding: RoundingMode::default(),
            containment: ContainmentPolicy::default(),
            log_level: default_log_level(),
        }
    }
}

/// `trace`..`error`, case-insensitive
pub fn parse_log_level(value: &str) -> Option<Level> {
    match value.trim().to_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

/// Accepts both the file spelling (`top_left`) and the CLI spelling (`top-left`)
fn parse_choice<T: ValueEnum>(value: &str) -> Option<T> {
    T::from_str(&value.trim().replace('_', "-"), true).ok()
}

impl Settings {
    pub fn config_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(crate::constants::config::APP_DIR);
        path.push(crate::constants::config::FILENAME);
        path
    }

    /// Load from `path`, or from the default location
    ///
    /// A missing file gives defaults and a generated file for the user to
    /// edit. A file that does not parse is an error and is left untouched.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(Self::config_path);
        let mut settings = match fs::read_to_string(&path) {
            Ok(contents) => Self::from_json(&contents)
                .context(format!("Failed to parse config file {}", path.display()))?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                let settings = Self::default();
                if let Err(e) = settings.save(&path) {
                    error!(path = %path.display(), error = ?e, "Failed to write default config");
                } else {
                    info!(path = %path.display(), "Generated config file for user to edit (env vars still override)");
                }
                settings
            }
            Err(e) => {
                return Err(e).context(format!("Failed to read config file {}", path.display()));
            }
        };

        settings.apply_overrides(
            env::var(crate::constants::env::ROUNDING).ok().as_deref(),
            env::var(crate::constants::env::CONTAINMENT).ok().as_deref(),
        );
        Ok(settings)
    }

    pub fn from_json(contents: &str) -> Result<Self> {
        let mut settings: Settings =
            serde_json::from_str(contents).context("Failed to deserialize config JSON")?;
        settings.validate();
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .context(format!("Failed to create config directory: {}", parent.display()))?;
        }
        let contents = serde_json::to_string_pretty(self).context("Failed to serialize config to JSON")?;
        fs::write(path, contents).context(format!("Failed to write config file to {}", path.display()))?;
        Ok(())
    }

    /// Replace values that would otherwise be silently ignored
    fn validate(&mut self) {
        let normalized = self.log_level.trim().to_lowercase();
        if LOG_LEVELS.contains(&normalized.as_str()) {
            self.log_level = normalized;
        } else {
            warn!(log_level = %self.log_level, using = %default_log_level(), "Unknown log_level, using default");
            self.log_level = default_log_level();
        }
    }

    /// Apply raw override strings (from the environment); bad values are logged and ignored
    pub fn apply_overrides(&mut self, rounding: Option<&str>, containment: Option<&str>) {
        if let Some(raw) = rounding {
            match parse_choice::<RoundingMode>(raw) {
                Some(mode) => self.rounding = mode,
                None => warn!(var = crate::constants::env::ROUNDING, value = %raw, "Ignoring invalid rounding override"),
            }
        }
        if let Some(raw) = containment {
            match parse_choice::<ContainmentPolicy>(raw) {
                Some(policy) => self.containment = policy,
                None => warn!(var = crate::constants::env::CONTAINMENT, value = %raw, "Ignoring invalid containment override"),
            }
        }
    }

    pub fn log_level(&self) -> Level {
        parse_log_level(&self.log_level).unwrap_or(Level::INFO)
    }

    pub fn relocate_options(&self) -> RelocateOptions {
        RelocateOptions {
            rounding: self.rounding,
            containment: self.containment,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_gives_defaults() {
        let settings = Settings::from_json("{}").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.rounding, RoundingMode::Truncate);
        assert_eq!(settings.containment, ContainmentPolicy::TopLeft);
        assert_eq!(settings.log_level(), Level::INFO);
    }

    #[test]
    fn test_full_config() {
        let settings = Settings::from_json(
            r#"{ "rounding": "nearest", "containment": "max_overlap", "log_level": "DEBUG" }"#,
        )
        .unwrap();
        assert_eq!(settings.rounding, RoundingMode::Nearest);
        assert_eq!(settings.containment, ContainmentPolicy::MaxOverlap);
        assert_eq!(settings.log_level, "debug");
        assert_eq!(settings.log_level(), Level::DEBUG);
    }

    #[test]
    fn test_unknown_log_level_replaced() {
        let settings = Settings::from_json(r#"{ "log_level": "verbose" }"#).unwrap();
        assert_eq!(settings.log_level, "info");
    }

    #[test]
    fn test_unknown_rounding_is_an_error() {
        assert!(Settings::from_json(r#"{ "rounding": "ceil" }"#).is_err());
        assert!(Settings::from_json("not json").is_err());
    }

    #[test]
    fn test_overrides_accept_both_spellings() {
        let mut settings = Settings::default();
        settings.apply_overrides(Some("Nearest"), Some("max_overlap"));
        assert_eq!(settings.rounding, RoundingMode::Nearest);
        assert_eq!(settings.containment, ContainmentPolicy::MaxOverlap);

        settings.apply_overrides(None, Some("top-left"));
        assert_eq!(settings.rounding, RoundingMode::Nearest);
        assert_eq!(settings.containment, ContainmentPolicy::TopLeft);
    }

    #[test]
    fn test_invalid_override_ignored() {
        let mut settings = Settings::default();
        settings.apply_overrides(Some("floor"), Some("center"));
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_parse_log_level() {
        assert_eq!(parse_log_level("warn"), Some(Level::WARN));
        assert_eq!(parse_log_level(" Trace "), Some(Level::TRACE));
        assert_eq!(parse_log_level("loud"), None);
    }

    #[test]
    fn test_load_missing_file_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let settings = Settings::load(Some(&path)).unwrap();

        assert_eq!(settings.log_level, "info");
        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(Settings::from_json(&written).unwrap().log_level, "info");
    }

    #[test]
    fn test_load_malformed_file_is_preserved() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ rounding: nearest").unwrap();

        assert!(Settings::load(Some(&path)).is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), "{ rounding: nearest");
    }

    #[test]
    fn test_save_and_load_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let settings = Settings {
            log_level: "warn".to_string(),
            ..Settings::default()
        };

        settings.save(&path).unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains("\"rounding\": \"truncate\""));
        assert!(contents.contains("\"containment\": \"top_left\""));
        assert_eq!(Settings::from_json(&contents).unwrap().log_level, "warn");
    }
}
