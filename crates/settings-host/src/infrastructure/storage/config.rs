//! TOML-based configuration for the settings host.
//!
//! Reads and writes `HostConfig` at the platform-appropriate location:
//! - Windows:  `%APPDATA%\settings-host\host.toml`
//! - Linux:    `~/.config/settings-host/host.toml`
//! - macOS:    `~/Library/Application Support/settings-host/host.toml`
//!
//! Example:
//!
//! ```toml
//! [host]
//! association = "stk"
//! log_level = "info"
//!
//! [defaults]
//! theme = "dark"
//! font_size = 12
//! autosave = true
//! ```
//!
//! The `[defaults]` table is the schema handed to the settings store.  TOML
//! scalars map onto setting types: strings → text, integers → `i64`, floats →
//! `f64`, booleans → `bool`.  Arrays, tables and datetimes have no setting
//! type and are rejected.
//!
//! # Serde default values
//!
//! Fields annotated with `#[serde(default = "some_fn")]` use the return value
//! of `some_fn()` when the field is absent, so a missing or partial file still
//! yields a working configuration.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use settings_core::SettingValue;
use thiserror::Error;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A `[defaults]` entry has no corresponding setting type.
    #[error("default {key:?} is a TOML {kind}, which is not a supported setting type")]
    UnsupportedDefault { key: String, kind: &'static str },
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level host configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct HostConfig {
    #[serde(default)]
    pub host: HostSection,
    /// Default schema for the settings store.
    #[serde(default)]
    pub defaults: BTreeMap<String, toml::Value>,
}

/// General host behaviour settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HostSection {
    /// File association tag; also the extension of named saves.
    #[serde(default = "default_association")]
    pub association: String,
    /// `tracing` log level: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Directory for named saves; the user's documents folder if absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documents_dir: Option<PathBuf>,
}

fn default_association() -> String {
    "stk".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for HostSection {
    fn default() -> Self {
        Self {
            association: default_association(),
            log_level: default_log_level(),
            documents_dir: None,
        }
    }
}

impl HostConfig {
    /// Converts the `[defaults]` table into settings store entries.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnsupportedDefault`] for arrays, tables and
    /// datetimes.
    pub fn schema(&self) -> Result<Vec<(String, SettingValue)>, ConfigError> {
        self.defaults
            .iter()
            .map(|(key, value)| Ok((key.clone(), toml_to_setting(key, value)?)))
            .collect()
    }
}

fn toml_to_setting(key: &str, value: &toml::Value) -> Result<SettingValue, ConfigError> {
    let unsupported = |kind| ConfigError::UnsupportedDefault {
        key: key.to_string(),
        kind,
    };
    match value {
        toml::Value::String(s) => Ok(SettingValue::Text(s.clone())),
        toml::Value::Integer(i) => Ok(SettingValue::Int64(*i)),
        toml::Value::Float(f) => Ok(SettingValue::Float64(*f)),
        toml::Value::Boolean(b) => Ok(SettingValue::Bool(*b)),
        toml::Value::Datetime(_) => Err(unsupported("datetime")),
        toml::Value::Array(_) => Err(unsupported("array")),
        toml::Value::Table(_) => Err(unsupported("table")),
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Resolves the full path to the host config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot be
/// determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    let base = dirs::config_dir().ok_or(ConfigError::NoPlatformConfigDir)?;
    Ok(base.join("settings-host").join("host.toml"))
}

/// Loads `HostConfig` from the platform location, returning
/// `HostConfig::default()` if the file does not yet exist.
///
/// # Errors
///
/// See [`load_config_from`].
pub fn load_config() -> Result<HostConfig, ConfigError> {
    load_config_from(&config_file_path()?)
}

/// Loads `HostConfig` from `path`, returning the default when it is absent.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config_from(path: &Path) -> Result<HostConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HostConfig::default()),
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Persists `config` to `path`, creating the directory if needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config_to(path: &Path, config: &HostConfig) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_uses_stk_association() {
        let cfg = HostConfig::default();
        assert_eq!(cfg.host.association, "stk");
        assert_eq!(cfg.host.log_level, "info");
        assert!(cfg.host.documents_dir.is_none());
        assert!(cfg.defaults.is_empty());
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let cfg: HostConfig = toml::from_str("").expect("deserialize empty");
        assert_eq!(cfg, HostConfig::default());
    }

    #[test]
    fn test_partial_host_section_keeps_other_defaults() {
        // Arrange
        let toml_str = r#"
[host]
association = "prefs"
"#;

        // Act
        let cfg: HostConfig = toml::from_str(toml_str).expect("deserialize partial");

        // Assert
        assert_eq!(cfg.host.association, "prefs");
        assert_eq!(cfg.host.log_level, "info");
    }

    #[test]
    fn test_schema_maps_scalars_to_setting_values() {
        // Arrange
        let toml_str = r#"
[defaults]
theme = "dark"
font_size = 12
ratio = 1.5
autosave = true
"#;
        let cfg: HostConfig = toml::from_str(toml_str).unwrap();

        // Act
        let schema: BTreeMap<_, _> = cfg.schema().expect("schema").into_iter().collect();

        // Assert
        assert_eq!(schema["theme"], SettingValue::Text("dark".into()));
        assert_eq!(schema["font_size"], SettingValue::Int64(12));
        assert_eq!(schema["ratio"], SettingValue::Float64(1.5));
        assert_eq!(schema["autosave"], SettingValue::Bool(true));
    }

    #[test]
    fn test_schema_rejects_arrays() {
        let cfg: HostConfig = toml::from_str("[defaults]\nrecent = [\"a\"]\n").unwrap();
        match cfg.schema() {
            Err(ConfigError::UnsupportedDefault { key, kind }) => {
                assert_eq!(key, "recent");
                assert_eq!(kind, "array");
            }
            other => panic!("expected UnsupportedDefault, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_toml_returns_parse_error() {
        let result: Result<HostConfig, toml::de::Error> = toml::from_str("[[[ not valid toml");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_from_missing_file_returns_default() {
        let cfg = load_config_from(Path::new("/nonexistent/path/that/cannot/exist/host.toml"))
            .expect("missing file is not an error");
        assert_eq!(cfg, HostConfig::default());
    }

    #[test]
    fn test_save_and_load_config_round_trip() {
        // Arrange
        let dir = std::env::temp_dir().join(format!("host_config_test_{}", uuid::Uuid::new_v4()));
        let path = dir.join("nested").join("host.toml");
        let mut cfg = HostConfig::default();
        cfg.host.log_level = "debug".to_string();
        cfg.host.documents_dir = Some(dir.join("docs"));
        cfg.defaults
            .insert("theme".to_string(), toml::Value::String("light".into()));

        // Act
        save_config_to(&path, &cfg).expect("save");
        let loaded = load_config_from(&path).expect("load");

        // Assert
        assert_eq!(loaded, cfg);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_config_file_path_ends_with_host_toml() {
        if let Ok(path) = config_file_path() {
            assert!(path.ends_with("settings-host/host.toml"), "got {path:?}");
        }
        // NoPlatformConfigDir in a stripped CI environment is also acceptable.
    }
}
