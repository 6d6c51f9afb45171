//! SettingsSession: the host's use cases over one settings store.
//!
//! This use case sits at the application layer.  It owns the
//! [`SettingsStore`] built from the host configuration and delegates OS
//! association changes to an injected [`AssociationRegistrar`] trait object.
//! The platform registrars are in the infrastructure layer.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use settings_core::domain::value::ParseValueError;
use settings_core::{
    AssociationError, AssociationRegistrar, SettingValue, SettingsError, SettingsStore, ValueType,
};
use thiserror::Error;
use tracing::info;

use crate::infrastructure::storage::config::{ConfigError, HostConfig};

/// Error type for session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Association(#[from] AssociationError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("setting {key:?}: {source}")]
    Parse {
        key: String,
        #[source]
        source: ParseValueError,
    },
}

/// One row of [`SettingsSession::show`].
#[derive(Debug, Clone, PartialEq)]
pub struct SettingLine {
    pub key: String,
    pub value_type: ValueType,
    pub value: String,
    /// `false` for keys introduced by loading a file.
    pub has_default: bool,
    pub is_default: bool,
}

/// Association state as reported to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssociationReport {
    pub tag: String,
    pub executable: Option<PathBuf>,
    pub registered: bool,
}

/// The settings host's use cases.
pub struct SettingsSession {
    store: SettingsStore,
    registrar: Arc<dyn AssociationRegistrar>,
}

impl SettingsSession {
    pub fn new(store: SettingsStore, registrar: Arc<dyn AssociationRegistrar>) -> Self {
        Self { store, registrar }
    }

    /// Builds the store from the host configuration's schema and settings.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Config`] for unsupported defaults and
    /// [`SessionError::Settings`] for an invalid schema or association tag.
    pub fn from_config(
        config: &HostConfig,
        registrar: Arc<dyn AssociationRegistrar>,
    ) -> Result<Self, SessionError> {
        let mut store = SettingsStore::new(config.schema()?, &config.host.association)?;
        if let Some(dir) = &config.host.documents_dir {
            store = store.with_documents_dir(dir);
        }
        Ok(Self::new(store, registrar))
    }

    pub fn store(&self) -> &SettingsStore {
        &self.store
    }

    /// Merges a settings file into the session.
    ///
    /// # Errors
    ///
    /// Propagates [`SettingsStore::load`] errors.
    pub fn open(&mut self, path: &Path) -> Result<(), SessionError> {
        self.store.load(path)?;
        Ok(())
    }

    /// Lists every live setting in key order.
    pub fn show(&self) -> Vec<SettingLine> {
        self.store
            .iter()
            .map(|(key, value)| SettingLine {
                key: key.to_string(),
                value_type: value.value_type(),
                value: value.to_string(),
                has_default: self.store.default_value(key).is_some(),
                is_default: self.store.is_default(key),
            })
            .collect()
    }

    /// Parses `text` as the recorded type of `key` and stores it.
    ///
    /// # Errors
    ///
    /// - [`SettingsError::NullValue`] if `text` is `None`.
    /// - [`SettingsError::KeyNotFound`] if `key` does not exist.
    /// - [`SessionError::Parse`] if `text` is not a literal of the key's type.
    pub fn set_from_text(&mut self, key: &str, text: Option<&str>) -> Result<(), SessionError> {
        let value = match text {
            None => None,
            Some(text) => {
                let ty = self
                    .store
                    .value_type(key)
                    .ok_or_else(|| SettingsError::KeyNotFound(key.to_string()))?;
                let parsed = SettingValue::parse_as(ty, text).map_err(|source| SessionError::Parse {
                    key: key.to_string(),
                    source,
                })?;
                Some(parsed)
            }
        };
        self.store.set_value(key, value)?;
        Ok(())
    }

    /// Saves under `name` in the documents directory, or re-saves the current
    /// file when `name` is `None`.
    ///
    /// # Errors
    ///
    /// Propagates [`SettingsStore::save`] errors.
    pub fn save(&mut self, name: Option<&str>) -> Result<PathBuf, SessionError> {
        Ok(self.store.save(name)?)
    }

    /// Saves to an explicit path.
    ///
    /// # Errors
    ///
    /// Propagates [`SettingsStore::save_to`] errors.
    pub fn save_to(&mut self, path: &Path) -> Result<PathBuf, SessionError> {
        Ok(self.store.save_to(path)?)
    }

    pub fn reset(&mut self) {
        self.store.reset();
    }

    /// Reports whether this executable handles the session's association tag.
    pub fn association_status(&self) -> AssociationReport {
        AssociationReport {
            tag: self.store.association().to_string(),
            executable: std::env::current_exe().ok(),
            registered: self.store.is_association_registered(self.registrar.as_ref()),
        }
    }

    /// Registers this executable and reports the resulting state.
    ///
    /// A refusal for lack of privilege is not an error; the report then shows
    /// `registered: false`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Association`] for other registrar failures.
    pub fn register(&self) -> Result<AssociationReport, SessionError> {
        self.store.register_association(self.registrar.as_ref())?;
        let report = self.association_status();
        info!(tag = %report.tag, registered = report.registered, "register finished");
        Ok(report)
    }

    /// Removes the registration and reports the resulting state.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Association`] for failures other than lacking privilege.
    pub fn deregister(&self) -> Result<AssociationReport, SessionError> {
        self.store.deregister_association(self.registrar.as_ref())?;
        let report = self.association_status();
        info!(tag = %report.tag, registered = report.registered, "deregister finished");
        Ok(report)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::association::mock::InMemoryRegistrar;

    fn config() -> HostConfig {
        let mut cfg = HostConfig::default();
        cfg.host.association = "test".to_string();
        cfg.defaults
            .insert("theme".to_string(), toml::Value::String("dark".into()));
        cfg.defaults
            .insert("font_size".to_string(), toml::Value::Integer(12));
        cfg
    }

    fn session() -> SettingsSession {
        SettingsSession::from_config(&config(), Arc::new(InMemoryRegistrar::new())).unwrap()
    }

    #[test]
    fn test_from_config_builds_schema() {
        let session = session();
        assert_eq!(session.store().association(), "test");
        assert_eq!(session.store().get::<i64>("font_size").unwrap(), 12);
        assert_eq!(session.store().get::<String>("theme").unwrap(), "dark");
    }

    #[test]
    fn test_from_config_rejects_invalid_association() {
        let mut cfg = config();
        cfg.host.association = String::new();
        let result = SettingsSession::from_config(&cfg, Arc::new(InMemoryRegistrar::new()));
        assert!(matches!(
            result,
            Err(SessionError::Settings(SettingsError::InvalidAssociation { .. }))
        ));
    }

    #[test]
    fn test_set_from_text_parses_recorded_type() {
        // Arrange
        let mut session = session();

        // Act
        session.set_from_text("font_size", Some("14")).unwrap();

        // Assert
        assert_eq!(session.store().get::<i64>("font_size").unwrap(), 14);
        let line = session
            .show()
            .into_iter()
            .find(|l| l.key == "font_size")
            .unwrap();
        assert_eq!(line.value, "14");
        assert_eq!(line.value_type, ValueType::Int64);
        assert!(line.has_default);
        assert!(!line.is_default);
    }

    #[test]
    fn test_set_from_text_rejects_unparseable_text() {
        let mut session = session();
        let err = session.set_from_text("font_size", Some("big")).unwrap_err();
        assert!(matches!(err, SessionError::Parse { .. }));
        assert_eq!(session.store().get::<i64>("font_size").unwrap(), 12);
    }

    #[test]
    fn test_set_from_text_without_value_is_null_value() {
        let mut session = session();
        let err = session.set_from_text("theme", None).unwrap_err();
        assert!(matches!(
            err,
            SessionError::Settings(SettingsError::NullValue(_))
        ));
    }

    #[test]
    fn test_set_from_text_unknown_key_is_key_not_found() {
        let mut session = session();
        let err = session.set_from_text("missing", Some("1")).unwrap_err();
        assert!(matches!(
            err,
            SessionError::Settings(SettingsError::KeyNotFound(_))
        ));
    }

    #[test]
    fn test_register_and_deregister_report_state() {
        let session = session();
        assert!(!session.association_status().registered);

        assert!(session.register().unwrap().registered);
        assert!(!session.deregister().unwrap().registered);
    }

    #[test]
    fn test_register_without_privilege_is_not_an_error() {
        let session =
            SettingsSession::from_config(&config(), Arc::new(InMemoryRegistrar::denying_writes()))
                .unwrap();

        let report = session.register().expect("permission denial is swallowed");

        assert!(!report.registered);
        assert_eq!(report.tag, "test");
    }

    #[test]
    fn test_register_platform_failure_is_reported() {
        let registrar = InMemoryRegistrar {
            should_fail: true,
            ..InMemoryRegistrar::default()
        };
        let session = SettingsSession::from_config(&config(), Arc::new(registrar)).unwrap();

        assert!(matches!(
            session.register(),
            Err(SessionError::Association(AssociationError::Platform(_)))
        ));
    }
}
