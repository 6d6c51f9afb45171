//! The settings store.
//!
//! A [`SettingsStore`] owns two maps:
//!
//! - the **default map**, captured at construction and never mutated, and
//! - the **live map**, a copy of the defaults that `set` and `load` mutate.
//!
//! It also remembers the file most recently saved to or loaded from, which
//! becomes the implicit target of `save(None)`.
//!
//! ```text
//!            save(p) / load(p)            save(None)
//!   Unset ───────────────────▶ Bound(p) ──────────────▶ Bound(p)
//!     ▲                            │
//!     └────────── reset() ─────────┘
//! ```
//!
//! Failed operations never change either map or the loaded-file reference.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::association::{AssociationBinding, AssociationError, AssociationRegistrar};
use crate::domain::names::{has_forbidden_chars, is_blank};
use crate::domain::value::{SettingType, SettingValue, ValueType};
use crate::error::SettingsError;
use crate::persistence::codec::{decode_settings, encode_settings, CodecError};
use crate::persistence::file::{read_file, write_atomic};

/// A typed, schema-validated settings collection.
///
/// Not internally synchronized: mutation takes `&mut self`, so sharing a store
/// between threads requires the caller to wrap it (e.g. in a `Mutex`).
#[derive(Debug, Clone)]
pub struct SettingsStore {
    values: BTreeMap<String, SettingValue>,
    defaults: BTreeMap<String, SettingValue>,
    association: String,
    current_file: Option<PathBuf>,
    documents_dir: Option<PathBuf>,
}

impl SettingsStore {
    /// Creates a store from a default schema and a file-association tag.
    ///
    /// An empty schema is legal.  Values are accepted as anything convertible
    /// to `Option<SettingValue>`, so callers holding possibly-absent values can
    /// pass them directly; an absent value is rejected.
    ///
    /// # Errors
    ///
    /// - [`SettingsError::InvalidSchema`] if a key is blank or a value is absent.
    /// - [`SettingsError::InvalidAssociation`] if `association` is blank or
    ///   contains characters forbidden in file names.
    pub fn new<I, K, V>(defaults: I, association: &str) -> Result<Self, SettingsError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Option<SettingValue>>,
    {
        let mut schema = BTreeMap::new();
        for (key, value) in defaults {
            let key = key.into();
            if is_blank(&key) {
                return Err(SettingsError::InvalidSchema(
                    "no key may be empty or whitespace".to_string(),
                ));
            }
            let value = value
                .into()
                .ok_or_else(|| SettingsError::InvalidSchema(format!("no value for key {key:?}")))?;
            schema.insert(key, value);
        }

        if is_blank(association) {
            return Err(SettingsError::InvalidAssociation {
                tag: association.to_string(),
                reason: "must not be empty or whitespace",
            });
        }
        if has_forbidden_chars(association) {
            return Err(SettingsError::InvalidAssociation {
                tag: association.to_string(),
                reason: "must not contain characters illegal in file names",
            });
        }

        debug!(keys = schema.len(), association, "settings store created");
        Ok(Self {
            values: schema.clone(),
            defaults: schema,
            association: association.to_string(),
            current_file: None,
            documents_dir: None,
        })
    }

    /// Overrides the directory that `save(Some(name))` writes into.
    ///
    /// Without an override the platform documents directory is used, falling
    /// back to the home directory.
    pub fn with_documents_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.documents_dir = Some(dir.into());
        self
    }

    // ── Accessors ─────────────────────────────────────────────────────────────

    /// The association tag, used as extension for named saves.
    pub fn association(&self) -> &str {
        &self.association
    }

    /// The file most recently saved to or loaded from, if any.
    pub fn current_file(&self) -> Option<&Path> {
        self.current_file.as_deref()
    }

    /// The immutable default map.
    pub fn defaults(&self) -> &BTreeMap<String, SettingValue> {
        &self.defaults
    }

    /// Iterates over live entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SettingValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Recorded type of the live value under `key`.
    pub fn value_type(&self, key: &str) -> Option<ValueType> {
        self.values.get(key).map(SettingValue::value_type)
    }

    /// Default value for `key`, or `None` for keys introduced by `load`.
    pub fn default_value(&self, key: &str) -> Option<&SettingValue> {
        self.defaults.get(key)
    }

    /// Returns `true` if the live value under `key` equals its default.
    pub fn is_default(&self, key: &str) -> bool {
        matches!(
            (self.values.get(key), self.defaults.get(key)),
            (Some(live), Some(default)) if live == default
        )
    }

    // ── Get / Set ─────────────────────────────────────────────────────────────

    /// Returns the live value for `key` without a type check.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::KeyNotFound`] for blank or unknown keys.
    pub fn value(&self, key: &str) -> Result<&SettingValue, SettingsError> {
        if is_blank(key) {
            return Err(SettingsError::KeyNotFound(key.to_string()));
        }
        self.values
            .get(key)
            .ok_or_else(|| SettingsError::KeyNotFound(key.to_string()))
    }

    /// Returns a copy of the live value for `key` as `T`.
    ///
    /// # Errors
    ///
    /// - [`SettingsError::KeyNotFound`] for blank or unknown keys.
    /// - [`SettingsError::TypeMismatch`] if `T` is not the recorded type.
    pub fn get<T: SettingType>(&self, key: &str) -> Result<T, SettingsError> {
        let value = self.value(key)?;
        T::from_setting(value).ok_or_else(|| SettingsError::TypeMismatch {
            key: key.to_string(),
            expected: value.value_type(),
            actual: T::VALUE_TYPE,
        })
    }

    /// Replaces the live value for an existing `key`.
    ///
    /// # Errors
    ///
    /// - [`SettingsError::KeyNotFound`] if `key` is not in the live map.
    /// - [`SettingsError::TypeMismatch`] if `T` is not the recorded type.
    pub fn set<T: SettingType>(&mut self, key: &str, value: T) -> Result<(), SettingsError> {
        self.set_value(key, Some(value.into_setting()))
    }

    /// Untyped form of [`SettingsStore::set`].
    ///
    /// # Errors
    ///
    /// - [`SettingsError::NullValue`] if `value` is `None`.
    /// - [`SettingsError::KeyNotFound`] if `key` is not in the live map.
    /// - [`SettingsError::TypeMismatch`] if the variant differs from the recorded type.
    pub fn set_value(&mut self, key: &str, value: Option<SettingValue>) -> Result<(), SettingsError> {
        let value = value.ok_or_else(|| SettingsError::NullValue(key.to_string()))?;
        let slot = self
            .values
            .get_mut(key)
            .ok_or_else(|| SettingsError::KeyNotFound(key.to_string()))?;

        if slot.value_type() != value.value_type() {
            return Err(SettingsError::TypeMismatch {
                key: key.to_string(),
                expected: slot.value_type(),
                actual: value.value_type(),
            });
        }

        debug!(key, value = %value, "setting updated");
        *slot = value;
        Ok(())
    }

    // ── Reset ─────────────────────────────────────────────────────────────────

    /// Restores every default, drops keys introduced by `load`, and forgets
    /// the loaded file.  Idempotent.
    pub fn reset(&mut self) {
        self.values = self.defaults.clone();
        self.current_file = None;
        info!(association = %self.association, "settings reset to defaults");
    }

    // ── Save / Load ───────────────────────────────────────────────────────────

    /// Saves the live map.
    ///
    /// - `None` or a blank name re-saves to the currently loaded file.
    /// - A name writes `<documents-dir>/<name>.<association>`.
    ///
    /// Returns the path written, which becomes the current file.
    ///
    /// # Errors
    ///
    /// - [`SettingsError::NoTargetSpecified`] if no name is given and no file is loaded.
    /// - [`SettingsError::InvalidPath`] if `name` contains characters illegal in file names.
    /// - [`SettingsError::NoDocumentsDirectory`], [`SettingsError::Io`] or
    ///   [`SettingsError::SerializationFailure`] on write failures.
    pub fn save(&mut self, filename: Option<&str>) -> Result<PathBuf, SettingsError> {
        let target = match filename.filter(|name| !is_blank(name)) {
            None => self
                .current_file
                .clone()
                .ok_or(SettingsError::NoTargetSpecified)?,
            Some(name) => {
                if has_forbidden_chars(name) {
                    return Err(SettingsError::InvalidPath(name.to_string()));
                }
                self.resolve_documents_dir()?
                    .join(format!("{name}.{}", self.association))
            }
        };
        self.write_to(target)
    }

    /// Saves the live map to an explicit `path`, creating parent directories.
    ///
    /// Returns the path written, which becomes the current file.
    ///
    /// # Errors
    ///
    /// - [`SettingsError::InvalidPath`] if `path` has no file name or the file
    ///   name contains characters illegal in file names.
    /// - [`SettingsError::Io`] or [`SettingsError::SerializationFailure`] on write failures.
    pub fn save_to(&mut self, path: impl AsRef<Path>) -> Result<PathBuf, SettingsError> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| SettingsError::InvalidPath(path.display().to_string()))?;
        if is_blank(&name) || has_forbidden_chars(&name) {
            return Err(SettingsError::InvalidPath(name));
        }
        self.write_to(path.to_path_buf())
    }

    /// Merges the entries of a settings file into the live map.
    ///
    /// Existing keys are overwritten and unknown keys are added without a
    /// default.  An entry whose type differs from the live value's type fails
    /// the whole load, exactly like [`SettingsStore::set`]; validation runs
    /// before any mutation, so a failed load merges nothing.
    ///
    /// # Errors
    ///
    /// - [`SettingsError::InvalidArgument`] if `path` is empty.
    /// - [`SettingsError::FileNotFound`] if `path` is not an existing file.
    /// - [`SettingsError::SerializationFailure`] if the file cannot be decoded.
    /// - [`SettingsError::TypeMismatch`] if an entry changes a key's type.
    /// - [`SettingsError::Io`] for other read failures.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(SettingsError::InvalidArgument("source path is empty"));
        }
        if !path.is_file() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }
        let resolved = absolutize(path)?;

        let bytes = read_file(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                SettingsError::FileNotFound(path.to_path_buf())
            } else {
                SettingsError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
        let incoming = decode_settings(&bytes)?;

        for (key, value) in &incoming {
            if is_blank(key) {
                return Err(CodecError::Malformed("blank setting key".to_string()).into());
            }
            if let Some(current) = self.values.get(key) {
                if current.value_type() != value.value_type() {
                    return Err(SettingsError::TypeMismatch {
                        key: key.clone(),
                        expected: current.value_type(),
                        actual: value.value_type(),
                    });
                }
            }
        }

        let added = incoming
            .keys()
            .filter(|k| !self.values.contains_key(*k))
            .count();
        let total = incoming.len();
        self.values.extend(incoming);
        info!(path = %resolved.display(), entries = total, added, "settings loaded");
        self.current_file = Some(resolved);
        Ok(())
    }

    // ── File association ──────────────────────────────────────────────────────

    /// The binding this store hands to a registrar: its tag and the running
    /// executable.
    ///
    /// # Errors
    ///
    /// Returns [`AssociationError::ExecutableUnavailable`] if the executable
    /// path cannot be resolved.
    pub fn association_binding(&self) -> Result<AssociationBinding, AssociationError> {
        let exe = std::env::current_exe().map_err(AssociationError::ExecutableUnavailable)?;
        Ok(AssociationBinding::new(self.association.clone(), exe))
    }

    /// Returns `true` if this executable handles files with the association tag.
    ///
    /// Any failure to query the OS reads as "not registered".
    pub fn is_association_registered(&self, registrar: &dyn AssociationRegistrar) -> bool {
        match self
            .association_binding()
            .and_then(|binding| registrar.is_registered(&binding))
        {
            Ok(registered) => registered,
            Err(e) => {
                debug!(association = %self.association, "association query failed: {e}");
                false
            }
        }
    }

    /// Registers this executable as the handler for the association tag.
    ///
    /// Permission failures are logged and ignored.
    ///
    /// # Errors
    ///
    /// Returns any [`AssociationError`] other than `PermissionDenied`.
    pub fn register_association(
        &self,
        registrar: &dyn AssociationRegistrar,
    ) -> Result<(), AssociationError> {
        let binding = self.association_binding()?;
        ignore_permission_denied(registrar.register(&binding), "register", &binding)?;
        info!(association = %self.association, "file association registered");
        Ok(())
    }

    /// Removes the handler registration for the association tag.
    ///
    /// Permission failures are logged and ignored.
    ///
    /// # Errors
    ///
    /// Returns any [`AssociationError`] other than `PermissionDenied`.
    pub fn deregister_association(
        &self,
        registrar: &dyn AssociationRegistrar,
    ) -> Result<(), AssociationError> {
        let binding = self.association_binding()?;
        ignore_permission_denied(registrar.deregister(&binding), "deregister", &binding)?;
        info!(association = %self.association, "file association removed");
        Ok(())
    }

    // ── Internals ─────────────────────────────────────────────────────────────

    fn resolve_documents_dir(&self) -> Result<PathBuf, SettingsError> {
        pick_documents_dir(
            self.documents_dir.clone(),
            dirs::document_dir,
            dirs::home_dir,
        )
    }

    fn write_to(&mut self, target: PathBuf) -> Result<PathBuf, SettingsError> {
        let target = absolutize(&target)?;
        let bytes = encode_settings(&self.values)?;
        write_atomic(&target, &bytes).map_err(|(path, source)| SettingsError::Io { path, source })?;

        info!(path = %target.display(), entries = self.values.len(), "settings saved");
        self.current_file = Some(target.clone());
        Ok(target)
    }
}

/// Override first, then the platform documents folder, then home.
fn pick_documents_dir(
    overridden: Option<PathBuf>,
    documents: impl FnOnce() -> Option<PathBuf>,
    home: impl FnOnce() -> Option<PathBuf>,
) -> Result<PathBuf, SettingsError> {
    overridden
        .or_else(documents)
        .or_else(home)
        .ok_or(SettingsError::NoDocumentsDirectory)
}

fn absolutize(path: &Path) -> Result<PathBuf, SettingsError> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().map_err(|source| SettingsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(cwd.join(path))
}

fn ignore_permission_denied(
    result: Result<(), AssociationError>,
    action: &str,
    binding: &AssociationBinding,
) -> Result<(), AssociationError> {
    match result {
        Err(AssociationError::PermissionDenied(detail)) => {
            warn!(tag = %binding.tag, "cannot {action} file association, ignoring: {detail}");
            Ok(())
        }
        other => other,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
