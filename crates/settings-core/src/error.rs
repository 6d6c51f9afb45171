//! Error type for settings store operations.

use std::path::PathBuf;

use thiserror::Error;

use crate::domain::value::ValueType;
use crate::persistence::codec::CodecError;

/// Errors returned by [`crate::SettingsStore`].
///
/// Every error is raised synchronously at the point of violation.  A failed
/// operation leaves the store exactly as it was before the call.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// A default schema entry has a blank key or an absent value.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    /// The association tag is blank or contains characters illegal in file names.
    #[error("invalid file association {tag:?}: {reason}")]
    InvalidAssociation { tag: String, reason: &'static str },

    /// The key is blank or not present in the live map.
    #[error("setting {0:?} not found")]
    KeyNotFound(String),

    /// An absent value was supplied for a setting.
    #[error("setting {0:?} cannot be set to an absent value")]
    NullValue(String),

    /// The requested or supplied type differs from the setting's recorded type.
    #[error("type mismatch for setting {key:?}: recorded {expected}, got {actual}")]
    TypeMismatch {
        key: String,
        expected: ValueType,
        actual: ValueType,
    },

    /// `save` was called without a target and no file is currently loaded.
    #[error("no save target given and no settings file is loaded")]
    NoTargetSpecified,

    /// The save target's file name contains characters illegal in file names.
    #[error("invalid file name {0:?}")]
    InvalidPath(String),

    /// A required argument was empty.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// The settings file to load does not exist.
    #[error("settings file not found: {0}")]
    FileNotFound(PathBuf),

    /// The settings file could not be encoded or decoded.
    #[error("settings serialization failed: {0}")]
    SerializationFailure(#[from] CodecError),

    /// The platform documents directory could not be determined.
    #[error("could not determine the user documents directory")]
    NoDocumentsDirectory,

    /// A file system I/O error occurred.
    #[error("I/O error accessing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
