//! The seam between the settings store and the OS file-association facility.
//!
//! # What is a file association? (for beginners)
//!
//! Desktop operating systems keep a global table mapping file extensions to
//! the program that opens them.  On Windows it lives in the registry under
//! `HKCU\Software\Classes`; on Linux desktops it is spread over XDG MIME
//! packages, `.desktop` entries and `mimeapps.list`.
//!
//! The store never touches that table itself.  It builds an
//! [`AssociationBinding`] (its association tag plus the running executable's
//! path) and hands it to an [`AssociationRegistrar`].  Platform registrars are
//! provided by `settings-host`; tests inject a fake.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Error type for association registrars.
#[derive(Debug, Error)]
pub enum AssociationError {
    /// The OS refused the change for lack of privilege.
    ///
    /// The store treats this as a no-op for register and deregister.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// File associations are not supported on this platform.
    #[error("file associations are not supported on this platform")]
    Unsupported,

    /// The running executable's path could not be resolved.
    #[error("could not resolve the running executable: {0}")]
    ExecutableUnavailable(#[source] std::io::Error),

    /// A file system I/O error occurred while editing association files.
    #[error("I/O error accessing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Any other platform API failure.
    #[error("platform error: {0}")]
    Platform(String),
}

impl AssociationError {
    /// Maps an I/O error, turning `PermissionDenied` into [`AssociationError::PermissionDenied`].
    pub fn from_io(path: &Path, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::PermissionDenied {
            AssociationError::PermissionDenied(format!("{}: {source}", path.display()))
        } else {
            AssociationError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }
}

/// What a registrar binds: one extension to one executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssociationBinding {
    /// Association tag, used as the file extension without the leading dot.
    pub tag: String,
    /// Absolute path of the executable that should open matching files.
    pub executable: PathBuf,
}

impl AssociationBinding {
    pub fn new(tag: impl Into<String>, executable: impl Into<PathBuf>) -> Self {
        Self {
            tag: tag.into(),
            executable: executable.into(),
        }
    }

    /// The extension with its leading dot, e.g. `.stk`.
    pub fn extension(&self) -> String {
        format!(".{}", self.tag)
    }

    /// Programmatic identifier for the file type, e.g. `stk_File`.
    pub fn prog_id(&self) -> String {
        format!("{}_File", self.tag)
    }

    /// Shell command that opens a file with the executable; `%1` is the file.
    pub fn open_command(&self) -> String {
        format!("\"{}\" \"%1\"", self.executable.display())
    }
}

/// OS facility that maps a file extension to a handler executable.
///
/// Implementations must be idempotent: registering twice or deregistering an
/// absent binding succeeds.
#[cfg_attr(test, mockall::automock)]
pub trait AssociationRegistrar: Send + Sync {
    /// Returns `true` if `binding.tag` currently opens with `binding.executable`.
    ///
    /// # Errors
    ///
    /// Returns [`AssociationError`] if the OS state cannot be read.
    fn is_registered(&self, binding: &AssociationBinding) -> Result<bool, AssociationError>;

    /// Makes `binding.executable` the handler for `binding.tag`.
    ///
    /// # Errors
    ///
    /// Returns [`AssociationError::PermissionDenied`] when privileges are
    /// lacking, or another variant for other failures.
    fn register(&self, binding: &AssociationBinding) -> Result<(), AssociationError>;

    /// Removes the handler registration for `binding.tag`.
    ///
    /// # Errors
    ///
    /// Same as [`AssociationRegistrar::register`].
    fn deregister(&self, binding: &AssociationBinding) -> Result<(), AssociationError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binding_derived_names() {
        let binding = AssociationBinding::new("test", "/opt/app/bin/host");
        assert_eq!(binding.extension(), ".test");
        assert_eq!(binding.prog_id(), "test_File");
        assert_eq!(binding.open_command(), "\"/opt/app/bin/host\" \"%1\"");
    }

    #[test]
    fn test_from_io_maps_permission_denied() {
        let err = AssociationError::from_io(
            Path::new("/x"),
            std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        );
        assert!(matches!(err, AssociationError::PermissionDenied(_)));
    }

    #[test]
    fn test_from_io_keeps_other_errors() {
        let err = AssociationError::from_io(
            Path::new("/x"),
            std::io::Error::from(std::io::ErrorKind::NotFound),
        );
        assert!(matches!(err, AssociationError::Io { .. }));
    }
}
