//! Platform-specific file-association registrars.
//!
//! Each platform implements [`AssociationRegistrar`]; the correct one is
//! selected at compile time via `#[cfg(target_os = ...)]` and re-exported as
//! `NativeAssociationRegistrar`:
//!
//! | Module        | OS      | Facility                                         |
//! |---------------|---------|--------------------------------------------------|
//! | `windows`     | Windows | `HKCU\Software\Classes` registry keys            |
//! | `linux`       | Linux   | XDG MIME package, desktop entry, `mimeapps.list` |
//! | `unsupported` | others  | always [`AssociationError::Unsupported`]         |
//!
//! [`mock::InMemoryRegistrar`] is always compiled so tests on any platform can
//! use it without touching real OS state.

use settings_core::{AssociationBinding, AssociationError, AssociationRegistrar};

pub mod mock;

// ── Windows implementation ────────────────────────────────────────────────────

#[cfg(target_os = "windows")]
pub mod windows;

#[cfg(target_os = "windows")]
pub use windows::WindowsAssociationRegistrar as NativeAssociationRegistrar;

// ── Linux implementation ──────────────────────────────────────────────────────

#[cfg(target_os = "linux")]
pub mod linux;

#[cfg(target_os = "linux")]
pub use linux::XdgAssociationRegistrar as NativeAssociationRegistrar;

// ── Fallback for other platforms ──────────────────────────────────────────────

/// Registrar for platforms without a supported association facility.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedRegistrar;

impl UnsupportedRegistrar {
    pub fn new() -> Self {
        Self
    }
}

impl AssociationRegistrar for UnsupportedRegistrar {
    fn is_registered(&self, _binding: &AssociationBinding) -> Result<bool, AssociationError> {
        Err(AssociationError::Unsupported)
    }

    fn register(&self, _binding: &AssociationBinding) -> Result<(), AssociationError> {
        Err(AssociationError::Unsupported)
    }

    fn deregister(&self, _binding: &AssociationBinding) -> Result<(), AssociationError> {
        Err(AssociationError::Unsupported)
    }
}

#[cfg(not(any(target_os = "windows", target_os = "linux")))]
pub use UnsupportedRegistrar as NativeAssociationRegistrar;
