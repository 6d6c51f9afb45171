//! In-memory association registrar for tests.
//!
//! # Why an in-memory registrar?
//!
//! The real registrars edit OS-global state: the Windows registry or the
//! user's XDG desktop database.  Running them from tests would change which
//! program opens files on the developer's machine.
//!
//! `InMemoryRegistrar` keeps the tag → executable table in a
//! `Mutex<HashMap<...>>` so tests can register, query and deregister freely
//! and then inspect the table directly.
//!
//! # Failure flags
//!
//! - `deny_writes = true` makes `register`/`deregister` return
//!   `PermissionDenied`, simulating a user without the required privilege.
//! - `should_fail = true` makes every method return a `Platform` error.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use settings_core::{AssociationBinding, AssociationError, AssociationRegistrar};

/// A registrar that records bindings in memory.
#[derive(Default)]
pub struct InMemoryRegistrar {
    /// Current tag → executable registrations.
    pub registrations: Mutex<HashMap<String, PathBuf>>,
    /// When `true`, writes fail with `PermissionDenied`.
    pub deny_writes: bool,
    /// When `true`, every method returns `AssociationError::Platform`.
    pub should_fail: bool,
}

impl InMemoryRegistrar {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registrar whose writes are refused for lack of privilege.
    pub fn denying_writes() -> Self {
        Self {
            deny_writes: true,
            ..Self::default()
        }
    }

    fn check(&self, writing: bool) -> Result<(), AssociationError> {
        if self.should_fail {
            return Err(AssociationError::Platform("mock failure".into()));
        }
        if writing && self.deny_writes {
            return Err(AssociationError::PermissionDenied("mock denial".into()));
        }
        Ok(())
    }
}

impl AssociationRegistrar for InMemoryRegistrar {
    fn is_registered(&self, binding: &AssociationBinding) -> Result<bool, AssociationError> {
        self.check(false)?;
        let table = self.registrations.lock().unwrap();
        Ok(table.get(&binding.tag) == Some(&binding.executable))
    }

    fn register(&self, binding: &AssociationBinding) -> Result<(), AssociationError> {
        self.check(true)?;
        self.registrations
            .lock()
            .unwrap()
            .insert(binding.tag.clone(), binding.executable.clone());
        Ok(())
    }

    fn deregister(&self, binding: &AssociationBinding) -> Result<(), AssociationError> {
        self.check(true)?;
        self.registrations.lock().unwrap().remove(&binding.tag);
        Ok(())
    }
}
