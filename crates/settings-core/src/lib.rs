//! # settings-core
//!
//! A typed, schema-validated settings store.  A [`SettingsStore`] is seeded
//! from a default schema, can be saved to and restored from a single file, and
//! can ask an OS collaborator to register the running executable as the
//! handler for files carrying the store's association tag.
//!
//! This crate has no dependencies on OS registries or desktop databases.  The
//! platform-specific registrars live in `settings-host`.
//!
//! # Architecture overview (for beginners)
//!
//! - **`domain`** – The value model.  Every stored setting is a
//!   [`SettingValue`], a sum type whose variant doubles as the setting's
//!   declared type.  `get::<T>` and `set::<T>` compare variants instead of
//!   inspecting runtime type names.
//!
//! - **`store`** – The [`SettingsStore`] itself: the live map, the immutable
//!   default map, and the currently-loaded-file reference.
//!
//! - **`persistence`** – How a live map becomes bytes on disk.  A small
//!   header (magic + version + length) wraps a `bincode` payload, and files
//!   are written atomically.
//!
//! - **`association`** – The narrow seam to the OS file-association facility:
//!   the [`AssociationRegistrar`] trait and the [`AssociationBinding`] it
//!   receives.

pub mod association;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod store;

// Re-export the most-used types at the crate root so callers can write
// `settings_core::SettingsStore` instead of `settings_core::store::SettingsStore`.
pub use association::{AssociationBinding, AssociationError, AssociationRegistrar};
pub use domain::value::{SettingType, SettingValue, ValueType};
pub use error::SettingsError;
pub use persistence::codec::{decode_settings, encode_settings, CodecError};
pub use store::SettingsStore;
