//! Infrastructure layer for the settings host.
//!
//! Contains OS-facing adapters.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `settings_core`, but MUST NOT be imported by `settings_core`.
//!
//! # Sub-modules
//!
//! - **`association`** – OS-specific implementations of
//!   `AssociationRegistrar`.  The correct implementation is selected at compile
//!   time using `#[cfg(target_os)]`.  An `InMemoryRegistrar` is also provided
//!   for tests.
//!
//! - **`storage`** – The host's own TOML configuration: association tag, log
//!   level, documents directory and the default settings schema.

pub mod association;
pub mod storage;
