//! settings-host library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does settings-host do? (for beginners)
//!
//! `settings-core` provides the store; this crate is the process that owns
//! one.  It:
//!
//! 1. Reads its TOML configuration (association tag, log level, default
//!    schema).
//! 2. Opens settings files, either named on the command line or handed over
//!    by the OS after the user double-clicks a `*.<tag>` file.
//! 3. Registers itself as the default handler for that extension using the
//!    platform facility: the registry on Windows, the XDG databases on Linux.

/// Application layer: use cases for the host.
pub mod application;

/// Infrastructure layer: OS association registrars and configuration storage.
pub mod infrastructure;
