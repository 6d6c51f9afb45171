//! Domain types for the settings store.
//!
//! Pure logic with no file-system or OS-registry access: the tagged value
//! model and the file-name rules the store validates its inputs against.

/// Tagged setting values and the Rust-type mapping.
pub mod value;

/// File-name character validation.
pub mod names;
