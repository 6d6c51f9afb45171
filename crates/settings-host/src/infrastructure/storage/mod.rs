//! Storage infrastructure: host configuration persistence.
//!
//! The `config` sub-module reads the host's TOML file from the platform config
//! directory and turns its `[defaults]` table into the settings schema.  The
//! settings files themselves are written by `settings-core`.

pub mod config;
