//! Application layer use cases for the settings host.
//!
//! - **`session`** – Builds a settings store from the host configuration and
//!   exposes the commands the CLI offers: open, show, set, save, reset, and the
//!   association register/deregister/status trio.  The OS registrar is
//!   injected at construction time.

pub mod session;
