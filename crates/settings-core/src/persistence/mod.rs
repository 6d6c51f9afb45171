//! Persistence module: the settings file codec and atomic file I/O.

pub mod codec;
pub mod file;

pub use codec::{decode_settings, encode_settings, CodecError};
