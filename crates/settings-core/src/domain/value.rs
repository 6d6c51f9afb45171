//! Tagged setting values.
//!
//! # Why a sum type? (for beginners)
//!
//! A settings map is heterogeneous: `"theme"` may hold text while
//! `"font_size"` holds an integer.  Rust maps hold a single value type, so
//! each entry is stored as a [`SettingValue`] enum.  The enum *variant* is the
//! entry's declared type; [`ValueType`] names that variant without carrying a
//! payload.
//!
//! The [`SettingType`] trait connects ordinary Rust types (`i32`, `String`,
//! ...) to their variant so the store can offer `get::<i32>("font_size")`
//! and refuse `set("theme", 1)` with a type mismatch.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ── Value types ───────────────────────────────────────────────────────────────

/// Discriminant of a [`SettingValue`], i.e. the declared type of a setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    Bool,
    Char,
    Int32,
    Int64,
    UInt32,
    UInt64,
    Float32,
    Float64,
    Text,
    Bytes,
}

impl ValueType {
    /// Short lowercase name used in messages and CLI output.
    pub fn name(self) -> &'static str {
        match self {
            ValueType::Bool => "bool",
            ValueType::Char => "char",
            ValueType::Int32 => "i32",
            ValueType::Int64 => "i64",
            ValueType::UInt32 => "u32",
            ValueType::UInt64 => "u64",
            ValueType::Float32 => "f32",
            ValueType::Float64 => "f64",
            ValueType::Text => "text",
            ValueType::Bytes => "bytes",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single stored setting.  The variant is the setting's type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SettingValue {
    Bool(bool),
    Char(char),
    Int32(i32),
    Int64(i64),
    UInt32(u32),
    UInt64(u64),
    Float32(f32),
    Float64(f64),
    Text(String),
    Bytes(Vec<u8>),
}

impl SettingValue {
    /// Returns the declared type of this value.
    pub fn value_type(&self) -> ValueType {
        match self {
            SettingValue::Bool(_) => ValueType::Bool,
            SettingValue::Char(_) => ValueType::Char,
            SettingValue::Int32(_) => ValueType::Int32,
            SettingValue::Int64(_) => ValueType::Int64,
            SettingValue::UInt32(_) => ValueType::UInt32,
            SettingValue::UInt64(_) => ValueType::UInt64,
            SettingValue::Float32(_) => ValueType::Float32,
            SettingValue::Float64(_) => ValueType::Float64,
            SettingValue::Text(_) => ValueType::Text,
            SettingValue::Bytes(_) => ValueType::Bytes,
        }
    }

    /// Parses `text` into a value of type `ty`.
    ///
    /// Bytes are written as an even-length hex string (`"0aff"`).
    ///
    /// # Errors
    ///
    /// Returns [`ParseValueError`] if `text` is not a valid literal for `ty`.
    pub fn parse_as(ty: ValueType, text: &str) -> Result<SettingValue, ParseValueError> {
        let invalid = || ParseValueError {
            expected: ty,
            text: text.to_string(),
        };
        let trimmed = text.trim();
        let value = match ty {
            ValueType::Bool => SettingValue::Bool(trimmed.parse().map_err(|_| invalid())?),
            ValueType::Char => {
                let mut chars = text.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => SettingValue::Char(c),
                    _ => return Err(invalid()),
                }
            }
            ValueType::Int32 => SettingValue::Int32(trimmed.parse().map_err(|_| invalid())?),
            ValueType::Int64 => SettingValue::Int64(trimmed.parse().map_err(|_| invalid())?),
            ValueType::UInt32 => SettingValue::UInt32(trimmed.parse().map_err(|_| invalid())?),
            ValueType::UInt64 => SettingValue::UInt64(trimmed.parse().map_err(|_| invalid())?),
            ValueType::Float32 => SettingValue::Float32(trimmed.parse().map_err(|_| invalid())?),
            ValueType::Float64 => SettingValue::Float64(trimmed.parse().map_err(|_| invalid())?),
            ValueType::Text => SettingValue::Text(text.to_string()),
            ValueType::Bytes => SettingValue::Bytes(decode_hex(trimmed).ok_or_else(invalid)?),
        };
        Ok(value)
    }
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingValue::Bool(v) => write!(f, "{v}"),
            SettingValue::Char(v) => write!(f, "{v}"),
            SettingValue::Int32(v) => write!(f, "{v}"),
            SettingValue::Int64(v) => write!(f, "{v}"),
            SettingValue::UInt32(v) => write!(f, "{v}"),
            SettingValue::UInt64(v) => write!(f, "{v}"),
            SettingValue::Float32(v) => write!(f, "{v}"),
            SettingValue::Float64(v) => write!(f, "{v}"),
            SettingValue::Text(v) => f.write_str(v),
            SettingValue::Bytes(v) => {
                for b in v {
                    write!(f, "{b:02x}")?;
                }
                Ok(())
            }
        }
    }
}

/// Text could not be parsed as the requested [`ValueType`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot parse {text:?} as {expected}")]
pub struct ParseValueError {
    pub expected: ValueType,
    pub text: String,
}

fn decode_hex(text: &str) -> Option<Vec<u8>> {
    if text.len() % 2 != 0 {
        return None;
    }
    (0..text.len())
        .step_by(2)
        .map(|i| text.get(i..i + 2).and_then(|pair| u8::from_str_radix(pair, 16).ok()))
        .collect()
}

// ── Rust type mapping ─────────────────────────────────────────────────────────

/// A Rust type that can be stored in and read back from a [`SettingValue`].
///
/// Implemented for `bool`, `char`, `i32`, `i64`, `u32`, `u64`, `f32`, `f64`,
/// `String` and `Vec<u8>`.
pub trait SettingType: Sized {
    /// The variant this type is stored as.
    const VALUE_TYPE: ValueType;

    /// Wraps `self` in its variant.
    fn into_setting(self) -> SettingValue;

    /// Extracts an owned copy if `value` holds this type's variant.
    fn from_setting(value: &SettingValue) -> Option<Self>;
}

macro_rules! setting_type {
    ($ty:ty, $variant:ident) => {
        impl SettingType for $ty {
            const VALUE_TYPE: ValueType = ValueType::$variant;

            fn into_setting(self) -> SettingValue {
                SettingValue::$variant(self)
            }

            fn from_setting(value: &SettingValue) -> Option<Self> {
                match value {
                    SettingValue::$variant(v) => Some(v.clone()),
                    _ => None,
                }
            }
        }

        impl From<$ty> for SettingValue {
            fn from(value: $ty) -> Self {
                SettingValue::$variant(value)
            }
        }
    };
}

setting_type!(bool, Bool);
setting_type!(char, Char);
setting_type!(i32, Int32);
setting_type!(i64, Int64);
setting_type!(u32, UInt32);
setting_type!(u64, UInt64);
setting_type!(f32, Float32);
setting_type!(f64, Float64);
setting_type!(String, Text);
setting_type!(Vec<u8>, Bytes);

impl From<&str> for SettingValue {
    fn from(value: &str) -> Self {
        SettingValue::Text(value.to_string())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
