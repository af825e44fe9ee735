//! Key/value property access.
//!
//! The collector reads its gating flags and writes the diag logger command
//! flag through [`PropertyStore`]. Values follow system property conventions:
//! an empty value is the same as a missing one, booleans accept the usual
//! `1/y/yes/on/true` and `0/n/no/off/false` spellings, and anything that
//! does not parse falls back to the caller's default.

mod file_store;
mod memory_store;

pub use file_store::FilePropertyStore;
pub use memory_store::MemoryPropertyStore;

use anyhow::Result;

use crate::constants::BUILD_TYPE_PROPERTY;

/// Persisted property storage with last-writer-wins semantics.
pub trait PropertyStore: Send + Sync {
    /// Raw lookup; `None` when the key is unset.
    fn get(&self, key: &str) -> Option<String>;

    /// Set a value, immediately visible to subsequent reads.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    fn get_string(&self, key: &str, default: &str) -> String {
        match self.get(key) {
            Some(value) if !value.is_empty() => value,
            _ => default.to_string(),
        }
    }

    fn get_bool(&self, key: &str, default: bool) -> bool {
        self.get(key)
            .and_then(|value| parse_bool(&value))
            .unwrap_or(default)
    }

    fn get_int(&self, key: &str, default: i64) -> i64 {
        self.get(key)
            .and_then(|value| parse_int(&value))
            .unwrap_or(default)
    }
}

/// Parse a property boolean. Returns `None` for unrecognized spellings.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "y" | "yes" | "on" | "true" => Some(true),
        "0" | "n" | "no" | "off" | "false" => Some(false),
        _ => None,
    }
}

/// Parse a property integer: signed decimal or `0x` hexadecimal.
pub fn parse_int(value: &str) -> Option<i64> {
    let trimmed = value.trim();
    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };

    let magnitude = match digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        Some(hex) => i64::from_str_radix(hex, 16).ok()?,
        None => digits.parse::<i64>().ok()?,
    };

    Some(if negative { -magnitude } else { magnitude })
}

/// True when the device runs a locked "user" build.
pub fn is_user_build(props: &dyn PropertyStore) -> bool {
    props.get_string(BUILD_TYPE_PROPERTY, "") == "user"
}
