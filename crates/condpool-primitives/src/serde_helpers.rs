//! Serde helpers for the `0x`-prefixed hex conventions used on the wire.

use primitive_types::U256;
use serde::de::{self, Visitor};
use serde::{Deserializer, Serializer};
use std::fmt;

/// Strip the mandatory `0x` prefix from a hex string.
pub(crate) fn strip_hex_prefix(s: &str) -> Result<&str, String> {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .ok_or_else(|| format!("hex string without 0x prefix: {:?}", s))
}

/// Digits of a hex quantity: `0x` prefix, at least one digit, no leading
/// zeros, at most `max_digits` digits.
fn quantity_digits(s: &str, max_digits: usize) -> Result<&str, String> {
    let digits = strip_hex_prefix(s)?;
    if digits.is_empty() {
        return Err("hex string \"0x\"".to_string());
    }
    if digits.len() > 1 && digits.starts_with('0') {
        return Err(format!("hex number with leading zero digits: {:?}", s));
    }
    if digits.len() > max_digits {
        return Err(format!("hex number > {} bits: {:?}", max_digits * 4, s));
    }
    Ok(digits)
}

/// Parse a hex quantity: `0x` prefix, at least one digit, no leading zeros,
/// at most 64 bits.
pub fn parse_quantity_u64(s: &str) -> Result<u64, String> {
    let digits = quantity_digits(s, 16)?;
    u64::from_str_radix(digits, 16).map_err(|e| format!("invalid hex quantity {:?}: {}", s, e))
}

/// Parse a hex quantity under the same rules as [`parse_quantity_u64`], at
/// most 256 bits.
pub fn parse_quantity_u256(s: &str) -> Result<U256, String> {
    let digits = quantity_digits(s, 64)?;
    U256::from_str_radix(digits, 16).map_err(|e| format!("invalid hex quantity {:?}: {}", s, e))
}

/// `Option<u64>` encoded as a hex quantity (`"0xffff"`).
///
/// Use together with `#[serde(default, skip_serializing_if = "Option::is_none")]`
/// so that an absent key stays `None`.
pub mod quantity_opt {
    use super::*;

    /// Serialize `Some(v)` as `"0x{v:x}"` and `None` as null.
    pub fn serialize<S: Serializer>(value: &Option<u64>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => serializer.serialize_str(&format!("{:#x}", v)),
            None => serializer.serialize_none(),
        }
    }

    /// Deserialize a hex quantity, or null, into an `Option<u64>`.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
        deserializer.deserialize_option(OptionVisitor)
    }

    struct OptionVisitor;

    impl<'de> Visitor<'de> for OptionVisitor {
        type Value = Option<u64>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a 0x-prefixed hex quantity or null")
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
            deserializer.deserialize_str(QuantityVisitor).map(Some)
        }
    }

    struct QuantityVisitor;

    impl<'de> Visitor<'de> for QuantityVisitor {
        type Value = u64;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a 0x-prefixed hex quantity")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<u64, E> {
            parse_quantity_u64(v).map_err(E::custom)
        }
    }
}

/// `Option<U256>` encoded as a hex quantity (`"0x1b4"`).
///
/// Same rules as [`quantity_opt`]: unprefixed strings and leading zeros are
/// rejected rather than reinterpreted.
pub mod quantity_u256_opt {
    use super::*;

    /// Serialize `Some(v)` as `"0x{v:x}"` and `None` as null.
    pub fn serialize<S: Serializer>(value: &Option<U256>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => serializer.serialize_str(&format!("0x{:x}", v)),
            None => serializer.serialize_none(),
        }
    }

    /// Deserialize a hex quantity, or null, into an `Option<U256>`.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<U256>, D::Error> {
        deserializer.deserialize_option(OptionVisitor)
    }

    struct OptionVisitor;

    impl<'de> Visitor<'de> for OptionVisitor {
        type Value = Option<U256>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a 0x-prefixed hex quantity or null")
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
            deserializer.deserialize_str(QuantityVisitor).map(Some)
        }
    }

    struct QuantityVisitor;

    impl<'de> Visitor<'de> for QuantityVisitor {
        type Value = U256;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a 0x-prefixed hex quantity")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<U256, E> {
            parse_quantity_u256(v).map_err(E::custom)
        }
    }
}
