// crates/piflow-core/src/core/value.rs
// ============================================================================
// Module: Field Values
// Description: Byte and string values bound to match fields and action params.
// Purpose: Encode literals to declared widths and check raw values against them.
// Dependencies: crate::core::schema, serde
// ============================================================================

//! ## Overview
//! A [`FieldValue`] is either a fixed-width byte sequence or a runtime-translated
//! string. Raw values are checked strictly against a [`FieldWidth`]: a 5-byte value
//! never satisfies a 48-bit field. Numeric literals ([`FieldValue::from_u64`],
//! [`ValueLiteral`]) are encoded big-endian and left-padded to the declared width.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::core::hashing::hex_encode;
use crate::core::schema::FieldWidth;
use crate::core::schema::MAX_TEXT_BYTES;

// ============================================================================
// SECTION: Field Value
// ============================================================================

/// Value bound to a match field or action parameter.
///
/// Bytes serialize as `0x`-prefixed lowercase hex so canonical JSON stays readable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldValue {
    /// Big-endian byte sequence.
    Bytes(#[serde(with = "hex_bytes")] Vec<u8>),
    /// Runtime-translated string.
    Text(String),
}

/// Describes why a value does not fit a declared width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidthMismatch {
    /// Declared width.
    pub expected: FieldWidth,
    /// Observed shape of the supplied value.
    pub actual: String,
}

impl FieldValue {
    /// Wraps raw bytes without any width adjustment.
    #[must_use]
    pub fn bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self::Bytes(bytes.into())
    }

    /// Wraps a string value.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Encodes an unsigned integer to the declared bit width.
    ///
    /// # Errors
    ///
    /// Returns [`WidthMismatch`] when the width is not a bit string or the value
    /// needs more bits than declared.
    pub fn from_u64(value: u64, width: FieldWidth) -> Result<Self, WidthMismatch> {
        fit_be_bytes(&value.to_be_bytes(), width, || format!("integer {value}"))
    }

    /// Checks the value against a declared width.
    ///
    /// # Errors
    ///
    /// Returns [`WidthMismatch`] when the value does not fit exactly.
    pub fn check(&self, width: FieldWidth) -> Result<(), WidthMismatch> {
        let fits = match (self, width) {
            (Self::Bytes(bytes), FieldWidth::Bits {
                bits,
            }) => width.byte_len() == Some(bytes.len()) && high_bits_clear(bytes, bits),
            (Self::Text(text), FieldWidth::String) => {
                !text.is_empty() && text.len() <= MAX_TEXT_BYTES
            }
            _ => false,
        };
        if fits {
            Ok(())
        } else {
            Err(WidthMismatch {
                expected: width,
                actual: self.describe(),
            })
        }
    }

    /// Returns a short description of the value's shape.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Bytes(bytes) => format!("{} bytes", bytes.len()),
            Self::Text(text) if text.is_empty() => "empty string".to_string(),
            Self::Text(text) => format!("string of {} bytes", text.len()),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bytes(bytes) => write!(f, "0x{}", hex_encode(bytes)),
            Self::Text(text) => write!(f, "\"{text}\""),
        }
    }
}

// ============================================================================
// SECTION: Literals
// ============================================================================

/// Literal value as written in rule definitions.
///
/// Integers and `0x` hex strings encode against bit-string widths. Plain strings
/// bind to string widths; decimal strings also encode against bit-string widths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ValueLiteral {
    /// Non-negative integer literal.
    Int(u64),
    /// String literal.
    Text(String),
}

impl ValueLiteral {
    /// Encodes the literal against a declared width.
    ///
    /// # Errors
    ///
    /// Returns [`WidthMismatch`] when the literal cannot represent a value of the
    /// declared width.
    pub fn encode(&self, width: FieldWidth) -> Result<FieldValue, WidthMismatch> {
        match (self, width) {
            (Self::Int(value), FieldWidth::Bits {
                ..
            }) => FieldValue::from_u64(*value, width),
            (Self::Text(text), FieldWidth::Bits {
                ..
            }) => {
                let bytes = parse_numeric(text).ok_or_else(|| WidthMismatch {
                    expected: width,
                    actual: format!("non-numeric literal \"{text}\""),
                })?;
                fit_be_bytes(&bytes, width, || format!("literal {text}"))
            }
            (Self::Text(text), FieldWidth::String) => {
                let value = FieldValue::text(text.clone());
                value.check(width)?;
                Ok(value)
            }
            (Self::Int(value), FieldWidth::String) => Err(WidthMismatch {
                expected: width,
                actual: format!("integer {value}"),
            }),
        }
    }
}

impl From<u64> for ValueLiteral {
    fn from(value: u64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for ValueLiteral {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

// ============================================================================
// SECTION: Encoding Helpers
// ============================================================================

/// Returns true when the unused high-order bits of the first byte are zero.
fn high_bits_clear(bytes: &[u8], bits: u16) -> bool {
    let unused = (bytes.len() * 8).saturating_sub(usize::from(bits));
    match bytes.first() {
        Some(first) if unused > 0 => usize::from(*first) >> (8 - unused) == 0,
        _ => true,
    }
}

/// Left-pads big-endian bytes to the declared width, rejecting overflow.
fn fit_be_bytes(
    bytes: &[u8],
    width: FieldWidth,
    describe: impl FnOnce() -> String,
) -> Result<FieldValue, WidthMismatch> {
    let FieldWidth::Bits {
        bits,
    } = width
    else {
        return Err(WidthMismatch {
            expected: width,
            actual: describe(),
        });
    };
    let significant = bytes.iter().position(|byte| *byte != 0).map_or(&[][..], |idx| &bytes[idx ..]);
    let used_bits = significant.first().map_or(0, |first| {
        let lead = usize::try_from(first.leading_zeros()).unwrap_or(0);
        (significant.len() - 1) * 8 + (8 - lead)
    });
    let byte_len = width.byte_len().unwrap_or_default();
    if used_bits > usize::from(bits) {
        return Err(WidthMismatch {
            expected: width,
            actual: format!("{} needs {used_bits} bits", describe()),
        });
    }
    let mut out = vec![0_u8; byte_len - significant.len()];
    out.extend_from_slice(significant);
    Ok(FieldValue::Bytes(out))
}

/// Parses `0x` hex or decimal text into big-endian bytes.
fn parse_numeric(text: &str) -> Option<Vec<u8>> {
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        return hex_decode(hex);
    }
    if text.is_empty() || !text.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    Some(decimal_to_be_bytes(text))
}

/// Converts ASCII decimal digits of any length into big-endian bytes.
fn decimal_to_be_bytes(digits: &str) -> Vec<u8> {
    let mut out: Vec<u8> = Vec::new();
    for digit in digits.bytes() {
        let mut carry = u16::from(digit - b'0');
        for byte in out.iter_mut().rev() {
            let [high, low] = (u16::from(*byte) * 10 + carry).to_be_bytes();
            *byte = low;
            carry = u16::from(high);
        }
        if carry > 0 {
            out.insert(0, carry.to_be_bytes()[1]);
        }
    }
    out
}

/// Decodes hex digits (odd lengths are left-padded with a zero nibble).
pub(crate) fn hex_decode(hex: &str) -> Option<Vec<u8>> {
    if hex.is_empty() {
        return None;
    }
    let mut nibbles = Vec::with_capacity(hex.len() + 1);
    if hex.len() % 2 == 1 {
        nibbles.push(0_u8);
    }
    for ch in hex.chars() {
        let digit = ch.to_digit(16)?;
        nibbles.push(u8::try_from(digit).ok()?);
    }
    Some(nibbles.chunks(2).map(|pair| (pair[0] << 4) | pair[1]).collect())
}

// ============================================================================
// SECTION: Serde Helpers
// ============================================================================

/// Serde adapter encoding byte vectors as `0x`-prefixed hex strings.
mod hex_bytes {
    use serde::Deserialize;
    use serde::Deserializer;
    use serde::Serializer;
    use serde::de::Error as _;

    use super::hex_decode;
    use super::hex_encode;

    /// Serializes bytes as `0x`-prefixed lowercase hex.
    pub(super) fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex_encode(bytes)))
    }

    /// Deserializes `0x`-prefixed hex into bytes.
    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        let digits =
            text.strip_prefix("0x").ok_or_else(|| D::Error::custom("expected 0x-prefixed hex"))?;
        if digits.is_empty() {
            return Ok(Vec::new());
        }
        if digits.len() % 2 == 1 {
            return Err(D::Error::custom("hex byte string must have an even digit count"));
        }
        hex_decode(digits).ok_or_else(|| D::Error::custom("invalid hex digit"))
    }
}
