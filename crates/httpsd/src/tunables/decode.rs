//! Integer and flag decoding for raw override values.
//!
//! Accepted integer forms:
//!
//! ```text
//! [+-]decimal     e.g. 30, -1, +200
//! [+-]0x<hex>     e.g. 0x2710, 0XFF
//! [+-]#<hex>      e.g. #10000
//! [+-]0<octal>    e.g. 0777
//! ```
//!
//! Whitespace is not trimmed.

use std::num::IntErrorKind;

use thiserror::Error;

/// Why a raw value could not be decoded.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// The value was the empty string.
    #[error("empty value")]
    Empty,

    /// The value is not an integer in any accepted form.
    #[error("not an integer: {0:?}")]
    Invalid(String),

    /// The value is an integer but does not fit the target width.
    #[error("out of range: {0:?}")]
    OutOfRange(String),
}

/// Decode a signed 64-bit integer.
pub fn decode_i64(raw: &str) -> Result<i64, DecodeError> {
    if raw.is_empty() {
        return Err(DecodeError::Empty);
    }

    let (negative, rest) = match raw.as_bytes()[0] {
        b'-' => (true, &raw[1..]),
        b'+' => (false, &raw[1..]),
        _ => (false, raw),
    };

    let (radix, digits) = if let Some(hex) = rest
        .strip_prefix("0x")
        .or_else(|| rest.strip_prefix("0X"))
        .or_else(|| rest.strip_prefix('#'))
    {
        (16, hex)
    } else if rest.len() > 1 && rest.starts_with('0') {
        (8, &rest[1..])
    } else {
        (10, rest)
    };

    // A second sign after the radix prefix is never valid.
    if digits.is_empty() || digits.starts_with(|c| c == '-' || c == '+') {
        return Err(DecodeError::Invalid(raw.to_owned()));
    }

    // Re-attach the sign so that i64::MIN decodes without overflowing.
    let signed = if negative {
        format!("-{digits}")
    } else {
        digits.to_owned()
    };

    i64::from_str_radix(&signed, radix).map_err(|e| match e.kind() {
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => {
            DecodeError::OutOfRange(raw.to_owned())
        }
        _ => DecodeError::Invalid(raw.to_owned()),
    })
}

/// Decode a signed 32-bit integer.
pub fn decode_i32(raw: &str) -> Result<i32, DecodeError> {
    let wide = decode_i64(raw)?;
    i32::try_from(wide).map_err(|_| DecodeError::OutOfRange(raw.to_owned()))
}

/// Decode a flag: only `true` (any case) is true.
pub fn decode_flag(raw: &str) -> bool {
    raw.eq_ignore_ascii_case("true")
}
