//! Offset-based reads and writes over scalar leaves.
//!
//! Strings are exposed as their raw content, one byte per character
//! (Latin-1). Every other node is exposed as its canonical text.
//!
//! Writes to numbers, booleans and null parse the payload as JSON of the
//! same kind; integral and real numbers count as different kinds. At offset
//! zero the payload replaces the node; at any other offset it is combined
//! with the current value instead (XOR for booleans, addition for numbers).
//! An appending write such as `echo 5 >> file` thus adds 5 to a number.

use serde_json::{Number, Value as JsonValue};

use crate::canonical;
use crate::classify::{NodeKind, NumberKind};
use crate::coerce;
use crate::error::{Error, Result};

/// Encode `text` one byte per character.
///
/// Characters above U+00FF have no single-byte form and are rejected.
pub fn encode_latin1(text: &str) -> Result<Vec<u8>> {
    text.chars()
        .map(|c| {
            u8::try_from(c).map_err(|_| {
                Error::invalid(format!(
                    "character U+{:04X} has no single-byte encoding",
                    u32::from(c)
                ))
            })
        })
        .collect()
}

pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

fn offset_to_usize(offset: u64) -> usize {
    usize::try_from(offset).unwrap_or(usize::MAX)
}

/// Read up to `size` bytes of `node` starting at `offset`.
pub fn read(node: &JsonValue, size: usize, offset: u64) -> Result<Vec<u8>> {
    let bytes = match node {
        JsonValue::String(text) => encode_latin1(text)?,
        _ => canonical::to_canonical_bytes(node)?,
    };

    let start = offset_to_usize(offset).min(bytes.len());
    let end = start.saturating_add(size).min(bytes.len());
    Ok(bytes[start..end].to_vec())
}

/// Compute the value of `node` after writing `data` at `offset`.
pub fn write(node: &JsonValue, data: &[u8], offset: u64) -> Result<JsonValue> {
    match node {
        JsonValue::String(text) => {
            let mut bytes = encode_latin1(text)?;
            // Past-the-end writes land directly after the current content.
            let start = offset_to_usize(offset).min(bytes.len());
            let end = offset_to_usize(offset)
                .saturating_add(data.len())
                .min(bytes.len())
                .max(start);
            bytes.splice(start..end, data.iter().copied());
            Ok(JsonValue::String(decode_latin1(&bytes)))
        }
        JsonValue::Null | JsonValue::Bool(_) | JsonValue::Number(_) => {
            let parsed: JsonValue = serde_json::from_slice(data)
                .map_err(|error| Error::invalid(format!("write payload is not JSON: {}", error)))?;
            if NodeKind::of(&parsed) != NodeKind::of(node) {
                return Err(Error::invalid(format!(
                    "cannot write {} into {}",
                    NodeKind::of(&parsed),
                    NodeKind::of(node)
                )));
            }
            if let (JsonValue::Number(current), JsonValue::Number(payload)) = (node, &parsed) {
                if NumberKind::of(current) != NumberKind::of(payload) {
                    return Err(Error::invalid(format!(
                        "cannot write {} number into {} number",
                        NumberKind::of(payload),
                        NumberKind::of(current)
                    )));
                }
            }

            if offset == 0 {
                Ok(parsed)
            } else {
                accumulate(node, parsed)
            }
        }
        JsonValue::Object(_) | JsonValue::Array(_) => Err(Error::invalid(format!(
            "{} nodes are directories and cannot be written",
            NodeKind::of(node)
        ))),
    }
}

fn accumulate(current: &JsonValue, operand: JsonValue) -> Result<JsonValue> {
    match (current, operand) {
        (JsonValue::Bool(a), JsonValue::Bool(b)) => Ok(JsonValue::Bool(*a ^ b)),
        (JsonValue::Number(a), JsonValue::Number(b)) => add(a, &b).map(JsonValue::Number),
        (JsonValue::Null, JsonValue::Null) => Ok(JsonValue::Null),
        (current, operand) => Err(Error::invalid(format!(
            "cannot combine {} with {}",
            NodeKind::of(current),
            NodeKind::of(&operand)
        ))),
    }
}

/// Add two numbers, staying integral while the exact sum fits.
pub fn add(a: &Number, b: &Number) -> Result<Number> {
    if let (Some(x), Some(y)) = (as_i128(a), as_i128(b)) {
        let sum = x + y;
        if let Ok(sum) = i64::try_from(sum) {
            return Ok(Number::from(sum));
        }
        if let Ok(sum) = u64::try_from(sum) {
            return Ok(Number::from(sum));
        }
    }

    let sum = coerce::as_f64(a)? + coerce::as_f64(b)?;
    Number::from_f64(sum).ok_or_else(|| Error::invalid(format!("{} + {} is not finite", a, b)))
}

fn as_i128(number: &Number) -> Option<i128> {
    number
        .as_i64()
        .map(i128::from)
        .or_else(|| number.as_u64().map(i128::from))
}

/// The zero value of a scalar's kind; `None` for containers.
pub fn truncate(node: &JsonValue) -> Option<JsonValue> {
    match node {
        JsonValue::String(_) => Some(JsonValue::String(String::new())),
        JsonValue::Bool(_) => Some(JsonValue::Bool(false)),
        JsonValue::Number(_) => Some(JsonValue::from(0)),
        JsonValue::Null => Some(JsonValue::Null),
        JsonValue::Object(_) | JsonValue::Array(_) => None,
    }
}
