//! The extended-attribute protocol for inspecting and changing JSON kinds.
//!
//! Two attributes exist on every node:
//!
//! - `user.json.type`: `string`, `number`, `object`, `array`, `boolean` or
//!   `null`. Writing it converts the node.
//! - `user.json.number.type`: `integral` or `real`. Present and writable only
//!   on numbers.
//!
//! Conversions compute a replacement value and never touch the node; the
//! caller swaps the result into the parent container. Conversions that are
//! not in the table below fail with `InvalidArgument`.
//!
//! | current | string | number | boolean | object | array | null |
//! |---|---|---|---|---|---|---|
//! | string | - | parse | parse | parse | parse | parse |
//! | boolean | serialize | 0/1 | - | | | |
//! | number | serialize | - | false iff zero | | | |
//! | object | serialize | | | - | | |
//! | array | serialize | | | | - | |
//! | null | serialize | | | | | - |

use serde_json::{Number, Value as JsonValue};

use crate::canonical;
use crate::classify::{NodeKind, NumberKind};
use crate::error::{Error, Result};

pub const TYPE_ATTRIBUTE: &str = "user.json.type";
pub const NUMBER_TYPE_ATTRIBUTE: &str = "user.json.number.type";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Attribute {
    Type,
    NumberType,
}

impl Attribute {
    pub fn parse(name: &str) -> Result<Self> {
        match name {
            TYPE_ATTRIBUTE => Ok(Attribute::Type),
            NUMBER_TYPE_ATTRIBUTE => Ok(Attribute::NumberType),
            other => Err(Error::invalid(format!("unknown attribute '{}'", other))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Attribute::Type => TYPE_ATTRIBUTE,
            Attribute::NumberType => NUMBER_TYPE_ATTRIBUTE,
        }
    }
}

/// Attributes defined on `node`.
pub fn list_attributes(node: &JsonValue) -> Vec<Attribute> {
    match node {
        JsonValue::Number(_) => vec![Attribute::Type, Attribute::NumberType],
        _ => vec![Attribute::Type],
    }
}

pub fn get_attribute(node: &JsonValue, attribute: Attribute) -> Result<&'static str> {
    match (attribute, node) {
        (Attribute::Type, _) => Ok(NodeKind::of(node).as_str()),
        (Attribute::NumberType, JsonValue::Number(n)) => Ok(NumberKind::of(n).as_str()),
        (Attribute::NumberType, _) => Err(Error::invalid(format!(
            "{} is only defined on numbers",
            NUMBER_TYPE_ATTRIBUTE
        ))),
    }
}

/// Apply an attribute write to `node`.
///
/// Returns the replacement value, or `None` when the write is a no-op.
pub fn set_attribute(
    node: &JsonValue,
    attribute: Attribute,
    value: &[u8],
) -> Result<Option<JsonValue>> {
    let value = std::str::from_utf8(value)
        .map_err(|_| Error::invalid("attribute value is not valid UTF-8"))?;

    match attribute {
        Attribute::Type => coerce_type(node, value.parse()?),
        Attribute::NumberType => coerce_number_type(node, value.parse()?).map(Some),
    }
}

/// Convert `node` to `target` kind.
pub fn coerce_type(node: &JsonValue, target: NodeKind) -> Result<Option<JsonValue>> {
    let current = NodeKind::of(node);
    if current == target {
        return Ok(None);
    }

    let unsupported = || Error::invalid(format!("cannot convert {} to {}", current, target));
    let converted = match node {
        JsonValue::String(text) => parse_as(text, target)?,
        JsonValue::Bool(b) => match target {
            NodeKind::String => serialize(node)?,
            NodeKind::Number => JsonValue::from(i64::from(*b)),
            NodeKind::Boolean | NodeKind::Object | NodeKind::Array | NodeKind::Null => {
                return Err(unsupported());
            }
        },
        JsonValue::Number(n) => match target {
            NodeKind::String => serialize(node)?,
            NodeKind::Boolean => JsonValue::Bool(!is_zero(n)),
            NodeKind::Number | NodeKind::Object | NodeKind::Array | NodeKind::Null => {
                return Err(unsupported());
            }
        },
        JsonValue::Object(_) | JsonValue::Array(_) | JsonValue::Null => match target {
            NodeKind::String => serialize(node)?,
            NodeKind::Number
            | NodeKind::Boolean
            | NodeKind::Object
            | NodeKind::Array
            | NodeKind::Null => return Err(unsupported()),
        },
    };

    Ok(Some(converted))
}

fn parse_as(text: &str, target: NodeKind) -> Result<JsonValue> {
    let parsed: JsonValue = serde_json::from_str(text).map_err(|error| {
        Error::invalid(format!("content does not parse as {}: {}", target, error))
    })?;
    if NodeKind::of(&parsed) != target {
        return Err(Error::invalid(format!(
            "content parses as {}, not {}",
            NodeKind::of(&parsed),
            target
        )));
    }
    Ok(parsed)
}

fn serialize(node: &JsonValue) -> Result<JsonValue> {
    canonical::to_canonical_string(node).map(JsonValue::String)
}

/// Change the representation of a number node.
///
/// `integral` truncates toward zero; `real` widens to a float.
pub fn coerce_number_type(node: &JsonValue, target: NumberKind) -> Result<JsonValue> {
    let JsonValue::Number(number) = node else {
        return Err(Error::invalid(format!(
            "{} is only settable on numbers, not {}",
            NUMBER_TYPE_ATTRIBUTE,
            NodeKind::of(node)
        )));
    };

    match target {
        NumberKind::Integral if !number.is_f64() => Ok(node.clone()),
        NumberKind::Integral => {
            let truncated = as_f64(number)?.trunc();
            // i64::MAX is not representable as f64; its neighbour 2^63 is out of range.
            if truncated.is_finite() && truncated >= i64::MIN as f64 && truncated < i64::MAX as f64
            {
                Ok(JsonValue::from(truncated as i64))
            } else {
                Err(Error::invalid(format!(
                    "{} is out of range for an integral number",
                    number
                )))
            }
        }
        NumberKind::Real => Number::from_f64(as_f64(number)?)
            .map(JsonValue::Number)
            .ok_or_else(|| Error::invalid(format!("{} has no real representation", number))),
    }
}

pub(crate) fn as_f64(number: &Number) -> Result<f64> {
    number
        .as_f64()
        .ok_or_else(|| Error::invalid(format!("{} has no real representation", number)))
}

fn is_zero(number: &Number) -> bool {
    number.as_f64() == Some(0.0)
}
