//! Operand extraction for `POST /compute`.
//!
//! The request body is a form with an `x` and a `y` field. Both are parsed
//! as signed 64-bit integers before anything reaches the compute network.

use crate::error::CoreError;

/// Form field carrying the left operand.
pub const FIELD_X: &str = "x";
/// Form field carrying the right operand.
pub const FIELD_Y: &str = "y";

/// Two validated operands for an addition job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operands {
    pub x: i64,
    pub y: i64,
}

impl Operands {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Extract both operands from decoded form pairs.
    ///
    /// A field may appear more than once; the last occurrence wins.
    /// Missing fields, values that are not integers and pairs whose sum
    /// does not fit in an `i64` are rejected with [`CoreError::Validation`].
    pub fn from_form_pairs(pairs: &[(String, String)]) -> Result<Self, CoreError> {
        let x = parse_operand(pairs, FIELD_X)?;
        let y = parse_operand(pairs, FIELD_Y)?;
        if x.checked_add(y).is_none() {
            return Err(CoreError::Validation(format!(
                "Sum of {x} and {y} is outside the 64-bit integer range"
            )));
        }
        Ok(Self { x, y })
    }
}

fn last_value<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .rev()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

fn parse_operand(pairs: &[(String, String)], key: &str) -> Result<i64, CoreError> {
    let raw = last_value(pairs, key)
        .ok_or_else(|| CoreError::Validation(format!("Missing form field '{key}'")))?;

    raw.trim().parse::<i64>().map_err(|e| {
        CoreError::Validation(format!("Form field '{key}' is not an integer ('{raw}'): {e}"))
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
