//! Packed rule set codec.
//!
//! # Purpose
//! Converts between the stored packed representation of a rule set and the
//! canonical [`AuthorizationRule`] list the migration operates on.
//!
//! # Wire shape
//! A packed rule set is a JSON array of packed rules. Each packed rule is a
//! positional array `[action, subject, conditions, inverted, fields, reason]`:
//! - `action`: comma-joined operation names (loose data may store a list).
//! - `subject`: resource category string; loose data may store a list, whose
//!   first element wins. Absent or null means no subject.
//! - `conditions`: arbitrary JSON payload; `0` stands in for "none".
//! - `inverted`: `1` (or any truthy value) marks a denial rule.
//! - `fields`, `reason`: legacy slots, tolerated on decode and dropped from
//!   the canonical model.
//!
//! Trailing empty slots (`0`, `""`, `null`, `false`) are trimmed on encode,
//! so the shortest packed rule is `[action]`.
//!
//! # Key invariants
//! - `unpack_rules(pack_rules(rules))` returns `rules` unchanged for any
//!   canonical rule list.
//! - Absent input decodes to the empty rule list, never an error.
use crate::model::rule::AuthorizationRule;
use serde_json::Value;
use thiserror::Error;

/// A stored rule set failed to decode into well-formed authorization rules.
///
/// Never recovered locally; the migration run aborts so the offending record
/// can be fixed out of band.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("packed rule set is not an array")]
    RuleSetShape,
    #[error("packed rule {index} is not an array")]
    RuleShape { index: usize },
    #[error("packed rule {index} has a malformed action slot")]
    ActionShape { index: usize },
    #[error("packed rule {index} has a malformed subject slot")]
    SubjectShape { index: usize },
}

/// Decode a packed rule set into canonical rules.
///
/// `None` and JSON `null` both decode to the empty rule list.
pub fn unpack_rules(packed: Option<&Value>) -> Result<Vec<AuthorizationRule>, DecodeError> {
    let packed = match packed {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(value) => value,
    };
    let rules = packed.as_array().ok_or(DecodeError::RuleSetShape)?;
    rules
        .iter()
        .enumerate()
        .map(|(index, rule)| unpack_rule(index, rule))
        .collect()
}

/// Encode canonical rules back into the packed representation.
pub fn pack_rules(rules: &[AuthorizationRule]) -> Value {
    Value::Array(rules.iter().map(pack_rule).collect())
}

fn unpack_rule(index: usize, packed: &Value) -> Result<AuthorizationRule, DecodeError> {
    let slots = packed.as_array().ok_or(DecodeError::RuleShape { index })?;
    let action = unpack_action(index, slots.first())?;
    let subject = unpack_subject(index, slots.get(1))?;
    let conditions = slots.get(2).filter(|slot| !is_empty_slot(slot)).cloned();
    let inverted = slots
        .get(3)
        .filter(|slot| !is_empty_slot(slot))
        .map(|_| true);
    Ok(AuthorizationRule {
        subject,
        action,
        conditions,
        inverted,
    })
}

fn unpack_action(index: usize, slot: Option<&Value>) -> Result<Vec<String>, DecodeError> {
    match slot {
        Some(Value::String(joined)) if !joined.is_empty() => {
            Ok(joined.split(',').map(str::to_string).collect())
        }
        Some(Value::Array(items)) if !items.is_empty() => items
            .iter()
            .map(|item| match item {
                Value::String(name) if !name.is_empty() => Ok(name.clone()),
                _ => Err(DecodeError::ActionShape { index }),
            })
            .collect(),
        _ => Err(DecodeError::ActionShape { index }),
    }
}

fn unpack_subject(index: usize, slot: Option<&Value>) -> Result<Option<String>, DecodeError> {
    match slot {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(name)) if name.is_empty() => Ok(None),
        Some(Value::String(name)) => Ok(Some(name.clone())),
        // Loose data stores a list of categories; the first element wins.
        Some(Value::Array(items)) => match items.first() {
            Some(Value::String(name)) if !name.is_empty() => Ok(Some(name.clone())),
            _ => Err(DecodeError::SubjectShape { index }),
        },
        Some(_) => Err(DecodeError::SubjectShape { index }),
    }
}

fn pack_rule(rule: &AuthorizationRule) -> Value {
    let mut slots = vec![
        Value::String(rule.action.join(",")),
        rule.subject
            .clone()
            .map(Value::String)
            .unwrap_or(Value::Null),
        rule.conditions.clone().unwrap_or_else(|| Value::from(0)),
        Value::from(i32::from(rule.inverted.unwrap_or(false))),
    ];
    while slots.last().is_some_and(is_empty_slot) {
        slots.pop();
    }
    Value::Array(slots)
}

// Slot emptiness follows the stored format's truthiness rules: empty arrays
// and objects are NOT empty slots.
fn is_empty_slot(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::Number(number) => number.as_f64() == Some(0.0),
        Value::String(text) => text.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}
