//! Scalar attribute values carried by feature records.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A JSON-safe scalar attribute value.
///
/// Floats are never NaN or infinite: [`AttrValue::float`] normalizes those to
/// [`AttrValue::Null`] so every value can be written back out as JSON.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl AttrValue {
    /// Build a float value, mapping non-finite input to null
    pub fn float(v: f64) -> Self {
        if v.is_finite() {
            AttrValue::Float(v)
        } else {
            AttrValue::Null
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, AttrValue::Null)
    }

    /// Numeric view of the value (integers widen to f64)
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttrValue::Int(v) => Some(*v as f64),
            AttrValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Equality as used by attribute filters.
    ///
    /// Integers and floats compare numerically, strings and booleans exactly.
    /// Null never matches anything, including another null.
    pub fn matches(&self, expected: &AttrValue) -> bool {
        match (self, expected) {
            (AttrValue::Null, _) | (_, AttrValue::Null) => false,
            (AttrValue::Bool(a), AttrValue::Bool(b)) => a == b,
            (AttrValue::Str(a), AttrValue::Str(b)) => a == b,
            (AttrValue::Int(a), AttrValue::Int(b)) => a == b,
            (a, b) => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => x == y,
                _ => false,
            },
        }
    }
}

/// Hashable identity of a non-null value, used for histograms and distinct
/// counts. Numbers compare numerically (`2` and `2.0` share a key) while a
/// string never equals a number, even when both print as `"2"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueKey {
    Bool(bool),
    Int(i64),
    /// Non-integral float, by bit pattern
    Float(u64),
    Str(String),
}

impl AttrValue {
    /// Normalized key, `None` for null
    pub fn key(&self) -> Option<ValueKey> {
        match self {
            AttrValue::Null => None,
            AttrValue::Bool(v) => Some(ValueKey::Bool(*v)),
            AttrValue::Int(v) => Some(ValueKey::Int(*v)),
            AttrValue::Float(v) => {
                let integral = v.fract() == 0.0 && *v >= i64::MIN as f64 && *v < i64::MAX as f64;
                if integral {
                    Some(ValueKey::Int(*v as i64))
                } else {
                    Some(ValueKey::Float(v.to_bits()))
                }
            }
            AttrValue::Str(v) => Some(ValueKey::Str(v.clone())),
        }
    }
}

/// Textual label used when rendering histogram buckets.
///
/// `2` and `2.0` share the label `"2"`.
impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Null => write!(f, "null"),
            AttrValue::Bool(v) => write!(f, "{}", v),
            AttrValue::Int(v) => write!(f, "{}", v),
            AttrValue::Float(v) => write!(f, "{}", v),
            AttrValue::Str(v) => write!(f, "{}", v),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::Str(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        AttrValue::Str(s)
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        AttrValue::Int(v)
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        AttrValue::float(v)
    }
}
