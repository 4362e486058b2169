use std::fmt;

use serde::{Deserialize, Serialize};

/// A single cell of a materialized dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Int(value) => Some(*value as f64),
            CellValue::Float(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CellValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Loose equality used when comparing values coming from different
    /// sources: numbers compare numerically, everything else by rendered text.
    ///
    /// Integers compare exactly, including against whole floats. Two floats
    /// are equal within a relative epsilon.
    pub fn loosely_equals(&self, other: &CellValue) -> bool {
        match (self, other) {
            (CellValue::Null, CellValue::Null) => true,
            (CellValue::Null, _) | (_, CellValue::Null) => false,
            (CellValue::Int(left), CellValue::Int(right)) => left == right,
            (CellValue::Int(int), CellValue::Float(float))
            | (CellValue::Float(float), CellValue::Int(int)) => int_equals_float(*int, *float),
            (CellValue::Float(left), CellValue::Float(right)) => floats_close(*left, *right),
            _ => self.to_string() == other.to_string(),
        }
    }
}

// i64::MAX as f64 rounds up to 2^63, which is already out of range.
fn int_equals_float(int: i64, float: f64) -> bool {
    float.fract() == 0.0
        && float >= i64::MIN as f64
        && float < i64::MAX as f64
        && float as i64 == int
}

fn floats_close(left: f64, right: f64) -> bool {
    left == right || (left - right).abs() <= f64::EPSILON * left.abs().max(right.abs())
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => Ok(()),
            CellValue::Bool(value) => write!(f, "{value}"),
            CellValue::Int(value) => write!(f, "{value}"),
            CellValue::Float(value) => write!(f, "{value}"),
            CellValue::Text(value) => f.write_str(value),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Int(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Float(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Bool(value)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(CellValue::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loose_equality_bridges_int_and_float() {
        assert!(CellValue::Int(3).loosely_equals(&CellValue::Float(3.0)));
        assert!(!CellValue::Int(3).loosely_equals(&CellValue::Int(9)));
        assert!(!CellValue::Null.loosely_equals(&CellValue::Int(1)));
        assert!(CellValue::from("a").loosely_equals(&CellValue::from("a")));
    }

    #[test]
    fn large_integers_compare_exactly() {
        let left = CellValue::Int(9_007_199_254_740_993);
        let right = CellValue::Int(9_007_199_254_740_992);
        assert!(!left.loosely_equals(&right));
        assert!(left.loosely_equals(&CellValue::Int(9_007_199_254_740_993)));
        assert!(!left.loosely_equals(&CellValue::Float(9_007_199_254_740_992.0)));
        assert!(right.loosely_equals(&CellValue::Float(9_007_199_254_740_992.0)));
    }

    #[test]
    fn float_tolerance_is_relative() {
        assert!(CellValue::Float(0.1 + 0.2).loosely_equals(&CellValue::Float(0.3)));
        assert!(!CellValue::Float(1e12 + 1.0).loosely_equals(&CellValue::Float(1e12)));
        assert!(!CellValue::Float(1e-20).loosely_equals(&CellValue::Float(2e-20)));
        assert!(!CellValue::Int(3).loosely_equals(&CellValue::Float(3.5)));
        assert!(!CellValue::Int(0).loosely_equals(&CellValue::Float(f64::NAN)));
    }
}
