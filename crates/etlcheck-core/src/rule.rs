use std::collections::BTreeMap;
use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::{Error, Result};

/// Closed set of checks a rule can perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    /// Two columns hold the same value on every row.
    ColumnPairEqual,
    /// Values of a column belong to a fixed set.
    ColumnValuesInSet,
    /// A column has no null values.
    ColumnValuesNotNull,
    /// Numeric values of a column fall within inclusive bounds.
    ColumnValuesBetween,
    /// Values of a column never repeat.
    ColumnValuesUnique,
}

impl RuleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleKind::ColumnPairEqual => "column_pair_equal",
            RuleKind::ColumnValuesInSet => "column_values_in_set",
            RuleKind::ColumnValuesNotNull => "column_values_not_null",
            RuleKind::ColumnValuesBetween => "column_values_between",
            RuleKind::ColumnValuesUnique => "column_values_unique",
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One declarative data-quality check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Rule {
    pub kind: RuleKind,
    #[serde(default)]
    pub parameters: BTreeMap<String, Value>,
    /// Boolean expression over row fields restricting the rows checked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_condition: Option<String>,
}

impl Rule {
    pub fn new(kind: RuleKind) -> Self {
        Self {
            kind,
            parameters: BTreeMap::new(),
            row_condition: None,
        }
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: Value) -> Self {
        self.parameters.insert(key.into(), value);
        self
    }

    pub fn with_row_condition(mut self, condition: impl Into<String>) -> Self {
        self.row_condition = Some(condition.into());
        self
    }

    pub fn column_pair_equal(column_a: &str, column_b: &str) -> Self {
        Self::new(RuleKind::ColumnPairEqual)
            .with_parameter("column_a", json!(column_a))
            .with_parameter("column_b", json!(column_b))
    }

    pub fn column_values_in_set<I, S>(column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values = values.into_iter().map(Into::into).collect::<Vec<String>>();
        Self::new(RuleKind::ColumnValuesInSet)
            .with_parameter("column", json!(column))
            .with_parameter("value_set", json!(values))
    }

    pub fn column_values_not_null(column: &str) -> Self {
        Self::new(RuleKind::ColumnValuesNotNull).with_parameter("column", json!(column))
    }

    pub fn column_values_between(column: &str, min: Option<f64>, max: Option<f64>) -> Self {
        let mut rule =
            Self::new(RuleKind::ColumnValuesBetween).with_parameter("column", json!(column));
        if let Some(min) = min {
            rule = rule.with_parameter("min_value", json!(min));
        }
        if let Some(max) = max {
            rule = rule.with_parameter("max_value", json!(max));
        }
        rule
    }

    pub fn column_values_unique(column: &str) -> Self {
        Self::new(RuleKind::ColumnValuesUnique).with_parameter("column", json!(column))
    }

    /// Whether `other` counts as the same rule when deduplicating a suite.
    ///
    /// Identity is the rule kind alone; parameters are not compared.
    pub fn same_identity(&self, other: &Rule) -> bool {
        self.kind == other.kind
    }

    /// Required string parameter.
    pub fn str_param(&self, key: &str) -> Result<&str> {
        self.parameters
            .get(key)
            .ok_or_else(|| Error::InvalidRule(format!("{}: missing parameter '{key}'", self.kind)))?
            .as_str()
            .ok_or_else(|| {
                Error::InvalidRule(format!("{}: parameter '{key}' must be a string", self.kind))
            })
    }

    /// Optional numeric parameter.
    pub fn f64_param(&self, key: &str) -> Result<Option<f64>> {
        match self.parameters.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => value.as_f64().map(Some).ok_or_else(|| {
                Error::InvalidRule(format!("{}: parameter '{key}' must be a number", self.kind))
            }),
        }
    }

    /// Required array parameter rendered as strings.
    pub fn string_list_param(&self, key: &str) -> Result<Vec<String>> {
        let values = self
            .parameters
            .get(key)
            .ok_or_else(|| Error::InvalidRule(format!("{}: missing parameter '{key}'", self.kind)))?
            .as_array()
            .ok_or_else(|| {
                Error::InvalidRule(format!("{}: parameter '{key}' must be an array", self.kind))
            })?;
        Ok(values
            .iter()
            .map(|value| match value {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            })
            .collect())
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params = self
            .parameters
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "{}({params})", self.kind)?;
        if let Some(condition) = &self.row_condition {
            write!(f, " where {condition}")?;
        }
        Ok(())
    }
}

/// "For every row where `PurchaseAmount > 0`, `Status` must be Active or Pending."
pub fn status_purchase_amount_rule() -> Rule {
    Rule::column_values_in_set("Status", ["Active", "Pending"])
        .with_row_condition("PurchaseAmount > 0")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_ignores_parameters() {
        let first = Rule::column_pair_equal("a", "a_db");
        let second = Rule::column_pair_equal("b", "b_db");
        assert!(first.same_identity(&second));
        assert!(!first.same_identity(&Rule::column_values_not_null("a")));
    }

    #[test]
    fn parameter_accessors_report_rule_kind() {
        let rule = Rule::new(RuleKind::ColumnValuesInSet).with_parameter("column", json!(3));
        let err = rule.str_param("column").unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid rule: column_values_in_set: parameter 'column' must be a string"
        );
        assert!(rule.string_list_param("value_set").is_err());
    }

    #[test]
    fn serializes_kind_in_snake_case() {
        let json = serde_json::to_value(status_purchase_amount_rule()).expect("serialize");
        assert_eq!(json["kind"], "column_values_in_set");
        assert_eq!(json["row_condition"], "PurchaseAmount > 0");
        assert_eq!(json["parameters"]["value_set"], json!(["Active", "Pending"]));
    }
}
