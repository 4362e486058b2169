use serde::{Deserialize, Serialize};

use crate::rule::Rule;
use crate::value::CellValue;

/// Outcome of evaluating one rule against a bound dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleOutcome {
    pub rule: Rule,
    pub passed: bool,
    /// Rows that survived the row condition and were checked.
    pub evaluated_row_count: usize,
    pub unexpected_row_count: usize,
    /// 0-based indices of violating rows.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unexpected_rows: Vec<usize>,
    /// Bounded sample of violating values.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unexpected_values: Vec<CellValue>,
    /// Set when the rule could not be evaluated at all.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RuleOutcome {
    pub fn errored(rule: Rule, message: impl Into<String>) -> Self {
        Self {
            rule,
            passed: false,
            evaluated_row_count: 0,
            unexpected_row_count: 0,
            unexpected_rows: Vec::new(),
            unexpected_values: Vec::new(),
            error: Some(message.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Result of evaluating a suite against one batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub success: bool,
    pub suite_name: String,
    pub suite_fingerprint: String,
    pub asset_name: String,
    pub batch_definition_name: String,
    pub row_count: usize,
    pub rule_outcomes: Vec<RuleOutcome>,
}

impl ValidationResult {
    pub fn failed_outcomes(&self) -> impl Iterator<Item = &RuleOutcome> {
        self.rule_outcomes.iter().filter(|outcome| !outcome.passed)
    }

    pub fn unexpected_row_total(&self) -> usize {
        self.rule_outcomes
            .iter()
            .map(|outcome| outcome.unexpected_row_count)
            .sum()
    }
}
