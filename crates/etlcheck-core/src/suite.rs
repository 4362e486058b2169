use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::SUITE_VERSION;
use crate::rule::Rule;

/// Named, ordered collection of rules, unique by rule kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Suite {
    #[serde(default = "default_suite_version")]
    pub suite_version: String,
    pub name: String,
    #[serde(default)]
    pub rules: Vec<Rule>,
}

fn default_suite_version() -> String {
    SUITE_VERSION.to_string()
}

impl Suite {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            suite_version: default_suite_version(),
            name: name.into(),
            rules: Vec::new(),
        }
    }

    /// Append `rule` unless a rule of the same kind is already present.
    ///
    /// Returns whether the rule was inserted; the first rule of a kind wins.
    pub fn add_rule_if_absent(&mut self, rule: Rule) -> bool {
        if self.rules.iter().any(|existing| existing.same_identity(&rule)) {
            return false;
        }
        self.rules.push(rule);
        true
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// SHA-256 of the canonical JSON rule list, hex encoded.
    pub fn fingerprint(&self) -> String {
        let canonical = serde_json::to_vec(&self.rules).unwrap_or_default();
        hex::encode(Sha256::digest(&canonical))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::{RuleKind, status_purchase_amount_rule};

    #[test]
    fn first_rule_of_a_kind_wins() {
        let mut suite = Suite::new("target");
        assert!(suite.add_rule_if_absent(Rule::column_pair_equal("a", "a_db")));
        assert!(!suite.add_rule_if_absent(Rule::column_pair_equal("b", "b_db")));
        assert_eq!(suite.rules.len(), 1);
        assert_eq!(suite.rules[0].str_param("column_a").expect("param"), "a");
    }

    #[test]
    fn distinct_kinds_coexist() {
        let mut suite = Suite::new("source");
        assert!(suite.add_rule_if_absent(status_purchase_amount_rule()));
        assert!(suite.add_rule_if_absent(Rule::column_values_not_null("CustomerID")));
        let kinds = suite.rules.iter().map(|rule| rule.kind).collect::<Vec<_>>();
        assert_eq!(
            kinds,
            vec![RuleKind::ColumnValuesInSet, RuleKind::ColumnValuesNotNull]
        );
    }

    #[test]
    fn fingerprint_tracks_rules_only() {
        let mut left = Suite::new("a");
        let mut right = Suite::new("b");
        assert_eq!(left.fingerprint(), right.fingerprint());
        left.add_rule_if_absent(Rule::column_values_unique("id"));
        assert_ne!(left.fingerprint(), right.fingerprint());
        right.add_rule_if_absent(Rule::column_values_unique("id"));
        assert_eq!(left.fingerprint(), right.fingerprint());
    }
}
