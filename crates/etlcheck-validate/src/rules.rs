use std::collections::HashSet;

use etlcheck_core::{CellValue, Column, Dataset, Rule, RuleKind, RuleOutcome};

use crate::condition::RowCondition;
use crate::errors::RuleEvaluationError;

/// Maximum number of violating values kept in an outcome.
pub const MAX_UNEXPECTED_SAMPLE: usize = 20;

struct Unexpected {
    row: usize,
    value: CellValue,
}

/// Evaluate one rule against a dataset.
///
/// The row condition, if any, restricts the rows checked; rows outside it
/// are vacuously satisfied. Evaluation problems are reported in the
/// outcome's `error` and mark the rule as failed.
pub fn evaluate_rule(rule: &Rule, dataset: &Dataset) -> RuleOutcome {
    match try_evaluate(rule, dataset) {
        Ok((evaluated, unexpected)) => {
            let unexpected_values = unexpected
                .iter()
                .take(MAX_UNEXPECTED_SAMPLE)
                .map(|item| item.value.clone())
                .collect();
            RuleOutcome {
                rule: rule.clone(),
                passed: unexpected.is_empty(),
                evaluated_row_count: evaluated,
                unexpected_row_count: unexpected.len(),
                unexpected_rows: unexpected.iter().map(|item| item.row).collect(),
                unexpected_values,
                error: None,
            }
        }
        Err(err) => RuleOutcome::errored(rule.clone(), err.to_string()),
    }
}

fn try_evaluate(
    rule: &Rule,
    dataset: &Dataset,
) -> Result<(usize, Vec<Unexpected>), RuleEvaluationError> {
    let rows = match &rule.row_condition {
        Some(expression) => RowCondition::parse(expression)?.filter_rows(dataset)?,
        None => (0..dataset.row_count()).collect(),
    };

    let unexpected = match rule.kind {
        RuleKind::ColumnPairEqual => check_pair_equal(rule, dataset, &rows)?,
        RuleKind::ColumnValuesInSet => check_in_set(rule, dataset, &rows)?,
        RuleKind::ColumnValuesNotNull => check_not_null(rule, dataset, &rows)?,
        RuleKind::ColumnValuesBetween => check_between(rule, dataset, &rows)?,
        RuleKind::ColumnValuesUnique => check_unique(rule, dataset, &rows)?,
    };

    Ok((rows.len(), unexpected))
}

fn column<'a>(dataset: &'a Dataset, name: &str) -> Result<&'a Column, RuleEvaluationError> {
    dataset
        .column(name)
        .ok_or_else(|| RuleEvaluationError::MissingColumn(name.to_string()))
}

fn check_pair_equal(
    rule: &Rule,
    dataset: &Dataset,
    rows: &[usize],
) -> Result<Vec<Unexpected>, RuleEvaluationError> {
    let left = column(dataset, rule.str_param("column_a")?)?;
    let right = column(dataset, rule.str_param("column_b")?)?;

    Ok(rows
        .iter()
        .filter_map(|&row| {
            let (a, b) = (&left.values[row], &right.values[row]);
            // Rows where both sides are missing are ignored.
            if a.is_null() && b.is_null() || a.loosely_equals(b) {
                return None;
            }
            Some(Unexpected {
                row,
                value: CellValue::Text(format!("{} != {}", render(a), render(b))),
            })
        })
        .collect())
}

fn check_in_set(
    rule: &Rule,
    dataset: &Dataset,
    rows: &[usize],
) -> Result<Vec<Unexpected>, RuleEvaluationError> {
    let target = column(dataset, rule.str_param("column")?)?;
    let allowed = rule.string_list_param("value_set")?;

    Ok(rows
        .iter()
        .filter_map(|&row| {
            let value = &target.values[row];
            if value.is_null() {
                return None;
            }
            let rendered = value.to_string();
            if allowed.iter().any(|candidate| *candidate == rendered) {
                None
            } else {
                Some(Unexpected {
                    row,
                    value: value.clone(),
                })
            }
        })
        .collect())
}

fn check_not_null(
    rule: &Rule,
    dataset: &Dataset,
    rows: &[usize],
) -> Result<Vec<Unexpected>, RuleEvaluationError> {
    let target = column(dataset, rule.str_param("column")?)?;
    Ok(rows
        .iter()
        .filter(|&&row| target.values[row].is_null())
        .map(|&row| Unexpected {
            row,
            value: CellValue::Null,
        })
        .collect())
}

fn check_between(
    rule: &Rule,
    dataset: &Dataset,
    rows: &[usize],
) -> Result<Vec<Unexpected>, RuleEvaluationError> {
    let target = column(dataset, rule.str_param("column")?)?;
    let min = rule.f64_param("min_value")?;
    let max = rule.f64_param("max_value")?;
    if min.is_none() && max.is_none() {
        return Err(etlcheck_core::Error::InvalidRule(format!(
            "{}: at least one of 'min_value' or 'max_value' is required",
            rule.kind
        ))
        .into());
    }

    Ok(rows
        .iter()
        .filter_map(|&row| {
            let value = &target.values[row];
            if value.is_null() {
                return None;
            }
            let within = value
                .as_f64()
                .or_else(|| value.as_str().and_then(|text| text.trim().parse().ok()))
                .is_some_and(|number| {
                    min.is_none_or(|min| number >= min) && max.is_none_or(|max| number <= max)
                });
            (!within).then(|| Unexpected {
                row,
                value: value.clone(),
            })
        })
        .collect())
}

fn check_unique(
    rule: &Rule,
    dataset: &Dataset,
    rows: &[usize],
) -> Result<Vec<Unexpected>, RuleEvaluationError> {
    let target = column(dataset, rule.str_param("column")?)?;
    let mut seen = HashSet::new();

    Ok(rows
        .iter()
        .filter_map(|&row| {
            let value = &target.values[row];
            if value.is_null() {
                return None;
            }
            let key = unique_key(value);
            if seen.insert(key) {
                None
            } else {
                Some(Unexpected {
                    row,
                    value: value.clone(),
                })
            }
        })
        .collect())
}

// Whole floats share the integer key so `3` and `3.0` count as repeats.
fn unique_key(value: &CellValue) -> String {
    match value {
        CellValue::Int(number) => format!("i:{number}"),
        CellValue::Float(number)
            if number.fract() == 0.0
                && *number >= i64::MIN as f64
                && *number < i64::MAX as f64 =>
        {
            format!("i:{}", *number as i64)
        }
        CellValue::Float(number) => format!("f:{number}"),
        other => format!("t:{other}"),
    }
}

fn render(value: &CellValue) -> String {
    if value.is_null() {
        "null".to_string()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use etlcheck_core::status_purchase_amount_rule;
    use serde_json::json;

    fn purchases(rows: &[(i64, &str)]) -> Dataset {
        Dataset::new(vec![
            Column {
                name: "PurchaseAmount".to_string(),
                values: rows.iter().map(|(amount, _)| CellValue::Int(*amount)).collect(),
            },
            Column {
                name: "Status".to_string(),
                values: rows.iter().map(|(_, status)| CellValue::from(*status)).collect(),
            },
        ])
        .expect("dataset")
    }

    #[test]
    fn business_rule_exempts_rows_outside_condition() {
        let dataset = purchases(&[(100, "Active"), (0, "Inactive"), (50, "Pending")]);
        let outcome = evaluate_rule(&status_purchase_amount_rule(), &dataset);
        assert!(outcome.passed);
        assert_eq!(outcome.evaluated_row_count, 2);
        assert_eq!(outcome.unexpected_row_count, 0);
    }

    #[test]
    fn business_rule_flags_cancelled_purchase() {
        let dataset = purchases(&[
            (100, "Active"),
            (0, "Inactive"),
            (50, "Pending"),
            (20, "Cancelled"),
        ]);
        let outcome = evaluate_rule(&status_purchase_amount_rule(), &dataset);
        assert!(!outcome.passed);
        assert_eq!(outcome.unexpected_row_count, 1);
        assert_eq!(outcome.unexpected_rows, vec![3]);
        assert_eq!(outcome.unexpected_values, vec![CellValue::from("Cancelled")]);
    }

    #[test]
    fn missing_condition_column_is_contained() {
        let dataset = purchases(&[(10, "Active")]);
        let rule = Rule::column_values_in_set("Status", ["Active"]).with_row_condition("Amount > 0");
        let outcome = evaluate_rule(&rule, &dataset);
        assert!(!outcome.passed);
        assert_eq!(
            outcome.error.as_deref(),
            Some("row condition references unknown column 'Amount'")
        );
    }

    #[test]
    fn missing_rule_column_is_contained() {
        let dataset = purchases(&[(10, "Active")]);
        let outcome = evaluate_rule(&Rule::column_values_not_null("Email"), &dataset);
        assert!(outcome.is_error());
        assert_eq!(outcome.error.as_deref(), Some("column 'Email' not found in dataset"));
    }

    #[test]
    fn between_requires_a_bound_and_flags_out_of_range() {
        let dataset = purchases(&[(10, "Active"), (500, "Active")]);
        let outcome = evaluate_rule(
            &Rule::column_values_between("PurchaseAmount", Some(0.0), Some(100.0)),
            &dataset,
        );
        assert_eq!(outcome.unexpected_rows, vec![1]);

        let unbounded = Rule::new(RuleKind::ColumnValuesBetween)
            .with_parameter("column", json!("PurchaseAmount"));
        assert!(evaluate_rule(&unbounded, &dataset).is_error());
    }

    #[test]
    fn unique_flags_repeats_after_first_occurrence() {
        let dataset = purchases(&[(1, "a"), (2, "b"), (1, "c"), (1, "d")]);
        let outcome = evaluate_rule(&Rule::column_values_unique("PurchaseAmount"), &dataset);
        assert_eq!(outcome.unexpected_rows, vec![2, 3]);
    }

    #[test]
    fn pair_equal_ignores_rows_missing_on_both_sides() {
        let dataset = Dataset::new(vec![
            Column {
                name: "a".to_string(),
                values: vec![CellValue::Int(1), CellValue::Null, CellValue::Null],
            },
            Column {
                name: "b".to_string(),
                values: vec![CellValue::Float(1.0), CellValue::Null, CellValue::Int(3)],
            },
        ])
        .expect("dataset");
        let outcome = evaluate_rule(&Rule::column_pair_equal("a", "b"), &dataset);
        assert_eq!(outcome.unexpected_rows, vec![2]);
        assert_eq!(
            outcome.unexpected_values,
            vec![CellValue::from("null != 3")]
        );
    }

    #[test]
    fn pair_equal_distinguishes_large_identifiers() {
        let dataset = Dataset::new(vec![
            Column {
                name: "CustomerID".to_string(),
                values: vec![CellValue::Int(9_007_199_254_740_993)],
            },
            Column {
                name: "CustomerID_db".to_string(),
                values: vec![CellValue::Int(9_007_199_254_740_992)],
            },
        ])
        .expect("dataset");
        let outcome =
            evaluate_rule(&Rule::column_pair_equal("CustomerID", "CustomerID_db"), &dataset);
        assert!(!outcome.passed);
        assert_eq!(outcome.unexpected_rows, vec![0]);

        let ids = Dataset::new(vec![Column {
            name: "CustomerID".to_string(),
            values: vec![
                CellValue::Int(9_007_199_254_740_993),
                CellValue::Int(9_007_199_254_740_992),
                CellValue::Float(9_007_199_254_740_992.0),
            ],
        }])
        .expect("dataset");
        let unique = evaluate_rule(&Rule::column_values_unique("CustomerID"), &ids);
        assert_eq!(unique.unexpected_rows, vec![2]);
    }
}
