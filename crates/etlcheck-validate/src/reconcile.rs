use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use etlcheck_core::{CellValue, Column, ColumnMapping, Dataset, Rule, Suite};

/// Suffix appended to a target column whose name is taken by the source.
pub const DEFAULT_ALIAS_SUFFIX: &str = "_db";

/// One mapping entry placed in the reconciled dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciledPair {
    pub source_column: String,
    pub target_column: String,
    /// Name of the target column in the reconciled dataset.
    pub output_column: String,
}

/// One mapping entry that could not be placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedEntry {
    pub source_column: String,
    pub target_column: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileSummary {
    pub pairs: Vec<ReconciledPair>,
    pub skipped: Vec<SkippedEntry>,
    pub rules_added: usize,
    pub rules_skipped: usize,
    /// Set when the inputs had different row counts and were padded.
    pub padded: bool,
}

/// Comparison dataset plus what went into it.
#[derive(Debug, Clone)]
pub struct Reconciliation {
    pub dataset: Dataset,
    pub summary: ReconcileSummary,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Origin {
    Source(String),
    Target(String),
}

/// Builds a field-aligned comparison dataset from a source and a target.
///
/// Rows are combined by position; callers supply datasets whose rows
/// already refer to the same records in the same order.
#[derive(Debug, Clone)]
pub struct DatasetReconciler {
    suffix: String,
}

impl Default for DatasetReconciler {
    fn default() -> Self {
        Self::new(DEFAULT_ALIAS_SUFFIX)
    }
}

impl DatasetReconciler {
    pub fn new(suffix: impl Into<String>) -> Self {
        Self {
            suffix: suffix.into(),
        }
    }

    /// Combine `source` and `target` under `mapping` and add one equality
    /// rule per fully placed pair to `suite`.
    pub fn reconcile(
        &self,
        source: &Dataset,
        target: &Dataset,
        mapping: &ColumnMapping,
        suite: &mut Suite,
    ) -> etlcheck_core::Result<Reconciliation> {
        let source_names: HashSet<&str> = source.column_names().collect();
        let mut columns: Vec<Column> = Vec::new();
        let mut origins: HashMap<String, Origin> = HashMap::new();
        let mut summary = ReconcileSummary::default();

        for (source_col, target_col) in mapping.iter() {
            let source_placed = match source.column(source_col) {
                Some(column) => {
                    if !origins.contains_key(source_col) {
                        origins.insert(source_col.to_string(), Origin::Source(source_col.to_string()));
                        columns.push(column.clone());
                    }
                    true
                }
                None => false,
            };

            let target_output = match target.column(target_col) {
                Some(column) => {
                    let existing = origins
                        .iter()
                        .find(|(_, origin)| **origin == Origin::Target(target_col.to_string()))
                        .map(|(name, _)| name.clone());
                    let name = match existing {
                        Some(name) => name,
                        None => {
                            let name = self.resolve_name(target_col, &source_names, &origins);
                            if name != target_col {
                                debug!(column = %target_col, alias = %name, "target column aliased");
                            }
                            origins.insert(name.clone(), Origin::Target(target_col.to_string()));
                            columns.push(Column {
                                name: name.clone(),
                                values: column.values.clone(),
                            });
                            name
                        }
                    };
                    Some(name)
                }
                None => None,
            };

            match (source_placed, target_output) {
                (true, Some(output_column)) => {
                    let rule = Rule::column_pair_equal(source_col, &output_column);
                    if suite.add_rule_if_absent(rule) {
                        info!(suite = %suite.name, column_a = %source_col, column_b = %output_column, "equality rule added");
                        summary.rules_added += 1;
                    } else {
                        warn!(suite = %suite.name, column_a = %source_col, column_b = %output_column, "equality rule already present, skipped");
                        summary.rules_skipped += 1;
                    }
                    summary.pairs.push(ReconciledPair {
                        source_column: source_col.to_string(),
                        target_column: target_col.to_string(),
                        output_column,
                    });
                }
                (source_placed, target_output) => {
                    let reason = match (source_placed, target_output.is_some()) {
                        (false, false) => "missing in source and target",
                        (false, true) => "missing in source",
                        _ => "missing in target",
                    };
                    debug!(source = %source_col, target = %target_col, reason, "mapping entry skipped");
                    summary.skipped.push(SkippedEntry {
                        source_column: source_col.to_string(),
                        target_column: target_col.to_string(),
                        reason: reason.to_string(),
                    });
                }
            }
        }

        if source.row_count() != target.row_count() && !columns.is_empty() {
            let rows = source.row_count().max(target.row_count());
            warn!(
                source_rows = source.row_count(),
                target_rows = target.row_count(),
                "row counts differ, padding shorter side with nulls"
            );
            for column in &mut columns {
                column.values.resize(rows, CellValue::Null);
            }
            summary.padded = true;
        }

        Ok(Reconciliation {
            dataset: Dataset::new(columns)?,
            summary,
        })
    }

    fn resolve_name(
        &self,
        target_col: &str,
        source_names: &HashSet<&str>,
        origins: &HashMap<String, Origin>,
    ) -> String {
        let mut name = target_col.to_string();
        while source_names.contains(name.as_str()) || origins.contains_key(&name) {
            name.push_str(&self.suffix);
        }
        name
    }
}
