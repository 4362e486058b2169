use tracing::{info, warn};

use etlcheck_catalog::BatchRegistry;
use etlcheck_core::{Asset, BatchDefinition, Dataset, Suite, ValidationResult};

use crate::errors::ValidateError;
use crate::rules::evaluate_rule;

/// Evaluates a suite against a dataset bound to a registered batch.
pub trait SuiteValidator {
    fn validate<R: BatchRegistry + ?Sized>(
        &self,
        registry: &R,
        asset: &Asset,
        batch: &BatchDefinition,
        suite: &Suite,
        dataset: &Dataset,
    ) -> Result<ValidationResult, ValidateError>;
}

/// Default validator: every rule is evaluated, failures never short-circuit.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidationRunner;

impl ValidationRunner {
    pub fn new() -> Self {
        Self
    }
}

impl SuiteValidator for ValidationRunner {
    fn validate<R: BatchRegistry + ?Sized>(
        &self,
        registry: &R,
        asset: &Asset,
        batch: &BatchDefinition,
        suite: &Suite,
        dataset: &Dataset,
    ) -> Result<ValidationResult, ValidateError> {
        if batch.asset_name != asset.name {
            return Err(ValidateError::NotFound(format!(
                "batch definition '{}' does not belong to asset '{}'",
                batch.name, asset.name
            )));
        }
        registry.get_batch_definition(asset, &batch.name)?;

        let rule_outcomes: Vec<_> = suite
            .rules
            .iter()
            .map(|rule| {
                let outcome = evaluate_rule(rule, dataset);
                if let Some(error) = &outcome.error {
                    warn!(suite = %suite.name, rule = %rule.kind, error = %error, "rule could not be evaluated");
                }
                outcome
            })
            .collect();

        let success = rule_outcomes.iter().all(|outcome| outcome.passed);
        info!(
            suite = %suite.name,
            asset = %asset.name,
            batch = %batch.name,
            rows = dataset.row_count(),
            rules = rule_outcomes.len(),
            success,
            "suite validated"
        );

        Ok(ValidationResult {
            success,
            suite_name: suite.name.clone(),
            suite_fingerprint: suite.fingerprint(),
            asset_name: asset.name.clone(),
            batch_definition_name: batch.name.clone(),
            row_count: dataset.row_count(),
            rule_outcomes,
        })
    }
}
