use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use etlcheck_catalog::{
    Catalog, CatalogError, Registration, SuiteCatalog, ensure_asset, ensure_batch_definition,
    ensure_source,
};
use etlcheck_core::{
    Asset, BatchDefinition, ColumnMapping, Dataset, Rule, ValidationResult,
    status_purchase_amount_rule,
};

use crate::errors::PipelineError;
use crate::reconcile::{DatasetReconciler, ReconcileSummary};
use crate::runner::{SuiteValidator, ValidationRunner};

/// Names and rules a pipeline run operates on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineSettings {
    pub data_source_name: String,
    pub data_asset_name: String,
    pub batch_definition_name: String,
    pub source_suite_name: String,
    pub target_suite_name: String,
    pub column_mapping: ColumnMapping,
    pub source_rules: Vec<Rule>,
}

impl PipelineSettings {
    /// Settings with the default mapping (`CustomerID -> CustomerID`) and the
    /// purchase/status business rule.
    pub fn new(
        data_source_name: impl Into<String>,
        data_asset_name: impl Into<String>,
        batch_definition_name: impl Into<String>,
        source_suite_name: impl Into<String>,
        target_suite_name: impl Into<String>,
    ) -> Self {
        Self {
            data_source_name: data_source_name.into(),
            data_asset_name: data_asset_name.into(),
            batch_definition_name: batch_definition_name.into(),
            source_suite_name: source_suite_name.into(),
            target_suite_name: target_suite_name.into(),
            column_mapping: [("CustomerID", "CustomerID")].into_iter().collect(),
            source_rules: vec![status_purchase_amount_rule()],
        }
    }

    pub fn with_column_mapping(mut self, mapping: ColumnMapping) -> Self {
        self.column_mapping = mapping;
        self
    }

    pub fn with_source_rules(mut self, rules: Vec<Rule>) -> Self {
        self.source_rules = rules;
        self
    }
}

/// Everything one run needs, constructed by the caller and discarded after.
pub struct RunContext<'a, C: Catalog + ?Sized> {
    pub catalog: &'a mut C,
    pub settings: PipelineSettings,
}

impl<'a, C: Catalog + ?Sized> RunContext<'a, C> {
    pub fn new(catalog: &'a mut C, settings: PipelineSettings) -> Self {
        Self { catalog, settings }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Stage {
    Source,
    Target,
    Done,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Source => "SOURCE",
            Stage::Target => "TARGET",
            Stage::Done => "DONE",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineOutcome {
    Passed,
    SourceFailed,
    TargetFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationSummary {
    pub data_source: Registration,
    pub data_asset: Registration,
    pub batch_definition: Registration,
}

/// Aggregated result of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineReport {
    pub outcome: PipelineOutcome,
    /// Stages entered, in order; always ends with `DONE`.
    pub stages_run: Vec<Stage>,
    pub registrations: RegistrationSummary,
    pub source: Option<ValidationResult>,
    pub target: Option<ValidationResult>,
    pub reconciliation: Option<ReconcileSummary>,
}

impl PipelineReport {
    pub fn success(&self) -> bool {
        self.outcome == PipelineOutcome::Passed
    }

    pub fn final_stage(&self) -> Stage {
        self.stages_run.last().copied().unwrap_or(Stage::Done)
    }
}

/// Sequences source validation, then reconciled target validation.
///
/// The target stage is only entered once the source suite passes.
#[derive(Debug, Clone, Default)]
pub struct EtlValidationOrchestrator<V = ValidationRunner> {
    validator: V,
    reconciler: DatasetReconciler,
}

impl EtlValidationOrchestrator<ValidationRunner> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<V: SuiteValidator> EtlValidationOrchestrator<V> {
    pub fn with_validator(validator: V) -> Self {
        Self {
            validator,
            reconciler: DatasetReconciler::default(),
        }
    }

    pub fn validator(&self) -> &V {
        &self.validator
    }

    pub fn run<C: Catalog + ?Sized>(
        &self,
        ctx: &mut RunContext<'_, C>,
        source: &Dataset,
        target: &Dataset,
    ) -> Result<PipelineReport, PipelineError> {
        let settings = &ctx.settings;
        let (asset, batch, registrations) = register_resources(&mut *ctx.catalog, settings)?;

        let (source_suite, mut target_suite) = {
            let mut suites = SuiteCatalog::new(&mut *ctx.catalog);
            let mut source_suite = suites.get_or_create(&settings.source_suite_name)?;
            for rule in &settings.source_rules {
                suites.add_rule_if_absent(&mut source_suite, rule.clone());
            }
            suites.save(&source_suite)?;
            let target_suite = suites.get_or_create(&settings.target_suite_name)?;
            (source_suite, target_suite)
        };

        let mut report = PipelineReport {
            outcome: PipelineOutcome::Passed,
            stages_run: Vec::new(),
            registrations,
            source: None,
            target: None,
            reconciliation: None,
        };

        let mut stage = Stage::Source;
        loop {
            report.stages_run.push(stage);
            if stage != Stage::Done {
                info!(event = "stage_started", stage = %stage, "pipeline stage entered");
            }
            stage = match stage {
                Stage::Source => {
                    let result = self.validator.validate(
                        &*ctx.catalog,
                        &asset,
                        &batch,
                        &source_suite,
                        source,
                    )?;
                    let passed = result.success;
                    info!(event = "stage_finished", stage = %stage, success = passed);
                    report.source = Some(result);
                    if passed {
                        Stage::Target
                    } else {
                        warn!(suite = %source_suite.name, "source validation failed, target stage skipped");
                        report.outcome = PipelineOutcome::SourceFailed;
                        Stage::Done
                    }
                }
                Stage::Target => {
                    let reconciliation = self.reconciler.reconcile(
                        source,
                        target,
                        &settings.column_mapping,
                        &mut target_suite,
                    )?;
                    SuiteCatalog::new(&mut *ctx.catalog).save(&target_suite)?;
                    let result = self.validator.validate(
                        &*ctx.catalog,
                        &asset,
                        &batch,
                        &target_suite,
                        &reconciliation.dataset,
                    )?;
                    report.reconciliation = Some(reconciliation.summary);
                    info!(event = "stage_finished", stage = %stage, success = result.success);
                    if !result.success {
                        warn!(suite = %target_suite.name, "target validation failed");
                        report.outcome = PipelineOutcome::TargetFailed;
                    }
                    report.target = Some(result);
                    Stage::Done
                }
                Stage::Done => break,
            };
        }

        info!(outcome = ?report.outcome, "pipeline finished");
        Ok(report)
    }
}

fn register_resources<C: Catalog + ?Sized>(
    catalog: &mut C,
    settings: &PipelineSettings,
) -> Result<(Asset, BatchDefinition, RegistrationSummary), PipelineError> {
    let registry_error = |name: &str| {
        let name = name.to_string();
        move |source: CatalogError| PipelineError::Registry { name, source }
    };

    let data_source = ensure_source(catalog, &settings.data_source_name)
        .map_err(registry_error(&settings.data_source_name))?;
    let (asset, data_asset) = ensure_asset(
        catalog,
        &settings.data_source_name,
        &settings.data_asset_name,
    )
    .map_err(registry_error(&settings.data_asset_name))?;
    let (batch, batch_definition) =
        ensure_batch_definition(catalog, &asset, &settings.batch_definition_name)
            .map_err(registry_error(&settings.batch_definition_name))?;

    Ok((
        asset,
        batch,
        RegistrationSummary {
            data_source,
            data_asset,
            batch_definition,
        },
    ))
}
