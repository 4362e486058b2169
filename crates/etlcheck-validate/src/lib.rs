//! Validation engine for etlcheck.
//!
//! Evaluates suites of rules against in-memory datasets, builds reconciled
//! comparison datasets from two sources, and sequences the two-stage
//! source → target validation pipeline.

pub mod condition;
pub mod errors;
pub mod orchestrator;
pub mod reconcile;
pub mod report;
pub mod rules;
pub mod runner;

pub use condition::RowCondition;
pub use errors::{ConditionError, PipelineError, RuleEvaluationError, ValidateError};
pub use orchestrator::{
    EtlValidationOrchestrator, PipelineOutcome, PipelineReport, PipelineSettings,
    RegistrationSummary, RunContext, Stage,
};
pub use reconcile::{
    DEFAULT_ALIAS_SUFFIX, DatasetReconciler, ReconcileSummary, ReconciledPair, Reconciliation,
    SkippedEntry,
};
pub use report::render_report;
pub use rules::{MAX_UNEXPECTED_SAMPLE, evaluate_rule};
pub use runner::{SuiteValidator, ValidationRunner};
