use thiserror::Error;

use etlcheck_catalog::CatalogError;

/// A row condition that cannot be parsed or bound to a dataset.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConditionError {
    #[error("row condition references unknown column '{0}'")]
    UnknownColumn(String),
    #[error("unsupported row condition: {0}")]
    Unsupported(String),
}

/// A single rule could not be evaluated against the bound dataset.
///
/// Always contained in that rule's outcome; never aborts a run.
#[derive(Debug, Error)]
pub enum RuleEvaluationError {
    #[error(transparent)]
    Condition(#[from] ConditionError),
    #[error(transparent)]
    InvalidRule(#[from] etlcheck_core::Error),
    #[error("column '{0}' not found in dataset")]
    MissingColumn(String),
}

/// Errors raised while binding a suite to a batch.
#[derive(Debug, Error)]
pub enum ValidateError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("catalog error: {0}")]
    Catalog(CatalogError),
}

impl From<CatalogError> for ValidateError {
    fn from(value: CatalogError) -> Self {
        if value.is_not_found() {
            ValidateError::NotFound(value.to_string())
        } else {
            ValidateError::Catalog(value)
        }
    }
}

/// Fatal pipeline errors; validation failures are reported, not raised.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("registry error for '{name}': {source}")]
    Registry {
        name: String,
        #[source]
        source: CatalogError,
    },
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Validate(#[from] ValidateError),
    #[error("reconciliation failed: {0}")]
    Reconcile(#[from] etlcheck_core::Error),
}
