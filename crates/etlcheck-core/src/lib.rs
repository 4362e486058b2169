//! Core contracts for etlcheck.
//!
//! This crate defines the in-memory dataset model, validation rules, suites
//! and result types shared by the catalog, the validation engine and the CLI.

pub mod asset;
pub mod dataset;
pub mod error;
pub mod mapping;
pub mod redaction;
pub mod result;
pub mod rule;
pub mod suite;
pub mod value;

pub use asset::{Asset, BatchDefinition, BatchStrategy};
pub use dataset::{Column, Dataset};
pub use error::{Error, Result};
pub use mapping::ColumnMapping;
pub use redaction::{RedactedConnection, redact_connection_string};
pub use result::{RuleOutcome, ValidationResult};
pub use rule::{Rule, RuleKind, status_purchase_amount_rule};
pub use suite::Suite;
pub use value::CellValue;

/// Current contract version for persisted suite documents.
pub const SUITE_VERSION: &str = "0.1";
