use thiserror::Error;

/// Core error type shared across etlcheck crates.
#[derive(Debug, Error)]
pub enum Error {
    /// A dataset violates its shape invariants.
    #[error("invalid dataset: {0}")]
    InvalidDataset(String),
    /// A rule is missing parameters or carries ill-typed ones.
    #[error("invalid rule: {0}")]
    InvalidRule(String),
    /// Catch-all error for unexpected failures.
    #[error("other error: {0}")]
    Other(String),
}

/// Convenience alias for results returned by etlcheck crates.
pub type Result<T> = std::result::Result<T, Error>;
