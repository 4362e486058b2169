use std::path::PathBuf;

use thiserror::Error;

pub type LoadResult<T> = std::result::Result<T, LoadError>;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("column '{column}' has unsupported type {type_name}; cast it in the query")]
    UnsupportedType { column: String, type_name: String },
    #[error("unsupported database engine: {0}")]
    UnsupportedEngine(String),
    #[error(transparent)]
    InvalidDataset(#[from] etlcheck_core::Error),
}
