use thiserror::Error;

/// Errors raised by suite stores and resource registries.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("suite '{0}' not found")]
    SuiteNotFound(String),
    #[error("data source '{0}' not found")]
    SourceNotFound(String),
    #[error("data asset '{asset}' not found in data source '{source_name}'")]
    AssetNotFound { source_name: String, asset: String },
    #[error("batch definition '{batch}' not found for data asset '{asset}'")]
    BatchDefinitionNotFound { asset: String, batch: String },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid catalog state: {0}")]
    Invalid(String),
}

impl CatalogError {
    /// Whether the error reports a missing named resource.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CatalogError::SuiteNotFound(_)
                | CatalogError::SourceNotFound(_)
                | CatalogError::AssetNotFound { .. }
                | CatalogError::BatchDefinitionNotFound { .. }
        )
    }
}

/// Result type for catalog operations.
pub type CatalogResult<T> = std::result::Result<T, CatalogError>;
