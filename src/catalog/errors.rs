use thiserror::Error;

/// Failures fetching or loading catalog facts.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CatalogError {
    #[error("Catalog provider failed during {operation} for `{table}`: {message}")]
    Provider {
        operation: String,
        table: String,
        message: String,
    },
    #[error("Table `{table}` does not exist in the catalog")]
    TableNotFound { table: String },
    #[error("Metadata cache lock poisoned for {shape}")]
    LockPoisoned { shape: String },
    #[error("Failed to read catalog definition: {error}")]
    ConfigRead { error: String },
    #[error("Failed to parse catalog definition: {error}")]
    ConfigParse { error: String },
    #[error("Invalid catalog definition: {message}")]
    InvalidDefinition { message: String },
}

impl CatalogError {
    pub fn provider(
        operation: impl Into<String>,
        table: impl ToString,
        message: impl Into<String>,
    ) -> Self {
        CatalogError::Provider {
            operation: operation.into(),
            table: table.to_string(),
            message: message.into(),
        }
    }
}
