use thiserror::Error;

/// Diagnostic engine error type
#[derive(Debug, Error)]
pub enum Error {
    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Malformed namespace: {0:?}")]
    MalformedNamespace(String),

    #[error("Operation not found: {0}")]
    NotFound(String),

    #[error("Unsupported aggregation: {0}")]
    UnsupportedAggregation(String),

    #[error("Explain failed: {0}")]
    ExplainExecution(#[source] Box<Error>),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Diagnosis aborted")]
    Aborted,
}

impl Error {
    /// Wrap an engine-side failure raised while explaining a request.
    pub fn explain(source: Error) -> Self {
        match source {
            already @ Error::ExplainExecution(_) => already,
            other => Error::ExplainExecution(Box::new(other)),
        }
    }

    /// Whether the assembler may still return a partial result for this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::UnsupportedAggregation(_)
                | Error::ExplainExecution(_)
                | Error::Timeout(_)
                | Error::Parse(_)
        )
    }
}

/// Convenience Result type using our Error
pub type Result<T> = std::result::Result<T, Error>;
