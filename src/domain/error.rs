use crate::domain::Money;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Ingestion failed with: {0}")]
    Ingestion(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Requested amount exceeds available balance ({available} available)")]
    InsufficientAvailable { available: Money },

    #[error("Conflicting update: {0}")]
    Conflict(String),
}
