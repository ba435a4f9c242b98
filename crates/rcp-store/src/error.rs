use rcp_domain::{DomainError, ErrorKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("concurrency conflict: {0}")]
    Concurrency(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("internal store error: {0}")]
    Internal(String),
}

impl From<StoreError> for DomainError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(m) => DomainError::NotFound(m),
            StoreError::Conflict(m) => DomainError::Conflict(m),
            StoreError::Concurrency(m) => DomainError::Concurrency(m),
            StoreError::Serialization(e) => DomainError::Internal(format!("serialization: {e}")),
            StoreError::Internal(m) => DomainError::Internal(m),
        }
    }
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::NotFound(_) => ErrorKind::NotFound,
            StoreError::Conflict(_) => ErrorKind::Conflict,
            StoreError::Concurrency(_) => ErrorKind::Concurrency,
            StoreError::Serialization(_) | StoreError::Internal(_) => ErrorKind::Internal,
        }
    }
}
