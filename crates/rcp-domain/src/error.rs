use thiserror::Error;

/// The error kinds the core surfaces, distinct from whatever HTTP status or
/// async-operation error code a caller maps them to (§7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    BadInput,
    NotFound,
    Conflict,
    Concurrency,
    Internal,
}

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("bad input: {0}")]
    BadInput(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("concurrency conflict: {0}")]
    Concurrency(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::BadInput(_) => ErrorKind::BadInput,
            DomainError::NotFound(_) => ErrorKind::NotFound,
            DomainError::Conflict(_) => ErrorKind::Conflict,
            DomainError::Concurrency(_) => ErrorKind::Concurrency,
            DomainError::Internal(_) => ErrorKind::Internal,
        }
    }
}
