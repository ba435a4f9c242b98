use rcp_diff::DiffError;
use rcp_domain::{DomainError, ErrorKind};
use rcp_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OperationsError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Diff(#[from] DiffError),
}

impl From<OperationsError> for DomainError {
    fn from(e: OperationsError) -> Self {
        let kind = e.kind();
        let msg = e.to_string();
        match kind {
            ErrorKind::BadInput => DomainError::BadInput(msg),
            ErrorKind::NotFound => DomainError::NotFound(msg),
            ErrorKind::Conflict => DomainError::Conflict(msg),
            ErrorKind::Concurrency => DomainError::Concurrency(msg),
            ErrorKind::Internal => DomainError::Internal(msg),
        }
    }
}

impl OperationsError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            OperationsError::NotFound(_) => ErrorKind::NotFound,
            OperationsError::Store(s) => s.kind(),
            OperationsError::Diff(d) => d.kind(),
        }
    }
}
