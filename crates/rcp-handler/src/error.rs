use rcp_domain::{DomainError, ErrorKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("put failed: {0}")]
    PutFailed(String),

    #[error("delete failed: {0}")]
    DeleteFailed(String),

    #[error("no handler registered for resource type '{0}'")]
    HandlerNotFound(String),

    #[error("no renderer registered for component kind '{0}'")]
    RendererNotFound(String),

    #[error("render failed: {0}")]
    RenderFailed(String),
}

impl From<HandlerError> for DomainError {
    fn from(e: HandlerError) -> Self {
        match &e {
            HandlerError::HandlerNotFound(_) | HandlerError::RendererNotFound(_) => DomainError::BadInput(e.to_string()),
            HandlerError::PutFailed(_) | HandlerError::DeleteFailed(_) | HandlerError::RenderFailed(_) => {
                DomainError::Internal(e.to_string())
            }
        }
    }
}

impl HandlerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            HandlerError::HandlerNotFound(_) | HandlerError::RendererNotFound(_) => ErrorKind::BadInput,
            HandlerError::PutFailed(_) | HandlerError::DeleteFailed(_) | HandlerError::RenderFailed(_) => ErrorKind::Internal,
        }
    }
}
