use rcp_domain::{DomainError, ErrorKind};
use rcp_graph::GraphError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DiffError {
    #[error("component '{0}' is not defined on this application")]
    ComponentNotFound(String),

    #[error("component '{component}' has no revision '{revision}' in its history")]
    RevisionNotFound { component: String, revision: String },

    #[error(transparent)]
    Binding(#[from] GraphError),
}

impl From<DiffError> for DomainError {
    fn from(e: DiffError) -> Self {
        match &e {
            DiffError::ComponentNotFound(_) | DiffError::RevisionNotFound { .. } => DomainError::BadInput(e.to_string()),
            DiffError::Binding(g) => match g.kind() {
                ErrorKind::Conflict => DomainError::Conflict(g.to_string()),
                _ => DomainError::BadInput(g.to_string()),
            },
        }
    }
}

impl DiffError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DiffError::ComponentNotFound(_) | DiffError::RevisionNotFound { .. } => ErrorKind::BadInput,
            DiffError::Binding(g) => g.kind(),
        }
    }
}
