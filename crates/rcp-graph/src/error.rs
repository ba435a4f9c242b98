use rcp_domain::{DomainError, ErrorKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("no provider for binding '{name}' required by component '{component}'")]
    NoProvider { component: String, name: String },

    #[error("binding kind mismatch: component '{component}' depends on '{name}' as {expected} but provider declares {actual}")]
    KindMismatch {
        component: String,
        name: String,
        expected: String,
        actual: String,
    },

    #[error("binding '{name}' has multiple providers: '{first}' and '{second}'")]
    MultipleProviders { name: String, first: String, second: String },

    #[error("cyclic dependency among components: {0:?}")]
    CycleDetected(Vec<String>),

    #[error("multiple errors")]
    Multiple(Vec<GraphError>),
}

impl From<GraphError> for DomainError {
    fn from(e: GraphError) -> Self {
        match &e {
            GraphError::NoProvider { .. } | GraphError::KindMismatch { .. } => {
                DomainError::BadInput(e.to_string())
            }
            GraphError::MultipleProviders { .. } | GraphError::CycleDetected(_) => {
                DomainError::Conflict(e.to_string())
            }
            GraphError::Multiple(_) => DomainError::BadInput(e.to_string()),
        }
    }
}

impl GraphError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GraphError::NoProvider { .. } | GraphError::KindMismatch { .. } | GraphError::Multiple(_) => {
                ErrorKind::BadInput
            }
            GraphError::MultipleProviders { .. } | GraphError::CycleDetected(_) => ErrorKind::Conflict,
        }
    }
}
