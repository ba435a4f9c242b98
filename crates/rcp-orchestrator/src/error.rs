use std::fmt;

use rcp_domain::{DomainError, ErrorKind};
use rcp_graph::GraphError;
use thiserror::Error;

/// Non-fatal errors accumulated while executing one deployment's action set
/// (§4.8). The orchestrator keeps going after any one resource fails;
/// `CompositeError` is how it reports that some of them did.
#[derive(Debug, Default)]
pub struct CompositeError(pub Vec<String>);

impl CompositeError {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn push(&mut self, msg: impl Into<String>) {
        self.0.push(msg.into());
    }
}

impl fmt::Display for CompositeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} error(s): {}", self.0.len(), self.0.join("; "))
    }
}

impl std::error::Error for CompositeError {}

#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Aborts the whole run: namespace prerequisite or dependency-graph
    /// failure, before any resource was touched.
    #[error("{0}")]
    Fatal(String),

    /// One or more resources failed; everything else that could run, did.
    #[error(transparent)]
    Composite(#[from] CompositeError),
}

impl From<GraphError> for OrchestratorError {
    fn from(e: GraphError) -> Self {
        OrchestratorError::Fatal(e.to_string())
    }
}

impl From<OrchestratorError> for DomainError {
    fn from(e: OrchestratorError) -> Self {
        match e {
            OrchestratorError::Fatal(msg) => DomainError::Internal(msg),
            OrchestratorError::Composite(c) => DomainError::BadInput(c.to_string()),
        }
    }
}

impl OrchestratorError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            OrchestratorError::Fatal(_) => ErrorKind::Internal,
            OrchestratorError::Composite(_) => ErrorKind::BadInput,
        }
    }
}
