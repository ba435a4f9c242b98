pub mod error;
pub mod orchestrator;

pub use error::{CompositeError, OrchestratorError};
pub use orchestrator::{delete_deployment, update_deployment, NamespaceProvisioner, NoopNamespaceProvisioner};
