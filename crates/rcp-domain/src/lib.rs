mod error;
mod resource_id;
mod revision;
mod types;

pub use error::{DomainError, ErrorKind};
pub use resource_id::{ApplicationId, ComponentId, DeploymentId, OperationId, ResourceId, ScopeId};
pub use revision::{compute_revision, revisions_equal};
pub use types::{
    Application, BindingState, ComponentHistory, ComponentProperties, ComponentRevision,
    DependsOn, Deployment, DeploymentComponent, DeploymentProperties, DeploymentResource,
    DeploymentStatus, DeploymentWorkload, Operation, OperationError, OperationErrorCode,
    OperationStatus, ProvisioningState, Provide, Scope, Trait,
};
