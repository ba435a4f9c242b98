use std::sync::Arc;

use chrono::Utc;
use rcp_diff::{diff, ActionEntry};
use rcp_domain::{
    Deployment, DeploymentProperties, DeploymentStatus, Operation, OperationError, OperationErrorCode, OperationStatus, ProvisioningState,
};
use rcp_graph::BindingMetadataRegistry;
use rcp_handler::{HandlerRegistry, RendererRegistry};
use rcp_orchestrator::{self, CompositeError, NamespaceProvisioner, OrchestratorError};
use rcp_store::{AuditEvent, StateStore};
use tracing::warn;
use uuid::Uuid;

use crate::error::OperationsError;

/// What the caller wants done to a deployment (§4.9).
pub enum MutationMode {
    Deploy(DeploymentProperties),
    Delete,
}

/// The immediate, synchronous result of [`OperationManager::process_mutation`].
/// `Accepted` means the work continues in the background; poll
/// [`OperationManager::get_operation`] with the returned id.
#[derive(Debug)]
pub enum MutationAck {
    NoOp(Deployment),
    Accepted(Operation),
}

/// Outcome of polling an operation (§4.9, "GetOperation").
pub enum GetOperationOutcome {
    /// Terminally failed with a client-caused (`Invalid`) error.
    Invalid(Operation),
    /// Terminally failed with a server-caused (`Internal`) error.
    InternalError(Operation),
    /// The deployment this operation targeted no longer exists.
    Gone,
    /// The deployment reached a terminal provisioning state.
    Ready(Deployment),
    /// Still running; poll again.
    InProgress(Operation),
}

/// Drives mutation requests to completion off the request path (§4.9).
#[derive(Clone)]
pub struct OperationManager {
    store: Arc<dyn StateStore>,
    handlers: Arc<HandlerRegistry>,
    renderers: Arc<RendererRegistry>,
    namespace: Arc<dyn NamespaceProvisioner>,
    bindings: Arc<BindingMetadataRegistry>,
}

impl OperationManager {
    pub fn new(
        store: Arc<dyn StateStore>,
        handlers: Arc<HandlerRegistry>,
        renderers: Arc<RendererRegistry>,
        namespace: Arc<dyn NamespaceProvisioner>,
        bindings: Arc<BindingMetadataRegistry>,
    ) -> Self {
        OperationManager { store, handlers, renderers, namespace, bindings }
    }

    pub async fn process_mutation(&self, application: &str, deployment: &str, mode: MutationMode) -> Result<MutationAck, OperationsError> {
        let app = self
            .store
            .get_application(application)
            .await?
            .ok_or_else(|| OperationsError::NotFound(format!("application '{application}' not found")))?;
        let older = self.store.get_deployment(application, deployment).await?;

        match mode {
            MutationMode::Deploy(desired) => self.start_deploy(application, deployment, &app, older, desired).await,
            MutationMode::Delete => self.start_delete(application, deployment, older).await,
        }
    }

    async fn start_deploy(
        &self,
        application: &str,
        deployment: &str,
        app: &rcp_domain::Application,
        older: Option<Deployment>,
        desired: DeploymentProperties,
    ) -> Result<MutationAck, OperationsError> {
        let computed = diff(app, older.as_ref(), &desired, &self.bindings)?;

        if computed.is_no_op {
            if let Some(existing) = older {
                return Ok(MutationAck::NoOp(existing));
            }
        }

        let resource_ids: std::collections::HashMap<&str, Option<String>> = desired
            .components
            .iter()
            .map(|c| (c.component_name.as_str(), c.resource_id.clone()))
            .collect();
        let resolved_components = computed
            .actions
            .iter()
            .filter(|a| a.action != rcp_diff::ComponentAction::Delete)
            .map(|a| rcp_domain::DeploymentComponent {
                component_name: a.component.clone(),
                resource_id: resource_ids.get(a.component.as_str()).cloned().flatten(),
                revision: a.revision.clone(),
            })
            .collect();

        let status = older.map(|d| d.status).unwrap_or_default();
        let record = Deployment {
            name: deployment.to_string(),
            provisioning_state: ProvisioningState::Deploying,
            status: status.clone(),
            properties: DeploymentProperties { components: resolved_components },
        };
        self.store.upsert_deployment(application, &record).await?;

        let operation_id = Uuid::new_v4().to_string();
        let operation_name = format!("{application}/{deployment}");
        let operation = Operation::new_in_progress(operation_id.clone(), operation_name, OperationStatus::Deploying, Utc::now());
        self.store.upsert_operation(&operation).await?;
        self.store
            .append_event(&AuditEvent::DeploymentStarted {
                id: Uuid::new_v4(),
                at: Utc::now(),
                application: application.to_string(),
                deployment: deployment.to_string(),
                operation_id: operation_id.clone(),
            })
            .await?;

        let store = self.store.clone();
        let handlers = self.handlers.clone();
        let renderers = self.renderers.clone();
        let namespace = self.namespace.clone();
        let application = application.to_string();
        let deployment = deployment.to_string();
        let task_operation_id = operation_id.clone();
        let actions = computed.actions;

        tokio::spawn(async move {
            run_deploy(store, handlers, renderers, namespace, application, deployment, task_operation_id, status, actions).await;
        });

        Ok(MutationAck::Accepted(operation))
    }

    async fn start_delete(&self, application: &str, deployment: &str, older: Option<Deployment>) -> Result<MutationAck, OperationsError> {
        let existing = older.ok_or_else(|| OperationsError::NotFound(format!("deployment '{deployment}' not found")))?;

        let mut record = existing.clone();
        record.provisioning_state = ProvisioningState::Deleting;
        self.store.upsert_deployment(application, &record).await?;

        let operation_id = Uuid::new_v4().to_string();
        let operation_name = format!("{application}/{deployment}");
        let operation = Operation::new_in_progress(operation_id.clone(), operation_name, OperationStatus::Deleting, Utc::now());
        self.store.upsert_operation(&operation).await?;

        let store = self.store.clone();
        let handlers = self.handlers.clone();
        let application = application.to_string();
        let deployment_name = deployment.to_string();
        let task_operation_id = operation_id.clone();
        let status = existing.status;

        tokio::spawn(async move {
            run_delete(store, handlers, application, deployment_name, task_operation_id, status).await;
        });

        Ok(MutationAck::Accepted(operation))
    }

    pub async fn get_operation(&self, application: &str, deployment: &str, operation_id: &str) -> Result<GetOperationOutcome, OperationsError> {
        let operation = self
            .store
            .get_operation(operation_id)
            .await?
            .ok_or_else(|| OperationsError::NotFound(format!("operation '{operation_id}' not found")))?;

        if operation.status.is_terminal() {
            if let Some(err) = &operation.error {
                return Ok(match err.code {
                    OperationErrorCode::Invalid => GetOperationOutcome::Invalid(operation),
                    OperationErrorCode::Internal => GetOperationOutcome::InternalError(operation),
                });
            }
        }

        match self.store.get_deployment(application, deployment).await? {
            None => Ok(GetOperationOutcome::Gone),
            Some(d) if d.provisioning_state.is_terminal() => Ok(GetOperationOutcome::Ready(d)),
            Some(_) => Ok(GetOperationOutcome::InProgress(operation)),
        }
    }
}

async fn run_deploy(
    store: Arc<dyn StateStore>,
    handlers: Arc<HandlerRegistry>,
    renderers: Arc<RendererRegistry>,
    namespace: Arc<dyn NamespaceProvisioner>,
    application: String,
    deployment: String,
    operation_id: String,
    mut status: DeploymentStatus,
    actions: Vec<ActionEntry>,
) {
    let outcome = rcp_orchestrator::update_deployment(&handlers, &renderers, namespace.as_ref(), &application, &mut status, &actions).await;
    finalize(&store, &application, &deployment, &operation_id, status, outcome.err(), false).await;
}

async fn run_delete(
    store: Arc<dyn StateStore>,
    handlers: Arc<HandlerRegistry>,
    application: String,
    deployment: String,
    operation_id: String,
    mut status: DeploymentStatus,
) {
    let outcome = rcp_orchestrator::delete_deployment(&handlers, &application, &mut status).await;
    finalize(&store, &application, &deployment, &operation_id, status, outcome.err(), true).await;
}

/// Classify the orchestrator's outcome, persist the terminal deployment and
/// operation records, and audit the result (§4.9). If the deployment or
/// operation can't be reloaded to finalize, the outcome is downgraded to an
/// internal failure rather than left pending forever.
async fn finalize(
    store: &Arc<dyn StateStore>,
    application: &str,
    deployment: &str,
    operation_id: &str,
    status: DeploymentStatus,
    error: Option<OrchestratorError>,
    is_delete: bool,
) {
    let now = Utc::now();
    let classified = classify(error);

    let succeeded_result = if is_delete && classified.is_none() {
        store.delete_deployment(application, deployment).await
    } else {
        match store.get_deployment(application, deployment).await {
            Ok(Some(mut current)) => {
                current.status = status;
                current.provisioning_state = classified.as_ref().map(|_| ProvisioningState::Failed).unwrap_or(ProvisioningState::Succeeded);
                store.upsert_deployment(application, &current).await
            }
            Ok(None) => Err(rcp_store::StoreError::NotFound(format!("deployment '{deployment}' disappeared during execution"))),
            Err(e) => Err(e),
        }
    };

    let final_error = match (classified, succeeded_result) {
        (err, Ok(())) => err,
        (_, Err(e)) => {
            warn!(application, deployment, error = %e, "failed to persist finalized deployment state");
            Some(OperationError { code: OperationErrorCode::Internal, message: e.to_string() })
        }
    };

    let status = if final_error.is_some() { OperationStatus::Failed } else { OperationStatus::Succeeded };

    let _ = store
        .append_event(&AuditEvent::DeploymentCompleted {
            id: Uuid::new_v4(),
            at: now,
            application: application.to_string(),
            deployment: deployment.to_string(),
            operation_id: operation_id.to_string(),
            succeeded: final_error.is_none(),
        })
        .await;

    match store.get_operation(operation_id).await {
        Ok(Some(mut op)) => {
            op.complete(status, now, final_error);
            if let Err(e) = store.upsert_operation(&op).await {
                warn!(application, deployment, operation_id, error = %e, "failed to persist finalized operation");
            }
        }
        Ok(None) => warn!(application, deployment, operation_id, "operation disappeared before finalization"),
        Err(e) => warn!(application, deployment, operation_id, error = %e, "failed to reload operation for finalization"),
    }
}

fn classify(error: Option<OrchestratorError>) -> Option<OperationError> {
    match error? {
        OrchestratorError::Composite(c) => Some(OperationError { code: OperationErrorCode::Invalid, message: composite_message(&c) }),
        OrchestratorError::Fatal(msg) => Some(OperationError { code: OperationErrorCode::Internal, message: msg }),
    }
}

fn composite_message(c: &CompositeError) -> String {
    c.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rcp_domain::{Application, ComponentHistory, ComponentProperties, ComponentRevision, DeploymentComponent};
    use rcp_handler::{InMemoryHandler, InMemoryRenderer};
    use rcp_store::InMemoryStore;

    async fn wait_for<F>(manager: &OperationManager, application: &str, deployment: &str, operation_id: &str, mut done: F) -> GetOperationOutcome
    where
        F: FnMut(&GetOperationOutcome) -> bool,
    {
        for _ in 0..10_000 {
            let outcome = manager.get_operation(application, deployment, operation_id).await.unwrap();
            if done(&outcome) {
                return outcome;
            }
            tokio::task::yield_now().await;
        }
        panic!("operation never reached the expected terminal state");
    }

    fn manager_with(store: Arc<dyn StateStore>) -> OperationManager {
        let mut handlers = HandlerRegistry::new();
        handlers.register(Arc::new(InMemoryHandler::new("Container")));
        let mut renderers = RendererRegistry::new();
        renderers.register(Arc::new(InMemoryRenderer::new("Container", "Container")));
        OperationManager::new(
            store,
            Arc::new(handlers),
            Arc::new(renderers),
            Arc::new(rcp_orchestrator::NoopNamespaceProvisioner),
            Arc::new(BindingMetadataRegistry::new()),
        )
    }

    async fn app_with_web_component(store: &Arc<dyn StateStore>) {
        let mut app = Application::new("app");
        let props = ComponentProperties {
            build: None,
            config: None,
            run: Some(serde_json::json!({"image": "nginx"})),
            provides: vec![],
            depends_on: vec![],
            traits: vec![],
        };
        let rev = ComponentRevision::new("Container".into(), props).unwrap();
        app.components.insert("web".into(), ComponentHistory::new("web".into(), rev));
        store.create_application(&app).await.unwrap();
    }

    #[tokio::test]
    async fn deploy_runs_in_background_and_succeeds() {
        let store: Arc<dyn StateStore> = Arc::new(InMemoryStore::new());
        app_with_web_component(&store).await;
        let manager = manager_with(store);

        let desired = DeploymentProperties {
            components: vec![DeploymentComponent { component_name: "web".into(), resource_id: None, revision: None }],
        };
        let ack = manager.process_mutation("app", "default", MutationMode::Deploy(desired)).await.unwrap();
        let operation_id = match ack {
            MutationAck::Accepted(op) => op.id,
            MutationAck::NoOp(_) => panic!("first deploy should not be a no-op"),
        };

        let outcome = wait_for(&manager, "app", "default", &operation_id, |o| matches!(o, GetOperationOutcome::Ready(_))).await;
        match outcome {
            GetOperationOutcome::Ready(d) => {
                assert_eq!(d.provisioning_state, ProvisioningState::Succeeded);
                assert_eq!(d.status.workloads.len(), 1);
            }
            _ => unreachable!(),
        }
    }

    #[tokio::test]
    async fn repeated_identical_deploy_is_a_noop() {
        let store: Arc<dyn StateStore> = Arc::new(InMemoryStore::new());
        app_with_web_component(&store).await;
        let manager = manager_with(store);

        let desired = DeploymentProperties {
            components: vec![DeploymentComponent { component_name: "web".into(), resource_id: None, revision: None }],
        };
        let ack = manager.process_mutation("app", "default", MutationMode::Deploy(desired.clone())).await.unwrap();
        let operation_id = match ack {
            MutationAck::Accepted(op) => op.id,
            MutationAck::NoOp(_) => panic!("first deploy should not be a no-op"),
        };
        wait_for(&manager, "app", "default", &operation_id, |o| matches!(o, GetOperationOutcome::Ready(_))).await;

        let second = manager.process_mutation("app", "default", MutationMode::Deploy(desired)).await.unwrap();
        assert!(matches!(second, MutationAck::NoOp(_)));
    }

    #[tokio::test]
    async fn delete_without_prior_deployment_is_not_found() {
        let store: Arc<dyn StateStore> = Arc::new(InMemoryStore::new());
        app_with_web_component(&store).await;
        let manager = manager_with(store);
        let err = manager.process_mutation("app", "default", MutationMode::Delete).await.unwrap_err();
        assert!(matches!(err, OperationsError::NotFound(_)));
    }
}
