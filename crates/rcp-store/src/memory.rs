use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use rcp_domain::{Application, ComponentHistory, ComponentRevision, Deployment, Operation, Scope};
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::state::AuditEvent;
use crate::store::StateStore;

#[derive(Debug, Default)]
struct Inner {
    applications: HashMap<String, Application>,
    operations: HashMap<String, Operation>,
    /// (application, deployment) -> operation ids, insertion order.
    operation_index: HashMap<(String, String), Vec<String>>,
    events: Vec<AuditEvent>,
}

/// In-memory implementation of [`StateStore`].
///
/// All data is lost on process exit. Suitable for tests and single-process
/// local runs of the control plane.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StateStore for InMemoryStore {
    async fn get_application(&self, name: &str) -> Result<Option<Application>, StoreError> {
        let guard = self.inner.read().await;
        Ok(guard.applications.get(name).cloned())
    }

    async fn list_applications(&self) -> Result<Vec<Application>, StoreError> {
        let guard = self.inner.read().await;
        Ok(guard.applications.values().cloned().collect())
    }

    async fn create_application(&self, app: &Application) -> Result<(), StoreError> {
        let mut guard = self.inner.write().await;
        if guard.applications.contains_key(&app.name) {
            return Err(StoreError::Conflict(format!("application already exists: {}", app.name)));
        }
        guard.applications.insert(app.name.clone(), app.clone());
        Ok(())
    }

    async fn delete_application(&self, name: &str) -> Result<(), StoreError> {
        let mut guard = self.inner.write().await;
        match guard.applications.get(name) {
            None => Err(StoreError::NotFound(format!("application not found: {name}"))),
            Some(app) if !app.can_delete() => {
                Err(StoreError::Conflict(format!("application has active deployments: {name}")))
            }
            Some(_) => {
                guard.applications.remove(name);
                Ok(())
            }
        }
    }

    async fn append_component_revision(
        &self,
        application: &str,
        component: &str,
        kind: String,
        revision: ComponentRevision,
        expected_revision: Option<&str>,
    ) -> Result<(), StoreError> {
        let mut guard = self.inner.write().await;
        let app = guard
            .applications
            .get_mut(application)
            .ok_or_else(|| StoreError::NotFound(format!("application not found: {application}")))?;

        match app.components.get_mut(component) {
            None => {
                if let Some(expected) = expected_revision {
                    return Err(StoreError::Concurrency(format!(
                        "expected revision {expected} but component {component} does not exist"
                    )));
                }
                let _ = &kind;
                app.components
                    .insert(component.to_string(), ComponentHistory::new(component.to_string(), revision));
            }
            Some(history) => {
                if let Some(expected) = expected_revision {
                    if history.current_revision != expected {
                        return Err(StoreError::Concurrency(format!(
                            "component {component} current revision {} does not match expected {expected}",
                            history.current_revision
                        )));
                    }
                }
                history.append_if_new(revision);
            }
        }
        Ok(())
    }

    async fn delete_component(&self, application: &str, component: &str) -> Result<(), StoreError> {
        let mut guard = self.inner.write().await;
        let app = guard
            .applications
            .get_mut(application)
            .ok_or_else(|| StoreError::NotFound(format!("application not found: {application}")))?;
        app.components.remove(component);
        Ok(())
    }

    async fn get_deployment(&self, application: &str, deployment: &str) -> Result<Option<Deployment>, StoreError> {
        let guard = self.inner.read().await;
        Ok(guard
            .applications
            .get(application)
            .and_then(|app| app.deployments.get(deployment).cloned()))
    }

    async fn upsert_deployment(&self, application: &str, deployment: &Deployment) -> Result<(), StoreError> {
        let mut guard = self.inner.write().await;
        let app = guard
            .applications
            .get_mut(application)
            .ok_or_else(|| StoreError::NotFound(format!("application not found: {application}")))?;
        app.deployments.insert(deployment.name.clone(), deployment.clone());
        Ok(())
    }

    async fn delete_deployment(&self, application: &str, deployment: &str) -> Result<(), StoreError> {
        let mut guard = self.inner.write().await;
        if let Some(app) = guard.applications.get_mut(application) {
            app.deployments.remove(deployment);
        }
        Ok(())
    }

    async fn get_scope(&self, application: &str, scope: &str) -> Result<Option<Scope>, StoreError> {
        let guard = self.inner.read().await;
        Ok(guard
            .applications
            .get(application)
            .and_then(|app| app.scopes.get(scope).cloned()))
    }

    async fn upsert_scope(&self, application: &str, scope: &Scope) -> Result<(), StoreError> {
        let mut guard = self.inner.write().await;
        let app = guard
            .applications
            .get_mut(application)
            .ok_or_else(|| StoreError::NotFound(format!("application not found: {application}")))?;
        app.scopes.insert(scope.name.clone(), scope.clone());
        Ok(())
    }

    async fn delete_scope(&self, application: &str, scope: &str) -> Result<(), StoreError> {
        let mut guard = self.inner.write().await;
        if let Some(app) = guard.applications.get_mut(application) {
            app.scopes.remove(scope);
        }
        Ok(())
    }

    async fn get_operation(&self, id: &str) -> Result<Option<Operation>, StoreError> {
        let guard = self.inner.read().await;
        Ok(guard.operations.get(id).cloned())
    }

    async fn upsert_operation(&self, op: &Operation) -> Result<(), StoreError> {
        let mut guard = self.inner.write().await;
        guard.operations.insert(op.id.clone(), op.clone());
        Ok(())
    }

    async fn list_operations(&self, application: &str, deployment: &str) -> Result<Vec<Operation>, StoreError> {
        let guard = self.inner.read().await;
        let key = (application.to_string(), deployment.to_string());
        let ids = guard.operation_index.get(&key).cloned().unwrap_or_default();
        Ok(ids.into_iter().filter_map(|id| guard.operations.get(&id).cloned()).collect())
    }

    async fn append_event(&self, event: &AuditEvent) -> Result<(), StoreError> {
        let mut guard = self.inner.write().await;
        guard.events.push(event.clone());
        if let AuditEvent::DeploymentStarted { application, deployment, operation_id, .. } = event {
            guard
                .operation_index
                .entry((application.clone(), deployment.clone()))
                .or_default()
                .push(operation_id.clone());
        }
        Ok(())
    }

    async fn list_events(&self, application: Option<&str>, limit: u32) -> Result<Vec<AuditEvent>, StoreError> {
        let guard = self.inner.read().await;
        let filtered: Vec<AuditEvent> = guard
            .events
            .iter()
            .filter(|ev| application.map_or(true, |a| ev.application() == a))
            .cloned()
            .collect();

        let start = filtered.len().saturating_sub(limit as usize);
        Ok(filtered[start..].to_vec())
    }
}
