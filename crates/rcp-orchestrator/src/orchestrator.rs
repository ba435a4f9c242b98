use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use rcp_diff::{ActionEntry, ComponentAction};
use rcp_domain::{DeploymentResource, DeploymentStatus, DeploymentWorkload};
use rcp_graph::{order_components, ProviderRecord};
use rcp_handler::{AllocateBindingsContext, DeleteContext, HandlerRegistry, PutContext, RenderContext, RendererRegistry};

use crate::error::{CompositeError, OrchestratorError};

/// Creates whatever shared, per-application scope a handler needs before any
/// component resource is touched (§5, "shared per-application namespace").
/// Failure here aborts the whole run.
#[async_trait]
pub trait NamespaceProvisioner: Send + Sync + 'static {
    async fn ensure_namespace(&self, application: &str) -> Result<(), String>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNamespaceProvisioner;

#[async_trait]
impl NamespaceProvisioner for NoopNamespaceProvisioner {
    async fn ensure_namespace(&self, _application: &str) -> Result<(), String> {
        Ok(())
    }
}

/// Execute a deployment's action set in dependency order (§4.8). Mutates
/// `status` in place as each component completes; returns a
/// [`CompositeError`] listing every resource that failed rather than
/// stopping at the first one. Only a namespace or graph-ordering failure
/// aborts before anything runs.
pub async fn update_deployment(
    handlers: &HandlerRegistry,
    renderers: &RendererRegistry,
    namespace: &dyn NamespaceProvisioner,
    application: &str,
    status: &mut DeploymentStatus,
    actions: &[ActionEntry],
) -> Result<(), OrchestratorError> {
    namespace.ensure_namespace(application).await.map_err(OrchestratorError::Fatal)?;

    let consumers: HashMap<String, HashMap<String, ProviderRecord>> =
        actions.iter().map(|a| (a.component.clone(), a.service_bindings.clone())).collect();
    let names: Vec<String> = actions.iter().map(|a| a.component.clone()).collect();
    let order = order_components(&names, &consumers)?;

    let by_name: HashMap<&str, &ActionEntry> = actions.iter().map(|a| (a.component.as_str(), a)).collect();
    let mut errors = CompositeError::default();

    for name in &order {
        let action = by_name[name.as_str()];
        match action.action {
            ComponentAction::None => {
                if !status.workloads.iter().any(|w| &w.component_name == name) {
                    errors.push(format!("component '{name}': expected a persisted workload entry but found none"));
                }
            }
            ComponentAction::Create | ComponentAction::Update => {
                execute_put(handlers, renderers, application, name, action, status, &mut errors).await;
            }
            ComponentAction::Delete => {
                execute_delete(handlers, application, name, status, &mut errors).await;
            }
        }
    }

    let mut seen = HashSet::new();
    for w in &status.workloads {
        if !seen.insert(w.component_name.clone()) {
            errors.push(format!("duplicate workload entry for component '{}'", w.component_name));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(OrchestratorError::Composite(errors))
    }
}

async fn execute_put(
    handlers: &HandlerRegistry,
    renderers: &RendererRegistry,
    application: &str,
    name: &str,
    action: &ActionEntry,
    status: &mut DeploymentStatus,
    errors: &mut CompositeError,
) {
    let Some(canonical) = &action.rendered else {
        errors.push(format!("component '{name}': action has no rendered definition"));
        return;
    };

    let renderer = match renderers.get(&canonical.kind) {
        Ok(r) => r,
        Err(e) => {
            errors.push(format!("component '{name}': {e}"));
            return;
        }
    };

    let render_ctx = RenderContext {
        application,
        component: name,
        canonical,
        service_bindings: &action.service_bindings,
        binding_values: &status.services,
    };
    let resources = match renderer.render(&render_ctx).await {
        Ok(r) => r,
        Err(e) => {
            errors.push(format!("component '{name}': render failed: {e}"));
            return;
        }
    };

    let prior: HashMap<String, DeploymentResource> = status
        .workloads
        .iter()
        .find(|w| w.component_name == name)
        .map(|w| w.resources.iter().map(|r| (r.local_id.clone(), r.clone())).collect())
        .unwrap_or_default();

    let mut put_resources = Vec::with_capacity(resources.len());
    for resource in &resources {
        let handler = match handlers.get(&resource.r#type) {
            Ok(h) => h,
            Err(e) => {
                errors.push(format!("component '{name}': {e}"));
                return;
            }
        };
        let existing = prior.get(&resource.local_id);
        let put_ctx = PutContext { application, component: name, resource, existing };
        match handler.put(&put_ctx).await {
            Ok(properties) => put_resources.push(DeploymentResource {
                local_id: resource.local_id.clone(),
                r#type: resource.r#type.clone(),
                properties,
            }),
            Err(e) => {
                errors.push(format!("component '{name}' resource '{}': {e}", resource.local_id));
                return;
            }
        }
    }

    status.workloads.retain(|w| w.component_name != name);
    status.workloads.push(DeploymentWorkload { component_name: name.to_string(), kind: canonical.kind.clone(), resources: put_resources.clone() });

    let alloc_ctx = AllocateBindingsContext { application, component: name, canonical, resources: &put_resources };
    let bindings = match renderer.allocate_bindings(&alloc_ctx).await {
        Ok(b) => b,
        Err(e) => {
            errors.push(format!("component '{name}': binding allocation failed: {e}"));
            return;
        }
    };

    for (binding_name, state) in bindings {
        status.services.insert(binding_name, state);
    }

    for provide_name in action.provides.keys() {
        if !status.services.contains_key(provide_name) {
            errors.push(format!("component '{name}': declared provide '{provide_name}' was not allocated"));
        }
    }
}

async fn execute_delete(handlers: &HandlerRegistry, application: &str, name: &str, status: &mut DeploymentStatus, errors: &mut CompositeError) {
    let Some(workload) = status.workloads.iter().find(|w| w.component_name == name).cloned() else {
        return; // already gone: delete is idempotent
    };

    for resource in &workload.resources {
        let handler = match handlers.get(&resource.r#type) {
            Ok(h) => h,
            Err(e) => {
                errors.push(format!("component '{name}': {e}"));
                continue;
            }
        };
        let delete_ctx = DeleteContext { application, component: name, existing: resource };
        if let Err(e) = handler.delete(&delete_ctx).await {
            errors.push(format!("component '{name}' resource '{}': {e}", resource.local_id));
        }
    }

    status.workloads.retain(|w| w.component_name != name);
    status.services.retain(|_, b| b.provider != name);
}

/// Tear down every resource belonging to a deployment, in reverse
/// provisioning order, and clear its published bindings (§4.8).
pub async fn delete_deployment(handlers: &HandlerRegistry, application: &str, status: &mut DeploymentStatus) -> Result<(), OrchestratorError> {
    let mut errors = CompositeError::default();
    let workloads: Vec<DeploymentWorkload> = status.workloads.drain(..).rev().collect();

    for workload in &workloads {
        for resource in &workload.resources {
            let handler = match handlers.get(&resource.r#type) {
                Ok(h) => h,
                Err(e) => {
                    errors.push(format!("component '{}': {e}", workload.component_name));
                    continue;
                }
            };
            let delete_ctx = DeleteContext { application, component: &workload.component_name, existing: resource };
            if let Err(e) = handler.delete(&delete_ctx).await {
                errors.push(format!("component '{}' resource '{}': {e}", workload.component_name, resource.local_id));
            }
        }
    }

    status.services.clear();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(OrchestratorError::Composite(errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rcp_diff::CanonicalComponent;
    use rcp_domain::Provide;
    use rcp_handler::{InMemoryHandler, InMemoryRenderer};
    use std::sync::Arc;

    fn handlers() -> HandlerRegistry {
        let mut registry = HandlerRegistry::new();
        registry.register(Arc::new(InMemoryHandler::new("Container")));
        registry
    }

    fn renderers() -> RendererRegistry {
        let mut registry = RendererRegistry::new();
        registry.register(Arc::new(InMemoryRenderer::new("Container", "Container")));
        registry
    }

    fn create_action(name: &str) -> ActionEntry {
        ActionEntry {
            component: name.to_string(),
            action: ComponentAction::Create,
            revision: Some("rev1".into()),
            service_bindings: HashMap::new(),
            provides: HashMap::from([("http".to_string(), ProviderRecord { name: "http".into(), kind: "http".into(), provider_component: name.into() })]),
            rendered: Some(CanonicalComponent {
                kind: "Container".into(),
                config: None,
                run: Some(serde_json::json!({"image": "nginx"})),
                depends_on: vec![],
                provides: vec![Provide { name: "http".into(), kind: "http".into(), extra: Default::default() }],
                traits: vec![],
            }),
        }
    }

    #[tokio::test]
    async fn create_action_provisions_and_publishes_binding() {
        let h = handlers();
        let r = renderers();
        let ns = NoopNamespaceProvisioner;
        let mut status = DeploymentStatus::default();
        let actions = vec![create_action("web")];

        update_deployment(&h, &r, &ns, "app", &mut status, &actions).await.unwrap();

        assert_eq!(status.workloads.len(), 1);
        assert!(status.services.contains_key("http"));
    }

    #[tokio::test]
    async fn delete_action_removes_workload_and_bindings() {
        let h = handlers();
        let r = renderers();
        let ns = NoopNamespaceProvisioner;
        let mut status = DeploymentStatus::default();
        update_deployment(&h, &r, &ns, "app", &mut status, &[create_action("web")]).await.unwrap();

        let delete = ActionEntry {
            component: "web".to_string(),
            action: ComponentAction::Delete,
            revision: None,
            service_bindings: HashMap::new(),
            provides: HashMap::new(),
            rendered: None,
        };
        update_deployment(&h, &r, &ns, "app", &mut status, &[delete]).await.unwrap();

        assert!(status.workloads.is_empty());
        assert!(status.services.is_empty());
    }

    #[tokio::test]
    async fn none_action_without_persisted_workload_is_non_fatal() {
        let h = handlers();
        let r = renderers();
        let ns = NoopNamespaceProvisioner;
        let mut status = DeploymentStatus::default();
        let none_action = ActionEntry {
            component: "web".to_string(),
            action: ComponentAction::None,
            revision: Some("rev1".into()),
            service_bindings: HashMap::new(),
            provides: HashMap::new(),
            rendered: None,
        };
        let err = update_deployment(&h, &r, &ns, "app", &mut status, &[none_action]).await.unwrap_err();
        assert!(matches!(err, OrchestratorError::Composite(_)));
    }

    #[tokio::test]
    async fn namespace_failure_aborts_before_any_resource_runs() {
        struct AlwaysFails;
        #[async_trait]
        impl NamespaceProvisioner for AlwaysFails {
            async fn ensure_namespace(&self, _application: &str) -> Result<(), String> {
                Err("quota exceeded".into())
            }
        }

        let h = handlers();
        let r = renderers();
        let ns = AlwaysFails;
        let mut status = DeploymentStatus::default();
        let err = update_deployment(&h, &r, &ns, "app", &mut status, &[create_action("web")]).await.unwrap_err();
        assert!(matches!(err, OrchestratorError::Fatal(_)));
        assert!(status.workloads.is_empty());
    }

    #[tokio::test]
    async fn delete_deployment_tears_down_all_resources() {
        let h = handlers();
        let r = renderers();
        let ns = NoopNamespaceProvisioner;
        let mut status = DeploymentStatus::default();
        update_deployment(&h, &r, &ns, "app", &mut status, &[create_action("web")]).await.unwrap();

        delete_deployment(&h, "app", &mut status).await.unwrap();
        assert!(status.workloads.is_empty());
        assert!(status.services.is_empty());
    }
}
