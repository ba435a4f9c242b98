use std::collections::BTreeMap;

use async_trait::async_trait;
use rcp_domain::{BindingState, DeploymentResource};
use serde_json::Map;
use tracing::debug;

use crate::error::HandlerError;
use crate::handler::{AllocateBindingsContext, DeleteContext, PutContext, RenderContext, Renderer, ResourceHandler};

/// A handler that performs no I/O; useful for tests and the local-only
/// deployment mode. Put merges the desired properties over whatever the
/// prior resource carried, so unspecified keys survive across updates.
pub struct InMemoryHandler {
    resource_type: &'static str,
}

impl InMemoryHandler {
    pub fn new(resource_type: &'static str) -> Self {
        Self { resource_type }
    }
}

#[async_trait]
impl ResourceHandler for InMemoryHandler {
    fn resource_type(&self) -> &'static str {
        self.resource_type
    }

    async fn put(&self, ctx: &PutContext<'_>) -> Result<BTreeMap<String, String>, HandlerError> {
        debug!(component = %ctx.component, local_id = %ctx.resource.local_id, "InMemoryHandler: put");
        let mut properties = ctx.existing.map(|r| r.properties.clone()).unwrap_or_default();
        properties.extend(ctx.resource.properties.clone());
        Ok(properties)
    }

    async fn delete(&self, ctx: &DeleteContext<'_>) -> Result<(), HandlerError> {
        debug!(component = %ctx.component, local_id = %ctx.existing.local_id, "InMemoryHandler: delete");
        Ok(())
    }
}

/// Renders a component to a single resource of `resource_type`, stubbing any
/// binding it provides with a synthetic `local://` address.
pub struct InMemoryRenderer {
    component_kind: &'static str,
    resource_type: &'static str,
}

impl InMemoryRenderer {
    pub fn new(component_kind: &'static str, resource_type: &'static str) -> Self {
        Self { component_kind, resource_type }
    }
}

#[async_trait]
impl Renderer for InMemoryRenderer {
    fn component_kind(&self) -> &'static str {
        self.component_kind
    }

    async fn render(&self, ctx: &RenderContext<'_>) -> Result<Vec<DeploymentResource>, HandlerError> {
        debug!(component = %ctx.component, "InMemoryRenderer: render");

        let mut properties = BTreeMap::new();
        properties.insert("kind".to_string(), ctx.canonical.kind.clone());
        if let Some(run) = &ctx.canonical.run {
            properties.insert("run".to_string(), run.to_string());
        }

        let resource = DeploymentResource {
            local_id: ctx.component.to_string(),
            r#type: self.resource_type.to_string(),
            properties,
        };

        Ok(vec![resource])
    }

    async fn allocate_bindings(&self, ctx: &AllocateBindingsContext<'_>) -> Result<BTreeMap<String, BindingState>, HandlerError> {
        debug!(component = %ctx.component, "InMemoryRenderer: allocate_bindings");

        let mut bindings = BTreeMap::new();
        for provide in &ctx.canonical.provides {
            let address = ctx
                .resources
                .iter()
                .find(|r| r.local_id == ctx.component)
                .and_then(|r| r.properties.get("address").cloned())
                .unwrap_or_else(|| format!("local://{}/{}", ctx.component, provide.name));
            let mut props = Map::new();
            props.insert("address".to_string(), serde_json::Value::String(address));
            bindings.insert(
                provide.name.clone(),
                BindingState {
                    name: provide.name.clone(),
                    kind: provide.kind.clone(),
                    provider: ctx.component.to_string(),
                    properties: props,
                },
            );
        }

        Ok(bindings)
    }
}
