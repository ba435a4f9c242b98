use std::collections::BTreeMap;

use async_trait::async_trait;
use rcp_diff::CanonicalComponent;
use rcp_domain::{BindingState, DeploymentResource};
use rcp_graph::ProviderRecord;

use crate::error::HandlerError;

/// Arguments to [`ResourceHandler::put`] (§4.7).
pub struct PutContext<'a> {
    pub application: &'a str,
    pub component: &'a str,
    /// Desired resource, as rendered by a [`Renderer`].
    pub resource: &'a DeploymentResource,
    /// The same `localId`'s resource from the prior deployment, if any.
    /// Keys the caller didn't set on `resource.properties` should be carried
    /// over from here rather than dropped.
    pub existing: Option<&'a DeploymentResource>,
}

/// Arguments to [`ResourceHandler::delete`] (§4.7).
pub struct DeleteContext<'a> {
    pub application: &'a str,
    pub component: &'a str,
    pub existing: &'a DeploymentResource,
}

/// Drives one resource type's lifecycle. Implementations must be idempotent:
/// calling `put` twice with the same inputs produces the same result, and
/// `delete` on a resource that no longer exists upstream succeeds.
#[async_trait]
pub trait ResourceHandler: Send + Sync + 'static {
    fn resource_type(&self) -> &'static str;

    async fn put(&self, ctx: &PutContext<'_>) -> Result<BTreeMap<String, String>, HandlerError>;

    async fn delete(&self, ctx: &DeleteContext<'_>) -> Result<(), HandlerError>;
}

/// Arguments to [`Renderer::render`] (§4.7). `service_bindings` is the
/// component's resolved consumer map from the Binding Resolver; `binding_values`
/// carries the concrete values already allocated for those bindings by
/// producers executed earlier in topological order.
pub struct RenderContext<'a> {
    pub application: &'a str,
    pub component: &'a str,
    pub canonical: &'a CanonicalComponent,
    pub service_bindings: &'a std::collections::HashMap<String, ProviderRecord>,
    pub binding_values: &'a BTreeMap<String, BindingState>,
}

/// Arguments to [`Renderer::allocate_bindings`] (§4.8 step 2). `resources` is
/// the Put-returned resource set for this component, not the pre-Put desired
/// one, so bindings can carry values a handler only knows after acting (a
/// cloud-assigned host or port).
pub struct AllocateBindingsContext<'a> {
    pub application: &'a str,
    pub component: &'a str,
    pub canonical: &'a CanonicalComponent,
    pub resources: &'a [DeploymentResource],
}

/// Turns a component's canonical definition into concrete resources, then
/// (after the orchestrator has Put those resources) allocates the bindings
/// it provides from the resulting resource set (§4.7, §4.8).
#[async_trait]
pub trait Renderer: Send + Sync + 'static {
    fn component_kind(&self) -> &'static str;

    async fn render(&self, ctx: &RenderContext<'_>) -> Result<Vec<DeploymentResource>, HandlerError>;

    async fn allocate_bindings(&self, ctx: &AllocateBindingsContext<'_>) -> Result<BTreeMap<String, BindingState>, HandlerError>;
}
