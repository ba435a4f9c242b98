use async_trait::async_trait;
use rcp_domain::{ComponentRevision, Deployment, Operation, Scope};

use crate::error::StoreError;
use crate::state::AuditEvent;

/// Persistence contract for the control plane's aggregates (§4.3).
///
/// Applications are the aggregate root: component history, deployments, and
/// scopes are addressed through an application name plus a child name.
/// Implementations must surface `NotFound`/`Conflict`/`Concurrency` per the
/// semantics documented on each method; callers map these onto HTTP status
/// codes and async-operation error codes.
#[async_trait]
pub trait StateStore: Send + Sync + 'static {
    // ── Applications ──────────────────────────────────────────────────────

    async fn get_application(&self, name: &str) -> Result<Option<rcp_domain::Application>, StoreError>;
    async fn list_applications(&self) -> Result<Vec<rcp_domain::Application>, StoreError>;

    /// Create a new application. Fails with `Conflict` if one already exists.
    async fn create_application(&self, app: &rcp_domain::Application) -> Result<(), StoreError>;

    /// Delete an application. Fails with `NotFound` if it doesn't exist, or
    /// `Conflict` if it still has deployments (the caller is expected to have
    /// checked this already via [`rcp_domain::Application::can_delete`], but
    /// the store re-checks to close the race between check and delete).
    async fn delete_application(&self, name: &str) -> Result<(), StoreError>;

    // ── Component revisions ───────────────────────────────────────────────

    /// Append a new revision to a component's history, creating the
    /// component and its history if this is the first revision.
    ///
    /// If `expected_revision` is `Some`, the append fails with
    /// `Concurrency` unless it matches the component's current revision
    /// immediately before the append — an optimistic-concurrency guard
    /// against two concurrent submissions racing on the same component.
    async fn append_component_revision(
        &self,
        application: &str,
        component: &str,
        kind: String,
        revision: ComponentRevision,
        expected_revision: Option<&str>,
    ) -> Result<(), StoreError>;

    async fn delete_component(&self, application: &str, component: &str) -> Result<(), StoreError>;

    // ── Deployments ───────────────────────────────────────────────────────

    async fn get_deployment(
        &self,
        application: &str,
        deployment: &str,
    ) -> Result<Option<Deployment>, StoreError>;

    async fn upsert_deployment(&self, application: &str, deployment: &Deployment) -> Result<(), StoreError>;

    async fn delete_deployment(&self, application: &str, deployment: &str) -> Result<(), StoreError>;

    // ── Scopes ────────────────────────────────────────────────────────────

    async fn get_scope(&self, application: &str, scope: &str) -> Result<Option<Scope>, StoreError>;

    async fn upsert_scope(&self, application: &str, scope: &Scope) -> Result<(), StoreError>;

    async fn delete_scope(&self, application: &str, scope: &str) -> Result<(), StoreError>;

    // ── Operations ────────────────────────────────────────────────────────

    async fn get_operation(&self, id: &str) -> Result<Option<Operation>, StoreError>;

    async fn upsert_operation(&self, op: &Operation) -> Result<(), StoreError>;

    async fn list_operations(&self, application: &str, deployment: &str) -> Result<Vec<Operation>, StoreError>;

    // ── Audit trail ───────────────────────────────────────────────────────

    async fn append_event(&self, event: &AuditEvent) -> Result<(), StoreError>;

    async fn list_events(&self, application: Option<&str>, limit: u32) -> Result<Vec<AuditEvent>, StoreError>;
}
