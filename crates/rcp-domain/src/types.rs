use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::DomainError;
use crate::revision::compute_revision;

// ── Bindings ──────────────────────────────────────────────────────────────────

/// A binding this component produces, declared on the component definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Provide {
    pub name: String,
    pub kind: String,
    /// Unknown/kind-specific keys (e.g. `containerPort`) preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A binding this component consumes, declared on the component definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependsOn {
    pub name: String,
    pub kind: String,
    #[serde(default)]
    pub set_env: BTreeMap<String, String>,
    #[serde(default)]
    pub set_secret: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trait {
    pub kind: String,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

// ── Component revision history ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentProperties {
    #[serde(default)]
    pub build: Option<Value>,
    #[serde(default)]
    pub config: Option<Value>,
    #[serde(default)]
    pub run: Option<Value>,
    #[serde(default)]
    pub provides: Vec<Provide>,
    #[serde(default)]
    pub depends_on: Vec<DependsOn>,
    #[serde(default)]
    pub traits: Vec<Trait>,
}

impl ComponentProperties {
    /// The value hashed by the Revision Codec: everything but the revision itself.
    pub fn as_hash_input(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentRevision {
    pub kind: String,
    pub revision: String,
    pub properties: ComponentProperties,
}

impl ComponentRevision {
    /// Build a new revision from `(kind, properties)`, computing its content hash.
    pub fn new(kind: String, properties: ComponentProperties) -> Result<Self, DomainError> {
        let revision = compute_revision(&kind, &properties.as_hash_input())?;
        Ok(ComponentRevision { kind, revision, properties })
    }
}

/// Base identity plus append-only revision history for one component.
///
/// Invariant: `current_revision` always equals the revision of the last
/// entry of `revision_history`; entries already in `revision_history` are
/// never mutated (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentHistory {
    pub name: String,
    pub current_revision: String,
    pub revision_history: Vec<ComponentRevision>,
}

impl ComponentHistory {
    pub fn new(name: String, first: ComponentRevision) -> Self {
        let current_revision = first.revision.clone();
        ComponentHistory { name, current_revision, revision_history: vec![first] }
    }

    pub fn current(&self) -> Option<&ComponentRevision> {
        self.revision_history.iter().find(|r| r.revision == self.current_revision)
    }

    pub fn find(&self, revision: &str) -> Option<&ComponentRevision> {
        self.revision_history.iter().find(|r| r.revision == revision)
    }

    /// Append `rev` and advance `current_revision`, unless its hash already
    /// matches the current revision (component bodies are immutable once
    /// stored; re-submitting an identical definition is a no-op append).
    pub fn append_if_new(&mut self, rev: ComponentRevision) {
        if rev.revision == self.current_revision {
            return;
        }
        self.current_revision = rev.revision.clone();
        self.revision_history.push(rev);
    }
}

// ── Deployment ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProvisioningState {
    Deploying,
    Deleting,
    Succeeded,
    Failed,
}

impl ProvisioningState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProvisioningState::Succeeded | ProvisioningState::Failed)
    }
}

impl std::fmt::Display for ProvisioningState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ProvisioningState::Deploying => "Deploying",
            ProvisioningState::Deleting => "Deleting",
            ProvisioningState::Succeeded => "Succeeded",
            ProvisioningState::Failed => "Failed",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentComponent {
    pub component_name: String,
    #[serde(default)]
    pub resource_id: Option<String>,
    #[serde(default)]
    pub revision: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentProperties {
    #[serde(default)]
    pub components: Vec<DeploymentComponent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BindingState {
    pub name: String,
    pub kind: String,
    pub provider: String,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentResource {
    pub local_id: String,
    pub r#type: String,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentWorkload {
    pub component_name: String,
    pub kind: String,
    #[serde(default)]
    pub resources: Vec<DeploymentResource>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentStatus {
    #[serde(default)]
    pub services: BTreeMap<String, BindingState>,
    #[serde(default)]
    pub workloads: Vec<DeploymentWorkload>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
    pub name: String,
    pub provisioning_state: ProvisioningState,
    #[serde(default)]
    pub status: DeploymentStatus,
    #[serde(default)]
    pub properties: DeploymentProperties,
}

// ── Operation ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationStatus {
    Deploying,
    Deleting,
    Succeeded,
    Failed,
}

impl OperationStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OperationStatus::Succeeded | OperationStatus::Failed)
    }
}

impl std::fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OperationStatus::Deploying => "Deploying",
            OperationStatus::Deleting => "Deleting",
            OperationStatus::Succeeded => "Succeeded",
            OperationStatus::Failed => "Failed",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum OperationErrorCode {
    Invalid,
    Internal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationError {
    pub code: OperationErrorCode,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub id: String,
    pub name: String,
    pub status: OperationStatus,
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    pub percent_complete: f32,
    #[serde(default)]
    pub error: Option<OperationError>,
}

impl Operation {
    pub fn new_in_progress(id: String, name: String, status: OperationStatus, now: DateTime<Utc>) -> Self {
        Operation {
            id,
            name,
            status,
            start_time: now,
            end_time: None,
            percent_complete: 0.0,
            error: None,
        }
    }

    pub fn complete(&mut self, status: OperationStatus, now: DateTime<Utc>, error: Option<OperationError>) {
        self.status = status;
        self.end_time = Some(now);
        self.percent_complete = 100.0;
        self.error = error;
    }
}

// ── Scope ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scope {
    pub name: String,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

// ── Application ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub name: String,
    #[serde(default)]
    pub properties: Map<String, Value>,
    #[serde(default)]
    pub components: BTreeMap<String, ComponentHistory>,
    #[serde(default)]
    pub deployments: BTreeMap<String, Deployment>,
    #[serde(default)]
    pub scopes: BTreeMap<String, Scope>,
}

impl Application {
    pub fn new(name: impl Into<String>) -> Self {
        Application {
            name: name.into(),
            properties: Map::new(),
            components: BTreeMap::new(),
            deployments: BTreeMap::new(),
            scopes: BTreeMap::new(),
        }
    }

    /// §3 invariant: deletion fails if any deployment exists.
    pub fn can_delete(&self) -> bool {
        self.deployments.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn component_history_append_if_new_is_idempotent_on_same_revision() {
        let props = ComponentProperties {
            build: None,
            config: None,
            run: Some(serde_json::json!({"image": "nginx"})),
            provides: vec![],
            depends_on: vec![],
            traits: vec![],
        };
        let rev = ComponentRevision::new("Container".into(), props).unwrap();
        let mut history = ComponentHistory::new("frontend".into(), rev.clone());
        let before = history.current_revision.clone();
        history.append_if_new(rev);
        assert_eq!(history.current_revision, before);
        assert_eq!(history.revision_history.len(), 1, "no history append on identical body");
    }

    #[test]
    fn component_history_appends_on_changed_revision() {
        let props_a = ComponentProperties {
            build: None, config: None,
            run: Some(serde_json::json!({"image": "nginx:1"})),
            provides: vec![], depends_on: vec![], traits: vec![],
        };
        let props_b = ComponentProperties {
            build: None, config: None,
            run: Some(serde_json::json!({"image": "nginx:2"})),
            provides: vec![], depends_on: vec![], traits: vec![],
        };
        let rev_a = ComponentRevision::new("Container".into(), props_a).unwrap();
        let rev_b = ComponentRevision::new("Container".into(), props_b).unwrap();
        let mut history = ComponentHistory::new("frontend".into(), rev_a.clone());
        history.append_if_new(rev_b.clone());
        assert_eq!(history.current_revision, rev_b.revision);
        assert_eq!(history.revision_history.len(), 2);
        assert_eq!(history.find(&rev_a.revision).unwrap().revision, rev_a.revision);
    }

    #[test]
    fn application_cannot_delete_with_deployments() {
        let mut app = Application::new("my-app");
        assert!(app.can_delete());
        app.deployments.insert(
            "default".into(),
            Deployment {
                name: "default".into(),
                provisioning_state: ProvisioningState::Succeeded,
                status: DeploymentStatus::default(),
                properties: DeploymentProperties::default(),
            },
        );
        assert!(!app.can_delete());
    }
}
