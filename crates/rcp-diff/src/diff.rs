use std::collections::{BTreeSet, HashMap};

use rcp_domain::{Application, ComponentProperties, DependsOn, Deployment, DeploymentProperties, Provide, ProvisioningState, Trait};
use rcp_graph::{resolve_bindings, BindingMetadataRegistry, ProviderRecord};
use serde_json::Value;

use crate::error::DiffError;

/// What to do with one component between `older` and `newer` (§4.5 step 5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentAction {
    Create,
    Update,
    Delete,
    None,
}

/// A component's definition flattened to the shape a [`rcp_handler::Renderer`]
/// consumes, independent of its revision history (§4.5, "canonical
/// component").
#[derive(Debug, Clone)]
pub struct CanonicalComponent {
    pub kind: String,
    pub config: Option<Value>,
    pub run: Option<Value>,
    pub depends_on: Vec<DependsOn>,
    pub provides: Vec<Provide>,
    pub traits: Vec<Trait>,
}

impl CanonicalComponent {
    fn from_properties(kind: String, props: &ComponentProperties) -> Self {
        CanonicalComponent {
            kind,
            config: props.config.clone(),
            run: props.run.clone(),
            depends_on: props.depends_on.clone(),
            provides: props.provides.clone(),
            traits: props.traits.clone(),
        }
    }
}

/// One component's planned action plus everything the orchestrator needs to
/// execute it, attached at diff time so execution never re-derives bindings.
#[derive(Debug, Clone)]
pub struct ActionEntry {
    pub component: String,
    pub action: ComponentAction,
    pub revision: Option<String>,
    pub service_bindings: HashMap<String, ProviderRecord>,
    pub provides: HashMap<String, ProviderRecord>,
    pub rendered: Option<CanonicalComponent>,
}

#[derive(Debug, Clone)]
pub struct DiffResult {
    pub actions: Vec<ActionEntry>,
    pub force_upgrade: bool,
    pub is_no_op: bool,
}

struct ResolvedComponent {
    name: String,
    kind: String,
    revision: String,
    properties: ComponentProperties,
}

fn resolve_newer(application: &Application, newer: &DeploymentProperties) -> Result<Vec<ResolvedComponent>, DiffError> {
    let mut resolved = Vec::with_capacity(newer.components.len());
    for entry in &newer.components {
        let history = application
            .components
            .get(&entry.component_name)
            .ok_or_else(|| DiffError::ComponentNotFound(entry.component_name.clone()))?;

        let revision = match &entry.revision {
            Some(r) if !r.is_empty() => history
                .find(r)
                .ok_or_else(|| DiffError::RevisionNotFound {
                    component: entry.component_name.clone(),
                    revision: r.clone(),
                })?,
            _ => history
                .current()
                .ok_or_else(|| DiffError::ComponentNotFound(entry.component_name.clone()))?,
        };

        resolved.push(ResolvedComponent {
            name: entry.component_name.clone(),
            kind: revision.kind.clone(),
            revision: revision.revision.clone(),
            properties: revision.properties.clone(),
        });
    }
    Ok(resolved)
}

/// Compute the action set that takes a deployment from `older` to `newer`
/// (§4.5). `registry` supplies the intrinsic binding metadata used by the
/// Binding Resolver.
pub fn diff(
    application: &Application,
    older: Option<&Deployment>,
    newer: &DeploymentProperties,
    registry: &BindingMetadataRegistry,
) -> Result<DiffResult, DiffError> {
    let resolved_newer = resolve_newer(application, newer)?;

    let binding_input: Vec<(String, String, ComponentProperties)> = resolved_newer
        .iter()
        .map(|c| (c.name.clone(), c.kind.clone(), c.properties.clone()))
        .collect();
    let resolved_bindings = resolve_bindings(&binding_input, registry)?;

    let force_upgrade = older
        .map(|d| d.provisioning_state != ProvisioningState::Succeeded)
        .unwrap_or(false);

    let older_revisions: HashMap<&str, Option<&str>> = older
        .map(|d| {
            d.properties
                .components
                .iter()
                .map(|c| (c.component_name.as_str(), c.revision.as_deref()))
                .collect()
        })
        .unwrap_or_default();

    let newer_by_name: HashMap<&str, &ResolvedComponent> = resolved_newer.iter().map(|c| (c.name.as_str(), c)).collect();

    let all_names: BTreeSet<&str> = older_revisions.keys().copied().chain(newer_by_name.keys().copied()).collect();

    let mut actions = Vec::with_capacity(all_names.len());
    for name in all_names {
        let in_older = older_revisions.contains_key(name);
        let in_newer = newer_by_name.get(name);

        let action = match (in_older, in_newer) {
            (true, None) => ComponentAction::Delete,
            (false, Some(_)) => ComponentAction::Create,
            (true, Some(newer_component)) => {
                let unchanged = older_revisions[name] == Some(newer_component.revision.as_str());
                if unchanged && !force_upgrade {
                    ComponentAction::None
                } else {
                    ComponentAction::Update
                }
            }
            (false, None) => unreachable!("name drawn from the union of both sides"),
        };

        let (revision, service_bindings, provides, rendered) = match (action, in_newer) {
            (ComponentAction::Delete, _) => (None, HashMap::new(), HashMap::new(), None),
            (_, Some(c)) => (
                Some(c.revision.clone()),
                resolved_bindings.consumers.get(name).cloned().unwrap_or_default(),
                resolved_bindings.provides_for(name),
                Some(CanonicalComponent::from_properties(c.kind.clone(), &c.properties)),
            ),
            (_, None) => unreachable!("non-delete action always has a newer side"),
        };

        actions.push(ActionEntry {
            component: name.to_string(),
            action,
            revision,
            service_bindings,
            provides,
            rendered,
        });
    }

    let is_no_op = actions.iter().all(|a| a.action == ComponentAction::None);

    Ok(DiffResult { actions, force_upgrade, is_no_op })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rcp_domain::{ComponentHistory, ComponentRevision, DeploymentComponent, DeploymentStatus};

    fn app_with(components: Vec<(&str, ComponentProperties)>) -> Application {
        let mut app = Application::new("app");
        for (name, props) in components {
            let rev = ComponentRevision::new("Container".into(), props).unwrap();
            app.components.insert(name.to_string(), ComponentHistory::new(name.to_string(), rev));
        }
        app
    }

    fn props(run: Value) -> ComponentProperties {
        ComponentProperties { build: None, config: None, run: Some(run), provides: vec![], depends_on: vec![], traits: vec![] }
    }

    fn desired(names: &[&str]) -> DeploymentProperties {
        DeploymentProperties {
            components: names
                .iter()
                .map(|n| DeploymentComponent { component_name: n.to_string(), resource_id: None, revision: None })
                .collect(),
        }
    }

    #[test]
    fn new_component_is_a_create() {
        let app = app_with(vec![("web", props(serde_json::json!({"image": "nginx"})))]);
        let registry = BindingMetadataRegistry::new();
        let result = diff(&app, None, &desired(&["web"]), &registry).unwrap();
        assert_eq!(result.actions.len(), 1);
        assert_eq!(result.actions[0].action, ComponentAction::Create);
        assert!(!result.is_no_op);
    }

    #[test]
    fn unchanged_component_is_a_noop_when_deployment_succeeded() {
        let app = app_with(vec![("web", props(serde_json::json!({"image": "nginx"})))]);
        let registry = BindingMetadataRegistry::new();
        let first = diff(&app, None, &desired(&["web"]), &registry).unwrap();
        let revision = first.actions[0].revision.clone();

        let older = Deployment {
            name: "default".into(),
            provisioning_state: ProvisioningState::Succeeded,
            status: DeploymentStatus::default(),
            properties: DeploymentProperties {
                components: vec![DeploymentComponent { component_name: "web".into(), resource_id: None, revision }],
            },
        };

        let second = diff(&app, Some(&older), &desired(&["web"]), &registry).unwrap();
        assert_eq!(second.actions[0].action, ComponentAction::None);
        assert!(second.is_no_op);
    }

    #[test]
    fn force_upgrade_turns_noop_into_update() {
        let app = app_with(vec![("web", props(serde_json::json!({"image": "nginx"})))]);
        let registry = BindingMetadataRegistry::new();
        let first = diff(&app, None, &desired(&["web"]), &registry).unwrap();
        let revision = first.actions[0].revision.clone();

        let older = Deployment {
            name: "default".into(),
            provisioning_state: ProvisioningState::Failed,
            status: DeploymentStatus::default(),
            properties: DeploymentProperties {
                components: vec![DeploymentComponent { component_name: "web".into(), resource_id: None, revision }],
            },
        };

        let second = diff(&app, Some(&older), &desired(&["web"]), &registry).unwrap();
        assert_eq!(second.actions[0].action, ComponentAction::Update);
        assert!(second.force_upgrade);
    }

    #[test]
    fn dropped_component_is_a_delete() {
        let app = app_with(vec![("web", props(serde_json::json!({"image": "nginx"})))]);
        let registry = BindingMetadataRegistry::new();
        let older = Deployment {
            name: "default".into(),
            provisioning_state: ProvisioningState::Succeeded,
            status: DeploymentStatus::default(),
            properties: DeploymentProperties {
                components: vec![DeploymentComponent { component_name: "web".into(), resource_id: None, revision: Some("x".into()) }],
            },
        };
        let result = diff(&app, Some(&older), &desired(&[]), &registry).unwrap();
        assert_eq!(result.actions.len(), 1);
        assert_eq!(result.actions[0].action, ComponentAction::Delete);
        assert!(result.actions[0].revision.is_none());
    }

    #[test]
    fn unknown_component_is_bad_input() {
        let app = Application::new("app");
        let registry = BindingMetadataRegistry::new();
        let err = diff(&app, None, &desired(&["missing"]), &registry).unwrap_err();
        assert!(matches!(err, DiffError::ComponentNotFound(_)));
    }

    #[test]
    fn pinned_revision_must_exist_in_history() {
        let app = app_with(vec![("web", props(serde_json::json!({"image": "nginx"})))]);
        let registry = BindingMetadataRegistry::new();
        let desired = DeploymentProperties {
            components: vec![DeploymentComponent { component_name: "web".into(), resource_id: None, revision: Some("nope".into()) }],
        };
        let err = diff(&app, None, &desired, &registry).unwrap_err();
        assert!(matches!(err, DiffError::RevisionNotFound { .. }));
    }
}
