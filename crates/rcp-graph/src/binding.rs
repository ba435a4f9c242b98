use std::collections::HashMap;

use rcp_domain::ComponentProperties;

use crate::error::GraphError;

/// Declares which component kinds and trait kinds implicitly produce a
/// binding, and what kind that binding carries. Pluggable so resource-kind
/// packages can register their own intrinsic bindings without this crate
/// knowing about concrete kinds (§4.4 rules 1-2, §6 metadata registry).
#[derive(Debug, Clone, Default)]
pub struct BindingMetadataRegistry {
    /// component kind -> intrinsic workload binding kind
    workload_bindings: HashMap<String, String>,
    /// trait kind -> intrinsic trait binding kind
    trait_bindings: HashMap<String, String>,
}

impl BindingMetadataRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_workload_binding(&mut self, component_kind: impl Into<String>, binding_kind: impl Into<String>) {
        self.workload_bindings.insert(component_kind.into(), binding_kind.into());
    }

    pub fn register_trait_binding(&mut self, trait_kind: impl Into<String>, binding_kind: impl Into<String>) {
        self.trait_bindings.insert(trait_kind.into(), binding_kind.into());
    }

    fn intrinsic_workload_kind(&self, component_kind: &str) -> Option<&str> {
        self.workload_bindings.get(component_kind).map(String::as_str)
    }

    fn intrinsic_trait_kind(&self, trait_kind: &str) -> Option<&str> {
        self.trait_bindings.get(trait_kind).map(String::as_str)
    }
}

/// One entry in the `providers` map (§4.4).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderRecord {
    pub name: String,
    pub kind: String,
    pub provider_component: String,
}

/// Output of the Binding Resolver.
#[derive(Debug, Clone, Default)]
pub struct ResolvedBindings {
    /// binding name -> provider record
    pub providers: HashMap<String, ProviderRecord>,
    /// component name -> (binding name -> provider record)
    pub consumers: HashMap<String, HashMap<String, ProviderRecord>>,
}

impl ResolvedBindings {
    /// The subset of `providers` whose `provider_component` is `component`.
    pub fn provides_for(&self, component: &str) -> HashMap<String, ProviderRecord> {
        self.providers
            .iter()
            .filter(|(_, p)| p.provider_component == component)
            .map(|(name, p)| (name.clone(), p.clone()))
            .collect()
    }
}

/// Resolve producer/consumer bindings across a deployment's components
/// (§4.4). `components` is `(name, kind, properties)` for every component in
/// the deployment at the revision selected for this run.
pub fn resolve_bindings(
    components: &[(String, String, ComponentProperties)],
    registry: &BindingMetadataRegistry,
) -> Result<ResolvedBindings, GraphError> {
    let mut providers: HashMap<String, ProviderRecord> = HashMap::new();
    let mut explicit_names: HashMap<String, String> = HashMap::new(); // binding name -> owning component, for override rule

    // Rule 1: intrinsic workload bindings, named after the component.
    for (name, kind, _props) in components {
        if let Some(binding_kind) = registry.intrinsic_workload_kind(kind) {
            providers.insert(
                name.clone(),
                ProviderRecord { name: name.clone(), kind: binding_kind.to_string(), provider_component: name.clone() },
            );
        }
    }

    // Rule 2: intrinsic trait bindings, also named after the component.
    for (name, _kind, props) in components {
        for t in &props.traits {
            if let Some(binding_kind) = registry.intrinsic_trait_kind(&t.kind) {
                if let Some(existing) = providers.get(name) {
                    if existing.provider_component != *name {
                        return Err(GraphError::MultipleProviders {
                            name: name.clone(),
                            first: existing.provider_component.clone(),
                            second: name.clone(),
                        });
                    }
                }
                providers.insert(
                    name.clone(),
                    ProviderRecord {
                        name: name.clone(),
                        kind: binding_kind.to_string(),
                        provider_component: name.clone(),
                    },
                );
            }
        }
    }

    // Rule 3: explicit `provides` entries override same-named intrinsic
    // bindings on the *same* component; any other collision is a conflict.
    for (name, _kind, props) in components {
        for provide in &props.provides {
            match providers.get(&provide.name) {
                Some(existing) if existing.provider_component != *name => {
                    return Err(GraphError::MultipleProviders {
                        name: provide.name.clone(),
                        first: existing.provider_component.clone(),
                        second: name.clone(),
                    });
                }
                _ => {}
            }
            if let Some(owner) = explicit_names.get(&provide.name) {
                if owner != name {
                    return Err(GraphError::MultipleProviders {
                        name: provide.name.clone(),
                        first: owner.clone(),
                        second: name.clone(),
                    });
                }
            }
            explicit_names.insert(provide.name.clone(), name.clone());
            providers.insert(
                provide.name.clone(),
                ProviderRecord { name: provide.name.clone(), kind: provide.kind.clone(), provider_component: name.clone() },
            );
        }
    }

    // Rule 4: resolve each dependsOn against `providers`.
    let mut consumers: HashMap<String, HashMap<String, ProviderRecord>> = HashMap::new();
    for (name, _kind, props) in components {
        let mut resolved = HashMap::new();
        for dep in &props.depends_on {
            let provider = providers
                .get(&dep.name)
                .ok_or_else(|| GraphError::NoProvider { component: name.clone(), name: dep.name.clone() })?;
            if provider.kind != dep.kind {
                return Err(GraphError::KindMismatch {
                    component: name.clone(),
                    name: dep.name.clone(),
                    expected: dep.kind.clone(),
                    actual: provider.kind.clone(),
                });
            }
            resolved.insert(dep.name.clone(), provider.clone());
        }
        consumers.insert(name.clone(), resolved);
    }

    Ok(ResolvedBindings { providers, consumers })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rcp_domain::{DependsOn, Provide};

    fn props_with(provides: Vec<Provide>, depends_on: Vec<DependsOn>) -> ComponentProperties {
        ComponentProperties { build: None, config: None, run: None, provides, depends_on, traits: vec![] }
    }

    fn provide(name: &str, kind: &str) -> Provide {
        Provide { name: name.into(), kind: kind.into(), extra: Default::default() }
    }

    fn depends(name: &str, kind: &str) -> DependsOn {
        DependsOn { name: name.into(), kind: kind.into(), set_env: Default::default(), set_secret: Default::default() }
    }

    #[test]
    fn intrinsic_workload_binding_is_produced() {
        let mut registry = BindingMetadataRegistry::new();
        registry.register_workload_binding("Container", "http");

        let components = vec![("web".to_string(), "Container".to_string(), props_with(vec![], vec![]))];
        let resolved = resolve_bindings(&components, &registry).unwrap();
        assert_eq!(resolved.providers["web"].kind, "http");
        assert_eq!(resolved.providers["web"].provider_component, "web");
    }

    #[test]
    fn explicit_provides_overrides_intrinsic_on_same_component() {
        let mut registry = BindingMetadataRegistry::new();
        registry.register_workload_binding("Container", "http");

        let components = vec![(
            "web".to_string(),
            "Container".to_string(),
            props_with(vec![provide("web", "grpc")], vec![]),
        )];
        let resolved = resolve_bindings(&components, &registry).unwrap();
        assert_eq!(resolved.providers["web"].kind, "grpc");
    }

    #[test]
    fn collision_across_components_is_conflict() {
        let registry = BindingMetadataRegistry::new();
        let components = vec![
            ("a".to_string(), "Container".to_string(), props_with(vec![provide("shared", "http")], vec![])),
            ("b".to_string(), "Container".to_string(), props_with(vec![provide("shared", "http")], vec![])),
        ];
        let err = resolve_bindings(&components, &registry).unwrap_err();
        assert!(matches!(err, GraphError::MultipleProviders { .. }));
    }

    #[test]
    fn missing_provider_is_bad_input() {
        let registry = BindingMetadataRegistry::new();
        let components = vec![(
            "consumer".to_string(),
            "Container".to_string(),
            props_with(vec![], vec![depends("nonexistent", "http")]),
        )];
        let err = resolve_bindings(&components, &registry).unwrap_err();
        assert!(matches!(err, GraphError::NoProvider { .. }));
    }

    #[test]
    fn kind_mismatch_is_bad_input() {
        let registry = BindingMetadataRegistry::new();
        let components = vec![
            ("producer".to_string(), "Container".to_string(), props_with(vec![provide("svc", "http")], vec![])),
            ("consumer".to_string(), "Container".to_string(), props_with(vec![], vec![depends("svc", "tcp")])),
        ];
        let err = resolve_bindings(&components, &registry).unwrap_err();
        assert!(matches!(err, GraphError::KindMismatch { .. }));
    }

    #[test]
    fn consumer_resolves_to_correct_provider() {
        let registry = BindingMetadataRegistry::new();
        let components = vec![
            ("producer".to_string(), "Container".to_string(), props_with(vec![provide("svc", "http")], vec![])),
            ("consumer".to_string(), "Container".to_string(), props_with(vec![], vec![depends("svc", "http")])),
        ];
        let resolved = resolve_bindings(&components, &registry).unwrap();
        let bound = &resolved.consumers["consumer"]["svc"];
        assert_eq!(bound.provider_component, "producer");
    }
}
