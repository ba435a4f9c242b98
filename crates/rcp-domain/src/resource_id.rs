use std::fmt;

use uuid::Uuid;

use crate::error::DomainError;

/// One `/{type}/{name}` pair in a parsed resource path, beyond the
/// `providers/{namespace}` segment.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Segment {
    type_name: String,
    name: String,
}

impl Segment {
    fn type_eq(&self, other: &str) -> bool {
        self.type_name.eq_ignore_ascii_case(other)
    }
}

/// A parsed hierarchical resource path of the form
/// `/subscriptions/{s}/resourceGroups/{g}/providers/{ns}/{type}/{name}(/{type}/{name})*`.
///
/// Case of the original text is preserved for display, but type segments
/// compare case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceId {
    raw: String,
    subscription_id: String,
    resource_group: String,
    provider_namespace: String,
    segments: Vec<Segment>,
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl ResourceId {
    /// Parse a resource path. Fails with [`DomainError::BadInput`] if the
    /// shape does not match `/subscriptions/{s}/resourceGroups/{g}/providers/{ns}/{type}/{name}...`.
    pub fn parse(path: &str) -> Result<Self, DomainError> {
        let trimmed = path.trim_start_matches('/');
        let parts: Vec<&str> = trimmed.split('/').filter(|s| !s.is_empty()).collect();

        if parts.len() < 6 || parts.len() % 2 != 0 {
            return Err(DomainError::BadInput(format!(
                "malformed resource id: {path}"
            )));
        }
        if !parts[0].eq_ignore_ascii_case("subscriptions") {
            return Err(DomainError::BadInput(format!(
                "resource id must start with /subscriptions/: {path}"
            )));
        }
        if !parts[2].eq_ignore_ascii_case("resourceGroups") {
            return Err(DomainError::BadInput(format!(
                "resource id missing /resourceGroups/: {path}"
            )));
        }
        if !parts[4].eq_ignore_ascii_case("providers") {
            return Err(DomainError::BadInput(format!(
                "resource id missing /providers/: {path}"
            )));
        }

        let subscription_id = parts[1].to_string();
        let resource_group = parts[3].to_string();
        let provider_namespace = parts[5].to_string();

        let rest = &parts[6..];
        if rest.is_empty() || rest.len() % 2 != 0 {
            return Err(DomainError::BadInput(format!(
                "resource id has no type/name segments: {path}"
            )));
        }
        let segments = rest
            .chunks(2)
            .map(|pair| Segment {
                type_name: pair[0].to_string(),
                name: pair[1].to_string(),
            })
            .collect();

        Ok(ResourceId {
            raw: path.to_string(),
            subscription_id,
            resource_group,
            provider_namespace,
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Build a path from this id's scope (subscription/resourceGroup/provider)
    /// and a prefix of `segments`, preserving original case.
    fn rebuild(&self, segments: &[Segment]) -> String {
        let mut path = format!(
            "/subscriptions/{}/resourceGroups/{}/providers/{}",
            self.subscription_id, self.resource_group, self.provider_namespace
        );
        for seg in segments {
            path.push('/');
            path.push_str(&seg.type_name);
            path.push('/');
            path.push_str(&seg.name);
        }
        path
    }

    /// Narrow to an Application identifier: exactly one `Applications/{name}` segment.
    pub fn application(&self) -> Result<ApplicationId, DomainError> {
        if self.segments.len() != 1 || !self.segments[0].type_eq("applications") {
            return Err(DomainError::BadInput(format!(
                "not an application resource id: {}",
                self.raw
            )));
        }
        Ok(ApplicationId(self.clone()))
    }

    /// Narrow to a Component identifier: `Applications/{a}/Components/{c}`.
    pub fn component(&self) -> Result<ComponentId, DomainError> {
        self.narrow2("applications", "components")
            .map(ComponentId)
            .ok_or_else(|| DomainError::BadInput(format!("not a component resource id: {}", self.raw)))
    }

    /// Narrow to a Deployment identifier: `Applications/{a}/Deployments/{d}`.
    pub fn deployment(&self) -> Result<DeploymentId, DomainError> {
        self.narrow2("applications", "deployments")
            .map(DeploymentId)
            .ok_or_else(|| DomainError::BadInput(format!("not a deployment resource id: {}", self.raw)))
    }

    /// Narrow to a Scope identifier: `Applications/{a}/Scopes/{s}`.
    pub fn scope(&self) -> Result<ScopeId, DomainError> {
        self.narrow2("applications", "scopes")
            .map(ScopeId)
            .ok_or_else(|| DomainError::BadInput(format!("not a scope resource id: {}", self.raw)))
    }

    /// Narrow to a deployment-operation identifier:
    /// `Applications/{a}/Deployments/{d}/OperationResults/{op}`.
    pub fn deployment_operation(&self) -> Result<OperationId, DomainError> {
        if self.segments.len() != 3
            || !self.segments[0].type_eq("applications")
            || !self.segments[1].type_eq("deployments")
            || !self.segments[2].type_eq("operationresults")
        {
            return Err(DomainError::BadInput(format!(
                "not a deployment operation resource id: {}",
                self.raw
            )));
        }
        Ok(OperationId(self.clone()))
    }

    fn narrow2(&self, first: &str, second: &str) -> Option<ResourceId> {
        if self.segments.len() == 2
            && self.segments[0].type_eq(first)
            && self.segments[1].type_eq(second)
        {
            Some(self.clone())
        } else {
            None
        }
    }
}

macro_rules! narrow_id {
    ($name:ident, $segment_index:expr, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct $name(ResourceId);

        impl $name {
            pub fn as_resource_id(&self) -> &ResourceId {
                &self.0
            }

            pub fn name(&self) -> &str {
                &self.0.segments[$segment_index].name
            }

            pub fn as_str(&self) -> &str {
                self.0.as_str()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

narrow_id!(ApplicationId, 0, "Identifies a single Application resource.");
narrow_id!(ComponentId, 1, "Identifies a single Component resource.");
narrow_id!(DeploymentId, 1, "Identifies a single Deployment resource.");
narrow_id!(ScopeId, 1, "Identifies a single Scope resource.");
narrow_id!(OperationId, 2, "Identifies a single deployment Operation resource.");

impl ApplicationId {
    pub fn application_name(&self) -> &str {
        self.name()
    }

    /// Build a Component id under this application.
    pub fn component(&self, name: &str) -> ComponentId {
        let mut seg = self.0.segments.clone();
        seg.push(Segment {
            type_name: "Components".to_string(),
            name: name.to_string(),
        });
        ComponentId(ResourceId {
            raw: self.0.rebuild(&seg),
            segments: seg,
            ..self.0.clone()
        })
    }

    /// Build a Deployment id under this application.
    pub fn deployment(&self, name: &str) -> DeploymentId {
        let mut seg = self.0.segments.clone();
        seg.push(Segment {
            type_name: "Deployments".to_string(),
            name: name.to_string(),
        });
        DeploymentId(ResourceId {
            raw: self.0.rebuild(&seg),
            segments: seg,
            ..self.0.clone()
        })
    }

    /// Build a Scope id under this application.
    pub fn scope(&self, name: &str) -> ScopeId {
        let mut seg = self.0.segments.clone();
        seg.push(Segment {
            type_name: "Scopes".to_string(),
            name: name.to_string(),
        });
        ScopeId(ResourceId {
            raw: self.0.rebuild(&seg),
            segments: seg,
            ..self.0.clone()
        })
    }
}

impl DeploymentId {
    pub fn application_name(&self) -> &str {
        &self.0.segments[0].name
    }

    pub fn deployment_name(&self) -> &str {
        self.name()
    }

    /// Mint a sibling operation id by appending a fresh `OperationResults/{uuid}` segment.
    ///
    /// "Deterministic" per spec means the *shape* is deterministic (a sibling
    /// under this exact deployment); the minted id itself is fresh per call.
    pub fn new_operation(&self) -> OperationId {
        let mut seg = self.0.segments.clone();
        seg.push(Segment {
            type_name: "OperationResults".to_string(),
            name: Uuid::new_v4().to_string(),
        });
        OperationId(ResourceId {
            raw: self.0.rebuild(&seg),
            segments: seg,
            ..self.0.clone()
        })
    }
}

impl ComponentId {
    pub fn application_name(&self) -> &str {
        &self.0.segments[0].name
    }

    pub fn component_name(&self) -> &str {
        self.name()
    }
}

impl OperationId {
    pub fn application_name(&self) -> &str {
        &self.0.segments[0].name
    }

    pub fn deployment_name(&self) -> &str {
        &self.0.segments[1].name
    }

    pub fn operation_name(&self) -> &str {
        self.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "/subscriptions/11111111-1111-1111-1111-111111111111/resourceGroups/my-group/providers/Applications.Core";

    #[test]
    fn parses_application_id() {
        let path = format!("{BASE}/Applications/my-app");
        let id = ResourceId::parse(&path).unwrap();
        let app = id.application().unwrap();
        assert_eq!(app.application_name(), "my-app");
    }

    #[test]
    fn parses_component_id() {
        let path = format!("{BASE}/Applications/my-app/Components/frontend");
        let id = ResourceId::parse(&path).unwrap();
        let comp = id.component().unwrap();
        assert_eq!(comp.application_name(), "my-app");
        assert_eq!(comp.component_name(), "frontend");
    }

    #[test]
    fn type_segment_comparison_is_case_insensitive() {
        let path = format!("{BASE}/applications/my-app/COMPONENTS/frontend");
        let id = ResourceId::parse(&path).unwrap();
        assert!(id.component().is_ok());
    }

    #[test]
    fn rejects_wrong_shape() {
        let path = format!("{BASE}/Applications/my-app/Components/frontend");
        let id = ResourceId::parse(&path).unwrap();
        assert!(id.application().is_err());
        assert!(id.deployment().is_err());
    }

    #[test]
    fn rejects_malformed_path() {
        assert!(ResourceId::parse("/not/a/valid/path").is_err());
    }

    #[test]
    fn application_derives_child_ids() {
        let path = format!("{BASE}/Applications/my-app");
        let app = ResourceId::parse(&path).unwrap().application().unwrap();
        let dep = app.deployment("default");
        assert_eq!(dep.application_name(), "my-app");
        assert_eq!(dep.deployment_name(), "default");
    }

    #[test]
    fn new_operation_is_sibling_of_deployment() {
        let path = format!("{BASE}/Applications/my-app/Deployments/default");
        let dep = ResourceId::parse(&path).unwrap().deployment().unwrap();
        let op1 = dep.new_operation();
        let op2 = dep.new_operation();
        assert_eq!(op1.application_name(), "my-app");
        assert_eq!(op1.deployment_name(), "default");
        assert_ne!(op1.operation_name(), op2.operation_name(), "each mint is fresh");
    }
}
