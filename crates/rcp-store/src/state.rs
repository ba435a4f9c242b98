use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A structured record of a mutation the store observed, independent of the
/// request/response cycle that triggered it. Appended by the orchestrator
/// and operation manager, read back through [`crate::StateStore::list_events`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum AuditEvent {
    ApplicationCreated {
        id: Uuid,
        at: DateTime<Utc>,
        application: String,
    },
    ApplicationDeleted {
        id: Uuid,
        at: DateTime<Utc>,
        application: String,
    },
    ComponentRevisionAppended {
        id: Uuid,
        at: DateTime<Utc>,
        application: String,
        component: String,
        revision: String,
    },
    DeploymentStarted {
        id: Uuid,
        at: DateTime<Utc>,
        application: String,
        deployment: String,
        operation_id: String,
    },
    DeploymentCompleted {
        id: Uuid,
        at: DateTime<Utc>,
        application: String,
        deployment: String,
        operation_id: String,
        succeeded: bool,
    },
}

impl AuditEvent {
    pub fn application(&self) -> &str {
        match self {
            AuditEvent::ApplicationCreated { application, .. }
            | AuditEvent::ApplicationDeleted { application, .. }
            | AuditEvent::ComponentRevisionAppended { application, .. }
            | AuditEvent::DeploymentStarted { application, .. }
            | AuditEvent::DeploymentCompleted { application, .. } => application,
        }
    }
}
