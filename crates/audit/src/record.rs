use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use fieldserv_core::{TenantId, UserId};

/// What kind of administrative mutation an audit record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    OverrideSet,
    OverrideReset,
    DependencyAdded,
    DependencyRemoved,
    ModuleRegistered,
    ModuleRenamed,
    ModuleActivated,
    ModuleDeactivated,
    ModuleArchived,
    ModuleHardDeleted,
}

/// One audit record per successful mutation.
///
/// `previous` and `new` capture the before/after values as JSON so the sink
/// stays schema-agnostic across record kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub action: AuditAction,
    pub actor: UserId,
    pub tenant_id: Option<TenantId>,
    /// Human-readable handle of the mutated record (slug, user id, edge id).
    pub target: String,
    pub previous: Option<serde_json::Value>,
    pub new: Option<serde_json::Value>,
    pub occurred_at: DateTime<Utc>,
}

impl AuditRecord {
    pub fn new(
        action: AuditAction,
        actor: UserId,
        target: impl Into<String>,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            action,
            actor,
            tenant_id: None,
            target: target.into(),
            previous: None,
            new: None,
            occurred_at,
        }
    }

    pub fn with_tenant(mut self, tenant_id: TenantId) -> Self {
        self.tenant_id = Some(tenant_id);
        self
    }

    pub fn with_previous(mut self, value: serde_json::Value) -> Self {
        self.previous = Some(value);
        self
    }

    pub fn with_new(mut self, value: serde_json::Value) -> Self {
        self.new = Some(value);
        self
    }
}
