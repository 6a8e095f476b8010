use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use fieldserv_core::{ModuleId, UserId};

/// An explicit, persisted per-user exception to the role default.
///
/// At most one override exists per (user, module) pair; the store enforces
/// uniqueness through its key, not caller discipline. Provenance (who granted
/// it, when) travels with the row and is replaced wholesale on upsert.
///
/// An override never expires implicitly; it is destroyed only by an explicit
/// reset-to-default action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionOverride {
    pub user_id: UserId,
    pub module_id: ModuleId,
    pub can_access: bool,
    pub granted_by: UserId,
    pub granted_at: DateTime<Utc>,
}

impl PermissionOverride {
    pub fn new(
        user_id: UserId,
        module_id: ModuleId,
        can_access: bool,
        granted_by: UserId,
        granted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            module_id,
            can_access,
            granted_by,
            granted_at,
        }
    }
}
