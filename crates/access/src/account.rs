use serde::{Deserialize, Serialize};

use fieldserv_core::{TenantId, UserId};

use crate::Role;

/// Identity of a user as supplied by the identity/session provider.
///
/// This is a trust boundary object: the core does not re-verify identity.
/// Accounts are never deleted, only deactivated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: UserId,
    pub tenant_id: TenantId,
    pub role: Role,
    pub active: bool,
}

impl UserAccount {
    pub fn new(id: UserId, tenant_id: TenantId, role: Role) -> Self {
        Self {
            id,
            tenant_id,
            role,
            active: true,
        }
    }
}

/// Whether `actor` holds administrative rights over `tenant_id`.
///
/// - `SuperAdmin` administers every tenant.
/// - `TenantAdmin` administers only their own tenant.
/// - Everyone else administers nothing.
///
/// No IO, no panics, no business logic (pure policy check).
pub fn can_administer(actor: &UserAccount, tenant_id: TenantId) -> bool {
    match actor.role {
        Role::SuperAdmin => true,
        Role::TenantAdmin => actor.tenant_id == tenant_id,
        _ => false,
    }
}
