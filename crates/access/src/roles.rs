use serde::{Deserialize, Serialize};

/// Role of a user account.
///
/// The role set is closed: changing what a role *means* (its default module
/// set) is a configuration change on [`crate::RoleDefaults`], never a new
/// variant. Individual users carry exactly one role.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Platform operator; administers every tenant.
    SuperAdmin,
    /// Administrator of a single tenant.
    TenantAdmin,
    /// Operational manager within a tenant.
    Manager,
    /// Field technician executing service orders.
    Technician,
    /// End client viewing their own orders.
    EndClient,
}

impl Role {
    /// Whether this role carries administrative rights at all.
    ///
    /// Tenant scoping of those rights is checked separately
    /// (see [`crate::can_administer`]).
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::SuperAdmin | Role::TenantAdmin)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "super_admin",
            Role::TenantAdmin => "tenant_admin",
            Role::Manager => "manager",
            Role::Technician => "technician",
            Role::EndClient => "end_client",
        }
    }

    /// All roles, in privilege order. Used when seeding default tables.
    pub const ALL: [Role; 5] = [
        Role::SuperAdmin,
        Role::TenantAdmin,
        Role::Manager,
        Role::Technician,
        Role::EndClient,
    ];
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
