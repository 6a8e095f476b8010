use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use fieldserv_core::ModuleId;

use crate::Role;

/// The role-default relation: `(Role, Module) -> bool`.
///
/// Absence of a row means "no default access" (false). This is deliberately a
/// first-class table rather than conditional logic at call sites, so the
/// override-over-default precedence rule stays testable on its own.
///
/// Authoring the table is configuration; it is not mutated per-user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleDefaults {
    rows: HashMap<Role, HashMap<ModuleId, bool>>,
}

impl RoleDefaults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default answer for a role/module pair (upsert).
    pub fn set(&mut self, role: Role, module_id: ModuleId, allowed: bool) {
        self.rows.entry(role).or_default().insert(module_id, allowed);
    }

    /// Grant default access for a role/module pair.
    pub fn grant(&mut self, role: Role, module_id: ModuleId) {
        self.set(role, module_id, true);
    }

    /// The default decision for a role/module pair; `false` when no row exists.
    pub fn allows(&self, role: Role, module_id: ModuleId) -> bool {
        self.rows
            .get(&role)
            .and_then(|m| m.get(&module_id))
            .copied()
            .unwrap_or(false)
    }

    /// Modules with an explicit default row for `role` (granted or denied).
    pub fn modules_for(&self, role: Role) -> Vec<ModuleId> {
        self.rows
            .get(&role)
            .map(|m| m.keys().copied().collect())
            .unwrap_or_default()
    }
}
