//! Administrative service facade.
//!
//! `AccessAdminService` is what the admin API surface calls: it checks the
//! acting user's rights, delegates invariant enforcement to the stores,
//! emits one audit record per successful mutation (synchronously, before
//! success is returned), and logs structured fields on every mutation path.
//!
//! Module catalog mutations (register/rename/lifecycle/graph edits) are
//! platform-level and require `SuperAdmin`; override mutations are
//! tenant-level and require administrative rights over the tenant owning
//! the target user.

use std::sync::RwLock;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use fieldserv_access::{
    AccessDecision, CandidateModule, PermissionOverride, Role, RoleDefaults, UserAccount,
    can_administer, resolve_access,
};
use fieldserv_audit::{AuditAction, AuditRecord, AuditSink};
use fieldserv_core::{DomainError, DomainResult, EdgeId, ModuleId, TenantId, UserId};
use fieldserv_modules::{Module, Slug};

use crate::store::{ModuleStore, OverrideStore, UserDirectory};

/// Thin module view used in warnings and dependents listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleSummary {
    pub module_id: ModuleId,
    pub slug: String,
    pub name: String,
}

impl From<&Module> for ModuleSummary {
    fn from(m: &Module) -> Self {
        Self {
            module_id: m.id,
            slug: m.slug.to_string(),
            name: m.name.clone(),
        }
    }
}

/// Returned by `deactivate_module`: the modules that depend on the
/// deactivated one and will lose functionality. Deactivation never cascades;
/// surfacing this list is the deliberate alternative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DependentsWarning {
    pub module_id: ModuleId,
    pub dependents: Vec<ModuleSummary>,
}

impl DependentsWarning {
    pub fn is_empty(&self) -> bool {
        self.dependents.is_empty()
    }
}

/// The administrative operations of the access-control core.
pub struct AccessAdminService<U, O, M, A> {
    users: U,
    overrides: O,
    modules: M,
    audit: A,
    defaults: RwLock<RoleDefaults>,
}

impl<U, O, M, A> AccessAdminService<U, O, M, A>
where
    U: UserDirectory,
    O: OverrideStore,
    M: ModuleStore,
    A: AuditSink,
{
    pub fn new(users: U, overrides: O, modules: M, audit: A, defaults: RoleDefaults) -> Self {
        Self {
            users,
            overrides,
            modules,
            audit,
            defaults: RwLock::new(defaults),
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Resolution (read side)
    // ─────────────────────────────────────────────────────────────────────

    /// Effective access for `user_id` over every non-archived module,
    /// ordered by module name. `NotFound` only when the user is unknown;
    /// denied access is a normal `allowed: false` row.
    pub fn resolve(&self, user_id: UserId) -> DomainResult<Vec<AccessDecision>> {
        let user = self.users.get(user_id).ok_or(DomainError::NotFound)?;

        let mut candidates: Vec<CandidateModule> = self
            .modules
            .list()
            .iter()
            .filter(|m| !m.is_archived())
            .map(|m| CandidateModule {
                id: m.id,
                name: m.name.clone(),
                active: m.is_active(),
            })
            .collect();
        candidates.sort_by(|a, b| a.name.cmp(&b.name));

        let defaults = self
            .defaults
            .read()
            .map_err(|_| DomainError::conflict("defaults lock poisoned"))?;

        Ok(resolve_access(user.role, &candidates, &defaults, |m| {
            self.overrides.get(user_id, m).map(|o| o.can_access)
        }))
    }

    /// Effective access for a subset of modules (archived ones resolve as
    /// inactive rather than being dropped, so callers can inspect them).
    pub fn resolve_for(
        &self,
        user_id: UserId,
        module_ids: &[ModuleId],
    ) -> DomainResult<Vec<AccessDecision>> {
        let user = self.users.get(user_id).ok_or(DomainError::NotFound)?;

        let mut candidates = Vec::with_capacity(module_ids.len());
        for id in module_ids {
            let module = self.modules.get(*id).ok_or(DomainError::NotFound)?;
            candidates.push(CandidateModule {
                id: module.id,
                name: module.name.clone(),
                active: module.is_active(),
            });
        }

        let defaults = self
            .defaults
            .read()
            .map_err(|_| DomainError::conflict("defaults lock poisoned"))?;

        Ok(resolve_access(user.role, &candidates, &defaults, |m| {
            self.overrides.get(user_id, m).map(|o| o.can_access)
        }))
    }

    // ─────────────────────────────────────────────────────────────────────
    // Role defaults (configuration)
    // ─────────────────────────────────────────────────────────────────────

    /// Change what a role means by default. Configuration, not a per-user
    /// mutation; requires `SuperAdmin`.
    pub fn set_role_default(
        &self,
        actor_id: UserId,
        role: Role,
        module_id: ModuleId,
        allowed: bool,
    ) -> DomainResult<()> {
        self.require_platform_admin(actor_id)?;
        self.modules.get(module_id).ok_or(DomainError::NotFound)?;

        let mut defaults = self
            .defaults
            .write()
            .map_err(|_| DomainError::conflict("defaults lock poisoned"))?;
        defaults.set(role, module_id, allowed);

        info!(actor = %actor_id, %role, module = %module_id, allowed, "role default updated");
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Overrides (write side)
    // ─────────────────────────────────────────────────────────────────────

    /// Upsert an override; a second call for the same (user, module)
    /// replaces the prior value and provenance.
    pub fn set_override(
        &self,
        actor_id: UserId,
        user_id: UserId,
        module_id: ModuleId,
        can_access: bool,
    ) -> DomainResult<PermissionOverride> {
        let (actor, target) = self.require_tenant_admin(actor_id, user_id)?;
        let module = self.modules.get(module_id).ok_or(DomainError::NotFound)?;

        if !target.active {
            warn!(
                actor = %actor.id,
                user = %target.id,
                module = %module.slug,
                "override set for a deactivated user account"
            );
        }

        let record =
            PermissionOverride::new(user_id, module_id, can_access, actor_id, Utc::now());
        let previous = self.overrides.upsert(record.clone());

        self.emit(
            AuditRecord::new(
                AuditAction::OverrideSet,
                actor_id,
                format!("{}:{}", user_id, module.slug),
                record.granted_at,
            )
            .with_tenant(target.tenant_id)
            .with_previous(serde_json::json!(previous.as_ref().map(|p| p.can_access)))
            .with_new(serde_json::json!(can_access)),
        )?;

        info!(
            actor = %actor_id,
            user = %user_id,
            module = %module.slug,
            can_access,
            customized_before = previous.is_some(),
            "override set"
        );
        Ok(record)
    }

    /// Delete the override if present. Idempotent: a second call is a no-op
    /// and never errors. Audited only when a row actually existed.
    pub fn reset_to_default(
        &self,
        actor_id: UserId,
        user_id: UserId,
        module_id: ModuleId,
    ) -> DomainResult<()> {
        let (_, target) = self.require_tenant_admin(actor_id, user_id)?;
        let module = self.modules.get(module_id).ok_or(DomainError::NotFound)?;

        let Some(previous) = self.overrides.remove(user_id, module_id) else {
            return Ok(());
        };

        self.emit(
            AuditRecord::new(
                AuditAction::OverrideReset,
                actor_id,
                format!("{}:{}", user_id, module.slug),
                Utc::now(),
            )
            .with_tenant(target.tenant_id)
            .with_previous(serde_json::json!(previous.can_access)),
        )?;

        info!(actor = %actor_id, user = %user_id, module = %module.slug, "override reset to default");
        Ok(())
    }

    /// All overrides for a user (audit/"customized" badge listing).
    pub fn list_overrides(&self, user_id: UserId) -> DomainResult<Vec<PermissionOverride>> {
        self.users.get(user_id).ok_or(DomainError::NotFound)?;
        Ok(self.overrides.list_for_user(user_id))
    }

    /// User accounts of a tenant, for the admin user table. Requires admin
    /// rights over that tenant.
    pub fn list_tenant_users(
        &self,
        actor_id: UserId,
        tenant_id: TenantId,
    ) -> DomainResult<Vec<UserAccount>> {
        let actor = self.users.get(actor_id).ok_or(DomainError::NotFound)?;
        if !can_administer(&actor, tenant_id) {
            return Err(DomainError::Forbidden);
        }
        let mut accounts = self.users.list_tenant(tenant_id);
        accounts.sort_by_key(|a| *a.id.as_uuid());
        Ok(accounts)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Module catalog
    // ─────────────────────────────────────────────────────────────────────

    pub fn register_module(
        &self,
        actor_id: UserId,
        name: &str,
        slug: &str,
        is_core: bool,
    ) -> DomainResult<Module> {
        self.require_platform_admin(actor_id)?;

        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::validation("module name cannot be empty"));
        }
        let slug = Slug::parse(slug)?;
        let module = Module::new(ModuleId::new(), name, slug, is_core);
        self.modules.insert(module.clone())?;

        self.emit(
            AuditRecord::new(
                AuditAction::ModuleRegistered,
                actor_id,
                module.slug.to_string(),
                Utc::now(),
            )
            .with_new(serde_json::json!({ "name": module.name, "isCore": module.is_core })),
        )?;

        info!(actor = %actor_id, module = %module.slug, is_core, "module registered");
        Ok(module)
    }

    pub fn rename_module(
        &self,
        actor_id: UserId,
        module_id: ModuleId,
        name: &str,
    ) -> DomainResult<Module> {
        self.require_platform_admin(actor_id)?;
        let (module, previous) = self.modules.rename(module_id, name.trim().to_string())?;

        self.emit(
            AuditRecord::new(
                AuditAction::ModuleRenamed,
                actor_id,
                module.slug.to_string(),
                Utc::now(),
            )
            .with_previous(serde_json::json!(previous))
            .with_new(serde_json::json!(module.name)),
        )?;

        info!(actor = %actor_id, module = %module.slug, "module renamed");
        Ok(module)
    }

    /// Modules visible to admin listings (everything not archived).
    pub fn list_modules(&self) -> Vec<Module> {
        let mut modules: Vec<Module> = self
            .modules
            .list()
            .into_iter()
            .filter(|m| !m.is_archived())
            .collect();
        modules.sort_by(|a, b| a.name.cmp(&b.name));
        modules
    }

    // ─────────────────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────────────────

    /// `Active → Inactive`. Returns a warning naming dependents; they are
    /// never deactivated automatically.
    pub fn deactivate_module(
        &self,
        actor_id: UserId,
        module_id: ModuleId,
    ) -> DomainResult<DependentsWarning> {
        self.require_platform_admin(actor_id)?;
        let (module, dependents) = self.modules.deactivate(module_id)?;

        self.emit(
            AuditRecord::new(
                AuditAction::ModuleDeactivated,
                actor_id,
                module.slug.to_string(),
                Utc::now(),
            )
            .with_previous(serde_json::json!("active"))
            .with_new(serde_json::json!("inactive")),
        )?;

        let warning = DependentsWarning {
            module_id,
            dependents: dependents.iter().map(ModuleSummary::from).collect(),
        };
        if !warning.is_empty() {
            warn!(
                actor = %actor_id,
                module = %module.slug,
                dependents = warning.dependents.len(),
                "deactivated module has dependents that will lose functionality"
            );
        }
        info!(actor = %actor_id, module = %module.slug, "module deactivated");
        Ok(warning)
    }

    /// `Inactive → Active`.
    pub fn activate_module(&self, actor_id: UserId, module_id: ModuleId) -> DomainResult<Module> {
        self.require_platform_admin(actor_id)?;
        let module = self.modules.activate(module_id)?;

        self.emit(
            AuditRecord::new(
                AuditAction::ModuleActivated,
                actor_id,
                module.slug.to_string(),
                Utc::now(),
            )
            .with_previous(serde_json::json!("inactive"))
            .with_new(serde_json::json!("active")),
        )?;

        info!(actor = %actor_id, module = %module.slug, "module activated");
        Ok(module)
    }

    /// Soft delete: `Active|Inactive → Archived`, sets `deleted_at`.
    pub fn archive_module(&self, actor_id: UserId, module_id: ModuleId) -> DomainResult<Module> {
        self.require_platform_admin(actor_id)?;
        let previous = self
            .modules
            .get(module_id)
            .ok_or(DomainError::NotFound)?
            .status;
        let module = self.modules.archive(module_id, Utc::now())?;

        self.emit(
            AuditRecord::new(
                AuditAction::ModuleArchived,
                actor_id,
                module.slug.to_string(),
                Utc::now(),
            )
            .with_previous(serde_json::json!(previous.to_string()))
            .with_new(serde_json::json!("archived")),
        )?;

        info!(actor = %actor_id, module = %module.slug, "module archived");
        Ok(module)
    }

    /// Irreversible row removal. Gated: the module must have left the
    /// `Active` state, must not be core, and must have no dependents.
    pub fn hard_delete_module(&self, actor_id: UserId, module_id: ModuleId) -> DomainResult<()> {
        self.require_platform_admin(actor_id)?;
        let module = self.modules.hard_delete(module_id).inspect_err(|err| {
            warn!(actor = %actor_id, module = %module_id, %err, "hard delete rejected");
        })?;

        self.emit(
            AuditRecord::new(
                AuditAction::ModuleHardDeleted,
                actor_id,
                module.slug.to_string(),
                Utc::now(),
            )
            .with_previous(serde_json::json!(module.status.to_string())),
        )?;

        info!(actor = %actor_id, module = %module.slug, "module hard-deleted");
        Ok(())
    }

    /// Whether hard delete would currently succeed, with the blocking error
    /// when it would not. For admin screens that grey the button out.
    pub fn can_hard_delete(&self, module_id: ModuleId) -> DomainResult<Result<(), DomainError>> {
        let module = self.modules.get(module_id).ok_or(DomainError::NotFound)?;
        if let Err(err) = module.ensure_deletable_state() {
            return Ok(Err(err));
        }
        use fieldserv_modules::HardDeleteBlock;
        Ok(match self.modules.hard_delete_block(module_id)? {
            None => Ok(()),
            Some(HardDeleteBlock::CoreModule) => Err(DomainError::dependency_conflict(format!(
                "module '{}' is a core module and cannot be deleted",
                module.slug
            ))),
            Some(HardDeleteBlock::HasDependents(ids)) => {
                let slugs: Vec<String> = ids
                    .iter()
                    .filter_map(|id| self.modules.get(*id))
                    .map(|m| m.slug.to_string())
                    .collect();
                Err(DomainError::has_dependents(format!(
                    "module '{}' is still required by: {}",
                    module.slug,
                    slugs.join(", ")
                )))
            }
        })
    }

    // ─────────────────────────────────────────────────────────────────────
    // Graph
    // ─────────────────────────────────────────────────────────────────────

    /// Insert `module depends_on dependency`, cycle-gated. Idempotent for an
    /// edge that already exists (no duplicate row, no audit record).
    pub fn add_dependency(
        &self,
        actor_id: UserId,
        module_id: ModuleId,
        depends_on: ModuleId,
    ) -> DomainResult<EdgeId> {
        self.require_platform_admin(actor_id)?;
        let (edge_id, created) = self
            .modules
            .add_dependency(module_id, depends_on)
            .inspect_err(|err| {
                warn!(actor = %actor_id, module = %module_id, %err, "dependency rejected");
            })?;

        if created {
            self.emit(
                AuditRecord::new(
                    AuditAction::DependencyAdded,
                    actor_id,
                    edge_id.to_string(),
                    Utc::now(),
                )
                .with_new(serde_json::json!({
                    "module": module_id,
                    "dependsOn": depends_on,
                })),
            )?;
            info!(actor = %actor_id, module = %module_id, depends_on = %depends_on, "dependency added");
        }
        Ok(edge_id)
    }

    /// Unconditional edge removal; never creates cycles.
    pub fn remove_dependency(&self, actor_id: UserId, edge_id: EdgeId) -> DomainResult<()> {
        self.require_platform_admin(actor_id)?;
        let edge = self.modules.remove_dependency(edge_id)?;

        self.emit(
            AuditRecord::new(
                AuditAction::DependencyRemoved,
                actor_id,
                edge_id.to_string(),
                Utc::now(),
            )
            .with_previous(serde_json::json!({
                "module": edge.module_id,
                "dependsOn": edge.depends_on,
            })),
        )?;

        info!(actor = %actor_id, module = %edge.module_id, "dependency removed");
        Ok(())
    }

    /// Modules that declare a dependency on `module_id`.
    pub fn list_dependents(&self, module_id: ModuleId) -> DomainResult<Vec<ModuleSummary>> {
        let dependents = self.modules.dependents_of(module_id)?;
        Ok(dependents.iter().map(ModuleSummary::from).collect())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Guards
    // ─────────────────────────────────────────────────────────────────────

    fn require_platform_admin(&self, actor_id: UserId) -> DomainResult<UserAccount> {
        let actor = self.users.get(actor_id).ok_or(DomainError::NotFound)?;
        if actor.role != Role::SuperAdmin {
            warn!(actor = %actor_id, role = %actor.role, "module administration denied");
            return Err(DomainError::Forbidden);
        }
        Ok(actor)
    }

    fn require_tenant_admin(
        &self,
        actor_id: UserId,
        target_user_id: UserId,
    ) -> DomainResult<(UserAccount, UserAccount)> {
        let actor = self.users.get(actor_id).ok_or(DomainError::NotFound)?;
        let target = self.users.get(target_user_id).ok_or(DomainError::NotFound)?;
        if !can_administer(&actor, target.tenant_id) {
            warn!(
                actor = %actor_id,
                target = %target_user_id,
                tenant = %target.tenant_id,
                "override administration denied"
            );
            return Err(DomainError::Forbidden);
        }
        Ok((actor, target))
    }

    fn emit(&self, record: AuditRecord) -> DomainResult<()> {
        self.audit
            .emit(record)
            .map_err(|_| DomainError::conflict("audit sink unavailable"))
    }
}
