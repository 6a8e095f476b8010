//! End-to-end scenarios over the full service: stores, resolver, lifecycle,
//! graph and audit wired together the way the admin API consumes them.

use std::sync::Arc;

use fieldserv_access::{Role, RoleDefaults, UserAccount};
use fieldserv_audit::{AuditAction, InMemoryAuditSink};
use fieldserv_core::{DomainError, ModuleId, TenantId, UserId};
use fieldserv_modules::Module;

use crate::admin::AccessAdminService;
use crate::store::{
    InMemoryModuleStore, InMemoryOverrideStore, InMemoryUserDirectory, UserDirectory,
};

type Service = AccessAdminService<
    Arc<InMemoryUserDirectory>,
    Arc<InMemoryOverrideStore>,
    Arc<InMemoryModuleStore>,
    Arc<InMemoryAuditSink>,
>;

struct Fixture {
    service: Service,
    audit: Arc<InMemoryAuditSink>,
    users: Arc<InMemoryUserDirectory>,
    super_admin: UserId,
    tenant_id: TenantId,
}

fn fixture() -> Fixture {
    fixture_with_defaults(RoleDefaults::new())
}

fn fixture_with_defaults(defaults: RoleDefaults) -> Fixture {
    let users = Arc::new(InMemoryUserDirectory::new());
    let overrides = Arc::new(InMemoryOverrideStore::new());
    let modules = Arc::new(InMemoryModuleStore::new());
    let audit = Arc::new(InMemoryAuditSink::new());

    let tenant_id = TenantId::new();
    let super_admin = UserId::new();
    users.upsert(UserAccount::new(super_admin, tenant_id, Role::SuperAdmin));

    let service = AccessAdminService::new(
        Arc::clone(&users),
        overrides,
        modules,
        Arc::clone(&audit),
        defaults,
    );

    Fixture {
        service,
        audit,
        users,
        super_admin,
        tenant_id,
    }
}

impl Fixture {
    fn add_user(&self, role: Role) -> UserId {
        self.add_user_in(role, self.tenant_id)
    }

    fn add_user_in(&self, role: Role, tenant_id: TenantId) -> UserId {
        let id = UserId::new();
        self.users.upsert(UserAccount::new(id, tenant_id, role));
        id
    }

    fn register(&self, slug: &str) -> Module {
        self.service
            .register_module(self.super_admin, &slug.to_uppercase(), slug, false)
            .unwrap()
    }

    fn register_core(&self, slug: &str) -> Module {
        self.service
            .register_module(self.super_admin, &slug.to_uppercase(), slug, true)
            .unwrap()
    }

    fn decision_for(&self, user_id: UserId, module_id: ModuleId) -> fieldserv_access::AccessDecision {
        self.service
            .resolve(user_id)
            .unwrap()
            .into_iter()
            .find(|d| d.module_id == module_id)
            .expect("module missing from resolution")
    }
}

// Scenario 1: default false + override true → allowed, customized.
#[test]
fn override_grants_access_denied_by_role_default() {
    let fx = fixture();
    let reports = fx.register("reports");
    let technician = fx.add_user(Role::Technician);
    fx.service
        .set_role_default(fx.super_admin, Role::Technician, reports.id, false)
        .unwrap();

    fx.service
        .set_override(fx.super_admin, technician, reports.id, true)
        .unwrap();

    let decision = fx.decision_for(technician, reports.id);
    assert!(decision.allowed);
    assert!(decision.is_customized);
}

// Scenario 2: reset returns the user to the role default.
#[test]
fn reset_restores_role_default() {
    let fx = fixture();
    let reports = fx.register("reports");
    let technician = fx.add_user(Role::Technician);

    fx.service
        .set_override(fx.super_admin, technician, reports.id, true)
        .unwrap();
    fx.service
        .reset_to_default(fx.super_admin, technician, reports.id)
        .unwrap();

    let decision = fx.decision_for(technician, reports.id);
    assert!(!decision.allowed);
    assert!(!decision.is_customized);

    // Idempotent: a second reset is a no-op, not an error.
    fx.service
        .reset_to_default(fx.super_admin, technician, reports.id)
        .unwrap();
}

// Scenario 3: A→C rejected when A→C→B→A would close a cycle.
#[test]
fn cycle_rejected_and_graph_unchanged() {
    let fx = fixture();
    let a = fx.register("alpha");
    let b = fx.register("bravo");
    let c = fx.register("charlie");

    fx.service.add_dependency(fx.super_admin, b.id, a.id).unwrap();
    fx.service.add_dependency(fx.super_admin, c.id, b.id).unwrap();

    let err = fx
        .service
        .add_dependency(fx.super_admin, a.id, c.id)
        .unwrap_err();
    assert!(matches!(err, DomainError::CyclicDependency(_)));

    // The two prior edges survive, nothing else.
    assert_eq!(fx.service.list_dependents(a.id).unwrap().len(), 1);
    assert_eq!(fx.service.list_dependents(b.id).unwrap().len(), 1);
    assert!(fx.service.list_dependents(c.id).unwrap().is_empty());
}

// Scenario 4: core module blocked from hard delete with zero dependents.
#[test]
fn core_module_cannot_be_hard_deleted() {
    let fx = fixture();
    let core = fx.register_core("work-orders");
    fx.service.deactivate_module(fx.super_admin, core.id).unwrap();

    let block = fx.service.can_hard_delete(core.id).unwrap().unwrap_err();
    assert!(matches!(block, DomainError::DependencyConflict(_)));

    let err = fx
        .service
        .hard_delete_module(fx.super_admin, core.id)
        .unwrap_err();
    assert!(matches!(err, DomainError::DependencyConflict(_)));
}

// Scenario 5: dependents block hard delete until the edge is removed.
#[test]
fn removing_dependent_edge_unblocks_hard_delete() {
    let fx = fixture();
    let n = fx.register("billing");
    let p = fx.register("invoices");

    let edge_id = fx.service.add_dependency(fx.super_admin, p.id, n.id).unwrap();
    fx.service.deactivate_module(fx.super_admin, n.id).unwrap();

    let err = fx
        .service
        .hard_delete_module(fx.super_admin, n.id)
        .unwrap_err();
    assert!(matches!(err, DomainError::HasDependents(_)));

    fx.service.remove_dependency(fx.super_admin, edge_id).unwrap();
    fx.service.hard_delete_module(fx.super_admin, n.id).unwrap();

    assert_eq!(fx.service.resolve(fx.super_admin).unwrap().iter().filter(|d| d.module_id == n.id).count(), 0);
}

// Scenario 6: deactivation suppresses an override grant; reactivation restores it.
#[test]
fn deactivation_suppresses_override_until_reactivated() {
    let fx = fixture();
    let q = fx.register("quotes");
    let user = fx.add_user(Role::EndClient);

    fx.service
        .set_override(fx.super_admin, user, q.id, true)
        .unwrap();
    fx.service.deactivate_module(fx.super_admin, q.id).unwrap();

    let suppressed = fx.decision_for(user, q.id);
    assert!(!suppressed.allowed);
    assert!(suppressed.would_allow, "raw decision stays visible to admins");
    assert!(!suppressed.module_active);

    fx.service.activate_module(fx.super_admin, q.id).unwrap();
    let restored = fx.decision_for(user, q.id);
    assert!(restored.allowed);
}

#[test]
fn deactivation_warns_about_dependents_without_cascading() {
    let fx = fixture();
    let base = fx.register("catalog");
    let leaf = fx.register("pricing");
    fx.service
        .add_dependency(fx.super_admin, leaf.id, base.id)
        .unwrap();

    let warning = fx
        .service
        .deactivate_module(fx.super_admin, base.id)
        .unwrap();

    assert_eq!(warning.dependents.len(), 1);
    assert_eq!(warning.dependents[0].slug, "pricing");

    // The dependent remains active.
    let user = fx.add_user(Role::Manager);
    fx.service
        .set_override(fx.super_admin, user, leaf.id, true)
        .unwrap();
    assert!(fx.decision_for(user, leaf.id).module_active);
}

#[test]
fn archived_modules_drop_out_of_resolution_and_listing() {
    let fx = fixture();
    let chat = fx.register("chat");
    let user = fx.add_user(Role::Manager);
    fx.service
        .set_override(fx.super_admin, user, chat.id, true)
        .unwrap();

    fx.service.archive_module(fx.super_admin, chat.id).unwrap();

    assert!(
        fx.service
            .resolve(user)
            .unwrap()
            .iter()
            .all(|d| d.module_id != chat.id)
    );
    assert!(fx.service.list_modules().iter().all(|m| m.id != chat.id));

    // Override provenance is still listed for audit purposes.
    let rows = fx.service.list_overrides(user).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].module_id, chat.id);
}

#[test]
fn hard_delete_of_active_module_requires_deactivation_first() {
    let fx = fixture();
    let m = fx.register("dispatch");

    let err = fx
        .service
        .hard_delete_module(fx.super_admin, m.id)
        .unwrap_err();
    assert!(matches!(err, DomainError::Conflict(_)));

    fx.service.deactivate_module(fx.super_admin, m.id).unwrap();
    fx.service.hard_delete_module(fx.super_admin, m.id).unwrap();
}

#[test]
fn tenant_admin_is_confined_to_their_tenant() {
    let fx = fixture();
    let reports = fx.register("reports");

    let admin_a = fx.add_user(Role::TenantAdmin);
    let other_tenant = TenantId::new();
    let user_b = fx.add_user_in(Role::Technician, other_tenant);

    let err = fx
        .service
        .set_override(admin_a, user_b, reports.id, true)
        .unwrap_err();
    assert_eq!(err, DomainError::Forbidden);

    // A super admin can cross tenants.
    fx.service
        .set_override(fx.super_admin, user_b, reports.id, true)
        .unwrap();
}

#[test]
fn non_admin_cannot_mutate_overrides_or_modules() {
    let fx = fixture();
    let reports = fx.register("reports");
    let manager = fx.add_user(Role::Manager);
    let technician = fx.add_user(Role::Technician);

    assert_eq!(
        fx.service
            .set_override(manager, technician, reports.id, true)
            .unwrap_err(),
        DomainError::Forbidden
    );
    assert_eq!(
        fx.service
            .deactivate_module(manager, reports.id)
            .unwrap_err(),
        DomainError::Forbidden
    );
}

#[test]
fn tenant_admin_cannot_administer_the_module_catalog() {
    let fx = fixture();
    let tenant_admin = fx.add_user(Role::TenantAdmin);

    let err = fx
        .service
        .register_module(tenant_admin, "Chat", "chat", false)
        .unwrap_err();
    assert_eq!(err, DomainError::Forbidden);
}

#[test]
fn tenant_user_listing_is_admin_gated() {
    let fx = fixture();
    let technician = fx.add_user(Role::Technician);
    let manager = fx.add_user(Role::Manager);

    let listed = fx
        .service
        .list_tenant_users(fx.super_admin, fx.tenant_id)
        .unwrap();
    assert!(listed.iter().any(|a| a.id == technician));
    assert!(listed.iter().any(|a| a.id == manager));

    assert_eq!(
        fx.service
            .list_tenant_users(technician, fx.tenant_id)
            .unwrap_err(),
        DomainError::Forbidden
    );
}

#[test]
fn resolving_an_unknown_user_is_not_found() {
    let fx = fixture();
    fx.register("reports");

    assert_eq!(
        fx.service.resolve(UserId::new()).unwrap_err(),
        DomainError::NotFound
    );
}

#[test]
fn every_successful_mutation_emits_one_audit_record() {
    let fx = fixture();
    let technician = fx.add_user(Role::Technician);

    let reports = fx.register("reports"); // 1: registered
    fx.service
        .set_override(fx.super_admin, technician, reports.id, true)
        .unwrap(); // 2: override set
    fx.service
        .reset_to_default(fx.super_admin, technician, reports.id)
        .unwrap(); // 3: override reset
    fx.service
        .deactivate_module(fx.super_admin, reports.id)
        .unwrap(); // 4: deactivated

    let actions: Vec<AuditAction> = fx.audit.records().iter().map(|r| r.action).collect();
    assert_eq!(
        actions,
        vec![
            AuditAction::ModuleRegistered,
            AuditAction::OverrideSet,
            AuditAction::OverrideReset,
            AuditAction::ModuleDeactivated,
        ]
    );
}

#[test]
fn failed_mutations_emit_no_audit_records() {
    let fx = fixture();
    let a = fx.register("alpha");
    let b = fx.register("bravo");
    fx.service.add_dependency(fx.super_admin, b.id, a.id).unwrap();
    let emitted = fx.audit.len();

    // Cycle rejection, forbidden actor, idempotent no-ops: none audited.
    let _ = fx.service.add_dependency(fx.super_admin, a.id, b.id);
    let manager = fx.add_user(Role::Manager);
    let _ = fx.service.deactivate_module(manager, a.id);
    fx.service
        .reset_to_default(fx.super_admin, manager, a.id)
        .unwrap();
    let _ = fx.service.add_dependency(fx.super_admin, b.id, a.id);

    assert_eq!(fx.audit.len(), emitted);
}

#[test]
fn second_set_override_replaces_provenance_not_duplicates() {
    let fx = fixture();
    let reports = fx.register("reports");
    let technician = fx.add_user(Role::Technician);
    let second_admin = fx.add_user(Role::SuperAdmin);

    fx.service
        .set_override(fx.super_admin, technician, reports.id, true)
        .unwrap();
    fx.service
        .set_override(second_admin, technician, reports.id, false)
        .unwrap();

    let rows = fx.service.list_overrides(technician).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].granted_by, second_admin);
    assert!(!rows[0].can_access);

    let decision = fx.decision_for(technician, reports.id);
    assert!(!decision.allowed);
    assert!(decision.is_customized);
}

#[test]
fn role_default_change_applies_to_uncustomized_users_only() {
    let fx = fixture();
    let reports = fx.register("reports");
    let plain = fx.add_user(Role::Technician);
    let customized = fx.add_user(Role::Technician);

    fx.service
        .set_override(fx.super_admin, customized, reports.id, false)
        .unwrap();
    fx.service
        .set_role_default(fx.super_admin, Role::Technician, reports.id, true)
        .unwrap();

    assert!(fx.decision_for(plain, reports.id).allowed);
    assert!(!fx.decision_for(customized, reports.id).allowed);
}

#[test]
fn resolution_lists_modules_in_name_order() {
    let fx = fixture();
    fx.register("zulu");
    fx.register("alpha");
    fx.register("mike");
    let user = fx.add_user(Role::Manager);

    let names: Vec<String> = fx
        .service
        .resolve(user)
        .unwrap()
        .into_iter()
        .map(|d| d.module_name)
        .collect();
    assert_eq!(names, vec!["ALPHA", "MIKE", "ZULU"]);
}
