//! Pure effective-access resolution.
//!
//! Combines role defaults and per-user overrides into one decision per
//! candidate module. Precedence: **an override always wins over the role
//! default**, regardless of its value; module activation is applied after,
//! and the pre-activation decision stays visible separately so admin screens
//! can show "would have access if the module were active".

use serde::{Deserialize, Serialize};

use fieldserv_core::ModuleId;

use crate::{Role, RoleDefaults};

/// A module under consideration by the resolver.
///
/// A deliberately thin view: the resolver needs identity, a display name and
/// the activation flag, nothing else about the module row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateModule {
    pub id: ModuleId,
    pub name: String,
    pub active: bool,
}

/// Effective access decision for one (user, module) pair.
///
/// Derived, never persisted; recomputed on every query. Serializes to the
/// admin listing shape
/// `{ moduleId, moduleName, allowed, isCustomized, moduleActive }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessDecision {
    pub module_id: ModuleId,
    pub module_name: String,
    /// Usable access: the raw decision gated by module activation.
    pub allowed: bool,
    /// The raw decision before activation gating. Kept separate from
    /// `allowed`; the two must not be conflated in the API surface.
    pub would_allow: bool,
    /// True when an explicit override (either value) produced the decision.
    pub is_customized: bool,
    pub module_active: bool,
}

/// Resolve effective access for a user with `role` over `candidates`.
///
/// `override_lookup` returns the override value for a module if one exists
/// for the user; lookups are injected as a closure so the function stays pure
/// and storage-agnostic.
///
/// Per module:
/// 1. Override present → that value, `is_customized = true`.
/// 2. Else the role default (`false` when no row exists), `is_customized = false`.
/// 3. `allowed = raw && module_active`.
///
/// Denied access is a normal `allowed: false` decision, never an error.
pub fn resolve_access<O>(
    role: Role,
    candidates: &[CandidateModule],
    defaults: &RoleDefaults,
    override_lookup: O,
) -> Vec<AccessDecision>
where
    O: Fn(ModuleId) -> Option<bool>,
{
    candidates
        .iter()
        .map(|m| {
            let (would_allow, is_customized) = match override_lookup(m.id) {
                Some(value) => (value, true),
                None => (defaults.allows(role, m.id), false),
            };

            AccessDecision {
                module_id: m.id,
                module_name: m.name.clone(),
                allowed: would_allow && m.active,
                would_allow,
                is_customized,
                module_active: m.active,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(name: &str, active: bool) -> CandidateModule {
        CandidateModule {
            id: ModuleId::new(),
            name: name.to_string(),
            active,
        }
    }

    fn no_overrides(_: ModuleId) -> Option<bool> {
        None
    }

    #[test]
    fn default_fallback_when_no_override() {
        let reports = candidate("Reports", true);
        let mut defaults = RoleDefaults::new();
        defaults.grant(Role::Manager, reports.id);

        let decisions = resolve_access(
            Role::Manager,
            std::slice::from_ref(&reports),
            &defaults,
            no_overrides,
        );

        assert_eq!(decisions.len(), 1);
        assert!(decisions[0].allowed);
        assert!(decisions[0].would_allow);
        assert!(!decisions[0].is_customized);
    }

    #[test]
    fn missing_default_row_is_false_not_an_error() {
        let reports = candidate("Reports", true);
        let defaults = RoleDefaults::new();

        let decisions = resolve_access(
            Role::Technician,
            std::slice::from_ref(&reports),
            &defaults,
            no_overrides,
        );

        assert!(!decisions[0].allowed);
        assert!(!decisions[0].is_customized);
    }

    #[test]
    fn override_true_wins_over_default_false() {
        let reports = candidate("Reports", true);
        let defaults = RoleDefaults::new();
        let target = reports.id;

        let decisions = resolve_access(
            Role::Technician,
            std::slice::from_ref(&reports),
            &defaults,
            |id| (id == target).then_some(true),
        );

        assert!(decisions[0].allowed);
        assert!(decisions[0].is_customized);
    }

    #[test]
    fn override_false_wins_over_default_true() {
        let reports = candidate("Reports", true);
        let mut defaults = RoleDefaults::new();
        defaults.grant(Role::Manager, reports.id);
        let target = reports.id;

        let decisions = resolve_access(
            Role::Manager,
            std::slice::from_ref(&reports),
            &defaults,
            |id| (id == target).then_some(false),
        );

        assert!(!decisions[0].allowed);
        assert!(!decisions[0].would_allow);
        assert!(decisions[0].is_customized);
    }

    #[test]
    fn inactive_module_suppresses_allowed_but_not_raw_decision() {
        let chat = candidate("Chat", false);
        let target = chat.id;
        let defaults = RoleDefaults::new();

        let decisions = resolve_access(
            Role::Technician,
            std::slice::from_ref(&chat),
            &defaults,
            |id| (id == target).then_some(true),
        );

        assert!(!decisions[0].allowed, "inactive module must not be usable");
        assert!(decisions[0].would_allow, "raw decision stays visible");
        assert!(!decisions[0].module_active);
    }

    #[test]
    fn decisions_follow_candidate_order() {
        let a = candidate("Alpha", true);
        let b = candidate("Bravo", true);
        let defaults = RoleDefaults::new();

        let decisions = resolve_access(
            Role::Manager,
            &[a.clone(), b.clone()],
            &defaults,
            no_overrides,
        );

        assert_eq!(decisions[0].module_id, a.id);
        assert_eq!(decisions[1].module_id, b.id);
    }

    #[test]
    fn decision_serializes_to_admin_listing_shape() {
        let reports = candidate("Reports", true);
        let defaults = RoleDefaults::new();

        let decisions = resolve_access(
            Role::Manager,
            std::slice::from_ref(&reports),
            &defaults,
            no_overrides,
        );

        let json = serde_json::to_value(&decisions[0]).unwrap();
        for key in ["moduleId", "moduleName", "allowed", "isCustomized", "moduleActive"] {
            assert!(json.get(key).is_some(), "missing key {key}");
        }
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: with an override present, the decision equals the
            /// override value no matter what the role default says.
            #[test]
            fn override_always_wins(
                override_value: bool,
                default_value: bool,
                has_default_row: bool,
            ) {
                let module = candidate("Reports", true);
                let mut defaults = RoleDefaults::new();
                if has_default_row {
                    defaults.set(Role::Technician, module.id, default_value);
                }
                let target = module.id;

                let decisions = resolve_access(
                    Role::Technician,
                    std::slice::from_ref(&module),
                    &defaults,
                    |id| (id == target).then_some(override_value),
                );

                prop_assert_eq!(decisions[0].would_allow, override_value);
                prop_assert!(decisions[0].is_customized);
            }

            /// Property: resolution is deterministic (same inputs, same output).
            #[test]
            fn resolution_is_deterministic(active: bool, default_value: bool) {
                let module = candidate("Reports", active);
                let mut defaults = RoleDefaults::new();
                defaults.set(Role::Manager, module.id, default_value);

                let first = resolve_access(
                    Role::Manager,
                    std::slice::from_ref(&module),
                    &defaults,
                    no_overrides,
                );
                let second = resolve_access(
                    Role::Manager,
                    std::slice::from_ref(&module),
                    &defaults,
                    no_overrides,
                );

                prop_assert_eq!(first, second);
            }
        }
    }
}
