use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use fieldserv_access::PermissionOverride;
use fieldserv_core::{ModuleId, UserId};

/// Persistence seam for per-user permission overrides.
///
/// Uniqueness of (user, module) is enforced by the store's key, not by
/// caller discipline: `upsert` replaces the prior row (value and provenance)
/// and returns it, so callers can audit the previous value.
pub trait OverrideStore: Send + Sync {
    /// Insert or replace the override row; returns the replaced row, if any.
    fn upsert(&self, record: PermissionOverride) -> Option<PermissionOverride>;

    /// Delete the row if present; returns it. Absence is not an error
    /// (reset-to-default is idempotent).
    fn remove(&self, user_id: UserId, module_id: ModuleId) -> Option<PermissionOverride>;

    fn get(&self, user_id: UserId, module_id: ModuleId) -> Option<PermissionOverride>;

    /// All overrides for a user, for the audit/"customized" badge listing.
    fn list_for_user(&self, user_id: UserId) -> Vec<PermissionOverride>;
}

impl<S> OverrideStore for Arc<S>
where
    S: OverrideStore + ?Sized,
{
    fn upsert(&self, record: PermissionOverride) -> Option<PermissionOverride> {
        (**self).upsert(record)
    }

    fn remove(&self, user_id: UserId, module_id: ModuleId) -> Option<PermissionOverride> {
        (**self).remove(user_id, module_id)
    }

    fn get(&self, user_id: UserId, module_id: ModuleId) -> Option<PermissionOverride> {
        (**self).get(user_id, module_id)
    }

    fn list_for_user(&self, user_id: UserId) -> Vec<PermissionOverride> {
        (**self).list_for_user(user_id)
    }
}

/// In-memory override store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryOverrideStore {
    inner: RwLock<HashMap<(UserId, ModuleId), PermissionOverride>>,
}

impl InMemoryOverrideStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OverrideStore for InMemoryOverrideStore {
    fn upsert(&self, record: PermissionOverride) -> Option<PermissionOverride> {
        let mut map = self.inner.write().ok()?;
        map.insert((record.user_id, record.module_id), record)
    }

    fn remove(&self, user_id: UserId, module_id: ModuleId) -> Option<PermissionOverride> {
        let mut map = self.inner.write().ok()?;
        map.remove(&(user_id, module_id))
    }

    fn get(&self, user_id: UserId, module_id: ModuleId) -> Option<PermissionOverride> {
        let map = self.inner.read().ok()?;
        map.get(&(user_id, module_id)).cloned()
    }

    fn list_for_user(&self, user_id: UserId) -> Vec<PermissionOverride> {
        let map = match self.inner.read() {
            Ok(m) => m,
            Err(_) => return vec![],
        };
        let mut rows: Vec<PermissionOverride> = map
            .iter()
            .filter_map(|((u, _m), v)| if *u == user_id { Some(v.clone()) } else { None })
            .collect();
        rows.sort_by_key(|r| *r.module_id.as_uuid());
        rows
    }
}
