use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use fieldserv_access::UserAccount;
use fieldserv_core::{TenantId, UserId};

/// Read side of the identity provider: accounts the core trusts as-is.
///
/// The core never verifies identity; it only needs the account's tenant,
/// role and activation flag to make policy decisions.
pub trait UserDirectory: Send + Sync {
    fn get(&self, id: UserId) -> Option<UserAccount>;
    fn upsert(&self, account: UserAccount);
    fn list_tenant(&self, tenant_id: TenantId) -> Vec<UserAccount>;
}

impl<D> UserDirectory for Arc<D>
where
    D: UserDirectory + ?Sized,
{
    fn get(&self, id: UserId) -> Option<UserAccount> {
        (**self).get(id)
    }

    fn upsert(&self, account: UserAccount) {
        (**self).upsert(account)
    }

    fn list_tenant(&self, tenant_id: TenantId) -> Vec<UserAccount> {
        (**self).list_tenant(tenant_id)
    }
}

/// In-memory user directory for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryUserDirectory {
    inner: RwLock<HashMap<UserId, UserAccount>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UserDirectory for InMemoryUserDirectory {
    fn get(&self, id: UserId) -> Option<UserAccount> {
        let map = self.inner.read().ok()?;
        map.get(&id).cloned()
    }

    fn upsert(&self, account: UserAccount) {
        if let Ok(mut map) = self.inner.write() {
            map.insert(account.id, account);
        }
    }

    fn list_tenant(&self, tenant_id: TenantId) -> Vec<UserAccount> {
        let map = match self.inner.read() {
            Ok(m) => m,
            Err(_) => return vec![],
        };
        map.values()
            .filter(|a| a.tenant_id == tenant_id)
            .cloned()
            .collect()
    }
}
