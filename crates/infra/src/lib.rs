//! `fieldserv-infra` — storage seams and the administrative service facade.
//!
//! Storage traits with in-memory implementations for tests/dev; a SQL-backed
//! deployment implements the same traits over serializable transactions.
//! [`admin::AccessAdminService`] wires stores, the resolver, the lifecycle
//! rules and the audit sink into the operations the admin API exposes.

pub mod admin;
pub mod store;

#[cfg(test)]
mod integration_tests;

pub use admin::{AccessAdminService, DependentsWarning, ModuleSummary};
pub use store::{
    InMemoryModuleStore, InMemoryOverrideStore, InMemoryUserDirectory, ModuleStore, OverrideStore,
    UserDirectory,
};
