//! Storage seams consumed by the admin service.
//!
//! Each trait owns the invariant its backing table enforces: the override
//! store owns (user, module) uniqueness through its key; the module store
//! owns acyclicity and delete safety by validating and committing inside one
//! critical section. Reads never block on anything longer than a single
//! lookup.

mod modules;
mod overrides;
mod users;

pub use modules::{InMemoryModuleStore, ModuleStore};
pub use overrides::{InMemoryOverrideStore, OverrideStore};
pub use users::{InMemoryUserDirectory, UserDirectory};
