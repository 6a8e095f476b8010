//! `fieldserv-access` — pure module-access resolution (zero-trust).
//!
//! This crate is intentionally decoupled from HTTP and storage. It holds the
//! RBAC vocabulary (roles, defaults, overrides) and the pure resolution
//! function that combines them into effective access decisions.

pub mod account;
pub mod defaults;
pub mod overrides;
pub mod resolve;
pub mod roles;

pub use account::{UserAccount, can_administer};
pub use defaults::RoleDefaults;
pub use overrides::PermissionOverride;
pub use resolve::{AccessDecision, CandidateModule, resolve_access};
pub use roles::Role;
