//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// invariants, conflicts). Infrastructure concerns belong elsewhere.
///
/// Graph and lifecycle variants carry a human-readable message naming the
/// conflicting module slug(s) so admin screens can surface the cause instead
/// of a generic failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. malformed slug, no-op transition).
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A referenced user/module/edge does not exist.
    #[error("not found")]
    NotFound,

    /// The acting user lacks administrative rights over the target tenant.
    #[error("forbidden")]
    Forbidden,

    /// Adding the edge would create a dependency cycle (self-loops included).
    #[error("cyclic dependency: {0}")]
    CyclicDependency(String),

    /// Hard delete blocked: the module is a core module.
    #[error("dependency conflict: {0}")]
    DependencyConflict(String),

    /// Hard delete blocked: other modules still depend on this one.
    #[error("has dependents: {0}")]
    HasDependents(String),

    /// A concurrent write lost a race after commit; the caller may retry.
    #[error("conflict: {0}")]
    Conflict(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn cyclic(msg: impl Into<String>) -> Self {
        Self::CyclicDependency(msg.into())
    }

    pub fn dependency_conflict(msg: impl Into<String>) -> Self {
        Self::DependencyConflict(msg.into())
    }

    pub fn has_dependents(msg: impl Into<String>) -> Self {
        Self::HasDependents(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }
}
