//! Module entity and its lifecycle state machine.
//!
//! # Invariants
//! - `name` and `slug` are unique across modules (enforced by the store).
//! - `status` and `deleted_at` are the only fields that change after
//!   creation (rename aside).
//! - Core modules (`is_core`) can never be hard-deleted.
//! - Hard delete is reachable only from `Inactive`/`Archived`; an `Active`
//!   module must be deactivated or archived first.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use fieldserv_core::{DomainError, DomainResult, Entity, ModuleId};

// ─────────────────────────────────────────────────────────────────────────────
// Slug
// ─────────────────────────────────────────────────────────────────────────────

/// URL-safe machine handle for a module.
///
/// Lowercase ASCII alphanumerics plus `-`/`_`, no leading or trailing
/// separator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Slug(String);

impl Slug {
    pub fn parse(raw: &str) -> DomainResult<Self> {
        let s = raw.trim();
        if s.is_empty() {
            return Err(DomainError::validation("slug cannot be empty"));
        }
        if !s
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
        {
            return Err(DomainError::validation(format!(
                "slug '{s}' may only contain lowercase letters, digits, '-' and '_'"
            )));
        }
        if s.starts_with(['-', '_']) || s.ends_with(['-', '_']) {
            return Err(DomainError::validation(format!(
                "slug '{s}' cannot start or end with a separator"
            )));
        }
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Slug {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Status
// ─────────────────────────────────────────────────────────────────────────────

/// Module lifecycle status.
///
/// `Archived` is the soft-deleted state: the row survives (audit and
/// dependency history) but the module drops out of listings and candidate
/// sets. Hard deletion removes the row entirely and is gated separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ModuleStatus {
    #[default]
    Active,
    Inactive,
    Archived,
}

impl core::fmt::Display for ModuleStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ModuleStatus::Active => write!(f, "active"),
            ModuleStatus::Inactive => write!(f, "inactive"),
            ModuleStatus::Archived => write!(f, "archived"),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Module
// ─────────────────────────────────────────────────────────────────────────────

/// A named, addressable feature unit whose access is gated per user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub id: ModuleId,
    pub name: String,
    pub slug: Slug,
    pub status: ModuleStatus,
    pub is_core: bool,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Module {
    pub fn new(id: ModuleId, name: impl Into<String>, slug: Slug, is_core: bool) -> Self {
        Self {
            id,
            name: name.into(),
            slug,
            status: ModuleStatus::Active,
            is_core,
            deleted_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == ModuleStatus::Active
    }

    pub fn is_archived(&self) -> bool {
        self.status == ModuleStatus::Archived
    }

    /// `Active → Inactive`. Always allowed; dependents are warned about at
    /// the service layer, never cascaded.
    pub fn deactivate(&mut self) -> DomainResult<()> {
        match self.status {
            ModuleStatus::Active => {
                self.status = ModuleStatus::Inactive;
                Ok(())
            }
            ModuleStatus::Inactive => {
                Err(DomainError::validation(format!("module '{}' is already inactive", self.slug)))
            }
            ModuleStatus::Archived => {
                Err(DomainError::validation(format!("module '{}' is archived", self.slug)))
            }
        }
    }

    /// `Inactive → Active`. Always allowed.
    pub fn activate(&mut self) -> DomainResult<()> {
        match self.status {
            ModuleStatus::Inactive => {
                self.status = ModuleStatus::Active;
                Ok(())
            }
            ModuleStatus::Active => {
                Err(DomainError::validation(format!("module '{}' is already active", self.slug)))
            }
            ModuleStatus::Archived => Err(DomainError::validation(format!(
                "module '{}' is archived and cannot be activated",
                self.slug
            ))),
        }
    }

    /// `Active|Inactive → Archived` (soft delete). Sets `deleted_at`.
    pub fn archive(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        if self.status == ModuleStatus::Archived {
            return Err(DomainError::validation(format!(
                "module '{}' is already archived",
                self.slug
            )));
        }
        self.status = ModuleStatus::Archived;
        self.deleted_at = Some(now);
        Ok(())
    }

    /// Guard for hard deletion: the row may only be removed once the module
    /// has left the `Active` state. Graph and core-module gates are checked
    /// separately ([`crate::DependencyGraph::hard_delete_block`]).
    pub fn ensure_deletable_state(&self) -> DomainResult<()> {
        if self.status == ModuleStatus::Active {
            return Err(DomainError::conflict(format!(
                "module '{}' is active; deactivate or archive it before deleting",
                self.slug
            )));
        }
        Ok(())
    }

    pub fn rename(&mut self, name: impl Into<String>) -> DomainResult<()> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("module name cannot be empty"));
        }
        self.name = name.trim().to_string();
        Ok(())
    }
}

impl Entity for Module {
    type Id = ModuleId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
