//! The directed `depends_on` relation between modules.
//!
//! Arena-style adjacency (module id → list of dependency ids) with an
//! explicit DFS reachability check gating every insert. Invariants:
//!
//! - **I1**: the graph is acyclic at all times; a violating insert is
//!   rejected with no partial state.
//! - **I2**: a self-loop is a degenerate cycle and is rejected by the same
//!   check, without running the full search.
//!
//! O(V+E) per insert is acceptable: dependency graphs are edited rarely and
//! stay small (tens to low hundreds of modules).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use fieldserv_core::{EdgeId, ModuleId};

/// A directed edge: `module_id` requires `depends_on` to be meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyEdge {
    pub id: EdgeId,
    pub module_id: ModuleId,
    pub depends_on: ModuleId,
}

/// Graph-level failure; the service layer renders these with module slugs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// Inserting the edge would close a cycle; the path runs from the
    /// would-be dependency back to the inserting module.
    #[error("edge would create a cycle")]
    Cycle { path: Vec<ModuleId> },

    /// A module cannot depend on itself.
    #[error("module cannot depend on itself")]
    SelfLoop(ModuleId),

    /// The referenced edge does not exist.
    #[error("unknown edge {0}")]
    UnknownEdge(EdgeId),
}

/// Why a module cannot be hard-deleted right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HardDeleteBlock {
    /// Core modules are never hard-deleted, dependents or not.
    CoreModule,
    /// Other modules still declare a dependency on this one.
    HasDependents(Vec<ModuleId>),
}

/// In-memory dependency graph over modules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    edges: HashMap<EdgeId, DependencyEdge>,
    /// module id → ids of modules it depends on (forward adjacency).
    forward: HashMap<ModuleId, Vec<ModuleId>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `module_id depends_on dependency`.
    ///
    /// Runs the cycle gate first; on rejection the graph is untouched.
    /// Inserting an edge that already exists is a no-op returning the
    /// existing edge id.
    pub fn add_edge(
        &mut self,
        module_id: ModuleId,
        depends_on: ModuleId,
    ) -> Result<EdgeId, GraphError> {
        if module_id == depends_on {
            return Err(GraphError::SelfLoop(module_id));
        }

        if let Some(existing) = self
            .edges
            .values()
            .find(|e| e.module_id == module_id && e.depends_on == depends_on)
        {
            return Ok(existing.id);
        }

        // Would `depends_on` reach back to `module_id` through existing
        // edges? If so the new edge closes a cycle.
        if let Some(mut path) = self.path_between(depends_on, module_id) {
            path.insert(0, module_id);
            return Err(GraphError::Cycle { path });
        }

        let edge = DependencyEdge {
            id: EdgeId::new(),
            module_id,
            depends_on,
        };
        self.forward.entry(module_id).or_default().push(depends_on);
        let id = edge.id;
        self.edges.insert(id, edge);
        Ok(id)
    }

    /// Remove an edge by id. Always safe; removal can never create a cycle.
    pub fn remove_edge(&mut self, edge_id: EdgeId) -> Result<DependencyEdge, GraphError> {
        let edge = self
            .edges
            .remove(&edge_id)
            .ok_or(GraphError::UnknownEdge(edge_id))?;

        if let Some(deps) = self.forward.get_mut(&edge.module_id) {
            if let Some(pos) = deps.iter().position(|d| *d == edge.depends_on) {
                deps.remove(pos);
            }
            if deps.is_empty() {
                self.forward.remove(&edge.module_id);
            }
        }
        Ok(edge)
    }

    /// Remove every outgoing edge of `module_id` (hard-delete cleanup).
    ///
    /// Callers must have verified there are no incoming edges first.
    pub fn remove_module(&mut self, module_id: ModuleId) {
        self.edges.retain(|_, e| e.module_id != module_id);
        self.forward.remove(&module_id);
    }

    /// Modules `module_id` directly depends on.
    pub fn dependencies_of(&self, module_id: ModuleId) -> Vec<ModuleId> {
        self.forward.get(&module_id).cloned().unwrap_or_default()
    }

    /// Modules that declare a dependency *on* `module_id`.
    pub fn dependents_of(&self, module_id: ModuleId) -> Vec<ModuleId> {
        let mut out: Vec<ModuleId> = self
            .edges
            .values()
            .filter(|e| e.depends_on == module_id)
            .map(|e| e.module_id)
            .collect();
        out.sort_by_key(|id| *id.as_uuid());
        out.dedup();
        out
    }

    /// The edge record for `(module_id, depends_on)`, if present.
    pub fn find_edge(&self, module_id: ModuleId, depends_on: ModuleId) -> Option<&DependencyEdge> {
        self.edges
            .values()
            .find(|e| e.module_id == module_id && e.depends_on == depends_on)
    }

    pub fn edges(&self) -> impl Iterator<Item = &DependencyEdge> {
        self.edges.values()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Why `module_id` cannot be hard-deleted, if anything blocks it.
    pub fn hard_delete_block(&self, module_id: ModuleId, is_core: bool) -> Option<HardDeleteBlock> {
        if is_core {
            return Some(HardDeleteBlock::CoreModule);
        }
        let dependents = self.dependents_of(module_id);
        if dependents.is_empty() {
            None
        } else {
            Some(HardDeleteBlock::HasDependents(dependents))
        }
    }

    /// Iterative DFS along forward edges; returns the path `from → … → to`
    /// when `to` is reachable from `from`.
    fn path_between(&self, from: ModuleId, to: ModuleId) -> Option<Vec<ModuleId>> {
        let mut stack = vec![vec![from]];
        let mut visited = std::collections::HashSet::new();

        while let Some(path) = stack.pop() {
            let current = *path.last().unwrap_or(&from);
            if current == to {
                return Some(path);
            }
            if !visited.insert(current) {
                continue;
            }
            if let Some(next) = self.forward.get(&current) {
                for dep in next {
                    if !visited.contains(dep) {
                        let mut longer = path.clone();
                        longer.push(*dep);
                        stack.push(longer);
                    }
                }
            }
        }
        None
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
