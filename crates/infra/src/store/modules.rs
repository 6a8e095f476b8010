//! Module catalog + dependency graph store.
//!
//! Rows and the graph live under a single lock so every mutation validates
//! and commits against the same snapshot: two concurrent `add_dependency`
//! calls cannot both pass the cycle check against a stale graph, and a
//! hard delete cannot race a dependent edge being inserted. A SQL-backed
//! implementation gets the same guarantee from serializable transactions
//! over the involved module rows.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};

use fieldserv_core::{DomainError, DomainResult, EdgeId, ModuleId};
use fieldserv_modules::{DependencyEdge, DependencyGraph, GraphError, HardDeleteBlock, Module};

/// Persistence seam for modules and their dependency edges.
///
/// Compound operations (cycle-gated insert, safety-gated delete) are part of
/// the contract so implementations own their atomicity. Error messages name
/// the conflicting module slugs — admin screens surface them verbatim.
pub trait ModuleStore: Send + Sync {
    /// Insert a new module; `Conflict` when the name or slug is taken.
    fn insert(&self, module: Module) -> DomainResult<()>;

    fn get(&self, id: ModuleId) -> Option<Module>;

    fn find_by_slug(&self, slug: &str) -> Option<Module>;

    /// Every non-hard-deleted row, archived included.
    fn list(&self) -> Vec<Module>;

    /// Rename; returns (updated row, previous name).
    fn rename(&self, id: ModuleId, name: String) -> DomainResult<(Module, String)>;

    fn activate(&self, id: ModuleId) -> DomainResult<Module>;

    /// Deactivate; returns the updated row plus its dependents so the caller
    /// can warn about them. Never cascades.
    fn deactivate(&self, id: ModuleId) -> DomainResult<(Module, Vec<Module>)>;

    fn archive(&self, id: ModuleId, now: DateTime<Utc>) -> DomainResult<Module>;

    /// Remove the row and its outgoing edges. Fails unless the module has
    /// left the `Active` state, is not core, and has no dependents.
    fn hard_delete(&self, id: ModuleId) -> DomainResult<Module>;

    /// Why hard delete is blocked right now, if it is. `NotFound` for an
    /// unknown module.
    fn hard_delete_block(&self, id: ModuleId) -> DomainResult<Option<HardDeleteBlock>>;

    /// Cycle-gated edge insert; the bool is false when the edge already
    /// existed (idempotent re-insert).
    fn add_dependency(&self, module_id: ModuleId, depends_on: ModuleId)
    -> DomainResult<(EdgeId, bool)>;

    fn remove_dependency(&self, edge_id: EdgeId) -> DomainResult<DependencyEdge>;

    /// Module rows that declare a dependency on `id`.
    fn dependents_of(&self, id: ModuleId) -> DomainResult<Vec<Module>>;

    /// Module rows that `id` depends on.
    fn dependencies_of(&self, id: ModuleId) -> DomainResult<Vec<Module>>;
}

impl<S> ModuleStore for Arc<S>
where
    S: ModuleStore + ?Sized,
{
    fn insert(&self, module: Module) -> DomainResult<()> {
        (**self).insert(module)
    }

    fn get(&self, id: ModuleId) -> Option<Module> {
        (**self).get(id)
    }

    fn find_by_slug(&self, slug: &str) -> Option<Module> {
        (**self).find_by_slug(slug)
    }

    fn list(&self) -> Vec<Module> {
        (**self).list()
    }

    fn rename(&self, id: ModuleId, name: String) -> DomainResult<(Module, String)> {
        (**self).rename(id, name)
    }

    fn activate(&self, id: ModuleId) -> DomainResult<Module> {
        (**self).activate(id)
    }

    fn deactivate(&self, id: ModuleId) -> DomainResult<(Module, Vec<Module>)> {
        (**self).deactivate(id)
    }

    fn archive(&self, id: ModuleId, now: DateTime<Utc>) -> DomainResult<Module> {
        (**self).archive(id, now)
    }

    fn hard_delete(&self, id: ModuleId) -> DomainResult<Module> {
        (**self).hard_delete(id)
    }

    fn hard_delete_block(&self, id: ModuleId) -> DomainResult<Option<HardDeleteBlock>> {
        (**self).hard_delete_block(id)
    }

    fn add_dependency(
        &self,
        module_id: ModuleId,
        depends_on: ModuleId,
    ) -> DomainResult<(EdgeId, bool)> {
        (**self).add_dependency(module_id, depends_on)
    }

    fn remove_dependency(&self, edge_id: EdgeId) -> DomainResult<DependencyEdge> {
        (**self).remove_dependency(edge_id)
    }

    fn dependents_of(&self, id: ModuleId) -> DomainResult<Vec<Module>> {
        (**self).dependents_of(id)
    }

    fn dependencies_of(&self, id: ModuleId) -> DomainResult<Vec<Module>> {
        (**self).dependencies_of(id)
    }
}

#[derive(Debug, Default)]
struct CatalogState {
    rows: HashMap<ModuleId, Module>,
    graph: DependencyGraph,
}

impl CatalogState {
    fn slug_of(&self, id: ModuleId) -> String {
        self.rows
            .get(&id)
            .map(|m| m.slug.to_string())
            .unwrap_or_else(|| id.to_string())
    }

    fn render_graph_error(&self, err: GraphError) -> DomainError {
        match err {
            GraphError::SelfLoop(id) => DomainError::cyclic(format!(
                "module '{}' cannot depend on itself",
                self.slug_of(id)
            )),
            GraphError::Cycle { path } => {
                let rendered: Vec<String> = path.iter().map(|id| self.slug_of(*id)).collect();
                DomainError::cyclic(format!("would create cycle {}", rendered.join(" -> ")))
            }
            GraphError::UnknownEdge(_) => DomainError::NotFound,
        }
    }

    fn require(&self, id: ModuleId) -> DomainResult<&Module> {
        self.rows.get(&id).ok_or(DomainError::NotFound)
    }

    fn rows_for(&self, ids: &[ModuleId]) -> Vec<Module> {
        ids.iter().filter_map(|id| self.rows.get(id).cloned()).collect()
    }
}

/// In-memory module catalog for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryModuleStore {
    state: RwLock<CatalogState>,
}

impl InMemoryModuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> DomainResult<RwLockReadGuard<'_, CatalogState>> {
        self.state
            .read()
            .map_err(|_| DomainError::conflict("module store lock poisoned"))
    }

    fn write(&self) -> DomainResult<RwLockWriteGuard<'_, CatalogState>> {
        self.state
            .write()
            .map_err(|_| DomainError::conflict("module store lock poisoned"))
    }
}

impl ModuleStore for InMemoryModuleStore {
    fn insert(&self, module: Module) -> DomainResult<()> {
        let mut state = self.write()?;
        if state.rows.values().any(|m| m.slug == module.slug) {
            return Err(DomainError::conflict(format!(
                "module slug '{}' already in use",
                module.slug
            )));
        }
        if state.rows.values().any(|m| m.name == module.name) {
            return Err(DomainError::conflict(format!(
                "module name '{}' already in use",
                module.name
            )));
        }
        state.rows.insert(module.id, module);
        Ok(())
    }

    fn get(&self, id: ModuleId) -> Option<Module> {
        self.read().ok()?.rows.get(&id).cloned()
    }

    fn find_by_slug(&self, slug: &str) -> Option<Module> {
        self.read()
            .ok()?
            .rows
            .values()
            .find(|m| m.slug.as_str() == slug)
            .cloned()
    }

    fn list(&self) -> Vec<Module> {
        match self.read() {
            Ok(state) => state.rows.values().cloned().collect(),
            Err(_) => vec![],
        }
    }

    fn rename(&self, id: ModuleId, name: String) -> DomainResult<(Module, String)> {
        let mut state = self.write()?;
        if state.rows.values().any(|m| m.id != id && m.name == name) {
            return Err(DomainError::conflict(format!(
                "module name '{name}' already in use"
            )));
        }
        let module = state.rows.get_mut(&id).ok_or(DomainError::NotFound)?;
        let previous = module.name.clone();
        module.rename(name)?;
        Ok((module.clone(), previous))
    }

    fn activate(&self, id: ModuleId) -> DomainResult<Module> {
        let mut state = self.write()?;
        let module = state.rows.get_mut(&id).ok_or(DomainError::NotFound)?;
        module.activate()?;
        Ok(module.clone())
    }

    fn deactivate(&self, id: ModuleId) -> DomainResult<(Module, Vec<Module>)> {
        let mut state = self.write()?;
        let module = state.rows.get_mut(&id).ok_or(DomainError::NotFound)?;
        module.deactivate()?;
        let updated = module.clone();
        let dependents = state.graph.dependents_of(id);
        Ok((updated, state.rows_for(&dependents)))
    }

    fn archive(&self, id: ModuleId, now: DateTime<Utc>) -> DomainResult<Module> {
        let mut state = self.write()?;
        let module = state.rows.get_mut(&id).ok_or(DomainError::NotFound)?;
        module.archive(now)?;
        Ok(module.clone())
    }

    fn hard_delete(&self, id: ModuleId) -> DomainResult<Module> {
        let mut state = self.write()?;
        let module = state.require(id)?.clone();

        module.ensure_deletable_state()?;
        match state.graph.hard_delete_block(id, module.is_core) {
            Some(HardDeleteBlock::CoreModule) => {
                return Err(DomainError::dependency_conflict(format!(
                    "module '{}' is a core module and cannot be deleted",
                    module.slug
                )));
            }
            Some(HardDeleteBlock::HasDependents(dependents)) => {
                let slugs: Vec<String> =
                    dependents.iter().map(|d| state.slug_of(*d)).collect();
                return Err(DomainError::has_dependents(format!(
                    "module '{}' is still required by: {}",
                    module.slug,
                    slugs.join(", ")
                )));
            }
            None => {}
        }

        state.graph.remove_module(id);
        state.rows.remove(&id);
        Ok(module)
    }

    fn hard_delete_block(&self, id: ModuleId) -> DomainResult<Option<HardDeleteBlock>> {
        let state = self.read()?;
        let module = state.require(id)?;
        Ok(state.graph.hard_delete_block(id, module.is_core))
    }

    fn add_dependency(
        &self,
        module_id: ModuleId,
        depends_on: ModuleId,
    ) -> DomainResult<(EdgeId, bool)> {
        let mut state = self.write()?;
        state.require(module_id)?;
        state.require(depends_on)?;

        let existed = state.graph.find_edge(module_id, depends_on).is_some();
        match state.graph.add_edge(module_id, depends_on) {
            Ok(edge_id) => Ok((edge_id, !existed)),
            Err(err) => Err(state.render_graph_error(err)),
        }
    }

    fn remove_dependency(&self, edge_id: EdgeId) -> DomainResult<DependencyEdge> {
        let mut state = self.write()?;
        match state.graph.remove_edge(edge_id) {
            Ok(edge) => Ok(edge),
            Err(err) => Err(state.render_graph_error(err)),
        }
    }

    fn dependents_of(&self, id: ModuleId) -> DomainResult<Vec<Module>> {
        let state = self.read()?;
        state.require(id)?;
        let ids = state.graph.dependents_of(id);
        Ok(state.rows_for(&ids))
    }

    fn dependencies_of(&self, id: ModuleId) -> DomainResult<Vec<Module>> {
        let state = self.read()?;
        state.require(id)?;
        let ids = state.graph.dependencies_of(id);
        Ok(state.rows_for(&ids))
    }
}
