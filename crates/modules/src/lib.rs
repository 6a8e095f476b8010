//! `fieldserv-modules` — feature modules, their lifecycle, and the
//! dependency graph between them.
//!
//! The graph is the one place a naive implementation could accumulate an
//! unrecoverable cycle; every insert is gated by an explicit reachability
//! check, never repaired in the background.

pub mod graph;
pub mod module;

pub use graph::{DependencyEdge, DependencyGraph, GraphError, HardDeleteBlock};
pub use module::{Module, ModuleStatus, Slug};
