// src/dag/mod.rs

//! Dependency graph.
//!
//! - [`graph`] holds the tasks of a run, produces the deterministic
//!   topological order, rejects cycles and unknown dependencies, and binds
//!   nodes to their upstream nodes for the executor.

pub mod graph;

pub use graph::DependencyGraph;
