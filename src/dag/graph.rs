// src/dag/graph.rs

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::sync::Arc;

use petgraph::Direction;
use petgraph::algo::toposort;
use petgraph::dot::{Config as DotConfig, Dot};
use petgraph::graph::{DiGraph, NodeIndex};
use tracing::debug;

use crate::config::Config;
use crate::errors::{Result, WorkdagError};
use crate::task::{Task, TaskHandle, TaskNode};
use crate::types::TaskId;

/// The set of tasks of one run and the edges implied by their `requires`.
///
/// Tasks are kept in insertion order, which is also the tie-break rule for
/// [`DependencyGraph::tsort`]. The graph is built before a run and only read
/// while executing; the lifecycle of each node lives behind its own lock.
#[derive(Debug)]
pub struct DependencyGraph {
    config: Config,
    nodes: Vec<Arc<TaskNode>>,
    index: HashMap<TaskId, usize>,
}

impl Default for DependencyGraph {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

impl DependencyGraph {
    /// Tasks added to this graph take their retry defaults from `config`.
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
            nodes: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Register a task. Fails if a task with the same id is already present.
    ///
    /// Dependencies may be added later; they are resolved by
    /// [`DependencyGraph::tsort`].
    pub fn add_task(&mut self, task: impl Task + 'static) -> Result<Arc<TaskNode>> {
        self.add_shared(Arc::new(task))
    }

    /// [`DependencyGraph::add_task`] for an already shared task.
    pub fn add_shared(&mut self, task: Arc<dyn Task>) -> Result<Arc<TaskNode>> {
        let id = task.id().to_string();
        if self.index.contains_key(&id) {
            return Err(WorkdagError::DuplicateTask(id));
        }

        let node = Arc::new(TaskNode::new(task, &self.config));
        debug!(task = %id, deps = node.requires().len(), "added task to graph");

        self.index.insert(id, self.nodes.len());
        self.nodes.push(Arc::clone(&node));
        Ok(node)
    }

    pub fn task(&self, id: &str) -> Option<&Arc<TaskNode>> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    /// All tasks in insertion order.
    pub fn tasks(&self) -> impl Iterator<Item = &Arc<TaskNode>> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Immediate dependencies of a task, flattened from its declared shape.
    pub fn dependencies_of(&self, id: &str) -> Vec<&str> {
        self.task(id)
            .map(|n| n.requires().iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Immediate dependents of a task, in insertion order.
    pub fn dependents_of(&self, id: &str) -> Vec<&str> {
        self.nodes
            .iter()
            .filter(|n| n.requires().iter().any(|dep| dep == id))
            .map(|n| n.id())
            .collect()
    }

    /// Topological order: every task after all of the tasks it depends on,
    /// ties broken by insertion order.
    ///
    /// Fails with [`WorkdagError::MissingDependency`] if a task requires an id
    /// that was never added, and with [`WorkdagError::DagCycle`] if the edges
    /// contain a cycle.
    pub fn tsort(&self) -> Result<Vec<Arc<TaskNode>>> {
        let graph = self.build_graph()?;

        let mut in_degree: Vec<usize> = graph
            .node_indices()
            .map(|n| graph.neighbors_directed(n, Direction::Incoming).count())
            .collect();

        let mut ready: BinaryHeap<Reverse<usize>> = in_degree
            .iter()
            .enumerate()
            .filter(|(_, d)| **d == 0)
            .map(|(i, _)| Reverse(i))
            .collect();

        let mut order = Vec::with_capacity(self.nodes.len());
        while let Some(Reverse(i)) = ready.pop() {
            order.push(Arc::clone(&self.nodes[i]));
            for next in graph.neighbors_directed(NodeIndex::new(i), Direction::Outgoing) {
                let j = next.index();
                in_degree[j] -= 1;
                if in_degree[j] == 0 {
                    ready.push(Reverse(j));
                }
            }
        }

        if order.len() < self.nodes.len() {
            return Err(WorkdagError::DagCycle(self.describe_cycle(&graph, &in_degree)));
        }

        Ok(order)
    }

    /// Bind a node to its upstream nodes and derive its input view.
    pub fn handle(&self, node: &Arc<TaskNode>) -> Result<TaskHandle> {
        let upstream = node
            .requires()
            .iter()
            .map(|dep| self.resolve(node.id(), dep).map(Arc::clone))
            .collect::<Result<Vec<_>>>()?;

        let input = node
            .requires()
            .try_map(|dep| self.resolve(node.id(), dep).map(|d| d.outputs().to_vec()))?;

        Ok(TaskHandle::new(Arc::clone(node), upstream, input))
    }

    /// Graphviz DOT text, with edges pointing from a dependency to its
    /// dependent. Unknown dependency ids are left out.
    pub fn to_dot(&self) -> String {
        let mut graph: DiGraph<&str, &str> = DiGraph::new();
        let indices: Vec<NodeIndex> = self.nodes.iter().map(|n| graph.add_node(n.id())).collect();

        for (i, node) in self.nodes.iter().enumerate() {
            for dep in node.requires().iter() {
                if let Some(&j) = self.index.get(dep) {
                    graph.add_edge(indices[j], indices[i], "");
                }
            }
        }

        format!("{}", Dot::with_config(&graph, &[DotConfig::EdgeNoLabel]))
    }

    fn resolve(&self, task: &str, dep: &str) -> Result<&Arc<TaskNode>> {
        self.task(dep).ok_or_else(|| WorkdagError::MissingDependency {
            task: task.to_string(),
            dependency: dep.to_string(),
        })
    }

    /// Build a petgraph graph whose node indices match insertion indices.
    ///
    /// Edge direction: dep -> task.
    fn build_graph(&self) -> Result<DiGraph<(), ()>> {
        let mut graph: DiGraph<(), ()> = DiGraph::with_capacity(self.nodes.len(), 0);
        for _ in &self.nodes {
            graph.add_node(());
        }

        for (i, node) in self.nodes.iter().enumerate() {
            for dep in node.requires().iter() {
                let j = self
                    .index
                    .get(dep)
                    .copied()
                    .ok_or_else(|| WorkdagError::MissingDependency {
                        task: node.id().to_string(),
                        dependency: dep.clone(),
                    })?;
                graph.add_edge(NodeIndex::new(j), NodeIndex::new(i), ());
            }
        }

        Ok(graph)
    }

    fn describe_cycle(&self, graph: &DiGraph<(), ()>, in_degree: &[usize]) -> String {
        // Prefer a node petgraph reports on the cycle itself; nodes left over
        // by Kahn's algorithm may only be downstream of it.
        let culprit = match toposort(graph, None) {
            Err(cycle) => cycle.node_id().index(),
            Ok(_) => in_degree.iter().position(|d| *d > 0).unwrap_or(0),
        };
        format!(
            "cycle detected in task DAG involving task '{}'",
            self.nodes[culprit].id()
        )
    }
}
