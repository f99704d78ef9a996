//! Project dependency graph backed by petgraph.
//!
//! Nodes are tasks keyed by id; edges run from a prerequisite to the task that
//! depends on it and carry the dependent task's duration as their weight.

use crate::{Error, Result};
use petgraph::Direction;
use petgraph::algo::{is_cyclic_directed, tarjan_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{EdgeRef, IntoNodeReferences};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, warn};

/// A task node in the project graph.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskNode {
    /// Task id.
    pub id: String,
    /// Task duration.
    pub duration: f64,
}

impl fmt::Display for TaskNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// A dependency edge, prerequisite first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DependencyEdge<'a> {
    /// The prerequisite task id.
    pub from: &'a str,
    /// The dependent task id.
    pub to: &'a str,
    /// Duration of the dependent task.
    pub weight: f64,
}

/// Directed dependency graph of a project.
///
/// All mutation goes through [`ProjectGraph::upsert_task`] and
/// [`ProjectGraph::upsert_edge`], which never create duplicates.
#[derive(Debug, Clone, Default)]
pub struct ProjectGraph {
    graph: DiGraph<TaskNode, f64>,
    id_to_node: HashMap<String, NodeIndex>,
}

impl ProjectGraph {
    /// Create a new empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a task, or update the duration of an existing one.
    ///
    /// Returns the node index of the task.
    pub fn upsert_task(&mut self, id: &str, duration: f64) -> NodeIndex {
        if let Some(&node) = self.id_to_node.get(id) {
            let existing = &mut self.graph[node];
            if existing.duration.to_bits() != duration.to_bits() {
                warn!(
                    task = id,
                    previous = existing.duration,
                    duration, "Task declared with conflicting durations, keeping the latest"
                );
                existing.duration = duration;
            }
            return node;
        }

        let node = self.graph.add_node(TaskNode {
            id: id.to_string(),
            duration,
        });
        self.id_to_node.insert(id.to_string(), node);
        debug!("Added task node '{}' (duration {})", id, duration);
        node
    }

    /// Add an edge `from -> to`, or overwrite the weight of the existing one.
    pub fn upsert_edge(&mut self, from: NodeIndex, to: NodeIndex, weight: f64) {
        self.graph.update_edge(from, to, weight);
        debug!(
            "Linked '{}' -> '{}' (weight {})",
            self.graph[from].id, self.graph[to].id, weight
        );
    }

    /// Number of tasks in the graph.
    #[must_use]
    pub fn task_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of dependency edges in the graph.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Whether the graph has no tasks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Check if a task exists in the graph.
    #[must_use]
    pub fn contains_task(&self, id: &str) -> bool {
        self.id_to_node.contains_key(id)
    }

    /// Get a task by id.
    #[must_use]
    pub fn task(&self, id: &str) -> Option<&TaskNode> {
        self.id_to_node
            .get(id)
            .and_then(|&idx| self.graph.node_weight(idx))
    }

    /// Duration of a task by id.
    #[must_use]
    pub fn duration(&self, id: &str) -> Option<f64> {
        self.task(id).map(|task| task.duration)
    }

    /// Weight of the edge `from -> to`, if it exists.
    #[must_use]
    pub fn edge_weight(&self, from: &str, to: &str) -> Option<f64> {
        let from = *self.id_to_node.get(from)?;
        let to = *self.id_to_node.get(to)?;
        self.graph
            .find_edge(from, to)
            .and_then(|edge| self.graph.edge_weight(edge))
            .copied()
    }

    /// Iterate over all tasks in insertion order.
    pub fn tasks(&self) -> impl Iterator<Item = &TaskNode> {
        self.graph.node_references().map(|(_, node)| node)
    }

    /// Iterate over all edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = DependencyEdge<'_>> {
        self.graph.edge_references().map(|edge| DependencyEdge {
            from: &self.graph[edge.source()].id,
            to: &self.graph[edge.target()].id,
            weight: *edge.weight(),
        })
    }

    /// Tasks with no prerequisites.
    pub fn sources(&self) -> impl Iterator<Item = &TaskNode> {
        self.graph
            .externals(Direction::Incoming)
            .map(|idx| &self.graph[idx])
    }

    /// Tasks nothing depends on.
    pub fn sinks(&self) -> impl Iterator<Item = &TaskNode> {
        self.graph
            .externals(Direction::Outgoing)
            .map(|idx| &self.graph[idx])
    }

    /// Check if the graph has cycles.
    #[must_use]
    pub fn has_cycles(&self) -> bool {
        is_cyclic_directed(&self.graph)
    }

    /// Ids of every task that sits on a cycle, sorted.
    ///
    /// Empty when the graph is acyclic.
    #[must_use]
    pub fn cycle_members(&self) -> Vec<String> {
        let mut members: Vec<String> = tarjan_scc(&self.graph)
            .into_iter()
            .filter(|component| match component.as_slice() {
                [single] => self.graph.contains_edge(*single, *single),
                _ => true,
            })
            .flatten()
            .map(|idx| self.graph[idx].id.clone())
            .collect();
        members.sort();
        members
    }

    /// Check that the graph is acyclic without solving it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CycleDetected`] naming every task that sits on a cycle.
    pub fn validate(&self) -> Result<()> {
        if self.has_cycles() {
            return Err(Error::CycleDetected {
                cycle: self.cycle_members(),
            });
        }
        debug!(tasks = self.task_count(), "Project graph is acyclic");
        Ok(())
    }

    /// Get the tasks in topological order (prerequisites first).
    ///
    /// # Errors
    ///
    /// Returns [`Error::CycleDetected`] if the graph contains cycles.
    pub fn topological_order(&self) -> Result<Vec<&TaskNode>> {
        Ok(self
            .sorted_indices()?
            .into_iter()
            .map(|idx| &self.graph[idx])
            .collect())
    }

    pub(crate) fn sorted_indices(&self) -> Result<Vec<NodeIndex>> {
        toposort(&self.graph, None).map_err(|_| Error::CycleDetected {
            cycle: self.cycle_members(),
        })
    }

    pub(crate) fn node_index(&self, id: &str) -> Option<NodeIndex> {
        self.id_to_node.get(id).copied()
    }

    /// The underlying petgraph graph, for read-only algorithms and output.
    #[must_use]
    pub fn inner(&self) -> &DiGraph<TaskNode, f64> {
        &self.graph
    }
}
