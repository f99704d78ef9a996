//! Conversion of a nested [`Plan`] into a [`ProjectGraph`].

use crate::{Plan, ProjectGraph, Result, TaskDefinition};
use petgraph::graph::NodeIndex;
use serde_yaml::Value;
use tracing::{debug, instrument};

/// Builds a project graph from nested task definitions.
///
/// Shared prerequisites are collapsed through idempotent upserts, so the same
/// subtree may be visited any number of times.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    graph: ProjectGraph,
}

impl GraphBuilder {
    /// Create a builder with an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add every task of a plan to the graph.
    #[must_use]
    pub fn with_plan(mut self, plan: &Plan) -> Self {
        for task in &plan.tasks {
            self.add_task(task);
        }
        self
    }

    /// Add a task and, recursively, its prerequisites.
    ///
    /// Returns the node index of the task.
    pub fn add_task(&mut self, task: &TaskDefinition) -> NodeIndex {
        let node = self.graph.upsert_task(&task.id, task.duration);
        for dependency in &task.dependencies {
            let prerequisite = self.add_task(dependency);
            self.graph.upsert_edge(prerequisite, node, task.duration);
        }
        node
    }

    /// Finish building and return the graph.
    #[must_use]
    pub fn build(self) -> ProjectGraph {
        debug!(
            tasks = self.graph.task_count(),
            edges = self.graph.edge_count(),
            "Built project graph"
        );
        self.graph
    }
}

/// Build a graph from an already validated plan.
#[must_use]
pub fn build_plan(plan: &Plan) -> ProjectGraph {
    GraphBuilder::new().with_plan(plan).build()
}

/// Validate a raw nested task mapping and build its graph.
///
/// # Errors
///
/// Returns [`crate::Error::MalformedInput`] naming the offending task if any
/// definition is invalid. No partial graph is produced.
#[instrument(skip_all)]
pub fn build(tasks: &Value) -> Result<ProjectGraph> {
    let plan = Plan::from_value(tasks)?;
    Ok(build_plan(&plan))
}
