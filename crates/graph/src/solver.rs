//! Critical path computation.
//!
//! The critical path is the longest weighted path through the project DAG.
//! Because every edge carries the duration of the task it leads into, a path's
//! weight counts each task except the first exactly once.

use crate::{Error, ProjectGraph, Result};
use petgraph::Direction;
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, instrument};

/// The longest chain of dependent tasks and its total duration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CriticalPath {
    /// Task ids from the first prerequisite to the final dependent.
    pub path: Vec<String>,
    /// Sum of the edge weights along `path`.
    pub duration: f64,
}

impl CriticalPath {
    /// Whether the path contains no tasks (empty project).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }

    /// Whether a task lies on the critical path.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.path.iter().any(|task| task == id)
    }

    /// Whether `from -> to` is a step of the critical path.
    #[must_use]
    pub fn contains_step(&self, from: &str, to: &str) -> bool {
        self.path.windows(2).any(|step| step[0] == from && step[1] == to)
    }
}

/// Compute the critical path of a project graph.
///
/// Nodes are processed in topological order while tracking, per node, the best
/// cumulative weight of any path ending there and the predecessor that achieved
/// it. Every task with prerequisites gets a predecessor, even when all incoming
/// edges weigh 0, so the path always starts at a source. Among equally long
/// alternatives the predecessor reached first in topological order is kept.
///
/// The endpoint is the first sink in topological order with the greatest
/// weight. Weights are never negative, so no path through the graph is longer
/// than the best path ending at a sink.
///
/// An empty graph yields an empty path and a graph without edges yields its
/// first task with duration 0.
///
/// # Errors
///
/// Returns [`Error::CycleDetected`] naming the tasks on the cycle if the graph
/// is not acyclic. No partial path is returned.
#[instrument(skip_all, fields(tasks = graph.task_count(), edges = graph.edge_count()))]
pub fn longest_path(graph: &ProjectGraph) -> Result<CriticalPath> {
    let order = graph.sorted_indices()?;
    let dag = graph.inner();

    let mut best: HashMap<NodeIndex, f64> = order.iter().map(|&idx| (idx, 0.0)).collect();
    let mut predecessor: HashMap<NodeIndex, NodeIndex> = HashMap::new();

    for &node in &order {
        let reached = best[&node];
        for edge in dag.edges_directed(node, Direction::Outgoing) {
            let candidate = reached + edge.weight();
            let successor = edge.target();
            if candidate > best[&successor] || !predecessor.contains_key(&successor) {
                best.insert(successor, candidate);
                predecessor.insert(successor, node);
            }
        }
    }

    let mut endpoint: Option<(NodeIndex, f64)> = None;
    for &node in &order {
        if dag
            .edges_directed(node, Direction::Outgoing)
            .next()
            .is_some()
        {
            continue;
        }
        let weight = best[&node];
        if endpoint.is_none_or(|(_, longest)| weight > longest) {
            endpoint = Some((node, weight));
        }
    }

    let Some((end, duration)) = endpoint else {
        debug!("Empty project graph, critical path is empty");
        return Ok(CriticalPath::default());
    };

    let mut path = vec![dag[end].id.clone()];
    let mut current = end;
    while let Some(&previous) = predecessor.get(&current) {
        path.push(dag[previous].id.clone());
        current = previous;
    }
    path.reverse();

    debug!(length = path.len(), duration, "Computed critical path");
    Ok(CriticalPath { path, duration })
}

/// Sum of the edge weights along a path of task ids.
///
/// A single-task path weighs 0.
///
/// # Errors
///
/// Returns [`Error::UnknownTask`] if an id is not in the graph, or
/// [`Error::MissingEdge`] if two consecutive ids are not connected.
pub fn path_weight(graph: &ProjectGraph, path: &[impl AsRef<str>]) -> Result<f64> {
    for id in path {
        let id = id.as_ref();
        if graph.node_index(id).is_none() {
            return Err(Error::UnknownTask {
                task: id.to_string(),
            });
        }
    }

    path.windows(2).try_fold(0.0, |total, step| {
        let (from, to) = (step[0].as_ref(), step[1].as_ref());
        graph
            .edge_weight(from, to)
            .map(|weight| total + weight)
            .ok_or_else(|| Error::MissingEdge {
                from: from.to_string(),
                to: to.to_string(),
            })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Plan, TaskDefinition, build_plan};

    fn graph(yaml: &str) -> ProjectGraph {
        build_plan(&Plan::from_yaml_str(yaml).unwrap())
    }

    #[test]
    fn test_two_task_chain() {
        let graph = graph(
            r"
B:
  duration: 5
  dependencies:
    - A: { duration: 3, dependencies: [] }
",
        );
        let critical = longest_path(&graph).unwrap();
        assert_eq!(critical.path, ["A", "B"]);
        assert_eq!(critical.duration, 5.0);
    }

    #[test]
    fn test_single_task() {
        let graph = graph("solo: { duration: 10 }");
        let critical = longest_path(&graph).unwrap();
        assert_eq!(critical.path, ["solo"]);
        assert_eq!(critical.duration, 0.0);
    }

    #[test]
    fn test_empty_graph() {
        let critical = longest_path(&ProjectGraph::new()).unwrap();
        assert!(critical.is_empty());
        assert_eq!(critical.duration, 0.0);
    }

    #[test]
    fn test_independent_chains_pick_longer() {
        let graph = graph(
            r"
short_end:
  duration: 2
  dependencies:
    - short_start: { duration: 1 }
long_end:
  duration: 4
  dependencies:
    - long_mid:
        duration: 6
        dependencies:
          - long_start: { duration: 1 }
",
        );
        let critical = longest_path(&graph).unwrap();
        assert_eq!(critical.path, ["long_start", "long_mid", "long_end"]);
        assert_eq!(critical.duration, 10.0);
    }

    #[test]
    fn test_diamond_takes_heavier_branch() {
        let graph = graph(
            r"
end:
  duration: 1
  dependencies:
    - fast:
        duration: 2
        dependencies:
          - start: { duration: 1 }
    - slow:
        duration: 8
        dependencies:
          - start: { duration: 1 }
",
        );
        let critical = longest_path(&graph).unwrap();
        assert_eq!(critical.path, ["start", "slow", "end"]);
        assert_eq!(critical.duration, 9.0);
        assert_eq!(path_weight(&graph, &critical.path).unwrap(), critical.duration);
    }

    #[test]
    fn test_cycle_detected() {
        let graph = graph(
            r"
A:
  duration: 1
  dependencies:
    - B:
        duration: 2
        dependencies:
          - A: { duration: 1 }
",
        );
        match longest_path(&graph) {
            Err(Error::CycleDetected { cycle }) => assert_eq!(cycle, ["A", "B"]),
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_duration_tasks() {
        let graph = build_plan(&Plan::new(vec![
            TaskDefinition::new("b", 0.0).with_dependency(TaskDefinition::new("a", 0.0)),
        ]));
        let critical = longest_path(&graph).unwrap();
        assert_eq!(critical.duration, 0.0);
        assert_eq!(critical.path, ["a", "b"]);
    }

    #[test]
    fn test_zero_duration_prefix_starts_at_source() {
        let graph = graph(
            r"
build:
  duration: 5
  dependencies:
    - milestone:
        duration: 0
        dependencies:
          - kickoff: { duration: 0 }
",
        );
        let critical = longest_path(&graph).unwrap();
        assert_eq!(critical.path, ["kickoff", "milestone", "build"]);
        assert_eq!(critical.duration, 5.0);
    }

    #[test]
    fn test_zero_duration_tail_ends_at_sink() {
        let graph = graph(
            r"
signoff:
  duration: 0
  dependencies:
    - build:
        duration: 5
        dependencies:
          - fetch: { duration: 1 }
",
        );
        let critical = longest_path(&graph).unwrap();
        assert_eq!(critical.path, ["fetch", "build", "signoff"]);
        assert_eq!(critical.duration, 5.0);
    }

    #[test]
    fn test_cycle_reported_through_topological_sort() {
        let graph = graph("loop: { duration: 1, dependencies: [ { loop: { duration: 1 } } ] }");
        match longest_path(&graph) {
            Err(Error::CycleDetected { cycle }) => assert_eq!(cycle, ["loop"]),
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn test_fractional_durations() {
        let graph = graph(
            r"
b:
  duration: 1.5
  dependencies:
    - a: { duration: 0.25 }
",
        );
        assert_eq!(longest_path(&graph).unwrap().duration, 1.5);
    }

    #[test]
    fn test_path_weight_errors() {
        let graph = graph("b: { duration: 1, dependencies: [ { a: { duration: 1 } } ] }");
        assert!(matches!(
            path_weight(&graph, &["a", "z"]),
            Err(Error::UnknownTask { task }) if task == "z"
        ));
        assert!(matches!(
            path_weight(&graph, &["b", "a"]),
            Err(Error::MissingEdge { .. })
        ));
        assert_eq!(path_weight(&graph, &["a"]).unwrap(), 0.0);
        let empty: [&str; 0] = [];
        assert_eq!(path_weight(&graph, &empty).unwrap(), 0.0);
    }

    #[test]
    fn test_critical_path_helpers() {
        let critical = CriticalPath {
            path: vec!["a".into(), "b".into(), "c".into()],
            duration: 3.0,
        };
        assert!(critical.contains("b"));
        assert!(critical.contains_step("b", "c"));
        assert!(!critical.contains_step("a", "c"));
    }

    #[test]
    fn test_serializes_to_json() {
        let critical = CriticalPath {
            path: vec!["a".into(), "b".into()],
            duration: 5.0,
        };
        let json = serde_json::to_string(&critical).unwrap();
        assert_eq!(json, r#"{"path":["a","b"],"duration":5.0}"#);
    }
}
