//! Layered placement of tasks for drawing.
//!
//! Each task goes in the column given by its depth (longest chain of
//! prerequisites in edges); rows follow topological order within a column.

use critpath_graph::{ProjectGraph, TaskNode};
use std::collections::HashMap;
use tracing::debug;

/// Grid position of a single task.
#[derive(Debug, Clone, Copy)]
pub struct Placement<'a> {
    /// The placed task.
    pub task: &'a TaskNode,
    /// Column, counted from the sources.
    pub layer: usize,
    /// Row within the column.
    pub row: usize,
}

/// Grid positions for every task of a graph.
#[derive(Debug)]
pub struct Layout<'a> {
    placements: Vec<Placement<'a>>,
    by_id: HashMap<&'a str, usize>,
    layers: usize,
    rows: usize,
}

impl<'a> Layout<'a> {
    /// Compute a layered layout.
    ///
    /// Cyclic graphs have no depth, so their tasks share a single column in
    /// insertion order.
    #[must_use]
    pub fn layered(graph: &'a ProjectGraph) -> Self {
        let order: Vec<&TaskNode> = graph.topological_order().unwrap_or_else(|_| {
            debug!("Graph is cyclic, falling back to a single column layout");
            graph.tasks().collect()
        });
        let acyclic = !graph.has_cycles();

        let mut prerequisites: HashMap<&str, Vec<&str>> = HashMap::new();
        if acyclic {
            for edge in graph.edges() {
                prerequisites.entry(edge.to).or_default().push(edge.from);
            }
        }

        let mut depth: HashMap<&str, usize> = HashMap::new();
        let mut column_sizes: Vec<usize> = Vec::new();
        let mut placements = Vec::with_capacity(order.len());
        let mut by_id = HashMap::with_capacity(order.len());

        for task in order {
            let layer = prerequisites
                .get(task.id.as_str())
                .into_iter()
                .flatten()
                .filter_map(|prerequisite| depth.get(prerequisite))
                .map(|d| d + 1)
                .max()
                .unwrap_or(0);
            depth.insert(task.id.as_str(), layer);

            if layer >= column_sizes.len() {
                column_sizes.resize(layer + 1, 0);
            }
            let row = column_sizes[layer];
            column_sizes[layer] += 1;

            by_id.insert(task.id.as_str(), placements.len());
            placements.push(Placement { task, layer, row });
        }

        Self {
            placements,
            by_id,
            layers: column_sizes.len(),
            rows: column_sizes.into_iter().max().unwrap_or(0),
        }
    }

    /// All placements in drawing order.
    #[must_use]
    pub fn placements(&self) -> &[Placement<'a>] {
        &self.placements
    }

    /// Placement of a task by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Placement<'a>> {
        self.by_id.get(id).map(|&i| &self.placements[i])
    }

    /// Number of columns.
    #[must_use]
    pub fn layers(&self) -> usize {
        self.layers
    }

    /// Number of rows in the tallest column.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use critpath_graph::{Plan, build_plan};

    fn graph(yaml: &str) -> ProjectGraph {
        build_plan(&Plan::from_yaml_str(yaml).unwrap())
    }

    #[test]
    fn test_layers_follow_depth() {
        let graph = graph(
            r"
end:
  duration: 1
  dependencies:
    - left:
        duration: 2
        dependencies:
          - start: { duration: 1 }
    - right:
        duration: 3
        dependencies:
          - start: { duration: 1 }
",
        );
        let layout = Layout::layered(&graph);

        assert_eq!(layout.layers(), 3);
        assert_eq!(layout.rows(), 2);
        assert_eq!(layout.get("start").unwrap().layer, 0);
        assert_eq!(layout.get("left").unwrap().layer, 1);
        assert_eq!(layout.get("right").unwrap().layer, 1);
        assert_eq!(layout.get("end").unwrap().layer, 2);
        assert_ne!(layout.get("left").unwrap().row, layout.get("right").unwrap().row);
    }

    #[test]
    fn test_empty_graph() {
        let graph = ProjectGraph::new();
        let layout = Layout::layered(&graph);
        assert!(layout.placements().is_empty());
        assert_eq!(layout.layers(), 0);
        assert_eq!(layout.rows(), 0);
    }

    #[test]
    fn test_cyclic_graph_single_column() {
        let graph = graph(
            r"
a:
  duration: 1
  dependencies:
    - b:
        duration: 1
        dependencies:
          - a: { duration: 1 }
",
        );
        let layout = Layout::layered(&graph);
        assert_eq!(layout.layers(), 1);
        assert_eq!(layout.rows(), 2);
    }
}
