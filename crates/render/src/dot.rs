//! Graphviz DOT output.

use crate::Renderer;
use critpath_graph::{CriticalPath, ProjectGraph};
use petgraph::dot::{Config, Dot, RankDir};
use petgraph::visit::EdgeRef;
use std::io::{self, Write};

const CRITICAL_COLOR: &str = "#d62728";

/// Renders a project graph as Graphviz source.
///
/// Nodes are numbered by their graph index and labeled with the task id and
/// duration. Feed the output to `dot -Tpng` (or any other Graphviz layout
/// engine) to get a raster image.
#[derive(Debug, Clone, Copy, Default)]
pub struct DotRenderer;

impl Renderer for DotRenderer {
    fn render(
        &self,
        graph: &ProjectGraph,
        critical: Option<&CriticalPath>,
        out: &mut dyn Write,
    ) -> io::Result<()> {
        let dag = graph.inner();
        let highlight = |on_path: bool| {
            if on_path {
                format!("color = \"{CRITICAL_COLOR}\" penwidth = 2 ")
            } else {
                String::new()
            }
        };

        let edge_attrs = |_, edge: petgraph::graph::EdgeReference<'_, _>| {
            let (from, to) = (&dag[edge.source()].id, &dag[edge.target()].id);
            format!(
                "label = \"{}\" {}",
                edge.weight(),
                highlight(critical.is_some_and(|c| c.contains_step(from, to)))
            )
        };
        let node_attrs = |_, (_, task): (_, &critpath_graph::TaskNode)| {
            format!(
                "label = \"{}\\nduration: {}\" {}",
                escape(&task.id),
                task.duration,
                highlight(critical.is_some_and(|c| c.contains(&task.id)))
            )
        };
        let dot = Dot::with_attr_getters(
            dag,
            &[
                Config::NodeNoLabel,
                Config::EdgeNoLabel,
                Config::GraphContentOnly,
                Config::RankDir(RankDir::LR),
            ],
            &edge_attrs,
            &node_attrs,
        );

        writeln!(out, "digraph project {{")?;
        writeln!(
            out,
            "    node [shape=box, style=\"rounded,filled\", fillcolor=white]"
        )?;
        write!(out, "{dot}")?;
        if let Some(critical) = critical.filter(|c| !c.is_empty()) {
            writeln!(out, "    label=\"critical path: {}\"", critical.duration)?;
        }
        writeln!(out, "}}")
    }

    fn extension(&self) -> &'static str {
        "dot"
    }
}

fn escape(id: &str) -> String {
    id.replace('\\', "\\\\").replace('"', "\\\"")
}
