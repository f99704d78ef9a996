//! Self-contained SVG output.

use crate::Renderer;
use crate::layout::{Layout, Placement};
use critpath_graph::{CriticalPath, ProjectGraph};
use std::io::{self, Write};

const NODE_WIDTH: f64 = 160.0;
const NODE_HEIGHT: f64 = 52.0;
const LAYER_GAP: f64 = 80.0;
const ROW_GAP: f64 = 28.0;
const MARGIN: f64 = 24.0;
const FOOTER: f64 = 32.0;

const CRITICAL_COLOR: &str = "#d62728";
const EDGE_COLOR: &str = "#555555";

/// Renders a project graph as an SVG image with a layered layout.
///
/// Tasks are boxes labeled with their id and duration; edges are labeled with
/// their weight. Tasks and edges on the critical path are drawn in red.
#[derive(Debug, Clone, Copy, Default)]
pub struct SvgRenderer;

impl Renderer for SvgRenderer {
    fn render(
        &self,
        graph: &ProjectGraph,
        critical: Option<&CriticalPath>,
        out: &mut dyn Write,
    ) -> io::Result<()> {
        let layout = Layout::layered(graph);
        let width = span(layout.layers(), NODE_WIDTH, LAYER_GAP);
        let height = span(layout.rows(), NODE_HEIGHT, ROW_GAP) + FOOTER;

        writeln!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}" font-family="sans-serif" font-size="12">"#
        )?;
        writeln!(
            out,
            r#"  <defs><marker id="arrow" viewBox="0 0 10 10" refX="10" refY="5" markerWidth="8" markerHeight="8" orient="auto-start-reverse"><path d="M 0 0 L 10 5 L 0 10 z" fill="context-stroke"/></marker></defs>"#
        )?;
        writeln!(out, r#"  <rect width="100%" height="100%" fill="white"/>"#)?;

        for edge in graph.edges() {
            let (Some(from), Some(to)) = (layout.get(edge.from), layout.get(edge.to)) else {
                continue;
            };
            let on_path = critical.is_some_and(|c| c.contains_step(edge.from, edge.to));
            write_edge(out, from, to, edge.weight, on_path)?;
        }

        for placement in layout.placements() {
            let on_path = critical.is_some_and(|c| c.contains(&placement.task.id));
            write_node(out, placement, on_path)?;
        }

        if let Some(critical) = critical.filter(|c| !c.is_empty()) {
            writeln!(
                out,
                r#"  <text x="{MARGIN}" y="{}" fill="{CRITICAL_COLOR}">critical path: {} (duration {})</text>"#,
                height - FOOTER / 2.0,
                escape(&critical.path.join(" → ")),
                critical.duration
            )?;
        }

        writeln!(out, "</svg>")
    }

    fn extension(&self) -> &'static str {
        "svg"
    }
}

fn span(count: usize, size: f64, gap: f64) -> f64 {
    if count == 0 {
        return MARGIN * 2.0;
    }
    let count = count as f64;
    MARGIN.mul_add(2.0, count.mul_add(size, (count - 1.0) * gap))
}

fn origin(placement: &Placement<'_>) -> (f64, f64) {
    (
        (placement.layer as f64).mul_add(NODE_WIDTH + LAYER_GAP, MARGIN),
        (placement.row as f64).mul_add(NODE_HEIGHT + ROW_GAP, MARGIN),
    )
}

fn write_node(out: &mut dyn Write, placement: &Placement<'_>, on_path: bool) -> io::Result<()> {
    let (x, y) = origin(placement);
    let (stroke, fill, stroke_width) = if on_path {
        (CRITICAL_COLOR, "#fde2e1", 2.0)
    } else {
        ("#333333", "#eef3fb", 1.0)
    };
    let center = x + NODE_WIDTH / 2.0;

    writeln!(
        out,
        r#"  <rect x="{x}" y="{y}" width="{NODE_WIDTH}" height="{NODE_HEIGHT}" rx="8" fill="{fill}" stroke="{stroke}" stroke-width="{stroke_width}"/>"#
    )?;
    writeln!(
        out,
        r#"  <text x="{center}" y="{}" text-anchor="middle" font-weight="bold">{}</text>"#,
        y + 22.0,
        escape(&placement.task.id)
    )?;
    writeln!(
        out,
        r#"  <text x="{center}" y="{}" text-anchor="middle">duration: {}</text>"#,
        y + 40.0,
        placement.task.duration
    )
}

fn write_edge(
    out: &mut dyn Write,
    from: &Placement<'_>,
    to: &Placement<'_>,
    weight: f64,
    on_path: bool,
) -> io::Result<()> {
    let (fx, fy) = origin(from);
    let (tx, ty) = origin(to);
    let (x1, y1) = (fx + NODE_WIDTH, fy + NODE_HEIGHT / 2.0);
    let (x2, y2) = (tx, ty + NODE_HEIGHT / 2.0);
    let (stroke, stroke_width) = if on_path {
        (CRITICAL_COLOR, 2.5)
    } else {
        (EDGE_COLOR, 1.2)
    };

    writeln!(
        out,
        r#"  <line x1="{x1}" y1="{y1}" x2="{x2}" y2="{y2}" stroke="{stroke}" stroke-width="{stroke_width}" marker-end="url(#arrow)"/>"#
    )?;
    writeln!(
        out,
        r#"  <text x="{}" y="{}" text-anchor="middle" fill="{stroke}">{weight}</text>"#,
        (x1 + x2) / 2.0,
        (y1 + y2) / 2.0 - 4.0
    )
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
