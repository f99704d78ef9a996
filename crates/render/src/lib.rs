//! Visualizations of critpath project graphs.
//!
//! Rendering is kept apart from the graph crate: renderers only read a
//! [`ProjectGraph`] and an optional [`CriticalPath`] to highlight.
//!
//! # Example
//!
//! ```
//! use critpath_graph::{Plan, build_plan, longest_path};
//! use critpath_render::{OutputFormat, Renderer};
//!
//! let graph = build_plan(&Plan::from_yaml_str("a: { duration: 1 }")?);
//! let critical = longest_path(&graph)?;
//!
//! let mut svg = Vec::new();
//! OutputFormat::Svg
//!     .renderer()
//!     .render(&graph, Some(&critical), &mut svg)?;
//! assert!(svg.starts_with(b"<svg"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod dot;
mod error;
mod layout;
mod svg;

pub use dot::DotRenderer;
pub use error::{Error, Result};
pub use layout::{Layout, Placement};
pub use svg::SvgRenderer;

use critpath_graph::{CriticalPath, ProjectGraph};
use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::str::FromStr;
use tracing::info;

/// Something that can draw a project graph.
pub trait Renderer {
    /// Write the rendering of `graph` to `out`, highlighting `critical` when given.
    ///
    /// # Errors
    ///
    /// Returns any error produced by the writer.
    fn render(
        &self,
        graph: &ProjectGraph,
        critical: Option<&CriticalPath>,
        out: &mut dyn Write,
    ) -> io::Result<()>;

    /// Conventional file extension for the output.
    fn extension(&self) -> &'static str;
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Self-contained SVG image.
    #[default]
    Svg,
    /// Graphviz DOT source.
    Dot,
}

impl OutputFormat {
    /// Pick the format from a file extension.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedFormat`] if the extension is missing or unknown.
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();
        extension.parse()
    }

    /// The renderer producing this format.
    #[must_use]
    pub fn renderer(self) -> Box<dyn Renderer> {
        match self {
            Self::Svg => Box::new(SvgRenderer),
            Self::Dot => Box::new(DotRenderer),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "svg" => Ok(Self::Svg),
            "dot" | "gv" => Ok(Self::Dot),
            _ => Err(Error::UnsupportedFormat {
                format: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Svg => write!(f, "svg"),
            Self::Dot => write!(f, "dot"),
        }
    }
}

/// Render a graph into a file, creating missing parent directories.
///
/// # Errors
///
/// Returns [`Error::Io`] if the directory or file cannot be written.
pub fn render_to_file(
    renderer: &dyn Renderer,
    graph: &ProjectGraph,
    critical: Option<&CriticalPath>,
    path: &Path,
) -> Result<()> {
    let io_error = |operation: &str| {
        let path = path.to_path_buf();
        let operation = operation.to_string();
        move |source| Error::Io {
            source,
            path: Some(path),
            operation,
        }
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_error("creating output directory"))?;
    }

    let file = File::create(path).map_err(io_error("creating output file"))?;
    let mut writer = BufWriter::new(file);
    renderer
        .render(graph, critical, &mut writer)
        .map_err(io_error("rendering graph"))?;
    writer.flush().map_err(io_error("flushing output file"))?;

    info!(
        path = %path.display(),
        format = renderer.extension(),
        tasks = graph.task_count(),
        "Rendered project graph"
    );
    Ok(())
}
