//! Error types for rendering.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for rendering operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while rendering a project graph.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// The output format could not be determined or is not supported.
    #[error("Unsupported output format: {format}")]
    #[diagnostic(
        code(critpath::render::unsupported_format),
        help("Supported formats: svg, dot (use a .svg, .dot or .gv extension, or pass --format)")
    )]
    UnsupportedFormat {
        /// The requested format or file extension.
        format: String,
    },

    /// I/O error occurred.
    #[error("I/O error during {operation}{}: {source}", path.as_ref().map(|p| format!(" at {}", p.display())).unwrap_or_default())]
    #[diagnostic(
        code(critpath::render::io_error),
        help("Check that the output directory is writable")
    )]
    Io {
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
        /// Optional path where the error occurred.
        path: Option<PathBuf>,
        /// Description of the operation being performed.
        operation: String,
    },
}

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Self::Io {
            source,
            path: None,
            operation: "writing output".to_string(),
        }
    }
}
