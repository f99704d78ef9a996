//! Error types for project graph operations.

use miette::Diagnostic;
use thiserror::Error;

/// Result type for project graph operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or solving a project graph.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// The task description is structurally invalid.
    #[error("Malformed input{}: {message}", task.as_ref().map(|t| format!(" for task '{t}'")).unwrap_or_default())]
    #[diagnostic(
        code(critpath::graph::malformed_input),
        help(
            "Every task needs a non-negative numeric 'duration'; 'dependencies' must be a list of single-key mappings"
        )
    )]
    MalformedInput {
        /// The task whose definition is invalid, when it can be identified.
        task: Option<String>,
        /// Description of what is wrong.
        message: String,
    },

    /// A dependency cycle was detected in the graph.
    #[error("Cycle detected between tasks: {}", cycle.join(", "))]
    #[diagnostic(
        code(critpath::graph::cycle_detected),
        help("Remove one of the dependencies between the listed tasks so the plan forms a DAG")
    )]
    CycleDetected {
        /// Ids of the tasks participating in a cycle, sorted.
        cycle: Vec<String>,
    },

    /// A path referenced a task that is not in the graph.
    #[error("Task '{task}' does not exist in the graph")]
    #[diagnostic(code(critpath::graph::unknown_task))]
    UnknownTask {
        /// The missing task id.
        task: String,
    },

    /// A path stepped between two tasks that are not connected.
    #[error("No dependency edge from '{from}' to '{to}'")]
    #[diagnostic(code(critpath::graph::missing_edge))]
    MissingEdge {
        /// The prerequisite end of the step.
        from: String,
        /// The dependent end of the step.
        to: String,
    },

    /// The plan document is not valid YAML.
    #[error("YAML parsing error: {source}")]
    #[diagnostic(
        code(critpath::graph::yaml_error),
        help("Ensure the plan has valid YAML (or JSON) syntax")
    )]
    Yaml {
        /// The underlying YAML error.
        #[source]
        source: serde_yaml::Error,
    },
}

impl Error {
    /// Create a malformed input error for a specific task.
    #[must_use]
    pub fn malformed(task: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedInput {
            task: Some(task.into()),
            message: message.into(),
        }
    }

    /// Create a malformed input error that is not tied to a task.
    #[must_use]
    pub fn malformed_document(message: impl Into<String>) -> Self {
        Self::MalformedInput {
            task: None,
            message: message.into(),
        }
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(source: serde_yaml::Error) -> Self {
        Self::Yaml { source }
    }
}
