//! Project dependency graphs and critical path computation.
//!
//! This crate turns a nested project plan (tasks with durations and nested
//! prerequisites) into a deduplicated petgraph DAG and finds its critical path,
//! the longest duration-weighted chain of dependent tasks.
//!
//! # Key Types
//!
//! - [`Plan`]: The validated nested task description
//! - [`ProjectGraph`]: One node per task id, edges from prerequisite to dependent
//!   weighted by the dependent's duration
//! - [`CriticalPath`]: The longest path and its total duration
//!
//! # Example
//!
//! ```
//! use critpath_graph::{Plan, build_plan, longest_path};
//!
//! let plan = Plan::from_yaml_str(
//!     "B:\n  duration: 5\n  dependencies:\n    - A: { duration: 3 }\n",
//! )?;
//! let graph = build_plan(&plan);
//! let critical = longest_path(&graph)?;
//!
//! assert_eq!(critical.path, ["A", "B"]);
//! assert_eq!(critical.duration, 5.0);
//! # Ok::<(), critpath_graph::Error>(())
//! ```

mod builder;
mod error;
mod graph;
mod plan;
mod solver;

pub use builder::{GraphBuilder, build, build_plan};
pub use error::{Error, Result};
pub use graph::{DependencyEdge, ProjectGraph, TaskNode};
pub use plan::{MAX_NESTING_DEPTH, Plan, TaskDefinition};
pub use solver::{CriticalPath, longest_path, path_weight};
