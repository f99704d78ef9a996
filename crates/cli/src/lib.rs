//! Command-line front end for critpath.
//!
//! The binary reads a nested project plan, computes its critical path with
//! [`critpath_graph`] and draws the dependency graph with [`critpath_render`].
//! Everything except process setup lives here so it can be tested directly.

pub mod cli;
pub mod config;
pub mod logging;
pub mod run;

pub use cli::{Cli, CliError};
pub use config::Settings;
pub use run::{CheckReport, Report, check, run};
