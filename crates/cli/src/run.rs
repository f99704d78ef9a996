//! The parse → build → solve → render pipeline behind the binary, plus the
//! `--check` pass that stops after validation.

use crate::cli::CliError;
use crate::config::Settings;
use critpath_graph::{CriticalPath, Plan, ProjectGraph, build_plan, longest_path};
use critpath_render::render_to_file;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    /// The critical path and its duration.
    #[serde(flatten)]
    pub critical: CriticalPath,
    /// Number of distinct tasks in the graph.
    pub tasks: usize,
    /// Number of dependency edges in the graph.
    pub edges: usize,
    /// Image written, if rendering was enabled.
    pub output: Option<PathBuf>,
}

/// Size of a plan that passed `--check`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CheckReport {
    /// Number of distinct tasks in the graph.
    pub tasks: usize,
    /// Number of dependency edges in the graph.
    pub edges: usize,
}

fn load_graph(input: &Path) -> Result<ProjectGraph, CliError> {
    let content = fs::read_to_string(input).map_err(|e| {
        CliError::config_with_help(
            format!("failed to read {}: {e}", input.display()),
            "Pass the plan path as the first argument or set CRITPATH_INPUT",
        )
    })?;

    let plan = Plan::from_yaml_str(&content)?;
    let graph = build_plan(&plan);
    info!(
        tasks = graph.task_count(),
        edges = graph.edge_count(),
        "Built project graph"
    );
    Ok(graph)
}

/// Read and validate the plan without solving or drawing it.
///
/// # Errors
///
/// Same as [`run`], except that nothing is rendered.
#[instrument(skip_all, fields(input = %settings.input.display()))]
pub fn check(settings: &Settings) -> Result<CheckReport, CliError> {
    let graph = load_graph(&settings.input)?;
    graph.validate()?;
    Ok(CheckReport {
        tasks: graph.task_count(),
        edges: graph.edge_count(),
    })
}

/// Read the plan, solve it and draw the graph.
///
/// The image is written before a cycle is reported so the offending
/// dependencies can be inspected; it carries no highlight in that case.
///
/// # Errors
///
/// Returns [`CliError::Config`] if the input cannot be read,
/// [`CliError::Input`] for a malformed plan, [`CliError::Cycle`] for a cyclic
/// plan and [`CliError::Render`] if the image cannot be written.
#[instrument(skip_all, fields(input = %settings.input.display()))]
pub fn run(settings: &Settings) -> Result<Report, CliError> {
    let graph = load_graph(&settings.input)?;
    let solved = longest_path(&graph);

    let output = if settings.render {
        let renderer = settings.format.renderer();
        render_to_file(
            renderer.as_ref(),
            &graph,
            solved.as_ref().ok(),
            &settings.output,
        )?;
        Some(settings.output.clone())
    } else {
        None
    };

    let critical = solved?;
    info!(
        path = ?critical.path,
        duration = critical.duration,
        "Found critical path"
    );

    Ok(Report {
        critical,
        tasks: graph.task_count(),
        edges: graph.edge_count(),
        output,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use critpath_render::OutputFormat;
    use tempfile::TempDir;

    fn settings(dir: &Path, plan: &str, render: bool) -> Settings {
        let input = dir.join("dependencies.yaml");
        fs::write(&input, plan).unwrap();
        Settings {
            input,
            output: dir.join("output").join("path.svg"),
            format: OutputFormat::Svg,
            render,
        }
    }

    #[test]
    fn test_run_two_task_chain() {
        let temp_dir = TempDir::new().unwrap();
        let settings = settings(
            temp_dir.path(),
            "B:\n  duration: 5\n  dependencies:\n    - A:\n        duration: 3\n",
            true,
        );

        let report = run(&settings).unwrap();

        assert_eq!(report.critical.path, vec!["A", "B"]);
        assert!((report.critical.duration - 5.0).abs() < f64::EPSILON);
        assert_eq!(report.tasks, 2);
        assert_eq!(report.edges, 1);
        assert_eq!(report.output.as_deref(), Some(settings.output.as_path()));
        assert!(settings.output.is_file());
    }

    #[test]
    fn test_run_without_rendering() {
        let temp_dir = TempDir::new().unwrap();
        let settings = settings(temp_dir.path(), "solo: { duration: 10 }", false);

        let report = run(&settings).unwrap();

        assert_eq!(report.critical.path, vec!["solo"]);
        assert!(report.output.is_none());
        assert!(!settings.output.exists());
    }

    #[test]
    fn test_cycle_still_renders() {
        let temp_dir = TempDir::new().unwrap();
        let plan = "\
A:
  duration: 1
  dependencies:
    - B: { duration: 2 }
B:
  duration: 2
  dependencies:
    - A: { duration: 1 }
";
        let settings = settings(temp_dir.path(), plan, true);

        let err = run(&settings).unwrap_err();

        assert!(matches!(err, CliError::Cycle { .. }));
        assert!(settings.output.is_file());
    }

    #[test]
    fn test_missing_input() {
        let temp_dir = TempDir::new().unwrap();
        let settings = Settings {
            input: temp_dir.path().join("nope.yaml"),
            output: temp_dir.path().join("path.svg"),
            format: OutputFormat::Svg,
            render: true,
        };

        let err = run(&settings).unwrap_err();
        assert!(matches!(err, CliError::Config { .. }));
        assert!(err.to_string().contains("nope.yaml"));
    }

    #[test]
    fn test_malformed_input() {
        let temp_dir = TempDir::new().unwrap();
        let settings = settings(temp_dir.path(), "A: { duration: soon }", true);

        let err = run(&settings).unwrap_err();
        assert!(matches!(err, CliError::Input { .. }));
        assert!(err.to_string().contains("'A'"));
        assert!(!settings.output.exists());
    }

    #[test]
    fn test_check_valid_plan() {
        let temp_dir = TempDir::new().unwrap();
        let settings = settings(
            temp_dir.path(),
            "B: { duration: 5, dependencies: [ { A: { duration: 3 } } ] }",
            true,
        );

        let summary = check(&settings).unwrap();

        assert_eq!(summary, CheckReport { tasks: 2, edges: 1 });
        assert!(!settings.output.exists());
    }

    #[test]
    fn test_check_reports_cycle() {
        let temp_dir = TempDir::new().unwrap();
        let settings = settings(
            temp_dir.path(),
            "A: { duration: 1, dependencies: [ { A: { duration: 1 } } ] }",
            false,
        );

        let err = check(&settings).unwrap_err();
        assert!(matches!(err, CliError::Cycle { .. }));
    }

    #[test]
    fn test_report_json_shape() {
        let report = Report {
            critical: CriticalPath {
                path: vec!["A".into(), "B".into()],
                duration: 5.0,
            },
            tasks: 2,
            edges: 1,
            output: Some(PathBuf::from("output/path.svg")),
        };

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["path"], serde_json::json!(["A", "B"]));
        assert_eq!(json["duration"], serde_json::json!(5.0));
        assert_eq!(json["tasks"], 2);
        assert_eq!(json["output"], "output/path.svg");
    }
}
