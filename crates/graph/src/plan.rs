//! Nested task plan parsed from a YAML (or JSON) document.
//!
//! A plan is a mapping from task id to a definition holding a `duration` and an
//! optional list of `dependencies`. Each dependency is a single-key mapping whose
//! value is itself a full task definition, so prerequisites nest inside each
//! other. The YAML parser caps nesting, which allows chains of up to
//! [`MAX_NESTING_DEPTH`] dependency levels below a top-level task:
//!
//! ```yaml
//! deploy:
//!   duration: 2
//!   dependencies:
//!     - build:
//!         duration: 5
//!         dependencies:
//!           - fetch: { duration: 1 }
//!     - fetch: { duration: 1 }
//! ```

use crate::{Error, Result};
use serde_yaml::{Mapping, Value};
use std::collections::HashSet;
use std::io::Read;
use tracing::debug;

/// Deepest chain of nested `dependencies` accepted below a top-level task.
///
/// `serde_yaml` stops at 128 nested collections. The plan mapping and a task
/// definition take two of them and every dependency level adds three (the
/// list, the single-key entry and the definition).
pub const MAX_NESTING_DEPTH: usize = 42;

const DURATION_KEY: &str = "duration";
const DEPENDENCIES_KEY: &str = "dependencies";

/// A single task and its (nested) prerequisites.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskDefinition {
    /// Task id, unique across the whole plan.
    pub id: String,
    /// Time added to a path when this task is reached.
    pub duration: f64,
    /// Tasks that must complete before this one can start, in document order.
    pub dependencies: Vec<TaskDefinition>,
}

impl TaskDefinition {
    /// Create a task without dependencies.
    #[must_use]
    pub fn new(id: impl Into<String>, duration: f64) -> Self {
        Self {
            id: id.into(),
            duration,
            dependencies: Vec::new(),
        }
    }

    /// Append a prerequisite to this task.
    #[must_use]
    pub fn with_dependency(mut self, dependency: Self) -> Self {
        self.dependencies.push(dependency);
        self
    }

    fn collect_ids<'a>(&'a self, seen: &mut HashSet<&'a str>) {
        seen.insert(self.id.as_str());
        for dependency in &self.dependencies {
            dependency.collect_ids(seen);
        }
    }
}

fn nesting_error(source: serde_yaml::Error) -> Error {
    if source.to_string().starts_with("recursion limit exceeded") {
        Error::malformed_document(format!(
            "dependencies nest more than {MAX_NESTING_DEPTH} levels deep ({source}); \
             list a deep prerequisite at the top level and reference it by id with its duration instead"
        ))
    } else {
        Error::Yaml { source }
    }
}

/// The top-level tasks of a project, in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Plan {
    /// Top-level task definitions.
    pub tasks: Vec<TaskDefinition>,
}

impl Plan {
    /// Create a plan from already-typed task definitions.
    #[must_use]
    pub fn new(tasks: Vec<TaskDefinition>) -> Self {
        Self { tasks }
    }

    /// Parse a plan from YAML text. JSON is accepted as well.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Yaml`] if the text is not valid YAML, or
    /// [`Error::MalformedInput`] if it does not follow the plan schema or nests
    /// dependencies deeper than [`MAX_NESTING_DEPTH`].
    pub fn from_yaml_str(input: &str) -> Result<Self> {
        if input.trim().is_empty() {
            return Ok(Self::default());
        }
        let value: Value = serde_yaml::from_str(input).map_err(nesting_error)?;
        Self::from_value(&value)
    }

    /// Parse a plan from a reader producing YAML text.
    ///
    /// # Errors
    ///
    /// Same as [`Plan::from_yaml_str`].
    pub fn from_reader(mut reader: impl Read) -> Result<Self> {
        let mut input = String::new();
        reader
            .read_to_string(&mut input)
            .map_err(|e| Error::malformed_document(format!("failed to read plan: {e}")))?;
        Self::from_yaml_str(&input)
    }

    /// Convert a parsed YAML value into a plan, validating every task.
    ///
    /// `null` and an empty mapping both produce an empty plan.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedInput`] naming the first offending task.
    pub fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Null => Ok(Self::default()),
            Value::Mapping(mapping) => {
                let tasks = mapping
                    .iter()
                    .map(|(key, definition)| {
                        let id = task_id(key)?;
                        parse_task(id, definition)
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(Self { tasks })
            }
            Value::Tagged(tagged) => Self::from_value(&tagged.value),
            other => Err(Error::malformed_document(format!(
                "plan must be a mapping of task ids, found {}",
                kind(other)
            ))),
        }
    }

    /// Number of unique task ids anywhere in the plan.
    #[must_use]
    pub fn task_count(&self) -> usize {
        let mut seen = HashSet::new();
        for task in &self.tasks {
            task.collect_ids(&mut seen);
        }
        seen.len()
    }

    /// Whether the plan declares no tasks at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

fn task_id(key: &Value) -> Result<String> {
    match key {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(Error::malformed_document(format!(
            "task ids must be scalars, found {}",
            kind(other)
        ))),
    }
}

fn parse_task(id: String, value: &Value) -> Result<TaskDefinition> {
    let mapping = match value {
        Value::Mapping(mapping) => mapping,
        Value::Null => {
            return Err(Error::malformed(id, "missing required field 'duration'"));
        }
        Value::Tagged(tagged) => return parse_task(id, &tagged.value),
        other => {
            return Err(Error::malformed(
                id,
                format!("task definition must be a mapping, found {}", kind(other)),
            ));
        }
    };

    let duration = parse_duration(&id, mapping)?;
    let dependencies = parse_dependencies(&id, mapping)?;

    for key in mapping.keys() {
        if let Some(name) = key.as_str()
            && name != DURATION_KEY
            && name != DEPENDENCIES_KEY
        {
            debug!("Ignoring unknown field '{}' on task '{}'", name, id);
        }
    }

    Ok(TaskDefinition {
        id,
        duration,
        dependencies,
    })
}

fn parse_duration(id: &str, mapping: &Mapping) -> Result<f64> {
    let value = mapping
        .get(DURATION_KEY)
        .ok_or_else(|| Error::malformed(id, "missing required field 'duration'"))?;

    let duration = match value {
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
    .ok_or_else(|| {
        Error::malformed(
            id,
            format!("'duration' must be a number, found {}", kind(value)),
        )
    })?;

    if !duration.is_finite() {
        return Err(Error::malformed(id, "'duration' must be finite"));
    }
    if duration < 0.0 {
        return Err(Error::malformed(
            id,
            format!("'duration' must not be negative, found {duration}"),
        ));
    }
    Ok(duration)
}

fn parse_dependencies(id: &str, mapping: &Mapping) -> Result<Vec<TaskDefinition>> {
    let entries = match mapping.get(DEPENDENCIES_KEY) {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Sequence(entries)) => entries,
        Some(other) => {
            return Err(Error::malformed(
                id,
                format!("'dependencies' must be a list, found {}", kind(other)),
            ));
        }
    };

    entries
        .iter()
        .enumerate()
        .map(|(position, entry)| {
            let Value::Mapping(entry) = entry else {
                return Err(Error::malformed(
                    id,
                    format!(
                        "dependency #{position} must be a single-key mapping, found {}",
                        kind(entry)
                    ),
                ));
            };
            let mut pairs = entry.iter();
            match (pairs.next(), pairs.next()) {
                (Some((key, definition)), None) => parse_task(task_id(key)?, definition),
                _ => Err(Error::malformed(
                    id,
                    format!(
                        "dependency #{position} must have exactly one key, found {}",
                        entry.len()
                    ),
                )),
            }
        })
        .collect()
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested_plan() {
        let plan = Plan::from_yaml_str(
            r"
B:
  duration: 5
  dependencies:
    - A:
        duration: 3
",
        )
        .unwrap();

        assert_eq!(
            plan.tasks,
            vec![TaskDefinition::new("B", 5.0).with_dependency(TaskDefinition::new("A", 3.0))]
        );
        assert_eq!(plan.task_count(), 2);
    }

    #[test]
    fn test_empty_document_is_empty_plan() {
        assert!(Plan::from_yaml_str("").unwrap().is_empty());
        assert!(Plan::from_yaml_str("{}").unwrap().is_empty());
        assert!(Plan::from_yaml_str("~").unwrap().is_empty());
    }

    #[test]
    fn test_null_and_empty_dependencies() {
        let plan = Plan::from_yaml_str(
            r"
a: { duration: 1, dependencies: null }
b: { duration: 2, dependencies: [] }
c: { duration: 3 }
",
        )
        .unwrap();
        assert!(plan.tasks.iter().all(|t| t.dependencies.is_empty()));
    }

    #[test]
    fn test_json_input() {
        let plan =
            Plan::from_yaml_str(r#"{"b": {"duration": 2.5, "dependencies": [{"a": {"duration": 1}}]}}"#)
                .unwrap();
        assert_eq!(plan.tasks[0].duration, 2.5);
        assert_eq!(plan.tasks[0].dependencies[0].id, "a");
    }

    #[test]
    fn test_numeric_task_ids() {
        let plan = Plan::from_yaml_str("1: { duration: 4 }").unwrap();
        assert_eq!(plan.tasks[0].id, "1");
    }

    #[test]
    fn test_task_count_deduplicates_shared_dependencies() {
        let plan = Plan::from_yaml_str(
            r"
c:
  duration: 1
  dependencies:
    - a: { duration: 2 }
d:
  duration: 1
  dependencies:
    - a: { duration: 2 }
",
        )
        .unwrap();
        assert_eq!(plan.task_count(), 3);
    }

    #[test]
    fn test_missing_duration() {
        let err = Plan::from_yaml_str(
            r"
b:
  duration: 1
  dependencies:
    - a: { dependencies: [] }
",
        )
        .unwrap_err();
        match err {
            Error::MalformedInput { task, message } => {
                assert_eq!(task.as_deref(), Some("a"));
                assert!(message.contains("duration"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_null_definition_is_missing_duration() {
        let err = Plan::from_yaml_str("a:").unwrap_err();
        assert!(matches!(err, Error::MalformedInput { task: Some(t), .. } if t == "a"));
    }

    #[test]
    fn test_negative_duration() {
        let err = Plan::from_yaml_str("a: { duration: -1 }").unwrap_err();
        assert!(err.to_string().contains("negative"));
    }

    #[test]
    fn test_non_numeric_duration() {
        let err = Plan::from_yaml_str("a: { duration: three }").unwrap_err();
        assert!(matches!(err, Error::MalformedInput { task: Some(t), .. } if t == "a"));
    }

    #[test]
    fn test_infinite_duration() {
        let err = Plan::from_yaml_str("a: { duration: .inf }").unwrap_err();
        assert!(err.to_string().contains("finite"));
    }

    #[test]
    fn test_dependency_entry_with_two_keys() {
        let err = Plan::from_yaml_str(
            r"
c:
  duration: 1
  dependencies:
    - a: { duration: 1 }
      b: { duration: 1 }
",
        )
        .unwrap_err();
        match err {
            Error::MalformedInput { task, message } => {
                assert_eq!(task.as_deref(), Some("c"));
                assert!(message.contains("exactly one key"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_dependency_entry_with_zero_keys() {
        let err = Plan::from_yaml_str("c: { duration: 1, dependencies: [{}] }").unwrap_err();
        assert!(err.to_string().contains("exactly one key"));
    }

    #[test]
    fn test_dependencies_not_a_list() {
        let err = Plan::from_yaml_str("c: { duration: 1, dependencies: a }").unwrap_err();
        assert!(err.to_string().contains("must be a list"));
    }

    #[test]
    fn test_top_level_must_be_mapping() {
        let err = Plan::from_yaml_str("- a\n- b\n").unwrap_err();
        assert!(matches!(err, Error::MalformedInput { task: None, .. }));
    }

    #[test]
    fn test_invalid_yaml() {
        let err = Plan::from_yaml_str("a: [unclosed").unwrap_err();
        assert!(matches!(err, Error::Yaml { .. }));
    }

    fn nested_chain(levels: usize) -> String {
        let mut plan = r#"{"t0": {"duration": 1}}"#.to_string();
        for level in 1..=levels {
            plan = format!(r#"{{"t{level}": {{"duration": 1, "dependencies": [{plan}]}}}}"#);
        }
        plan
    }

    #[test]
    fn test_deep_chain_within_limit() {
        let plan = Plan::from_yaml_str(&nested_chain(MAX_NESTING_DEPTH)).unwrap();
        assert_eq!(plan.task_count(), MAX_NESTING_DEPTH + 1);
    }

    #[test]
    fn test_chain_beyond_nesting_limit() {
        let err = Plan::from_yaml_str(&nested_chain(MAX_NESTING_DEPTH + 8)).unwrap_err();
        match err {
            Error::MalformedInput { task: None, message } => {
                assert!(message.contains("more than 42 levels"), "{message}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_from_reader() {
        let plan = Plan::from_reader("a: { duration: 7 }".as_bytes()).unwrap();
        assert_eq!(plan.tasks[0].duration, 7.0);
    }
}
