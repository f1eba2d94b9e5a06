/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Schedule description loading.
//!
//! A schedule can be described in YAML and materialised into an
//! [`Executive`](crate::Executive) with
//! [`Executive::from_spec`](crate::Executive::from_spec); only the task
//! functions are attached in code.  The expected structure is:
//!
//! ```yaml
//! schedule:
//!   frame_length: 5
//!   unit_ms: 10
//!   tasks:
//!     - name: control
//!       wcet: 2
//!     - name: telemetry
//!       wcet: 1
//!   aperiodic:
//!     wcet: 3
//!   frames:
//!     - [0, 1]
//!     - [0]
//! ```
//!
//! Frame entries index the task table in declaration order; the `name`
//! field exists so code can resolve ids with [`ScheduleSpec::task_id`]
//! instead of hard-coding positions.  `unit_ms` falls back to the default
//! quantum when absent, and the `aperiodic` section is optional.

use std::path::Path;

use anyhow::{bail, ensure, Context, Result};
use serde::Deserialize;
use tracing::info;

use crate::schedule::DEFAULT_UNIT_MS;

// ── Private YAML deserialization wrapper ──────────────────────────────────────

/// Top-level wrapper matching the file layout.  Kept private — callers work
/// with [`ScheduleSpec`].
#[derive(Debug, Deserialize)]
struct ScheduleFile {
    schedule: ScheduleSpec,
}

// ── Public data structures ────────────────────────────────────────────────────

/// One periodic task declaration: a name for id lookup plus its WCET in
/// time units.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskSpec {
    pub name: String,
    #[serde(default)]
    pub wcet: u32,
}

/// Declaration of the optional aperiodic task.
#[derive(Debug, Clone, Deserialize)]
pub struct AperiodicSpec {
    #[serde(default)]
    pub wcet: u32,
}

/// A parsed, validated schedule description.
#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleSpec {
    /// Frame length `F`, in time units.
    pub frame_length: u32,

    /// Unit time `U` in milliseconds.  Defaults to the standard quantum
    /// when absent from the file.
    #[serde(default = "default_unit_ms")]
    pub unit_ms: u64,

    /// Task table in id order.
    pub tasks: Vec<TaskSpec>,

    /// Optional aperiodic declaration.
    #[serde(default)]
    pub aperiodic: Option<AperiodicSpec>,

    /// Frame list; every entry indexes `tasks`.
    pub frames: Vec<Vec<usize>>,
}

fn default_unit_ms() -> u64 {
    DEFAULT_UNIT_MS
}

impl ScheduleSpec {
    /// Parse and validate `path`.
    ///
    /// # Errors
    /// Returns an error when the file cannot be read, the YAML is
    /// structurally invalid, or validation fails (empty frame list,
    /// out-of-range frame entry, duplicate task name, zero frame length or
    /// unit).
    pub fn load_from_file(path: &Path) -> Result<ScheduleSpec> {
        info!("Loading schedule description from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot open schedule file: {}", path.display()))?;

        ScheduleSpec::from_yaml(&content)
            .with_context(|| format!("Invalid schedule file: {}", path.display()))
    }

    /// Parse and validate a YAML document held in memory.
    pub fn from_yaml(content: &str) -> Result<ScheduleSpec> {
        let file: ScheduleFile =
            serde_yaml::from_str(content).context("Failed to parse schedule YAML")?;
        let spec = file.schedule;
        spec.validate()?;

        info!(
            tasks = spec.tasks.len(),
            frames = spec.frames.len(),
            frame_length = spec.frame_length,
            unit_ms = spec.unit_ms,
            aperiodic = spec.aperiodic.is_some(),
            "Schedule description loaded"
        );
        Ok(spec)
    }

    fn validate(&self) -> Result<()> {
        ensure!(self.frame_length > 0, "frame_length must be positive");
        ensure!(self.unit_ms > 0, "unit_ms must be positive");
        ensure!(!self.frames.is_empty(), "the frame list is empty");

        for (id, task) in self.tasks.iter().enumerate() {
            if self.tasks[..id].iter().any(|t| t.name == task.name) {
                bail!("duplicate task name '{}'", task.name);
            }
        }
        for (frame_id, frame) in self.frames.iter().enumerate() {
            for &id in frame {
                ensure!(
                    id < self.tasks.len(),
                    "frame {frame_id} references task {id}, but only {} tasks are declared",
                    self.tasks.len()
                );
            }
        }
        Ok(())
    }

    /// Resolve a task name to its id in the table.
    pub fn task_id(&self, name: &str) -> Option<usize> {
        self.tasks.iter().position(|t| t.name == name)
    }

    /// Number of declared periodic tasks.
    pub fn num_tasks(&self) -> usize {
        self.tasks.len()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Helper: write a YAML string to a temp file and return it.
    fn yaml_tempfile(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    const FULL_EXAMPLE: &str = r#"
schedule:
  frame_length: 5
  unit_ms: 20
  tasks:
    - name: control
      wcet: 2
    - name: telemetry
      wcet: 1
    - name: housekeeping
      wcet: 1
  aperiodic:
    wcet: 3
  frames:
    - [0, 1]
    - [0, 2]
"#;

    // ── Parsing ───────────────────────────────────────────────────────────────

    #[test]
    fn full_example_parses() {
        let f = yaml_tempfile(FULL_EXAMPLE);
        let spec = ScheduleSpec::load_from_file(f.path()).unwrap();

        assert_eq!(spec.frame_length, 5);
        assert_eq!(spec.unit_ms, 20);
        assert_eq!(spec.num_tasks(), 3);
        assert_eq!(spec.tasks[0].name, "control");
        assert_eq!(spec.tasks[0].wcet, 2);
        assert_eq!(spec.aperiodic.as_ref().unwrap().wcet, 3);
        assert_eq!(spec.frames, vec![vec![0, 1], vec![0, 2]]);
    }

    #[test]
    fn unit_ms_defaults_to_the_standard_quantum() {
        let spec = ScheduleSpec::from_yaml(
            r#"
schedule:
  frame_length: 4
  tasks:
    - name: only
      wcet: 1
  frames:
    - [0]
"#,
        )
        .unwrap();
        assert_eq!(spec.unit_ms, DEFAULT_UNIT_MS);
        assert!(spec.aperiodic.is_none());
    }

    #[test]
    fn missing_file_returns_error() {
        let result = ScheduleSpec::load_from_file(Path::new("/nonexistent/schedule.yaml"));
        assert!(result.is_err());
    }

    #[test]
    fn malformed_yaml_returns_error() {
        assert!(ScheduleSpec::from_yaml("this is: not: valid: yaml:::").is_err());
    }

    // ── Validation ────────────────────────────────────────────────────────────

    #[test]
    fn empty_frame_list_is_rejected() {
        let result = ScheduleSpec::from_yaml(
            r#"
schedule:
  frame_length: 4
  tasks:
    - name: only
  frames: []
"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn out_of_range_frame_entry_is_rejected() {
        let result = ScheduleSpec::from_yaml(
            r#"
schedule:
  frame_length: 4
  tasks:
    - name: only
  frames:
    - [0, 1]
"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn duplicate_task_names_are_rejected() {
        let result = ScheduleSpec::from_yaml(
            r#"
schedule:
  frame_length: 4
  tasks:
    - name: twin
    - name: twin
  frames:
    - [0]
"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn zero_frame_length_is_rejected() {
        let result = ScheduleSpec::from_yaml(
            r#"
schedule:
  frame_length: 0
  tasks:
    - name: only
  frames:
    - [0]
"#,
        );
        assert!(result.is_err());
    }

    // ── Lookup ────────────────────────────────────────────────────────────────

    #[test]
    fn task_id_resolves_names_in_declaration_order() {
        let spec = ScheduleSpec::from_yaml(FULL_EXAMPLE).unwrap();
        assert_eq!(spec.task_id("control"), Some(0));
        assert_eq!(spec.task_id("housekeeping"), Some(2));
        assert_eq!(spec.task_id("unknown"), None);
    }

    // ── Building an executive ─────────────────────────────────────────────────

    #[test]
    fn spec_materialises_into_a_runnable_executive() {
        let spec = ScheduleSpec::from_yaml(FULL_EXAMPLE).unwrap();
        let mut exec = crate::Executive::from_spec(&spec).unwrap();

        for name in ["control", "telemetry", "housekeeping"] {
            let id = spec.task_id(name).unwrap();
            exec.set_task_function(id, || {}).unwrap();
        }
        exec.set_aperiodic_function(|| {}).unwrap();

        exec.start().unwrap();
        std::thread::sleep(std::time::Duration::from_millis(50));
        exec.stop();
        exec.wait();
        assert!(exec.stats().frames >= 1);
    }

    #[test]
    fn spec_without_aperiodic_leaves_the_slot_undeclared() {
        let spec = ScheduleSpec::from_yaml(
            r#"
schedule:
  frame_length: 4
  tasks:
    - name: only
      wcet: 1
  frames:
    - [0]
"#,
        )
        .unwrap();
        let exec = crate::Executive::from_spec(&spec).unwrap();
        assert!(exec.ap_requester().is_none());
    }
}
