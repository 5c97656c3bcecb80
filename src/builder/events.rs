//! Task records and build events for JSON output.
//!
//! Every executed task is recorded once by the executor. Records are
//! appended concurrently by the package tasks of a space, so the
//! [`Recorder`] is the only state shared between running tasks.
//!
//! # Event Types
//!
//! - `build-started`: planned tasks of a build
//! - `task-finished`: a task ran (success or failure)
//! - `task-skipped`: a task did not run because an earlier task failed
//! - `build-finished`: build completed (success or failure)
//! - `diagnostic`: a note, warning or error message
//!
//! Events are emitted one JSON object per line with `build --message-format json`.

use std::sync::Mutex;

use serde::Serialize;

/// Outcome of one tool invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskRecord {
    pub label: String,
    pub tool: String,
    pub args: Vec<String>,
    pub duration_ms: u64,
    /// Exit code; `None` if the tool could not be launched
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl TaskRecord {
    pub fn is_success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Thread-safe, append-only collection of task records.
#[derive(Debug, Default)]
pub struct Recorder {
    records: Mutex<Vec<TaskRecord>>,
}

impl Recorder {
    pub fn new() -> Self {
        Recorder::default()
    }

    pub fn record(&self, record: TaskRecord) {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(record);
    }

    /// Snapshot of all records in completion order.
    pub fn records(&self) -> Vec<TaskRecord> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Records of failed tasks.
    pub fn failures(&self) -> Vec<TaskRecord> {
        self.records()
            .into_iter()
            .filter(|record| !record.is_success())
            .collect()
    }
}

/// A build event emitted during the build process.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "reason")]
pub enum BuildEvent {
    #[serde(rename = "build-started")]
    BuildStarted {
        project: String,
        version: String,
        tasks: Vec<String>,
    },

    #[serde(rename = "task-finished")]
    TaskFinished {
        label: String,
        tool: String,
        success: bool,
        duration_ms: u64,
        #[serde(skip_serializing_if = "Option::is_none")]
        code: Option<i32>,
        /// Captured error output of a failed task
        #[serde(skip_serializing_if = "Option::is_none")]
        stderr: Option<String>,
    },

    #[serde(rename = "task-skipped")]
    TaskSkipped { label: String },

    #[serde(rename = "build-finished")]
    BuildFinished {
        success: bool,
        duration_ms: u64,
        tasks_run: u64,
    },

    #[serde(rename = "diagnostic")]
    Diagnostic {
        /// Severity level ("error", "warning", "note")
        level: String,
        message: String,
    },
}

impl BuildEvent {
    pub fn started(project: impl Into<String>, version: impl Into<String>, tasks: Vec<String>) -> Self {
        BuildEvent::BuildStarted {
            project: project.into(),
            version: version.into(),
            tasks,
        }
    }

    /// Event describing a recorded task.
    pub fn task(record: &TaskRecord) -> Self {
        let success = record.is_success();
        BuildEvent::TaskFinished {
            label: record.label.clone(),
            tool: record.tool.clone(),
            success,
            duration_ms: record.duration_ms,
            code: record.code,
            stderr: (!success && !record.stderr.is_empty()).then(|| record.stderr.clone()),
        }
    }

    pub fn skipped(label: impl Into<String>) -> Self {
        BuildEvent::TaskSkipped {
            label: label.into(),
        }
    }

    pub fn finished(success: bool, duration_ms: u64, tasks_run: u64) -> Self {
        BuildEvent::BuildFinished {
            success,
            duration_ms,
            tasks_run,
        }
    }

    pub fn diagnostic(level: impl Into<String>, message: impl Into<String>) -> Self {
        BuildEvent::Diagnostic {
            level: level.into(),
            message: message.into(),
        }
    }

    /// Serialize this event to a JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}
