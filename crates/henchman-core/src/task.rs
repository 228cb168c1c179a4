use crate::error::TaskExecutionError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Variables shared read-only by every task on every host.
pub type TaskVars = HashMap<String, String>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct TaskId(pub String);

impl TaskId {
    pub fn from_string(s: String) -> Self {
        Self(s)
    }

    /// Id given to an unnamed task at 1-based `position` in the plan.
    pub fn positional(position: usize) -> Self {
        Self(format!("task-{}", position))
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// One unit of work. Immutable once the plan is built.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    pub id: TaskId,
    pub shell: String,
    /// Run against the local pseudo-target instead of the worker's host.
    #[serde(default)]
    pub local_action: bool,
}

impl Task {
    pub fn new(id: impl Into<TaskId>, shell: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            shell: shell.into(),
            local_action: false,
        }
    }

    pub fn local(mut self) -> Self {
        self.local_action = true;
        self
    }
}

/// Outcome label of a single task run. Only `Failure` stops a host.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Success,
    Failure,
    Skipped,
    Unknown,
}

impl TaskStatus {
    pub fn is_failure(&self) -> bool {
        matches!(self, TaskStatus::Failure)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::Success => write!(f, "success"),
            TaskStatus::Failure => write!(f, "failure"),
            TaskStatus::Skipped => write!(f, "skipped"),
            TaskStatus::Unknown => write!(f, "unknown"),
        }
    }
}

/// What a runner hands back: the status, plus an error to log if one occurred.
#[derive(Debug)]
pub struct TaskOutcome {
    pub status: TaskStatus,
    pub error: Option<TaskExecutionError>,
}

impl TaskOutcome {
    pub fn success() -> Self {
        Self {
            status: TaskStatus::Success,
            error: None,
        }
    }

    pub fn with_status(status: TaskStatus) -> Self {
        Self {
            status,
            error: None,
        }
    }

    /// A failed run caused by `error`.
    pub fn failed(error: TaskExecutionError) -> Self {
        Self {
            status: TaskStatus::Failure,
            error: Some(error),
        }
    }

    pub fn with_error(mut self, error: TaskExecutionError) -> Self {
        self.error = Some(error);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_failure_is_failure() {
        assert!(TaskStatus::Failure.is_failure());
        assert!(!TaskStatus::Success.is_failure());
        assert!(!TaskStatus::Skipped.is_failure());
        assert!(!TaskStatus::Unknown.is_failure());
    }

    #[test]
    fn status_serializes_as_label() {
        let json = serde_json::to_string(&TaskStatus::Failure).unwrap();
        assert_eq!(json, "\"failure\"");
        assert_eq!(TaskStatus::Skipped.to_string(), "skipped");
    }
}
