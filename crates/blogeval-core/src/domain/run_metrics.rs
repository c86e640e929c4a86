//! Per-agent and per-task execution metrics.
//!
//! These are the telemetry inputs of the agent evaluator. The collector
//! mutates them while a run is live; evaluation only ever reads a frozen
//! [`TelemetrySnapshot`].

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a task. Any label other than the three known ones is a
/// terminal failure.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskStatus {
    #[default]
    Pending,
    Running,
    Completed,
    Other(String),
}

impl TaskStatus {
    pub fn as_str(&self) -> &str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Running => "running",
            TaskStatus::Completed => "completed",
            TaskStatus::Other(label) => label,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, TaskStatus::Completed)
    }
}

impl From<String> for TaskStatus {
    fn from(label: String) -> Self {
        match label.as_str() {
            "pending" => TaskStatus::Pending,
            "running" => TaskStatus::Running,
            "completed" => TaskStatus::Completed,
            _ => TaskStatus::Other(label),
        }
    }
}

impl From<&str> for TaskStatus {
    fn from(label: &str) -> Self {
        TaskStatus::from(label.to_string())
    }
}

impl From<TaskStatus> for String {
    fn from(status: TaskStatus) -> Self {
        status.as_str().to_string()
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metrics for a single agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentMetrics {
    pub agent_name: String,
    #[serde(default)]
    pub task_count: u32,
    #[serde(default)]
    pub tool_calls: u32,
    /// Cumulative active time in seconds.
    #[serde(default)]
    pub total_time: f64,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    /// Distinct tool names, in first-use order.
    #[serde(default)]
    pub tools_used: Vec<String>,
    #[serde(default)]
    pub errors: Vec<String>,
}

impl AgentMetrics {
    pub fn new(agent_name: impl Into<String>) -> Self {
        Self {
            agent_name: agent_name.into(),
            task_count: 0,
            tool_calls: 0,
            total_time: 0.0,
            start_time: None,
            end_time: None,
            tools_used: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn with_tool_calls(mut self, tool_calls: u32) -> Self {
        self.tool_calls = tool_calls;
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.errors.push(error.into());
        self
    }
}

/// Metrics for a single task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskMetrics {
    pub task_id: String,
    #[serde(default)]
    pub task_description: String,
    #[serde(default)]
    pub agent_name: String,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    /// Wall-clock duration in seconds.
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub tool_calls: u32,
    /// Output length in characters.
    #[serde(default)]
    pub output_length: usize,
}

impl TaskMetrics {
    pub fn new(task_id: impl Into<String>, agent_name: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            task_description: String::new(),
            agent_name: agent_name.into(),
            status: TaskStatus::Pending,
            start_time: None,
            end_time: None,
            duration: 0.0,
            tool_calls: 0,
            output_length: 0,
        }
    }

    /// Mark the task finished with the given status, duration and output length.
    pub fn finished(mut self, status: TaskStatus, duration: f64, output_length: usize) -> Self {
        self.status = status;
        self.duration = duration;
        self.output_length = output_length;
        self
    }
}

/// Frozen copy of a run's telemetry, taken after the run completes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    #[serde(default)]
    pub agents: BTreeMap<String, AgentMetrics>,
    #[serde(default)]
    pub tasks: Vec<TaskMetrics>,
    /// Total run duration in seconds.
    #[serde(default)]
    pub total_duration: f64,
}
