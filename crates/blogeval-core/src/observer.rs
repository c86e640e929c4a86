//! Live telemetry collection for a pipeline run.
//!
//! [`RunObserver`] is fed lifecycle callbacks while agents work, keeps a
//! timestamped event log and rough token counts, and hands evaluators a
//! frozen [`TelemetrySnapshot`]. Token counts are estimated at four
//! characters per token.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{AgentMetrics, Result, TaskMetrics, TaskStatus, TelemetrySnapshot};

/// Default file name for exported run metrics.
pub const DEFAULT_METRICS_FILE: &str = "run_metrics.json";

const CHARS_PER_TOKEN: usize = 4;
const INPUT_USD_PER_1K: f64 = 0.03;
const OUTPUT_USD_PER_1K: f64 = 0.06;
const DESCRIPTION_LIMIT: usize = 100;

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// One entry in the run's event log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservedEvent {
    pub timestamp: DateTime<Utc>,
    /// Seconds since the observer was created.
    pub time_elapsed: f64,
    pub event_type: String,
    pub data: Value,
}

/// Token and cost estimate for a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostEstimate {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_tokens: u64,
    pub estimated_cost_usd: f64,
    pub input_cost_usd: f64,
    pub output_cost_usd: f64,
}

#[derive(Debug, Clone, Serialize)]
struct ExecutionSummary {
    run_id: Uuid,
    start_time: DateTime<Utc>,
    end_time: Option<DateTime<Utc>>,
    total_duration: Option<f64>,
}

#[derive(Debug, Serialize)]
struct MetricsExport<'a> {
    execution_summary: ExecutionSummary,
    agents: &'a BTreeMap<String, AgentMetrics>,
    tasks: &'a [TaskMetrics],
    cost_estimate: CostEstimate,
    events: &'a [ObservedEvent],
}

/// Collects agent and task telemetry for one run.
pub struct RunObserver<C: Clock = SystemClock> {
    clock: C,
    run_id: Uuid,
    start_time: DateTime<Utc>,
    end_time: Option<DateTime<Utc>>,
    agents: BTreeMap<String, AgentMetrics>,
    tasks: Vec<TaskMetrics>,
    events: Vec<ObservedEvent>,
    input_tokens: u64,
    output_tokens: u64,
}

impl Default for RunObserver<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl RunObserver<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl<C: Clock> RunObserver<C> {
    pub fn with_clock(clock: C) -> Self {
        let start_time = clock.now();
        Self {
            clock,
            run_id: Uuid::new_v4(),
            start_time,
            end_time: None,
            agents: BTreeMap::new(),
            tasks: Vec::new(),
            events: Vec::new(),
            input_tokens: 0,
            output_tokens: 0,
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn events(&self) -> &[ObservedEvent] {
        &self.events
    }

    /// Append a timestamped entry to the event log.
    pub fn log_event(&mut self, event_type: &str, data: Value) {
        let timestamp = self.clock.now();
        self.events.push(ObservedEvent {
            timestamp,
            time_elapsed: seconds_between(self.start_time, timestamp),
            event_type: event_type.to_string(),
            data,
        });
    }

    pub fn start_agent(&mut self, agent_name: &str) {
        let now = self.clock.now();
        self.agents
            .entry(agent_name.to_string())
            .or_insert_with(|| AgentMetrics::new(agent_name))
            .start_time = Some(now);
        self.log_event("agent_start", serde_json::json!({ "agent": agent_name }));
        info!(event = "agent.started", run_id = %self.run_id, agent = %agent_name);
    }

    /// Close the agent's active interval and add it to its total time.
    pub fn end_agent(&mut self, agent_name: &str) {
        let now = self.clock.now();
        if let Some(metrics) = self.agents.get_mut(agent_name) {
            metrics.end_time = Some(now);
            if let Some(start) = metrics.start_time {
                metrics.total_time += seconds_between(start, now);
            }
        }
        self.log_event("agent_end", serde_json::json!({ "agent": agent_name }));
    }

    pub fn start_task(&mut self, task_id: &str, task_description: &str, agent_name: &str) {
        let now = self.clock.now();
        let mut task = TaskMetrics::new(task_id, agent_name);
        task.task_description = truncate_description(task_description);
        task.status = TaskStatus::Running;
        task.start_time = Some(now);

        if let Some(agent) = self.agents.get_mut(agent_name) {
            agent.task_count += 1;
        }

        let short: String = task_description.chars().take(DESCRIPTION_LIMIT).collect();
        info!(event = "task.started", run_id = %self.run_id, task_id = %task_id, agent = %agent_name);
        self.tasks.push(task);
        self.log_event(
            "task_start",
            serde_json::json!({ "task_id": task_id, "agent": agent_name, "description": short }),
        );
    }

    /// Finish the first task with `task_id`. Unknown ids are ignored.
    pub fn end_task(&mut self, task_id: &str, status: impl Into<TaskStatus>, output: &str) {
        let now = self.clock.now();
        let status = status.into();
        let output_length = output.chars().count();

        let Some(task) = self.tasks.iter_mut().find(|t| t.task_id == task_id) else {
            warn!(run_id = %self.run_id, task_id = %task_id, "end_task for unknown task");
            return;
        };
        task.end_time = Some(now);
        task.status = status.clone();
        task.output_length = output_length;
        if let Some(start) = task.start_time {
            task.duration = seconds_between(start, now);
        }
        let duration = task.duration;

        self.output_tokens += estimate_tokens(output_length);
        info!(
            event = "task.finished",
            run_id = %self.run_id,
            task_id = %task_id,
            status = %status,
            duration,
            output_length,
        );
        self.log_event(
            "task_end",
            serde_json::json!({
                "task_id": task_id,
                "status": status.as_str(),
                "duration": duration,
                "output_length": output_length,
            }),
        );
    }

    /// Record one tool call by `agent_name` with the given input payload.
    pub fn track_tool_use(&mut self, agent_name: &str, tool_name: &str, input: &str) {
        if let Some(agent) = self.agents.get_mut(agent_name) {
            agent.tool_calls += 1;
            if !agent.tools_used.iter().any(|t| t == tool_name) {
                agent.tools_used.push(tool_name.to_string());
            }
        }
        if let Some(task) = self
            .tasks
            .iter_mut()
            .rev()
            .find(|t| t.agent_name == agent_name && t.status == TaskStatus::Running)
        {
            task.tool_calls += 1;
        }

        let input_length = input.chars().count();
        self.input_tokens += estimate_tokens(input_length);
        self.log_event(
            "tool_use",
            serde_json::json!({ "agent": agent_name, "tool": tool_name, "input_length": input_length }),
        );
    }

    pub fn track_error(&mut self, agent_name: &str, error: &str) {
        if let Some(agent) = self.agents.get_mut(agent_name) {
            agent.errors.push(error.to_string());
        }
        warn!(event = "agent.error", run_id = %self.run_id, agent = %agent_name, error = %error);
        self.log_event(
            "error",
            serde_json::json!({ "agent": agent_name, "error": error }),
        );
    }

    /// Stamp the run end time. Calling again moves the end time forward.
    pub fn finalize(&mut self) {
        self.end_time = Some(self.clock.now());
    }

    /// Run duration in seconds, up to the end time or to now if not
    /// finalized.
    pub fn total_duration(&self) -> f64 {
        let end = self.end_time.unwrap_or_else(|| self.clock.now());
        seconds_between(self.start_time, end)
    }

    /// Frozen copy of the collected telemetry.
    pub fn snapshot(&self) -> TelemetrySnapshot {
        TelemetrySnapshot {
            agents: self.agents.clone(),
            tasks: self.tasks.clone(),
            total_duration: self.total_duration(),
        }
    }

    pub fn estimate_cost(&self) -> CostEstimate {
        let input_cost = self.input_tokens as f64 / 1000.0 * INPUT_USD_PER_1K;
        let output_cost = self.output_tokens as f64 / 1000.0 * OUTPUT_USD_PER_1K;
        CostEstimate {
            input_tokens: self.input_tokens,
            output_tokens: self.output_tokens,
            total_tokens: self.input_tokens + self.output_tokens,
            estimated_cost_usd: round4(input_cost + output_cost),
            input_cost_usd: round4(input_cost),
            output_cost_usd: round4(output_cost),
        }
    }

    /// Plain-text execution summary: totals, per-agent and per-task
    /// breakdowns, token and cost estimates.
    pub fn render_summary(&self) -> String {
        let mut out = String::new();
        let heavy = "=".repeat(70);
        let light = "-".repeat(70);

        let _ = writeln!(out, "{heavy}\nAGENT OBSERVABILITY SUMMARY\n{heavy}\n");
        let _ = writeln!(out, "Total Execution Time: {:.2} seconds", self.total_duration());
        let _ = writeln!(out, "Total Tasks: {}", self.tasks.len());
        let _ = writeln!(out, "Total Agents: {}\n", self.agents.len());

        let _ = writeln!(out, "{light}\nAGENT BREAKDOWN\n{light}\n");
        for (name, metrics) in &self.agents {
            let tools = if metrics.tools_used.is_empty() {
                "None".to_string()
            } else {
                metrics.tools_used.join(", ")
            };
            let _ = writeln!(out, "Agent: {}", name);
            let _ = writeln!(out, "  - Time: {:.2}s", metrics.total_time);
            let _ = writeln!(out, "  - Tool Calls: {}", metrics.tool_calls);
            let _ = writeln!(out, "  - Tools Used: {}", tools);
            if !metrics.errors.is_empty() {
                let _ = writeln!(out, "  - Errors: {}", metrics.errors.len());
            }
            out.push('\n');
        }

        let _ = writeln!(out, "{light}\nTASK BREAKDOWN\n{light}\n");
        for (i, task) in self.tasks.iter().enumerate() {
            let _ = writeln!(out, "Task {}: {}", i + 1, task.task_description);
            let _ = writeln!(out, "  - Agent: {}", task.agent_name);
            let _ = writeln!(out, "  - Status: {}", task.status);
            let _ = writeln!(out, "  - Duration: {:.2}s", task.duration);
            let _ = writeln!(out, "  - Output Length: {} characters\n", task.output_length);
        }

        let cost = self.estimate_cost();
        let _ = writeln!(out, "{light}\nTOKEN USAGE & COST ESTIMATES\n{light}\n");
        let _ = writeln!(out, "  - Input Tokens (est.): {}", cost.input_tokens);
        let _ = writeln!(out, "  - Output Tokens (est.): {}", cost.output_tokens);
        let _ = writeln!(out, "  - Total Tokens (est.): {}", cost.total_tokens);
        let _ = writeln!(out, "  - Estimated Cost: ${:.4} USD", cost.estimated_cost_usd);
        let _ = writeln!(out, "    Input Cost: ${:.4}", cost.input_cost_usd);
        let _ = writeln!(out, "    Output Cost: ${:.4}", cost.output_cost_usd);
        let _ = writeln!(out, "\n{heavy}");
        out
    }

    /// Write the full run telemetry as pretty JSON.
    pub fn export_metrics(&self, path: &Path) -> Result<()> {
        let export = MetricsExport {
            execution_summary: ExecutionSummary {
                run_id: self.run_id,
                start_time: self.start_time,
                end_time: self.end_time,
                total_duration: self
                    .end_time
                    .map(|end| seconds_between(self.start_time, end)),
            },
            agents: &self.agents,
            tasks: &self.tasks,
            cost_estimate: self.estimate_cost(),
            events: &self.events,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_vec_pretty(&export)?)?;
        info!(event = "metrics.exported", run_id = %self.run_id, path = %path.display());
        Ok(())
    }
}

fn seconds_between(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    let delta = end - start;
    delta
        .num_microseconds()
        .map(|us| us as f64 / 1_000_000.0)
        .unwrap_or_else(|| delta.num_milliseconds() as f64 / 1000.0)
}

fn estimate_tokens(chars: usize) -> u64 {
    (chars / CHARS_PER_TOKEN) as u64
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

fn truncate_description(description: &str) -> String {
    if description.chars().count() > DESCRIPTION_LIMIT {
        let mut short: String = description.chars().take(DESCRIPTION_LIMIT).collect();
        short.push_str("...");
        short
    } else {
        description.to_string()
    }
}
