//! Agent performance evaluation.
//!
//! Scores a completed run from its telemetry snapshot along three axes:
//! efficiency (wall-clock and tool usage), reliability (errors, failed tasks,
//! duration consistency) and quality (a telemetry-level output-length check;
//! the written artifact itself is judged by the content evaluator).

use std::collections::BTreeMap;

use tracing::debug;

use crate::domain::score::{weights_are_normalized, AGENT_WEIGHTS, MAX_SCORE};
use crate::domain::{AgentMetrics, AgentPerformanceScore, TaskMetrics, TelemetrySnapshot};
use crate::metrics::METRICS;
use crate::obs;

const FAST_RUN_SECS: f64 = 30.0;
const TARGET_RUN_SECS: f64 = 60.0;
const SLOW_RUN_SECS: f64 = 90.0;
const MAX_TOOL_CALLS: u64 = 10;
const MIN_TOOL_CALLS: u64 = 3;
const SLOW_TASK_SECS: f64 = 30.0;

const ERROR_PENALTY: f64 = 20.0;
const FAILED_TASK_PENALTY: f64 = 30.0;
/// Raw seconds-squared; not normalized by the scale of task durations.
const DURATION_VARIANCE_LIMIT: f64 = 100.0;

const SHORT_OUTPUT_CHARS: usize = 50;
const SUBSTANTIAL_OUTPUT_CHARS: usize = 500;

/// Strength and weakness lists shared by the three axes, in axis order.
#[derive(Default)]
struct Findings {
    strengths: Vec<String>,
    weaknesses: Vec<String>,
}

/// Population variance, or `None` for an empty sample.
pub fn population_variance(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    Some(values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n)
}

/// Evaluates agent execution runs.
#[derive(Debug, Clone)]
pub struct AgentEvaluator {
    _private: (),
}

impl Default for AgentEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentEvaluator {
    /// Create an evaluator.
    ///
    /// # Panics
    ///
    /// Panics if the agent axis weights do not sum to 1.0.
    pub fn new() -> Self {
        assert!(
            weights_are_normalized(&AGENT_WEIGHTS),
            "agent axis weights must sum to 1.0"
        );
        Self { _private: () }
    }

    /// Evaluate a run from its agent metrics, task metrics and total duration
    /// in seconds.
    pub fn evaluate_agent_performance(
        &self,
        agent_metrics: &BTreeMap<String, AgentMetrics>,
        task_metrics: &[TaskMetrics],
        total_duration: f64,
    ) -> AgentPerformanceScore {
        let mut findings = Findings::default();

        let efficiency = self.efficiency(agent_metrics, task_metrics, total_duration, &mut findings);
        let reliability = self.reliability(agent_metrics, task_metrics, &mut findings);
        let quality = self.quality(task_metrics, &mut findings);
        debug!(efficiency, reliability, quality, "agent axes scored");

        let score = AgentPerformanceScore::new(
            efficiency,
            reliability,
            quality,
            findings.strengths,
            findings.weaknesses,
        );

        METRICS.inc_agent_evaluations();
        obs::emit_agent_evaluated(
            score.overall_score(),
            score.grade(),
            task_metrics.len(),
            agent_metrics.len(),
        );
        score
    }

    /// Evaluate a frozen telemetry snapshot.
    pub fn evaluate_snapshot(&self, snapshot: &TelemetrySnapshot) -> AgentPerformanceScore {
        self.evaluate_agent_performance(&snapshot.agents, &snapshot.tasks, snapshot.total_duration)
    }

    fn efficiency(
        &self,
        agents: &BTreeMap<String, AgentMetrics>,
        tasks: &[TaskMetrics],
        total_duration: f64,
        findings: &mut Findings,
    ) -> f64 {
        let mut score = MAX_SCORE;

        if total_duration < FAST_RUN_SECS {
            findings
                .strengths
                .push(format!("Very fast execution ({:.1}s)", total_duration));
        } else if total_duration > SLOW_RUN_SECS {
            findings
                .weaknesses
                .push(format!("Slow execution ({:.1}s)", total_duration));
            score -= 25.0;
        } else if total_duration > TARGET_RUN_SECS {
            findings
                .weaknesses
                .push("Execution time above target".to_string());
            score -= 15.0;
        }

        let tool_calls: u64 = agents.values().map(|a| u64::from(a.tool_calls)).sum();
        if tool_calls > MAX_TOOL_CALLS {
            findings
                .weaknesses
                .push(format!("High tool usage ({} calls)", tool_calls));
            score -= 15.0;
        } else if tool_calls < MIN_TOOL_CALLS {
            findings
                .weaknesses
                .push("Very few tool calls - may lack thoroughness".to_string());
            score -= 10.0;
        }

        let slow_tasks = tasks.iter().filter(|t| t.duration > SLOW_TASK_SECS).count();
        if slow_tasks > 0 {
            findings
                .weaknesses
                .push(format!("{} slow tasks detected", slow_tasks));
            score -= 10.0 * slow_tasks as f64;
        }

        score
    }

    fn reliability(
        &self,
        agents: &BTreeMap<String, AgentMetrics>,
        tasks: &[TaskMetrics],
        findings: &mut Findings,
    ) -> f64 {
        let mut score = MAX_SCORE;

        let errors: usize = agents.values().map(|a| a.errors.len()).sum();
        if errors == 0 {
            findings
                .strengths
                .push("Zero errors during execution".to_string());
        } else {
            findings.weaknesses.push(format!("{} errors occurred", errors));
            score -= ERROR_PENALTY * errors as f64;
        }

        let failed = tasks.iter().filter(|t| !t.status.is_completed()).count();
        if failed > 0 {
            findings.weaknesses.push(format!("{} tasks failed", failed));
            score -= FAILED_TASK_PENALTY * failed as f64;
        } else {
            findings
                .strengths
                .push("All tasks completed successfully".to_string());
        }

        let durations: Vec<f64> = tasks
            .iter()
            .map(|t| t.duration)
            .filter(|d| *d > 0.0)
            .collect();
        if let Some(variance) = population_variance(&durations) {
            if variance > DURATION_VARIANCE_LIMIT {
                findings
                    .weaknesses
                    .push("Inconsistent task completion times".to_string());
                score -= 10.0;
            }
        }

        score
    }

    fn quality(&self, tasks: &[TaskMetrics], findings: &mut Findings) -> f64 {
        let mut score = MAX_SCORE;

        for task in tasks {
            let len = task.output_length;
            if len > 0 && len < SHORT_OUTPUT_CHARS {
                findings
                    .weaknesses
                    .push(format!("Task produced very short output ({} chars)", len));
                score -= 15.0;
            }
        }

        let substantial = tasks
            .iter()
            .filter(|t| t.output_length > SUBSTANTIAL_OUTPUT_CHARS)
            .count();
        if substantial > 0 {
            findings
                .strengths
                .push(format!("{} tasks with substantial output", substantial));
        }

        score
    }
}
