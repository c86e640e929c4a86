//! Structured observability hooks for evaluation events.
//!
//! - `EvaluationSpan` RAII guard tagging everything inside with an
//!   evaluation id
//! - `emit_*` functions for completed evaluations, report writes and gate
//!   verdicts
//!
//! Events are emitted at `info!` level; filter with `RUST_LOG`.

use std::path::Path;

use tracing::info;

use crate::domain::Grade;

/// RAII guard that enters an evaluation-scoped span.
///
/// ```ignore
/// let _span = EvaluationSpan::enter("eval-1234");
/// // events below carry evaluation_id = "eval-1234"
/// ```
pub struct EvaluationSpan {
    _span: tracing::span::EnteredSpan,
}

impl EvaluationSpan {
    pub fn enter(evaluation_id: &str) -> Self {
        let span = tracing::info_span!("blogeval.evaluation", evaluation_id = %evaluation_id);
        Self {
            _span: span.entered(),
        }
    }
}

/// Emit event: content scored.
pub fn emit_content_evaluated(overall: f64, grade: Grade, issues: usize, fallbacks: usize) {
    info!(
        event = "content.evaluated",
        overall = overall,
        grade = %grade,
        issues = issues,
        fallback_axes = fallbacks,
    );
}

/// Emit event: agent run scored.
pub fn emit_agent_evaluated(overall: f64, grade: Grade, tasks: usize, agents: usize) {
    info!(
        event = "agent.evaluated",
        overall = overall,
        grade = %grade,
        tasks = tasks,
        agents = agents,
    );
}

/// Emit event: a report file was written.
pub fn emit_report_written(path: &Path, digest: &str) {
    info!(event = "report.written", path = %path.display(), digest = %digest);
}

/// Emit event: quality gate evaluated.
pub fn emit_gate_evaluated(score: f64, threshold: f64, passed: bool) {
    info!(
        event = "gate.evaluated",
        score = score,
        threshold = threshold,
        passed = passed,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluation_span_enters_without_subscriber() {
        let _span = EvaluationSpan::enter("test-evaluation");
        emit_gate_evaluated(72.5, 70.0, true);
    }
}
