//! Publication gate over content quality.
//!
//! The evaluators never consult this; a caller decides whether a verdict
//! blocks publication or only warns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{ContentQualityScore, EvalError, Result};
use crate::obs;

/// Default minimum acceptable content score.
pub const DEFAULT_MIN_QUALITY_SCORE: f64 = 70.0;

/// Outcome of comparing one content score against the threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateVerdict {
    pub passed: bool,
    pub score: f64,
    pub threshold: f64,
    /// Why the gate blocked, if it did.
    pub reason: Option<String>,
    pub evaluated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityGate {
    min_quality_score: f64,
}

impl Default for QualityGate {
    fn default() -> Self {
        Self {
            min_quality_score: DEFAULT_MIN_QUALITY_SCORE,
        }
    }
}

impl QualityGate {
    /// Threshold must be a finite value in [0, 100].
    pub fn new(min_quality_score: f64) -> Result<Self> {
        if !min_quality_score.is_finite() || !(0.0..=100.0).contains(&min_quality_score) {
            return Err(EvalError::InvalidConfig(format!(
                "minimum quality score must be within [0, 100], got {}",
                min_quality_score
            )));
        }
        Ok(Self { min_quality_score })
    }

    pub fn min_quality_score(&self) -> f64 {
        self.min_quality_score
    }

    /// Passes when the overall score is at or above the threshold.
    pub fn evaluate(&self, score: &ContentQualityScore) -> GateVerdict {
        let overall = score.overall_score();
        let passed = overall >= self.min_quality_score;
        let reason = (!passed).then(|| {
            format!(
                "Content quality score ({}) is below minimum threshold ({})",
                overall, self.min_quality_score
            )
        });

        obs::emit_gate_evaluated(overall, self.min_quality_score, passed);
        GateVerdict {
            passed,
            score: overall,
            threshold: self.min_quality_score,
            reason,
            evaluated_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn score_of(axis: f64) -> ContentQualityScore {
        ContentQualityScore::new(axis, axis, axis, axis, vec![], vec![])
    }

    #[rstest]
    #[case(69.0, false)]
    #[case(70.0, true)]
    #[case(95.0, true)]
    fn threshold_is_inclusive(#[case] axis: f64, #[case] passed: bool) {
        let verdict = QualityGate::default().evaluate(&score_of(axis));
        assert_eq!(verdict.passed, passed);
        assert_eq!(verdict.threshold, 70.0);
        assert_eq!(verdict.reason.is_none(), passed);
    }

    #[test]
    fn blocked_reason_names_score_and_threshold() {
        let gate = QualityGate::new(80.0).expect("gate");
        let verdict = gate.evaluate(&score_of(62.5));
        assert_eq!(
            verdict.reason.as_deref(),
            Some("Content quality score (62.5) is below minimum threshold (80)")
        );
    }

    #[rstest]
    #[case(-1.0)]
    #[case(100.5)]
    #[case(f64::NAN)]
    fn out_of_range_threshold_is_rejected(#[case] threshold: f64) {
        assert!(matches!(
            QualityGate::new(threshold),
            Err(EvalError::InvalidConfig(_))
        ));
    }
}
