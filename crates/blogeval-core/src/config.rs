//! Evaluation settings loaded from the environment.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::{EvalError, Result};
use crate::quality_gate::{QualityGate, DEFAULT_MIN_QUALITY_SCORE};

/// Switches and locations for the evaluation step of a pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationConfig {
    pub enable_evaluation: bool,
    pub export_evaluation: bool,
    pub export_metrics: bool,
    pub min_quality_score: f64,
    pub report_dir: PathBuf,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            enable_evaluation: true,
            export_evaluation: true,
            export_metrics: true,
            min_quality_score: DEFAULT_MIN_QUALITY_SCORE,
            report_dir: PathBuf::from("."),
        }
    }
}

impl EvaluationConfig {
    /// Create from environment variables
    ///
    /// Reads:
    /// - ENABLE_EVALUATION (optional, default: "true")
    /// - EXPORT_EVALUATION (optional, default: "true")
    /// - EXPORT_METRICS (optional, default: "true")
    /// - MIN_QUALITY_SCORE (optional, default: "70"), must be within [0, 100]
    /// - EVALUATION_REPORT_DIR (optional, default: ".")
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a caller-supplied lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let flag = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_lowercase() == "true")
                .unwrap_or(true)
        };

        let min_quality_score = match lookup("MIN_QUALITY_SCORE") {
            Some(raw) => raw.trim().parse::<f64>().map_err(|_| {
                EvalError::InvalidConfig(format!("MIN_QUALITY_SCORE is not a number: {:?}", raw))
            })?,
            None => DEFAULT_MIN_QUALITY_SCORE,
        };
        // Range check lives in the gate constructor.
        QualityGate::new(min_quality_score)?;

        Ok(Self {
            enable_evaluation: flag("ENABLE_EVALUATION"),
            export_evaluation: flag("EXPORT_EVALUATION"),
            export_metrics: flag("EXPORT_METRICS"),
            min_quality_score,
            report_dir: lookup("EVALUATION_REPORT_DIR")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".")),
        })
    }

    pub fn quality_gate(&self) -> Result<QualityGate> {
        QualityGate::new(self.min_quality_score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = EvaluationConfig::from_lookup(lookup(&[])).expect("config");
        assert_eq!(config, EvaluationConfig::default());
    }

    #[test]
    fn booleans_are_case_insensitive_and_strict() {
        let config = EvaluationConfig::from_lookup(lookup(&[
            ("ENABLE_EVALUATION", "TRUE"),
            ("EXPORT_EVALUATION", "yes"),
            ("EXPORT_METRICS", "false"),
        ]))
        .expect("config");
        assert!(config.enable_evaluation);
        assert!(!config.export_evaluation);
        assert!(!config.export_metrics);
    }

    #[test]
    fn reads_threshold_and_report_dir() {
        let config = EvaluationConfig::from_lookup(lookup(&[
            ("MIN_QUALITY_SCORE", " 82.5 "),
            ("EVALUATION_REPORT_DIR", "/tmp/reports"),
        ]))
        .expect("config");
        assert_eq!(config.min_quality_score, 82.5);
        assert_eq!(config.report_dir, PathBuf::from("/tmp/reports"));
        assert_eq!(
            config.quality_gate().expect("gate").min_quality_score(),
            82.5
        );
    }

    #[test]
    fn invalid_threshold_is_rejected() {
        for raw in ["seventy", "150", "-3"] {
            let err = EvaluationConfig::from_lookup(lookup(&[("MIN_QUALITY_SCORE", raw)]))
                .expect_err("should reject");
            assert!(matches!(err, EvalError::InvalidConfig(_)), "{raw}: {err}");
        }
    }
}
