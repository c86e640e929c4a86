//! Human-readable rendering and persistence of evaluation results.
//!
//! Rendering is plain text; colouring is left to whatever terminal layer the
//! caller has. Persisted records are pretty JSON with a sibling `.digest`
//! file holding the SHA-256 of the exact bytes written, checked on reload.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::{AgentPerformanceScore, ContentQualityScore, EvalError, Result};
use crate::metrics::METRICS;
use crate::obs;

/// Default file name for exported evaluation records.
pub const DEFAULT_REPORT_FILE: &str = "evaluation_report.json";

const RULE_WIDTH: usize = 70;

/// A content and agent evaluation persisted together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    pub content_quality: ContentQualityScore,
    pub agent_performance: AgentPerformanceScore,
    pub timestamp: DateTime<Utc>,
}

impl EvaluationRecord {
    /// Pair two scores under the current time.
    pub fn new(content_quality: ContentQualityScore, agent_performance: AgentPerformanceScore) -> Self {
        Self {
            content_quality,
            agent_performance,
            timestamp: Utc::now(),
        }
    }
}

/// Lower-case hex SHA-256 of `bytes`.
pub fn content_digest(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Sidecar digest path: `report.json` -> `report.json.digest`.
pub fn digest_path(path: &Path) -> PathBuf {
    with_suffix(path, ".digest")
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

/// Stage `contents` next to `path` so the final step is a rename.
fn stage(path: &Path, contents: &[u8]) -> Result<PathBuf> {
    let staged = with_suffix(path, ".tmp");
    std::fs::write(&staged, contents)?;
    Ok(staged)
}

/// Write the record and its digest via staged files. The digest is moved
/// into place first, so a failure never leaves a record without one.
fn commit(path: &Path, json: &[u8], digest: &str) -> Result<()> {
    let sidecar = digest_path(path);
    let staged_json = stage(path, json)?;
    let moved = stage(&sidecar, digest.as_bytes())
        .and_then(|staged| {
            std::fs::rename(&staged, &sidecar).map_err(|err| {
                let _ = std::fs::remove_file(&staged);
                EvalError::from(err)
            })
        })
        .and_then(|()| std::fs::rename(&staged_json, path).map_err(EvalError::from));
    if moved.is_err() {
        let _ = std::fs::remove_file(&staged_json);
    }
    moved
}

/// Stateless renderer and exporter.
#[derive(Debug, Clone, Copy, Default)]
pub struct EvaluationReporter;

impl EvaluationReporter {
    pub fn render_content(&self, score: &ContentQualityScore) -> String {
        let mut out = String::new();
        banner(&mut out, "CONTENT QUALITY EVALUATION");
        let _ = writeln!(
            out,
            "Overall Score: {:.2}/100 (Grade: {})\n",
            score.overall_score(),
            score.grade()
        );

        out.push_str("Detailed Scores:\n");
        let _ = writeln!(out, "  - Readability: {:.1}/100", score.readability_score());
        let _ = writeln!(out, "  - Structure: {:.1}/100", score.structure_score());
        let _ = writeln!(out, "  - SEO: {:.1}/100", score.seo_score());
        let _ = writeln!(out, "  - Completeness: {:.1}/100\n", score.completeness_score());

        bullet_section(&mut out, "Issues Found", score.issues());
        bullet_section(&mut out, "Recommendations", score.recommendations());
        rule(&mut out, '=');
        out
    }

    pub fn render_agent(&self, score: &AgentPerformanceScore) -> String {
        let mut out = String::new();
        banner(&mut out, "AGENT PERFORMANCE EVALUATION");
        let _ = writeln!(
            out,
            "Overall Score: {:.2}/100 (Grade: {})\n",
            score.overall_score(),
            score.grade()
        );

        out.push_str("Detailed Scores:\n");
        let _ = writeln!(out, "  - Efficiency: {:.1}/100", score.efficiency_score());
        let _ = writeln!(out, "  - Reliability: {:.1}/100", score.reliability_score());
        let _ = writeln!(out, "  - Quality: {:.1}/100\n", score.quality_score());

        bullet_section(&mut out, "Strengths", score.strengths());
        bullet_section(&mut out, "Areas for Improvement", score.weaknesses());
        rule(&mut out, '=');
        out
    }

    /// Content section first, then agent section, then the record time.
    pub fn render_record(&self, record: &EvaluationRecord) -> String {
        let mut out = self.render_content(&record.content_quality);
        out.push('\n');
        out.push_str(&self.render_agent(&record.agent_performance));
        let _ = writeln!(out, "Evaluated at {}", record.timestamp.to_rfc3339());
        out
    }

    /// Write both scores as a timestamped record to `path`, plus its digest
    /// sidecar. Parent directories are created as needed.
    pub fn export_evaluation(
        &self,
        content: &ContentQualityScore,
        agent: &AgentPerformanceScore,
        path: &Path,
    ) -> Result<PathBuf> {
        let record = EvaluationRecord::new(content.clone(), agent.clone());
        self.write_record(&record, path)
    }

    /// Persist an already-built record.
    pub fn write_record(&self, record: &EvaluationRecord, path: &Path) -> Result<PathBuf> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_vec_pretty(record)?;
        let digest = content_digest(&json);

        commit(path, &json, &digest)?;

        METRICS.inc_reports_written();
        obs::emit_report_written(path, &digest);
        Ok(path.to_path_buf())
    }
}

/// Reload a record written by [`EvaluationReporter::export_evaluation`],
/// verifying it against its digest sidecar.
pub fn read_evaluation_record(path: &Path) -> Result<EvaluationRecord> {
    let json = std::fs::read(path)?;
    let expected = std::fs::read_to_string(digest_path(path))?;
    let actual = content_digest(&json);
    if expected.trim() != actual {
        return Err(EvalError::DigestMismatch {
            expected: expected.trim().to_string(),
            actual,
        });
    }
    Ok(serde_json::from_slice(&json)?)
}

fn rule(out: &mut String, ch: char) {
    out.extend(std::iter::repeat(ch).take(RULE_WIDTH));
    out.push('\n');
}

fn banner(out: &mut String, title: &str) {
    rule(out, '=');
    out.push_str(title);
    out.push('\n');
    rule(out, '=');
    out.push('\n');
}

fn bullet_section(out: &mut String, heading: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    let _ = writeln!(out, "{} ({}):", heading, items.len());
    for item in items {
        let _ = writeln!(out, "  - {}", item);
    }
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content() -> ContentQualityScore {
        ContentQualityScore::new(
            90.0,
            70.0,
            80.0,
            100.0,
            vec!["Too few paragraphs - content lacks depth".to_string()],
            vec!["Add more relevant tags".to_string()],
        )
    }

    fn agent() -> AgentPerformanceScore {
        AgentPerformanceScore::new(
            100.0,
            100.0,
            100.0,
            vec!["Zero errors during execution".to_string()],
            vec![],
        )
    }

    #[test]
    fn content_rendering_lists_axes_and_feedback() {
        let text = EvaluationReporter.render_content(&content());
        assert!(text.contains("CONTENT QUALITY EVALUATION"));
        assert!(text.contains("Overall Score: 85.00/100 (Grade: B)"));
        assert!(text.contains("  - Structure: 70.0/100"));
        assert!(text.contains("Issues Found (1):"));
        assert!(text.contains("  - Too few paragraphs - content lacks depth"));
        assert!(text.contains("Recommendations (1):"));
    }

    #[test]
    fn agent_rendering_omits_empty_sections() {
        let text = EvaluationReporter.render_agent(&agent());
        assert!(text.contains("Overall Score: 100.00/100 (Grade: A)"));
        assert!(text.contains("Strengths (1):"));
        assert!(!text.contains("Areas for Improvement"));
    }

    #[test]
    fn rendering_does_not_change_scores() {
        let score = content();
        let before = score.clone();
        let _ = EvaluationReporter.render_content(&score);
        assert_eq!(score, before);
    }

    #[test]
    fn record_renders_content_before_agent() {
        let record = EvaluationRecord::new(content(), agent());
        let text = EvaluationReporter.render_record(&record);
        let content_at = text.find("CONTENT QUALITY").expect("content section");
        let agent_at = text.find("AGENT PERFORMANCE").expect("agent section");
        assert!(content_at < agent_at);
    }

    #[test]
    fn digest_path_appends_suffix() {
        assert_eq!(
            digest_path(Path::new("out/evaluation_report.json")),
            PathBuf::from("out/evaluation_report.json.digest")
        );
    }

    #[test]
    fn digest_is_sha256_hex() {
        let digest = content_digest(b"abc");
        assert_eq!(
            digest,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
