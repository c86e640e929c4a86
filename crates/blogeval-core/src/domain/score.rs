//! Score records and the shared grade mapping.
//!
//! Both score records keep their fields private. The overall score and grade
//! are derived in the constructor and deserialization is routed through the
//! same constructor, so a persisted record can never carry an overall score
//! that disagrees with its axes.

use serde::{Deserialize, Serialize};

/// Lower bound of every axis score.
pub const MIN_SCORE: f64 = 0.0;

/// Upper bound of every axis score, and the starting value of every axis.
pub const MAX_SCORE: f64 = 100.0;

pub const READABILITY_WEIGHT: f64 = 0.25;
pub const STRUCTURE_WEIGHT: f64 = 0.25;
pub const SEO_WEIGHT: f64 = 0.25;
pub const COMPLETENESS_WEIGHT: f64 = 0.25;

pub const EFFICIENCY_WEIGHT: f64 = 0.30;
pub const RELIABILITY_WEIGHT: f64 = 0.35;
pub const QUALITY_WEIGHT: f64 = 0.35;

/// Content axis weights in evaluation order.
pub const CONTENT_WEIGHTS: [f64; 4] = [
    READABILITY_WEIGHT,
    STRUCTURE_WEIGHT,
    SEO_WEIGHT,
    COMPLETENESS_WEIGHT,
];

/// Agent axis weights in evaluation order.
pub const AGENT_WEIGHTS: [f64; 3] = [EFFICIENCY_WEIGHT, RELIABILITY_WEIGHT, QUALITY_WEIGHT];

/// Whether a weight vector is normalized (sums to 1.0 within float noise).
pub fn weights_are_normalized(weights: &[f64]) -> bool {
    let sum: f64 = weights.iter().sum();
    (sum - 1.0).abs() < 1e-9
}

/// Clamp a raw axis total into `[0, 100]`. NaN collapses to zero.
pub fn clamp_score(raw: f64) -> f64 {
    if raw.is_nan() {
        return MIN_SCORE;
    }
    raw.clamp(MIN_SCORE, MAX_SCORE)
}

/// Letter grade derived from an overall score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    /// Map a score onto the five grade bands. Each band includes its lower bound.
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 90.0 => Grade::A,
            s if s >= 80.0 => Grade::B,
            s if s >= 70.0 => Grade::C,
            s if s >= 60.0 => Grade::D,
            _ => Grade::F,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        }
    }
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of scoring one axis.
///
/// `Fallback` marks an axis whose metric could not be computed; it carries
/// the fixed score that replaced the running total and the reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AxisOutcome {
    Scored { score: f64 },
    Fallback { score: f64, reason: String },
}

impl AxisOutcome {
    /// Clamp a running total into a scored outcome.
    pub fn scored(raw: f64) -> Self {
        AxisOutcome::Scored {
            score: clamp_score(raw),
        }
    }

    pub fn fallback(score: f64, reason: impl Into<String>) -> Self {
        AxisOutcome::Fallback {
            score: clamp_score(score),
            reason: reason.into(),
        }
    }

    pub fn score(&self) -> f64 {
        match self {
            AxisOutcome::Scored { score } | AxisOutcome::Fallback { score, .. } => *score,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, AxisOutcome::Fallback { .. })
    }
}

// ---------------------------------------------------------------------------
// Content quality
// ---------------------------------------------------------------------------

/// Quality assessment of one piece of generated content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ContentQualityFields")]
pub struct ContentQualityScore {
    readability_score: f64,
    structure_score: f64,
    seo_score: f64,
    completeness_score: f64,
    overall_score: f64,
    grade: Grade,
    issues: Vec<String>,
    recommendations: Vec<String>,
}

impl ContentQualityScore {
    /// Build a score from the four axis totals. Axes are clamped, then the
    /// overall score and grade are derived from them.
    pub fn new(
        readability: f64,
        structure: f64,
        seo: f64,
        completeness: f64,
        issues: Vec<String>,
        recommendations: Vec<String>,
    ) -> Self {
        let readability_score = clamp_score(readability);
        let structure_score = clamp_score(structure);
        let seo_score = clamp_score(seo);
        let completeness_score = clamp_score(completeness);

        let overall_score = readability_score * READABILITY_WEIGHT
            + structure_score * STRUCTURE_WEIGHT
            + seo_score * SEO_WEIGHT
            + completeness_score * COMPLETENESS_WEIGHT;

        Self {
            readability_score,
            structure_score,
            seo_score,
            completeness_score,
            overall_score,
            grade: Grade::from_score(overall_score),
            issues,
            recommendations,
        }
    }

    pub fn readability_score(&self) -> f64 {
        self.readability_score
    }

    pub fn structure_score(&self) -> f64 {
        self.structure_score
    }

    pub fn seo_score(&self) -> f64 {
        self.seo_score
    }

    pub fn completeness_score(&self) -> f64 {
        self.completeness_score
    }

    pub fn overall_score(&self) -> f64 {
        self.overall_score
    }

    pub fn grade(&self) -> Grade {
        self.grade
    }

    pub fn issues(&self) -> &[String] {
        &self.issues
    }

    pub fn recommendations(&self) -> &[String] {
        &self.recommendations
    }
}

#[derive(Deserialize)]
struct ContentQualityFields {
    readability_score: f64,
    structure_score: f64,
    seo_score: f64,
    completeness_score: f64,
    #[serde(default)]
    issues: Vec<String>,
    #[serde(default)]
    recommendations: Vec<String>,
}

impl From<ContentQualityFields> for ContentQualityScore {
    fn from(f: ContentQualityFields) -> Self {
        ContentQualityScore::new(
            f.readability_score,
            f.structure_score,
            f.seo_score,
            f.completeness_score,
            f.issues,
            f.recommendations,
        )
    }
}

// ---------------------------------------------------------------------------
// Agent performance
// ---------------------------------------------------------------------------

/// Performance assessment of one completed execution run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "AgentPerformanceFields")]
pub struct AgentPerformanceScore {
    efficiency_score: f64,
    reliability_score: f64,
    quality_score: f64,
    overall_score: f64,
    grade: Grade,
    strengths: Vec<String>,
    weaknesses: Vec<String>,
}

impl AgentPerformanceScore {
    /// Build a score from the three axis totals. Axes are clamped before
    /// weighting.
    pub fn new(
        efficiency: f64,
        reliability: f64,
        quality: f64,
        strengths: Vec<String>,
        weaknesses: Vec<String>,
    ) -> Self {
        let efficiency_score = clamp_score(efficiency);
        let reliability_score = clamp_score(reliability);
        let quality_score = clamp_score(quality);

        let overall_score = efficiency_score * EFFICIENCY_WEIGHT
            + reliability_score * RELIABILITY_WEIGHT
            + quality_score * QUALITY_WEIGHT;

        Self {
            efficiency_score,
            reliability_score,
            quality_score,
            overall_score,
            grade: Grade::from_score(overall_score),
            strengths,
            weaknesses,
        }
    }

    pub fn efficiency_score(&self) -> f64 {
        self.efficiency_score
    }

    pub fn reliability_score(&self) -> f64 {
        self.reliability_score
    }

    pub fn quality_score(&self) -> f64 {
        self.quality_score
    }

    pub fn overall_score(&self) -> f64 {
        self.overall_score
    }

    pub fn grade(&self) -> Grade {
        self.grade
    }

    pub fn strengths(&self) -> &[String] {
        &self.strengths
    }

    pub fn weaknesses(&self) -> &[String] {
        &self.weaknesses
    }
}

#[derive(Deserialize)]
struct AgentPerformanceFields {
    efficiency_score: f64,
    reliability_score: f64,
    quality_score: f64,
    #[serde(default)]
    strengths: Vec<String>,
    #[serde(default)]
    weaknesses: Vec<String>,
}

impl From<AgentPerformanceFields> for AgentPerformanceScore {
    fn from(f: AgentPerformanceFields) -> Self {
        AgentPerformanceScore::new(
            f.efficiency_score,
            f.reliability_score,
            f.quality_score,
            f.strengths,
            f.weaknesses,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(100.0, Grade::A)]
    #[case(90.0, Grade::A)]
    #[case(89.99, Grade::B)]
    #[case(80.0, Grade::B)]
    #[case(79.99, Grade::C)]
    #[case(70.0, Grade::C)]
    #[case(69.99, Grade::D)]
    #[case(60.0, Grade::D)]
    #[case(59.99, Grade::F)]
    #[case(0.0, Grade::F)]
    fn grade_bands_include_lower_bound(#[case] score: f64, #[case] expected: Grade) {
        assert_eq!(Grade::from_score(score), expected);
    }

    #[test]
    fn grade_is_monotonic() {
        let mut previous = Grade::from_score(0.0);
        for step in 0..=1000 {
            let grade = Grade::from_score(step as f64 / 10.0);
            // Ord runs A < B < ... < F, so a rising score never moves right.
            assert!(grade <= previous, "grade regressed at {}", step);
            previous = grade;
        }
    }

    #[test]
    fn weight_tables_are_normalized() {
        assert!(weights_are_normalized(&CONTENT_WEIGHTS));
        assert!(weights_are_normalized(&AGENT_WEIGHTS));
        assert!(!weights_are_normalized(&[0.5, 0.4]));
    }

    #[test]
    fn clamp_score_bounds() {
        assert_eq!(clamp_score(-35.0), 0.0);
        assert_eq!(clamp_score(140.0), 100.0);
        assert_eq!(clamp_score(f64::NAN), 0.0);
        assert_eq!(clamp_score(42.5), 42.5);
    }

    #[test]
    fn content_overall_is_mean_of_axes() {
        let score = ContentQualityScore::new(75.0, 60.0, 100.0, 45.0, vec![], vec![]);
        assert_eq!(score.overall_score(), (75.0 + 60.0 + 100.0 + 45.0) / 4.0);
        assert_eq!(score.grade(), Grade::C);
    }

    #[test]
    fn content_axes_are_clamped_before_averaging() {
        let score = ContentQualityScore::new(-20.0, 100.0, 100.0, 100.0, vec![], vec![]);
        assert_eq!(score.readability_score(), 0.0);
        assert_eq!(score.overall_score(), 75.0);
    }

    #[test]
    fn agent_overall_is_weighted_sum() {
        let score = AgentPerformanceScore::new(85.0, 40.0, 70.0, vec![], vec![]);
        let expected = 0.30 * 85.0 + 0.35 * 40.0 + 0.35 * 70.0;
        assert!((score.overall_score() - expected).abs() < 1e-9);
        assert_eq!(score.grade(), Grade::D);
    }

    #[test]
    fn deserialize_recomputes_overall() {
        let json = serde_json::json!({
            "readability_score": 100.0,
            "structure_score": 100.0,
            "seo_score": 100.0,
            "completeness_score": 100.0,
            "overall_score": 12.0,
            "grade": "F",
            "issues": [],
            "recommendations": []
        });
        let score: ContentQualityScore = serde_json::from_value(json).expect("deserialize");
        assert_eq!(score.overall_score(), 100.0);
        assert_eq!(score.grade(), Grade::A);
    }

    #[test]
    fn serialized_content_score_has_all_fields() {
        let score = ContentQualityScore::new(
            80.0,
            90.0,
            70.0,
            60.0,
            vec!["issue".to_string()],
            vec!["rec".to_string()],
        );
        let v = serde_json::to_value(&score).expect("to_value");
        let obj = v.as_object().expect("object");
        for key in &[
            "readability_score",
            "structure_score",
            "seo_score",
            "completeness_score",
            "overall_score",
            "grade",
            "issues",
            "recommendations",
        ] {
            assert!(obj.contains_key(*key), "missing key: {}", key);
        }
        assert_eq!(obj["grade"], "C");
    }

    #[test]
    fn axis_outcome_fallback_keeps_reason() {
        let outcome = AxisOutcome::fallback(75.0, "no sentences");
        assert!(outcome.is_fallback());
        assert_eq!(outcome.score(), 75.0);

        let scored = AxisOutcome::scored(-10.0);
        assert!(!scored.is_fallback());
        assert_eq!(scored.score(), 0.0);
    }
}
