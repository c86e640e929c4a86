//! Content quality evaluation.
//!
//! Scores a generated post (title, HTML body, comma-separated tags) along four
//! independent axes: readability, structure, SEO and completeness. Every axis
//! starts at 100, subtracts fixed penalties and is clamped to `[0, 100]`.
//! The HTML is parsed once and shared by all axes; a failure inside one axis
//! becomes an [`AxisOutcome::Fallback`] and never affects the others.

pub mod html;
pub mod readability;

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::score::{weights_are_normalized, AxisOutcome, CONTENT_WEIGHTS, MAX_SCORE};
use crate::domain::ContentQualityScore;
use crate::metrics::METRICS;
use crate::obs;

pub use html::HtmlDocument;
pub use readability::{ReadabilityError, ReadabilityStats};

/// Score assigned to the readability axis when its metrics cannot be computed.
pub const READABILITY_FALLBACK_SCORE: f64 = 75.0;

/// Phrases that mark a closing paragraph as a conclusion.
pub const CONCLUSION_MARKERS: [&str; 5] =
    ["conclusion", "summary", "in closing", "to wrap up", "finally"];

/// Markers of unfinished or filler content.
pub const PLACEHOLDER_MARKERS: [&str; 5] = ["lorem ipsum", "placeholder", "todo", "tbd", "xxx"];

const MIN_H2_SECTIONS: usize = 3;
const MAX_H2_SECTIONS: usize = 8;
const MIN_PARAGRAPHS: usize = 5;
/// Matched against the case-folded raw content, so `<h1 class="...">` does not count.
const H1_MARKER: &str = "<h1>";

const MIN_TITLE_CHARS: usize = 30;
const GOOD_TITLE_CHARS: usize = 50;
const MAX_TITLE_CHARS: usize = 70;
const MIN_TAGS: usize = 3;
const MAX_TAGS: usize = 7;
const MIN_WORDS: usize = 800;
const LONG_FORM_WORDS: usize = 2000;
const MIN_KEYWORD_MATCHES: usize = 2;
const KEYWORD_MIN_CHARS: usize = 4;

const MIN_PARAGRAPH_WORDS: usize = 30;
const MIN_PARAGRAPHS_PER_SECTION: f64 = 2.0;
const MIN_VIABLE_WORDS: usize = 500;

/// The four content axes, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentAxis {
    Readability,
    Structure,
    Seo,
    Completeness,
}

impl ContentAxis {
    pub fn title(&self) -> &'static str {
        match self {
            ContentAxis::Readability => "Readability",
            ContentAxis::Structure => "Structure",
            ContentAxis::Seo => "SEO",
            ContentAxis::Completeness => "Completeness",
        }
    }
}

impl std::fmt::Display for ContentAxis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.title())
    }
}

/// Outcome and findings of one axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisReport {
    pub axis: ContentAxis,
    pub outcome: AxisOutcome,
    pub issues: Vec<String>,
    pub recommendations: Vec<String>,
}

impl AxisReport {
    pub fn score(&self) -> f64 {
        self.outcome.score()
    }
}

/// Per-axis breakdown of a content evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentAxes {
    pub readability: AxisReport,
    pub structure: AxisReport,
    pub seo: AxisReport,
    pub completeness: AxisReport,
}

impl ContentAxes {
    /// Axes in evaluation order.
    pub fn iter(&self) -> impl Iterator<Item = &AxisReport> {
        [
            &self.readability,
            &self.structure,
            &self.seo,
            &self.completeness,
        ]
        .into_iter()
    }

    pub fn fallbacks(&self) -> impl Iterator<Item = &AxisReport> {
        self.iter().filter(|r| r.outcome.is_fallback())
    }

    /// Fold the axes into a score record, concatenating findings in axis order.
    pub fn into_score(self) -> ContentQualityScore {
        let (r, s, e, c) = (
            self.readability.score(),
            self.structure.score(),
            self.seo.score(),
            self.completeness.score(),
        );

        let mut issues = Vec::new();
        let mut recommendations = Vec::new();
        for report in [self.readability, self.structure, self.seo, self.completeness] {
            issues.extend(report.issues);
            recommendations.extend(report.recommendations);
        }

        ContentQualityScore::new(r, s, e, c, issues, recommendations)
    }
}

/// Running total and findings for one axis.
struct AxisBuilder {
    axis: ContentAxis,
    score: f64,
    issues: Vec<String>,
    recommendations: Vec<String>,
}

impl AxisBuilder {
    fn new(axis: ContentAxis) -> Self {
        Self {
            axis,
            score: MAX_SCORE,
            issues: Vec::new(),
            recommendations: Vec::new(),
        }
    }

    fn issue(&mut self, message: impl Into<String>) -> &mut Self {
        self.issues.push(message.into());
        self
    }

    fn recommend(&mut self, message: impl Into<String>) -> &mut Self {
        self.recommendations.push(message.into());
        self
    }

    fn penalize(&mut self, points: f64) {
        self.score -= points;
    }

    fn finish(self) -> AxisReport {
        let outcome = AxisOutcome::scored(self.score);
        debug!(axis = %self.axis, score = outcome.score(), "content axis scored");
        AxisReport {
            axis: self.axis,
            outcome,
            issues: self.issues,
            recommendations: self.recommendations,
        }
    }

    /// Replace the running total with a fixed fallback score. Findings
    /// gathered before the failure are discarded.
    fn fall_back(self, score: f64, reason: String, issue: String) -> AxisReport {
        warn!(axis = %self.axis, reason = %reason, "content axis fell back");
        METRICS.inc_axis_fallbacks();
        AxisReport {
            axis: self.axis,
            outcome: AxisOutcome::fallback(score, reason),
            issues: vec![issue],
            recommendations: Vec::new(),
        }
    }
}

/// Split a comma-separated tag string, dropping blank entries.
pub fn parse_tags(tags: &str) -> Vec<&str> {
    tags.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect()
}

fn word_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\w+").expect("word pattern is valid"))
}

/// Distinct case-folded title words longer than four characters that occur
/// anywhere in the case-folded content.
pub fn title_keyword_matches(title: &str, content: &str) -> usize {
    let title_lower = title.to_lowercase();
    let content_lower = content.to_lowercase();
    word_pattern()
        .find_iter(&title_lower)
        .map(|m| m.as_str())
        .filter(|w| w.chars().count() > KEYWORD_MIN_CHARS)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .filter(|w| content_lower.contains(w))
        .count()
}

fn contains_any(haystack_lower: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack_lower.contains(n))
}

/// Evaluates generated blog content.
#[derive(Debug, Clone)]
pub struct ContentEvaluator {
    _private: (),
}

impl Default for ContentEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentEvaluator {
    /// Create an evaluator.
    ///
    /// # Panics
    ///
    /// Panics if the content axis weights do not sum to 1.0.
    pub fn new() -> Self {
        assert!(
            weights_are_normalized(&CONTENT_WEIGHTS),
            "content axis weights must sum to 1.0"
        );
        Self { _private: () }
    }

    /// Evaluate a post and return its quality score.
    ///
    /// Never fails: malformed HTML is parsed permissively and a metric that
    /// cannot be computed falls back to a fixed axis score with an issue.
    pub fn evaluate_content(&self, title: &str, content: &str, tags: &str) -> ContentQualityScore {
        let axes = self.evaluate_axes(title, content, tags);
        let fallbacks = axes.fallbacks().count();
        let score = axes.into_score();

        METRICS.inc_content_evaluations();
        obs::emit_content_evaluated(
            score.overall_score(),
            score.grade(),
            score.issues().len(),
            fallbacks,
        );
        score
    }

    /// Evaluate a post and return the per-axis breakdown.
    pub fn evaluate_axes(&self, title: &str, content: &str, tags: &str) -> ContentAxes {
        let doc = HtmlDocument::parse(content);
        let content_lower = content.to_lowercase();
        let word_count = doc.word_count();

        ContentAxes {
            readability: self.readability(&doc),
            structure: self.structure(&doc, &content_lower),
            seo: self.seo(title, content, tags, word_count),
            completeness: self.completeness(&doc, &content_lower, word_count),
        }
    }

    fn readability(&self, doc: &HtmlDocument) -> AxisReport {
        let mut axis = AxisBuilder::new(ContentAxis::Readability);

        let stats = match readability::analyze(doc.text()) {
            Ok(stats) => stats,
            Err(err) => {
                let issue = format!("Could not fully assess readability: {}", err);
                return axis.fall_back(READABILITY_FALLBACK_SCORE, err.to_string(), issue);
            }
        };

        if stats.reading_ease < 50.0 {
            axis.issue(format!(
                "Content is difficult to read (score: {:.1})",
                stats.reading_ease
            ))
            .recommend("Use shorter sentences and simpler words");
            axis.penalize(20.0);
        } else if stats.reading_ease < 60.0 {
            axis.recommend("Could improve readability with simpler language");
            axis.penalize(10.0);
        }

        if stats.grade_level > 12.0 {
            axis.issue(format!(
                "Content requires college-level reading (grade {:.1})",
                stats.grade_level
            ))
            .recommend("Simplify complex sentences");
            axis.penalize(15.0);
        } else if stats.grade_level < 6.0 {
            axis.issue("Content may be too simplistic");
            axis.penalize(5.0);
        }

        if stats.avg_sentence_length > 25.0 {
            axis.recommend("Consider breaking up long sentences");
            axis.penalize(10.0);
        }

        axis.finish()
    }

    fn structure(&self, doc: &HtmlDocument, content_lower: &str) -> AxisReport {
        let mut axis = AxisBuilder::new(ContentAxis::Structure);

        let h2 = doc.count("h2");
        if h2 < MIN_H2_SECTIONS {
            axis.issue(format!(
                "Only {} main sections (H2). Need at least {}",
                h2, MIN_H2_SECTIONS
            ))
            .recommend("Add more main sections with H2 headings");
            axis.penalize(25.0);
        } else if h2 > MAX_H2_SECTIONS {
            axis.issue("Too many main sections - content may be fragmented");
            axis.penalize(10.0);
        }

        if doc.count("h3") == 0 {
            axis.recommend("Consider adding subsections with H3 headings");
            axis.penalize(10.0);
        }

        if doc.count("p") < MIN_PARAGRAPHS {
            axis.issue("Too few paragraphs - content lacks depth")
                .recommend("Break content into more paragraphs");
            axis.penalize(20.0);
        }

        if doc.count_any(&["ul", "ol"]) == 0 {
            axis.recommend("Consider using bullet points or numbered lists");
            axis.penalize(10.0);
        }

        if content_lower.contains(H1_MARKER) {
            axis.issue("Contains H1 tag - title should be separate");
            axis.penalize(15.0);
        }

        if doc.count_any(&["strong", "em", "b", "i"]) == 0 {
            axis.recommend("Add emphasis to key points using bold/italic");
            axis.penalize(5.0);
        }

        axis.finish()
    }

    fn seo(&self, title: &str, content: &str, tags: &str, word_count: usize) -> AxisReport {
        let mut axis = AxisBuilder::new(ContentAxis::Seo);

        let title_len = title.chars().count();
        if title_len < MIN_TITLE_CHARS {
            axis.issue(format!(
                "Title too short ({} chars). SEO optimal: 50-70",
                title_len
            ))
            .recommend("Expand title to 50-70 characters");
            axis.penalize(20.0);
        } else if title_len < GOOD_TITLE_CHARS {
            axis.recommend("Title could be longer for better SEO");
            axis.penalize(10.0);
        } else if title_len > MAX_TITLE_CHARS {
            axis.issue(format!(
                "Title too long ({} chars). May be truncated",
                title_len
            ))
            .recommend("Shorten title to 50-70 characters");
            axis.penalize(15.0);
        }

        let tag_count = parse_tags(tags).len();
        if tag_count < MIN_TAGS {
            axis.issue(format!("Only {} tags. Recommended: 3-5", tag_count))
                .recommend("Add more relevant tags");
            axis.penalize(15.0);
        } else if tag_count > MAX_TAGS {
            axis.issue("Too many tags - dilutes focus")
                .recommend("Reduce to 3-5 most relevant tags");
            axis.penalize(10.0);
        }

        if word_count < MIN_WORDS {
            axis.issue(format!(
                "Content too short ({} words). Target: 800-1500",
                word_count
            ))
            .recommend("Expand content with more details and examples");
            axis.penalize(25.0);
        } else if word_count > LONG_FORM_WORDS {
            axis.recommend("Content is quite long - consider breaking into series");
            axis.penalize(5.0);
        }

        if title_keyword_matches(title, content) < MIN_KEYWORD_MATCHES {
            axis.issue("Title keywords barely appear in content")
                .recommend("Use title keywords naturally throughout content");
            axis.penalize(20.0);
        }

        axis.finish()
    }

    fn completeness(&self, doc: &HtmlDocument, content_lower: &str, word_count: usize) -> AxisReport {
        let mut axis = AxisBuilder::new(ContentAxis::Completeness);
        let paragraphs = doc.paragraphs();

        if let (Some(first), Some(last)) = (paragraphs.first(), paragraphs.last()) {
            if first.split_whitespace().count() < MIN_PARAGRAPH_WORDS {
                axis.issue("Introduction paragraph is too short")
                    .recommend("Expand introduction to engage readers");
                axis.penalize(15.0);
            }

            let has_conclusion = contains_any(&last.to_lowercase(), &CONCLUSION_MARKERS);
            if !has_conclusion && last.split_whitespace().count() < MIN_PARAGRAPH_WORDS {
                axis.recommend("Consider adding a clear conclusion");
                axis.penalize(10.0);
            }
        }

        let h2 = doc.count("h2");
        if h2 > 0 {
            let per_section = paragraphs.len() as f64 / h2 as f64;
            if per_section < MIN_PARAGRAPHS_PER_SECTION {
                axis.issue("Sections lack depth - need more content per section")
                    .recommend("Expand each section with more details");
                axis.penalize(20.0);
            }
        }

        if contains_any(content_lower, &PLACEHOLDER_MARKERS) {
            axis.issue("Content contains placeholder text");
            axis.penalize(30.0);
        }

        if word_count < MIN_VIABLE_WORDS {
            axis.issue("Content critically short - not viable for publication");
            axis.penalize(40.0);
        }

        axis.finish()
    }
}
