//! Flesch reading-ease and Flesch-Kincaid grade level.
//!
//! Sentences are runs of text terminated by `.`, `!` or `?`; fragments of two
//! words or fewer are not counted as sentences, with a floor of one sentence.
//! Syllables are estimated from vowel groups. Results are rounded the way
//! common readability tooling reports them (ease to two decimals, grade and
//! sentence length to one).

use std::sync::OnceLock;

use regex::Regex;

/// Readability figures for a block of plain text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReadabilityStats {
    /// Flesch reading ease; higher is easier.
    pub reading_ease: f64,
    /// Flesch-Kincaid grade level.
    pub grade_level: f64,
    /// Words per sentence.
    pub avg_sentence_length: f64,
    pub words: usize,
    pub sentences: usize,
    pub syllables: usize,
}

/// Why readability could not be computed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReadabilityError {
    #[error("text contains no countable words")]
    NoWords,
}

fn sentence_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\b[^.!?]+[.!?]*").expect("sentence pattern is valid"))
}

/// Compute readability statistics for `text`.
pub fn analyze(text: &str) -> Result<ReadabilityStats, ReadabilityError> {
    let words = lexicon(text);
    if words.is_empty() {
        return Err(ReadabilityError::NoWords);
    }

    let sentences = sentence_count(text);
    let syllables: usize = words.iter().map(|w| count_syllables(w)).sum();

    let word_count = words.len() as f64;
    let asl = word_count / sentences as f64;
    let asw = syllables as f64 / word_count;

    Ok(ReadabilityStats {
        reading_ease: round_to(206.835 - 1.015 * asl - 84.6 * asw, 2),
        grade_level: round_to(0.39 * asl + 11.8 * asw - 15.59, 1),
        avg_sentence_length: round_to(asl, 1),
        words: words.len(),
        sentences,
        syllables,
    })
}

/// Words with surrounding punctuation removed. Tokens that are pure
/// punctuation are dropped.
fn lexicon(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|token| {
            token
                .chars()
                .filter(|c| c.is_alphanumeric() || *c == '\'' || *c == '\u{2019}')
                .collect::<String>()
        })
        .filter(|w| w.chars().any(char::is_alphanumeric))
        .collect()
}

fn sentence_count(text: &str) -> usize {
    let mut total = 0usize;
    let mut ignored = 0usize;
    for m in sentence_pattern().find_iter(text) {
        total += 1;
        if lexicon(m.as_str()).len() <= 2 {
            ignored += 1;
        }
    }
    total.saturating_sub(ignored).max(1)
}

/// Vowel-group syllable estimate. Every word has at least one syllable;
/// purely numeric tokens have none.
pub fn count_syllables(word: &str) -> usize {
    let letters: Vec<char> = word
        .chars()
        .filter(|c| c.is_alphabetic())
        .flat_map(char::to_lowercase)
        .collect();
    if letters.is_empty() {
        return 0;
    }
    if letters.len() <= 3 {
        return 1;
    }

    let is_vowel = |c: char| matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y');
    let mut groups = 0usize;
    let mut in_group = false;
    for &c in &letters {
        if is_vowel(c) {
            if !in_group {
                groups += 1;
            }
            in_group = true;
        } else {
            in_group = false;
        }
    }

    // Silent trailing "e", except the syllabic "-le" ending.
    let n = letters.len();
    if letters[n - 1] == 'e' && letters[n - 2] != 'l' && groups > 1 {
        groups -= 1;
    }

    groups.max(1)
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
