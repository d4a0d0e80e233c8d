use std::sync::Arc;

use anyhow::{Context, Result};
use regex::{Captures, Regex};

use super::similarity::similarity_ratio;
use super::{Lexicon, RuleTable};

#[derive(Debug, Clone)]
pub struct WordCorrectorConfig {
    pub min_word_length: usize,
    pub max_word_length: usize,
    pub min_confidence: f64,
    pub max_edit_distance: usize,
    pub fix_hyphenation: bool,
}

impl Default for WordCorrectorConfig {
    fn default() -> Self {
        Self {
            min_word_length: 3,
            max_word_length: 20,
            min_confidence: 0.7,
            max_edit_distance: 2,
            fix_hyphenation: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Correction {
    pub word: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HyphenBreak {
    Soft,
    LineEnd,
    Spaced,
}

const JOIN_CONFIDENCE: f64 = 0.9;
/// Candidates at or below this ratio are never considered.
const CANDIDATE_SIMILARITY: f64 = 0.8;

#[derive(Debug)]
pub struct WordCorrector {
    config: WordCorrectorConfig,
    lexicon: Arc<Lexicon>,
    ocr_rules: RuleTable,
    hyphenation: Vec<(HyphenBreak, Regex)>,
    word_token: Regex,
}

impl WordCorrector {
    pub fn new(lexicon: Arc<Lexicon>, config: WordCorrectorConfig) -> Result<Self> {
        Ok(Self {
            config,
            lexicon,
            ocr_rules: RuleTable::ocr_errors()?,
            hyphenation: vec![
                (
                    HyphenBreak::Soft,
                    Regex::new(r"(\w{2,})\x{00AD}\s*\n+\s*(\w{2,})")
                        .context("failed to compile soft hyphen regex")?,
                ),
                (
                    HyphenBreak::LineEnd,
                    Regex::new(r"(\w{2,})-[ \t]*\n+\s*(\w{2,})")
                        .context("failed to compile line-end hyphen regex")?,
                ),
                (
                    HyphenBreak::Spaced,
                    Regex::new(r"(\w{2,})[ \t]+-[ \t]*(\w{2,})")
                        .context("failed to compile spaced hyphen regex")?,
                ),
            ],
            word_token: Regex::new(r"\w+").context("failed to compile word token regex")?,
        })
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    /// Returns the corrected word and the confidence of the correction. Words
    /// that are short, known, or without a good candidate come back unchanged
    /// with confidence 1.0.
    pub fn correct_word(&self, word: &str) -> (String, f64) {
        if word.chars().count() < self.config.min_word_length || self.lexicon.contains(word) {
            return (word.to_string(), 1.0);
        }

        if let Some(rule) = self.ocr_rules.match_word(word) {
            return (rule.replacement.to_string(), rule.confidence);
        }

        match self.suggest(word) {
            Some(candidate) if candidate.confidence >= self.config.min_confidence => {
                (candidate.word, candidate.confidence)
            }
            _ => (word.to_string(), 1.0),
        }
    }

    /// Best lexicon candidate scoring above 0.8, with the casing of `word`
    /// applied. `min_confidence` is checked by the caller.
    pub fn suggest(&self, word: &str) -> Option<Correction> {
        let length = word.chars().count();
        if length < self.config.min_word_length || length > self.config.max_word_length {
            return None;
        }

        let lowered = word.to_lowercase();
        let prefix = lowered.chars().take(2).collect::<String>();
        let mut best: Option<(&str, f64)> = None;

        for candidate in self.lexicon.words() {
            if candidate.chars().count().abs_diff(length) > self.config.max_edit_distance {
                continue;
            }
            if !candidate.starts_with(&prefix) || candidate == lowered {
                continue;
            }

            let score = similarity_ratio(&lowered, candidate);
            if score <= CANDIDATE_SIMILARITY {
                continue;
            }
            // Lexicon iteration is sorted, so equal scores keep the first word.
            if best.is_none_or(|(_, best_score)| score > best_score) {
                best = Some((candidate, score));
            }
        }

        best.map(|(candidate, score)| Correction {
            word: match_casing(word, candidate),
            confidence: score,
        })
    }

    pub fn correct_text(&self, text: &str) -> String {
        if text.is_empty() {
            return String::new();
        }

        let mut output = if self.config.fix_hyphenation {
            self.fix_hyphenated_words(text)
        } else {
            text.to_string()
        };
        output = self.ocr_rules.apply(&output);

        self.word_token
            .replace_all(&output, |captures: &Captures<'_>| {
                let word = &captures[0];
                let (corrected, confidence) = self.correct_word(word);
                if confidence >= self.config.min_confidence {
                    corrected
                } else {
                    word.to_string()
                }
            })
            .into_owned()
    }

    pub fn correct_document(&self, paragraphs: &[String]) -> Vec<String> {
        paragraphs
            .iter()
            .map(|paragraph| self.correct_text(paragraph))
            .collect()
    }

    fn fix_hyphenated_words(&self, text: &str) -> String {
        let mut output = text.to_string();

        for (kind, pattern) in &self.hyphenation {
            output = pattern
                .replace_all(&output, |captures: &Captures<'_>| {
                    self.join_hyphenated(*kind, &captures[0], &captures[1], &captures[2])
                })
                .into_owned();
        }

        output.replace('\u{00AD}', "")
    }

    fn join_hyphenated(&self, kind: HyphenBreak, matched: &str, head: &str, tail: &str) -> String {
        let joined = format!("{head}{tail}");
        if self.lexicon.contains(&joined) {
            return joined;
        }

        if let Some(candidate) = self.suggest(&joined)
            && candidate.confidence > JOIN_CONFIDENCE
        {
            return candidate.word;
        }

        let compound = format!("{head}-{tail}");
        if self.lexicon.contains(&compound) {
            return compound;
        }

        match kind {
            HyphenBreak::Soft => joined,
            HyphenBreak::LineEnd => compound,
            HyphenBreak::Spaced => matched.to_string(),
        }
    }
}

fn match_casing(original: &str, candidate: &str) -> String {
    let original_upper = original
        .chars()
        .next()
        .is_some_and(|character| character.is_uppercase());

    let mut characters = candidate.chars();
    match characters.next() {
        Some(first) if original_upper && first.is_lowercase() => {
            first.to_uppercase().chain(characters).collect()
        }
        _ => candidate.to_string(),
    }
}
