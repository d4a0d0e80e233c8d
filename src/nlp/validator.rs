use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use regex::Regex;
use tracing::{debug, warn};

use crate::model::{
    Chapter, ChapterValidation, LineValidation, SubchapterValidation, TableValidation,
    ValidationIssue, ValidationMetrics,
};

use super::WordCorrector;

/// Produces the advisory validation entry for one chapter.
pub trait ChapterValidator: std::fmt::Debug {
    fn validate_chapter(&self, chapter: &Chapter) -> Result<ChapterValidation>;
}

#[derive(Debug, Clone)]
pub struct ValidatorConfig {
    pub min_word_length: usize,
    pub min_text_chars: usize,
    pub min_words: usize,
    pub max_unknown_words: usize,
    pub sample_size: usize,
    pub budget: Duration,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            min_word_length: 3,
            min_text_chars: 10,
            min_words: 3,
            max_unknown_words: 10,
            sample_size: 50,
            budget: Duration::from_millis(100),
        }
    }
}

#[derive(Debug)]
pub struct TextValidator {
    config: ValidatorConfig,
    corrector: Arc<WordCorrector>,
    punctuation: Regex,
}

impl TextValidator {
    pub fn new(corrector: Arc<WordCorrector>, config: ValidatorConfig) -> Result<Self> {
        Ok(Self {
            config,
            corrector,
            punctuation: Regex::new(r"[^\w\s]").context("failed to compile punctuation regex")?,
        })
    }

    pub fn validate_text(&self, text: &str) -> LineValidation {
        let mut result = LineValidation {
            text: text.to_string(),
            issues: Vec::new(),
            valid: true,
            timed_out: false,
            metrics: ValidationMetrics::default(),
        };

        if text.chars().count() < self.config.min_text_chars {
            return result;
        }

        let started = Instant::now();
        let lowered = text.to_lowercase();
        let stripped = self.punctuation.replace_all(&lowered, " ");
        let words = stripped
            .split_whitespace()
            .filter(|word| word.chars().count() >= self.config.min_word_length)
            .collect::<Vec<&str>>();
        if words.len() < self.config.min_words {
            return result;
        }

        let lexicon = self.corrector.lexicon();
        let unknown = words
            .iter()
            .copied()
            .filter(|word| !lexicon.contains(word))
            .collect::<Vec<&str>>();

        result.metrics = ValidationMetrics {
            total_words: words.len(),
            unknown_words: unknown.len(),
        };

        for word in unknown.iter().take(self.config.max_unknown_words) {
            if started.elapsed() >= self.config.budget {
                warn!(
                    checked = result.issues.len(),
                    budget_ms = self.config.budget.as_millis() as u64,
                    "validation budget exhausted, returning partial result"
                );
                result.timed_out = true;
                break;
            }

            if let Some(suggestion) = self.corrector.suggest(word)
                && suggestion.word != *word
            {
                result.issues.push(ValidationIssue {
                    word: (*word).to_string(),
                    suggestion: suggestion.word,
                    confidence: suggestion.confidence,
                });
            }
        }

        result.valid = result.issues.is_empty();
        result
    }

    /// Systematic sample of at most `sample_size` lines; only flagged or
    /// truncated results are kept.
    fn validate_lines<'a, I>(&self, lines: I) -> Vec<LineValidation>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let lines = lines.into_iter().collect::<Vec<&str>>();
        let sample = self.config.sample_size.min(lines.len());

        (0..sample)
            .map(|index| index * lines.len() / sample)
            .filter_map(|index| lines.get(index))
            .map(|line| self.validate_text(line))
            .filter(|validation| !validation.valid || validation.timed_out)
            .collect()
    }
}

impl ChapterValidator for TextValidator {
    fn validate_chapter(&self, chapter: &Chapter) -> Result<ChapterValidation> {
        debug!(number = chapter.number, title = %chapter.title, "validating chapter");

        let mut validation = ChapterValidation::empty_for(chapter);
        validation.main_content = self
            .validate_lines(chapter.content.main_content.iter().map(String::as_str));

        for subchapter in &chapter.content.subchapters {
            let content = self.validate_lines(subchapter.lines.iter().map(String::as_str));
            if !content.is_empty() {
                validation.subchapters.push(SubchapterValidation {
                    title: subchapter.title.clone(),
                    content,
                });
            }
        }

        for table in &chapter.content.tables {
            let rows = table
                .rows
                .iter()
                .map(|row| row.join(" "))
                .collect::<Vec<String>>();
            let issues = self.validate_lines(rows.iter().map(String::as_str));
            if !issues.is_empty() {
                validation.tables.push(TableValidation {
                    table_type: table.table_type.clone(),
                    issues,
                });
            }
        }

        Ok(validation)
    }
}
