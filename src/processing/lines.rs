use anyhow::{Context, Result};
use regex::Regex;

use crate::model::{LineOutput, LineStats};

pub const DEFAULT_MAX_LINE_LENGTH: usize = 2000;

#[derive(Debug)]
pub struct LineProcessor {
    max_line_length: usize,
    whitespace: Regex,
    sentence_end: Regex,
}

impl LineProcessor {
    pub fn new(max_line_length: usize) -> Result<Self> {
        Ok(Self {
            max_line_length: max_line_length.max(1),
            whitespace: Regex::new(r"\s+").context("failed to compile whitespace regex")?,
            sentence_end: Regex::new(r"[.!?]\s+").context("failed to compile sentence regex")?,
        })
    }

    pub fn process(&self, raw_text: &str) -> LineOutput {
        let mut lines = Vec::<String>::new();

        for raw_line in raw_text.lines() {
            let line = self.whitespace.replace_all(raw_line.trim(), " ");
            if line.is_empty() {
                continue;
            }

            if line.chars().count() > self.max_line_length {
                lines.extend(self.split_long_line(&line));
            } else {
                lines.push(line.into_owned());
            }
        }

        let stats = line_stats(&lines);
        LineOutput { lines, stats }
    }

    /// Splits at sentence ends and re-packs sentences greedily up to the
    /// maximum. A single sentence over the limit is kept whole.
    fn split_long_line(&self, line: &str) -> Vec<String> {
        let mut sentences = Vec::<&str>::new();
        let mut start = 0usize;
        for found in self.sentence_end.find_iter(line) {
            sentences.push(line[start..found.start() + 1].trim());
            start = found.end();
        }
        if start < line.len() {
            sentences.push(line[start..].trim());
        }

        let mut fragments = Vec::<String>::new();
        let mut current = String::new();
        for sentence in sentences.into_iter().filter(|sentence| !sentence.is_empty()) {
            if current.is_empty() {
                current.push_str(sentence);
                continue;
            }

            let combined = current.chars().count() + 1 + sentence.chars().count();
            if combined <= self.max_line_length {
                current.push(' ');
                current.push_str(sentence);
            } else {
                fragments.push(std::mem::take(&mut current));
                current.push_str(sentence);
            }
        }
        if !current.is_empty() {
            fragments.push(current);
        }

        fragments
    }
}

fn line_stats(lines: &[String]) -> LineStats {
    if lines.is_empty() {
        return LineStats::default();
    }

    let lengths = lines
        .iter()
        .map(|line| line.chars().count())
        .collect::<Vec<usize>>();

    LineStats {
        total_lines: lines.len(),
        total_words: lines
            .iter()
            .map(|line| line.split_whitespace().count())
            .sum(),
        avg_line_length: lengths.iter().sum::<usize>() as f64 / lines.len() as f64,
        max_line_length: lengths.iter().copied().max().unwrap_or(0),
    }
}
