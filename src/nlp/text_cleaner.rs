use std::sync::Arc;

use anyhow::Result;
use tracing::warn;

use crate::cli::CleaningLevel;
use crate::model::{Chapter, Subchapter};

use super::{Lexicon, LinguisticModel, RuleTable, SpacedText};

const MIN_PARAGRAPH_CHARS: usize = 5;
const MAX_SPLIT_CHARS: usize = 40;
const MIN_PIECE_CHARS: usize = 3;

#[derive(Debug)]
pub struct TextCleaner {
    level: CleaningLevel,
    lexicon: Arc<Lexicon>,
    spaced: SpacedText,
    term_rules: RuleTable,
    spacing_rules: RuleTable,
    model: Option<Arc<dyn LinguisticModel>>,
}

impl TextCleaner {
    pub fn new(lexicon: Arc<Lexicon>, level: CleaningLevel) -> Result<Self> {
        Ok(Self {
            level,
            lexicon,
            spaced: SpacedText::new()?,
            term_rules: RuleTable::term_normalization()?,
            spacing_rules: RuleTable::spacing_fixes()?,
            model: None,
        })
    }

    pub fn with_model(mut self, model: Arc<dyn LinguisticModel>) -> Self {
        self.model = Some(model);
        self
    }

    pub fn clean_paragraph(&self, text: &str) -> String {
        if text.chars().count() < MIN_PARAGRAPH_CHARS {
            return text.to_string();
        }

        let joined = self.spaced.join_spaced_words(text);
        let cleaned = self.term_rules.apply(&joined);
        if self.level == CleaningLevel::Light {
            return cleaned;
        }

        let split = self.fix_run_together_words(&cleaned);
        let spaced = self.spacing_rules.apply(&split);

        match &self.model {
            Some(model) => match model.refine(&spaced) {
                Ok(refined) => refined,
                Err(err) => {
                    warn!(model = model.name(), error = %err, "linguistic pass failed, keeping rule output");
                    spaced
                }
            },
            None => spaced,
        }
    }

    /// Returns a cleaned copy; tables are carried over as-is.
    pub fn clean_chapter(&self, chapter: &Chapter) -> Chapter {
        let mut cleaned = chapter.clone();
        cleaned.content.main_content = self.clean_lines(&chapter.content.main_content);
        cleaned.content.subchapters = chapter
            .content
            .subchapters
            .iter()
            .map(|subchapter| Subchapter {
                title: subchapter.title.clone(),
                lines: self.clean_lines(&subchapter.lines),
            })
            .collect();
        cleaned
    }

    fn clean_lines(&self, lines: &[String]) -> Vec<String> {
        lines.iter().map(|line| self.clean_paragraph(line)).collect()
    }

    fn fix_run_together_words(&self, text: &str) -> String {
        text.split(' ')
            .map(|token| self.split_token(token).unwrap_or_else(|| token.to_string()))
            .collect::<Vec<String>>()
            .join(" ")
    }

    fn split_token(&self, token: &str) -> Option<String> {
        let start = token.find(|character: char| character.is_alphabetic())?;
        let end = token
            .rfind(|character: char| character.is_alphabetic())
            .map(|index| index + token[index..].chars().next().map_or(1, char::len_utf8))?;
        let core = &token[start..end];

        if !core.chars().all(char::is_alphabetic) || self.lexicon.contains(core) {
            return None;
        }

        let pieces = self.segment(core)?;
        Some(format!("{}{}{}", &token[..start], pieces.join(" "), &token[end..]))
    }

    /// Fewest-piece segmentation of `word` into known words of three or more
    /// letters, accepted only when at least one piece is a common glue word.
    fn segment(&self, word: &str) -> Option<Vec<String>> {
        let boundaries = word
            .char_indices()
            .map(|(index, _)| index)
            .chain(std::iter::once(word.len()))
            .collect::<Vec<usize>>();
        let count = boundaries.len() - 1;
        if !(2 * MIN_PIECE_CHARS..=MAX_SPLIT_CHARS).contains(&count) {
            return None;
        }

        // best[i] = (pieces, previous boundary) for the prefix ending at boundary i.
        let mut best: Vec<Option<(usize, usize)>> = vec![None; count + 1];
        best[0] = Some((0, 0));

        for end in MIN_PIECE_CHARS..=count {
            for start in 0..=end - MIN_PIECE_CHARS {
                let Some((pieces, _)) = best[start] else {
                    continue;
                };
                let piece = &word[boundaries[start]..boundaries[end]];
                if !self.lexicon.contains(piece) {
                    continue;
                }
                if best[end].is_none_or(|(current, _)| pieces + 1 < current) {
                    best[end] = Some((pieces + 1, start));
                }
            }
        }

        let mut pieces = Vec::<String>::new();
        let mut cursor = count;
        while cursor > 0 {
            let (_, start) = best[cursor]?;
            pieces.push(word[boundaries[start]..boundaries[cursor]].to_string());
            cursor = start;
        }
        pieces.reverse();

        let glued = pieces.iter().any(|piece| self.lexicon.is_common(piece));
        (pieces.len() >= 2 && glued).then_some(pieces)
    }
}
