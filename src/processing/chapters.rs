use std::sync::Arc;

use anyhow::{Context, Result};
use regex::Regex;
use tracing::{debug, warn};

use crate::model::{
    Chapter, ChapterContent, ChapterProcessingResult, ChapterStats, ChapterValidation, Subchapter,
};
use crate::nlp::{
    ChapterValidator, Lexicon, RuleTable, SpacedText, coalesce_letter_runs,
    repair_single_char_gaps, split_case_boundaries, split_pascal_case,
};

use super::tables::{DEFAULT_MIN_ROWS, TableProcessor};

const MAX_SUBCHAPTER_CHARS: usize = 50;
const MAX_PLAIN_HEADING_CHARS: usize = 60;
const STEP_BY_STEP_TITLE: &str = "Step-by-Step Characters";

#[derive(Debug)]
struct HeadingPatterns {
    explicit: Regex,
    plain_heading: Regex,
    lone_number: Regex,
    canonical: Regex,
    step_by_step: Regex,
    toc_leader: Regex,
    toc_page: Regex,
    bare_chapter: Regex,
    personality: Regex,
    numbered_title: Regex,
}

impl HeadingPatterns {
    fn new() -> Result<Self> {
        Ok(Self {
            explicit: Regex::new(r"(?i)^Chapter\s+\d+\b")
                .context("failed to compile chapter heading regex")?,
            plain_heading: Regex::new(r"(?i)^Chapter\s+\d+\s*(?::\s*\S.*)?$")
                .context("failed to compile plain chapter heading regex")?,
            lone_number: Regex::new(r"^(\d+)\s*$")
                .context("failed to compile lone number heading regex")?,
            canonical: Regex::new(
                r"(?i)^(?:Races|Classes|Equipment|Spells|Combat|Adventuring|Spellcasting)\s*$",
            )
            .context("failed to compile canonical heading regex")?,
            step_by_step: Regex::new(
                r"(?i)^st\s*[e\s]*p[\s-]*[b\s]*y[\s-]*[s\s]*t\s*e\s*p\s*characters\s*$",
            )
                .context("failed to compile step-by-step heading regex")?,
            toc_leader: Regex::new(r"\.{3,}\s*\d+\s*$")
                .context("failed to compile TOC leader regex")?,
            toc_page: Regex::new(r"\s\d+\s*$").context("failed to compile TOC page regex")?,
            bare_chapter: Regex::new(r"(?i)^Chapter\s+\d+\s*$")
                .context("failed to compile bare chapter regex")?,
            personality: Regex::new(r"^Chapter\s+(\d+)\s*:?\s*([Pp]ersonalityand\s*.*)$")
                .context("failed to compile personality heading regex")?,
            numbered_title: Regex::new(r"(?i)^Chapter\s+(\d+)\s*:?\s*(.*)$")
                .context("failed to compile numbered heading regex")?,
        })
    }
}

/// Walks a line stream and rebuilds the chapter / subchapter / table tree.
#[derive(Debug)]
pub struct ChapterProcessor {
    lexicon: Arc<Lexicon>,
    spaced: SpacedText,
    term_rules: RuleTable,
    tables: TableProcessor,
    headings: HeadingPatterns,
    validator: Option<Arc<dyn ChapterValidator>>,
}

impl ChapterProcessor {
    pub fn new(lexicon: Arc<Lexicon>) -> Result<Self> {
        Ok(Self {
            lexicon,
            spaced: SpacedText::new()?,
            term_rules: RuleTable::term_normalization()?,
            tables: TableProcessor::new()?,
            headings: HeadingPatterns::new()?,
            validator: None,
        })
    }

    pub fn with_validator(mut self, validator: Arc<dyn ChapterValidator>) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn process(&self, lines: &[String]) -> ChapterProcessingResult {
        self.process_with_progress(lines, &mut |_| {})
    }

    /// `progress` receives the number of chapters closed so far, once per
    /// closed chapter.
    pub fn process_with_progress(
        &self,
        lines: &[String],
        progress: &mut dyn FnMut(usize),
    ) -> ChapterProcessingResult {
        debug!(lines = lines.len(), "starting chapter processing");

        let mut walk = ChapterWalk::new(Chapter::front_matter());
        for line in lines {
            self.step(&mut walk, line, true, progress);
        }
        let (chapters, mut stats) = walk.finish(self, progress);

        stats.total_chapters = chapters.len();
        stats.avg_chapter_length = average_chapter_length(&chapters);

        let validation = self.validate(&chapters);
        debug!(
            chapters = chapters.len(),
            tables = stats.tables_detected,
            "chapter processing complete"
        );

        ChapterProcessingResult {
            chapters,
            validation,
            stats,
        }
    }

    /// Processes a body with no chapter breaks, e.g. an appendix.
    pub fn process_section(&self, lines: &[String]) -> ChapterContent {
        let mut walk = ChapterWalk::new(Chapter::front_matter());
        let mut ignore = |_: usize| {};
        for line in lines {
            self.step(&mut walk, line, false, &mut ignore);
        }
        let (mut chapters, _) = walk.finish(self, &mut ignore);
        chapters
            .pop()
            .map(|chapter| chapter.content)
            .unwrap_or_default()
    }

    fn step(
        &self,
        walk: &mut ChapterWalk,
        raw_line: &str,
        detect_chapters: bool,
        progress: &mut dyn FnMut(usize),
    ) {
        let trimmed = raw_line.trim();
        if trimmed.is_empty() {
            walk.stats.blank_lines_skipped += 1;
            return;
        }

        let spaced = self.spaced.has_signature(trimmed);
        let line = if spaced {
            coalesce_letter_runs(trimmed)
        } else {
            trimmed.to_string()
        };

        if detect_chapters && self.is_chapter_title(&line, spaced) {
            let next = self.chapter_heading(&line, &mut walk.stats);
            debug!(number = next.number, title = %next.title, "found chapter heading");
            walk.close_chapter(self, next, progress);
            return;
        }

        if spaced && let Some(title) = self.subchapter_title(&line) {
            walk.open_subchapter(self, title);
            return;
        }

        walk.push_content(line);
    }

    /// A trailing page number marks a TOC line unless the line is a bare
    /// `Chapter N` heading.
    pub fn is_toc_line(&self, line: &str) -> bool {
        let headings = &self.headings;
        headings.toc_leader.is_match(line)
            || (headings.toc_page.is_match(line) && !headings.bare_chapter.is_match(line))
    }

    /// De-spaced lines are tested against every heading pattern. A plain line
    /// only opens a chapter in the exact `Chapter N` or `Chapter N: Title`
    /// shape, so prose, running headers and page numbers stay content.
    pub fn is_chapter_title(&self, line: &str, spaced: bool) -> bool {
        if self.is_toc_line(line) {
            return false;
        }

        let headings = &self.headings;
        if !spaced {
            return line.chars().count() <= MAX_PLAIN_HEADING_CHARS
                && headings.plain_heading.is_match(line);
        }

        headings.explicit.is_match(line)
            || headings.lone_number.is_match(line)
            || headings.canonical.is_match(line)
            || headings.step_by_step.is_match(line)
    }

    fn chapter_heading(&self, line: &str, stats: &mut ChapterStats) -> Chapter {
        let line = line.trim();
        let headings = &self.headings;

        let numbered = if headings.step_by_step.is_match(line) {
            Some((1, STEP_BY_STEP_TITLE.to_string()))
        } else if let Some(captures) = headings.personality.captures(line) {
            let title = captures[2]
                .replacen("ersonalityand", "ersonality and", 1)
                .trim()
                .to_string();
            captures[1]
                .parse::<u32>()
                .ok()
                .map(|number| (number, split_case_boundaries(&title)))
        } else if let Some(captures) = headings.numbered_title.captures(line) {
            let title = captures[2].trim();
            captures[1].parse::<u32>().ok().map(|number| {
                if title.is_empty() {
                    (number, format!("Chapter {number}"))
                } else {
                    (number, split_case_boundaries(title))
                }
            })
        } else if let Some(captures) = headings.lone_number.captures(line) {
            captures[1]
                .parse::<u32>()
                .ok()
                .map(|number| (number, format!("Chapter {number}")))
        } else {
            None
        };

        let (number, title) = numbered.unwrap_or_else(|| {
            warn!(title = %line, "chapter heading carries no number, using 0");
            stats.fallback_numbered_chapters += 1;
            (0, line.to_string())
        });

        Chapter {
            number,
            title,
            original_line: Some(line.to_string()),
            content: ChapterContent::default(),
        }
    }

    fn subchapter_title(&self, line: &str) -> Option<String> {
        if line.chars().count() > MAX_SUBCHAPTER_CHARS {
            return None;
        }

        let words = line.split_whitespace().collect::<Vec<&str>>();
        let capitalized = words.iter().all(|word| {
            word.chars()
                .next()
                .is_some_and(|character| character.is_uppercase())
        });
        if words.is_empty() || !capitalized {
            return None;
        }

        Some(
            words
                .iter()
                .flat_map(|word| split_pascal_case(word))
                .collect::<Vec<String>>()
                .join(" "),
        )
    }

    /// Prose repair applied to every content line that is not part of a table.
    pub fn clean_content_line(&self, line: &str) -> String {
        let joined = self.spaced.join_spaced_words(line);
        let normalized = self.term_rules.apply(&joined);
        let repaired = repair_single_char_gaps(&normalized, &self.lexicon);
        self.spaced.collapse_whitespace(&repaired)
    }

    fn validate(&self, chapters: &[Chapter]) -> Vec<ChapterValidation> {
        let Some(validator) = &self.validator else {
            return Vec::new();
        };

        chapters
            .iter()
            .map(|chapter| match validator.validate_chapter(chapter) {
                Ok(validation) => validation,
                Err(err) => {
                    warn!(
                        number = chapter.number,
                        title = %chapter.title,
                        error = %err,
                        "chapter validation failed, recording empty entry"
                    );
                    ChapterValidation::empty_for(chapter)
                }
            })
            .collect()
    }
}

/// Per-call walk state: the open chapter, its unclassified lines and the
/// open subchapter.
#[derive(Debug)]
struct ChapterWalk {
    chapters: Vec<Chapter>,
    current: Chapter,
    attributed_lines: usize,
    pending: Vec<String>,
    subchapter: Option<Subchapter>,
    stats: ChapterStats,
}

impl ChapterWalk {
    fn new(first: Chapter) -> Self {
        Self {
            chapters: Vec::new(),
            current: first,
            attributed_lines: 0,
            pending: Vec::new(),
            subchapter: None,
            stats: ChapterStats::default(),
        }
    }

    fn push_content(&mut self, line: String) {
        match self.subchapter.as_mut() {
            Some(subchapter) => subchapter.lines.push(line),
            None => self.pending.push(line),
        }
    }

    fn flush_pending(&mut self, processor: &ChapterProcessor) {
        if self.pending.is_empty() {
            return;
        }

        let buffer = std::mem::take(&mut self.pending);
        self.attributed_lines += buffer.len();

        if buffer.len() >= DEFAULT_MIN_ROWS
            && let Some(table) = processor.tables.parse_table(&buffer)
        {
            debug!(
                table_type = %table.table_type,
                rows = table.rows.len(),
                chapter = self.current.number,
                "classified content as table"
            );
            self.stats.tables_detected += 1;
            self.current.content.tables.push(table);
            return;
        }

        self.current.content.main_content.extend(
            buffer
                .iter()
                .map(|line| processor.clean_content_line(line)),
        );
    }

    fn close_subchapter(&mut self, processor: &ChapterProcessor) {
        let Some(mut subchapter) = self.subchapter.take() else {
            return;
        };

        self.attributed_lines += subchapter.lines.len();
        subchapter.lines = subchapter
            .lines
            .iter()
            .map(|line| processor.clean_content_line(line))
            .collect();
        self.current.content.subchapters.push(subchapter);
    }

    fn open_subchapter(&mut self, processor: &ChapterProcessor, title: String) {
        self.close_subchapter(processor);
        self.flush_pending(processor);
        self.subchapter = Some(Subchapter {
            title,
            lines: Vec::new(),
        });
    }

    fn seal_current(&mut self, processor: &ChapterProcessor) {
        self.flush_pending(processor);
        self.close_subchapter(processor);
        self.current.content.info.line_count = std::mem::take(&mut self.attributed_lines);
    }

    fn close_chapter(
        &mut self,
        processor: &ChapterProcessor,
        next: Chapter,
        progress: &mut dyn FnMut(usize),
    ) {
        self.seal_current(processor);
        let closed = std::mem::replace(&mut self.current, next);
        debug!(
            number = closed.number,
            title = %closed.title,
            lines = closed.content.info.line_count,
            "closed chapter"
        );
        self.chapters.push(closed);
        progress(self.chapters.len());
    }

    fn finish(
        mut self,
        processor: &ChapterProcessor,
        progress: &mut dyn FnMut(usize),
    ) -> (Vec<Chapter>, ChapterStats) {
        self.seal_current(processor);
        self.chapters.push(self.current);
        progress(self.chapters.len());
        (self.chapters, self.stats)
    }
}

fn average_chapter_length(chapters: &[Chapter]) -> f64 {
    if chapters.is_empty() {
        return 0.0;
    }

    let total = chapters
        .iter()
        .map(|chapter| {
            chapter.content.main_content.len()
                + chapter
                    .content
                    .subchapters
                    .iter()
                    .map(|subchapter| subchapter.lines.len())
                    .sum::<usize>()
        })
        .sum::<usize>();

    total as f64 / chapters.len() as f64
}
