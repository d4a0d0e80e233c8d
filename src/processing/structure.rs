use anyhow::{Context, Result};
use regex::Regex;
use tracing::debug;

use crate::model::{
    Appendix, Chapter, DocumentMetadata, StructuredDocument, TocEntry, TocSection,
};
use crate::nlp::coalesce_letter_runs;

use super::chapters::ChapterProcessor;
use super::lines::LineProcessor;

const DOCUMENT_TYPE: &str = "Core Rulebook";
const UNTITLED: &str = "Untitled";

/// Section boundaries found in the normalized line list.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Boundaries {
    contents: Option<usize>,
    first_chapter: Option<usize>,
    first_appendix: Option<usize>,
}

/// Splits a whole document into front matter, table of contents, chapters and
/// appendices, then hands each body to chapter processing.
#[derive(Debug)]
pub struct StructureProcessor {
    lines: LineProcessor,
    chapters: ChapterProcessor,
    contents_heading: Regex,
    chapter_heading: Regex,
    appendix_heading: Regex,
    toc_chapter: Regex,
    toc_appendix: Regex,
    toc_section: Regex,
}

impl StructureProcessor {
    pub fn new(lines: LineProcessor, chapters: ChapterProcessor) -> Result<Self> {
        Ok(Self {
            lines,
            chapters,
            contents_heading: Regex::new(r"(?i)^c\s*o\s*n\s*t\s*e\s*n\s*t\s*s\s*$")
                .context("failed to compile contents heading regex")?,
            chapter_heading: Regex::new(r"(?i)^c\s*h\s*a\s*p\s*t\s*e\s*r\s*(\d+)\b")
                .context("failed to compile chapter boundary regex")?,
            appendix_heading: Regex::new(
                r"^(?i:a\s*p\s*p\s*e\s*n\s*d\s*i\s*x)\s+([A-Z])\b\s*:?\s*(.*)$",
            )
            .context("failed to compile appendix heading regex")?,
            toc_chapter: Regex::new(r"(?i)^Chapter\s+(\d+)\s*:?\s*(.+?)\s*(?:\.{2,}|•)?\s*(\d+)$")
                .context("failed to compile TOC chapter regex")?,
            toc_appendix: Regex::new(
                r"^(?i:Appendix)\s+([A-Z])\s*:?\s*(.+?)\s*(?:\.{2,}|•)?\s*(\d+)$",
            )
            .context("failed to compile TOC appendix regex")?,
            toc_section: Regex::new(r"^([A-Z][^.•]*?)(?:\s*(?:\.{2,}|•)\s*|\s+)(\d+)$")
                .context("failed to compile TOC section regex")?,
        })
    }

    pub fn process(&self, text: &str) -> StructuredDocument {
        let lines = self.lines.process(text).lines;

        let bounds = self.find_boundaries(&lines);
        debug!(
            lines = lines.len(),
            contents = ?bounds.contents,
            first_chapter = ?bounds.first_chapter,
            first_appendix = ?bounds.first_appendix,
            "located document sections"
        );

        let Some(contents) = bounds.contents else {
            return StructuredDocument {
                metadata: metadata_from(&[]),
                chapters: self.body_chapters(&lines),
                ..StructuredDocument::default()
            };
        };

        let front_matter = lines[..contents]
            .iter()
            .map(|line| self.chapters.clean_content_line(line))
            .collect::<Vec<String>>();
        let metadata = metadata_from(&front_matter);

        let Some(first_chapter) = bounds.first_chapter else {
            return StructuredDocument {
                metadata,
                front_matter,
                chapters: self.body_chapters(&lines[contents + 1..]),
                ..StructuredDocument::default()
            };
        };

        let body_end = bounds.first_appendix.unwrap_or(lines.len());
        StructuredDocument {
            metadata,
            table_of_contents: self.parse_toc(&lines[contents + 1..first_chapter]),
            front_matter,
            chapters: self.body_chapters(&lines[first_chapter..body_end]),
            appendices: bounds
                .first_appendix
                .map(|start| self.split_appendices(&lines[start..]))
                .unwrap_or_default(),
        }
    }

    fn find_boundaries(&self, lines: &[String]) -> Boundaries {
        let mut bounds = Boundaries {
            contents: lines
                .iter()
                .position(|line| self.contents_heading.is_match(line)),
            ..Boundaries::default()
        };
        let Some(contents) = bounds.contents else {
            return bounds;
        };

        bounds.first_chapter = lines
            .iter()
            .enumerate()
            .skip(contents + 1)
            .find(|(_, line)| self.is_first_chapter(line))
            .map(|(index, _)| index);

        if let Some(first_chapter) = bounds.first_chapter {
            bounds.first_appendix = lines
                .iter()
                .enumerate()
                .skip(first_chapter + 1)
                .find(|(_, line)| self.is_appendix_heading(line))
                .map(|(index, _)| index);
        }

        bounds
    }

    fn is_first_chapter(&self, line: &str) -> bool {
        !self.chapters.is_toc_line(&coalesce_letter_runs(line))
            && self
                .chapter_heading
                .captures(line)
                .and_then(|captures| captures[1].parse::<u32>().ok())
                == Some(1)
    }

    fn is_appendix_heading(&self, line: &str) -> bool {
        !self.chapters.is_toc_line(line) && self.appendix_heading.is_match(line)
    }

    fn body_chapters(&self, lines: &[String]) -> Vec<Chapter> {
        let mut chapters = self.chapters.process(lines).chapters;
        if chapters
            .first()
            .is_some_and(|chapter| chapter.number == 0 && chapter.content.is_empty())
        {
            chapters.remove(0);
        }
        chapters
    }

    /// Section lines attach to the most recent chapter entry; sections before
    /// any chapter entry are dropped.
    pub fn parse_toc(&self, lines: &[String]) -> Vec<TocEntry> {
        let mut entries = Vec::<TocEntry>::new();

        for line in lines {
            let line = coalesce_letter_runs(line.trim());
            let line = line.as_str();

            if let Some(captures) = self.toc_chapter.captures(line)
                && let (Ok(number), Ok(page)) =
                    (captures[1].parse::<u32>(), captures[3].parse::<u32>())
            {
                entries.push(TocEntry::Chapter {
                    number,
                    title: captures[2].trim().to_string(),
                    page,
                    sections: Vec::new(),
                });
                continue;
            }

            if let Some(captures) = self.toc_appendix.captures(line)
                && let Ok(page) = captures[3].parse::<u32>()
            {
                entries.push(TocEntry::Appendix {
                    letter: captures[1].to_string(),
                    title: captures[2].trim().to_string(),
                    page,
                });
                continue;
            }

            if let Some(captures) = self.toc_section.captures(line)
                && let Ok(page) = captures[2].parse::<u32>()
            {
                let section = TocSection {
                    title: captures[1].trim().to_string(),
                    page,
                };
                match entries.last_mut() {
                    Some(TocEntry::Chapter { sections, .. }) => sections.push(section),
                    _ => debug!(title = %section.title, "TOC section without a chapter entry"),
                }
            }
        }

        entries
    }

    fn split_appendices(&self, lines: &[String]) -> Vec<Appendix> {
        let mut appendices = Vec::<Appendix>::new();
        let mut heading: Option<(String, String)> = None;
        let mut body = Vec::<String>::new();

        for line in lines {
            if self.is_appendix_heading(line)
                && let Some(captures) = self.appendix_heading.captures(line)
            {
                if let Some((letter, title)) = heading.take() {
                    appendices.push(self.build_appendix(letter, title, &body));
                    body.clear();
                }
                let letter = captures[1].to_string();
                let title = match coalesce_letter_runs(captures[2].trim()) {
                    title if title.is_empty() => format!("Appendix {letter}"),
                    title => title,
                };
                heading = Some((letter, title));
                continue;
            }
            body.push(line.clone());
        }

        if let Some((letter, title)) = heading {
            appendices.push(self.build_appendix(letter, title, &body));
        }
        appendices
    }

    fn build_appendix(&self, letter: String, title: String, body: &[String]) -> Appendix {
        debug!(letter = %letter, title = %title, lines = body.len(), "closed appendix");
        Appendix {
            letter,
            title,
            content: self.chapters.process_section(body),
        }
    }
}

fn metadata_from(front_matter: &[String]) -> DocumentMetadata {
    DocumentMetadata {
        title: front_matter
            .iter()
            .find(|line| !line.trim().is_empty())
            .cloned()
            .unwrap_or_else(|| UNTITLED.to_string()),
        document_type: DOCUMENT_TYPE.to_string(),
    }
}
