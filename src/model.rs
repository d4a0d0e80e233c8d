use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceEntry {
    pub filename: String,
    pub kind: String,
    pub size_bytes: u64,
    pub sha256: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceInventoryManifest {
    pub manifest_version: u32,
    pub generated_at: String,
    pub source_directory: String,
    pub source_count: usize,
    pub sources: Vec<SourceEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineStats {
    pub total_lines: usize,
    pub total_words: usize,
    pub avg_line_length: f64,
    pub max_line_length: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineOutput {
    pub lines: Vec<String>,
    pub stats: LineStats,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChapterInfo {
    pub line_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subchapter {
    pub title: String,
    pub lines: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    #[serde(rename = "type")]
    pub kind: String,
    pub table_type: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChapterContent {
    pub main_content: Vec<String>,
    pub subchapters: Vec<Subchapter>,
    pub tables: Vec<Table>,
    pub info: ChapterInfo,
}

impl ChapterContent {
    pub fn is_empty(&self) -> bool {
        self.main_content.is_empty() && self.subchapters.is_empty() && self.tables.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    pub number: u32,
    pub title: String,
    pub original_line: Option<String>,
    pub content: ChapterContent,
}

impl Chapter {
    pub fn front_matter() -> Self {
        Self {
            number: 0,
            title: "Front Matter".to_string(),
            original_line: None,
            content: ChapterContent::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub word: String,
    pub suggestion: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationMetrics {
    pub total_words: usize,
    pub unknown_words: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineValidation {
    pub text: String,
    pub issues: Vec<ValidationIssue>,
    pub valid: bool,
    pub timed_out: bool,
    pub metrics: ValidationMetrics,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubchapterValidation {
    pub title: String,
    pub content: Vec<LineValidation>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableValidation {
    pub table_type: String,
    pub issues: Vec<LineValidation>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChapterValidation {
    pub chapter_number: u32,
    pub chapter_title: String,
    pub main_content: Vec<LineValidation>,
    pub subchapters: Vec<SubchapterValidation>,
    pub tables: Vec<TableValidation>,
}

impl ChapterValidation {
    pub fn empty_for(chapter: &Chapter) -> Self {
        Self {
            chapter_number: chapter.number,
            chapter_title: chapter.title.clone(),
            ..Self::default()
        }
    }

    pub fn flagged_line_count(&self) -> usize {
        self.main_content.len()
            + self
                .subchapters
                .iter()
                .map(|subchapter| subchapter.content.len())
                .sum::<usize>()
            + self
                .tables
                .iter()
                .map(|table| table.issues.len())
                .sum::<usize>()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChapterStats {
    pub total_chapters: usize,
    pub avg_chapter_length: f64,
    pub blank_lines_skipped: usize,
    pub fallback_numbered_chapters: usize,
    pub tables_detected: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChapterProcessingResult {
    pub chapters: Vec<Chapter>,
    pub validation: Vec<ChapterValidation>,
    pub stats: ChapterStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TocSection {
    pub title: String,
    pub page: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TocEntry {
    Chapter {
        number: u32,
        title: String,
        page: u32,
        sections: Vec<TocSection>,
    },
    Appendix {
        letter: String,
        title: String,
        page: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appendix {
    pub letter: String,
    pub title: String,
    pub content: ChapterContent,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: String,
    pub document_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredDocument {
    pub metadata: DocumentMetadata,
    pub table_of_contents: Vec<TocEntry>,
    pub front_matter: Vec<String>,
    pub chapters: Vec<Chapter>,
    pub appendices: Vec<Appendix>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolVersions {
    pub pdftotext: Option<String>,
    pub pdftoppm: Option<String>,
    pub tesseract: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ExtractCounts {
    pub input_count: usize,
    pub processed_count: usize,
    pub failed_count: usize,
    pub page_count: usize,
    pub ocr_page_count: usize,
    pub line_count: usize,
    pub chapter_count: usize,
    pub table_count: usize,
    pub flagged_line_count: usize,
    pub fallback_numbered_chapters: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExtractOutputRecord {
    pub source: SourceEntry,
    pub output_path: String,
    pub page_count: usize,
    pub ocr_page_count: usize,
    pub elapsed_ms: u128,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExtractRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub command: String,
    pub output_type: String,
    pub format: String,
    pub tool_versions: ToolVersions,
    pub counts: ExtractCounts,
    pub outputs: Vec<ExtractOutputRecord>,
    pub warnings: Vec<String>,
}
