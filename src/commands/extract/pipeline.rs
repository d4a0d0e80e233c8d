use super::*;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub output_type: OutputType,
    pub max_line_length: usize,
    pub cleaning_level: CleaningLevel,
    pub min_confidence: f64,
    pub validation_budget: Duration,
    pub word_list: Option<PathBuf>,
}

impl PipelineConfig {
    pub fn from_args(args: &ExtractArgs) -> Self {
        Self {
            output_type: args.output_type,
            max_line_length: args.max_line_length,
            cleaning_level: args.cleaning_level,
            min_confidence: args.min_confidence,
            validation_budget: Duration::from_millis(args.validation_budget_ms),
            word_list: args.word_list.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum DocumentContent {
    Raw(String),
    Lines(LineOutput),
    Chapters(ChapterProcessingResult),
    Structured(StructuredDocument),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentSummary {
    pub line_count: usize,
    pub chapter_count: usize,
    pub table_count: usize,
    pub flagged_line_count: usize,
    pub fallback_numbered_chapters: usize,
}

#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub content: DocumentContent,
    pub summary: DocumentSummary,
}

/// Every processor one extract run needs, built once and shared across inputs.
#[derive(Debug)]
pub struct Pipeline {
    output_type: OutputType,
    lines: LineProcessor,
    chapters: ChapterProcessor,
    structure: StructureProcessor,
    cleaner: TextCleaner,
    corrector: Arc<WordCorrector>,
}

impl Pipeline {
    pub fn new(config: &PipelineConfig) -> Result<Self> {
        let lexicon = Arc::new(Lexicon::with_word_list(config.word_list.as_deref()));
        let corrector = Arc::new(WordCorrector::new(
            lexicon.clone(),
            WordCorrectorConfig {
                min_confidence: config.min_confidence,
                ..WordCorrectorConfig::default()
            },
        )?);

        let mut chapters = ChapterProcessor::new(lexicon.clone())?;
        if config.output_type == OutputType::Validated {
            let validator = TextValidator::new(
                corrector.clone(),
                ValidatorConfig {
                    budget: config.validation_budget,
                    ..ValidatorConfig::default()
                },
            )?;
            chapters = chapters.with_validator(Arc::new(validator));
        }

        let structure = StructureProcessor::new(
            LineProcessor::new(config.max_line_length)?,
            ChapterProcessor::new(lexicon.clone())?,
        )?;

        let mut cleaner = TextCleaner::new(lexicon.clone(), config.cleaning_level)?;
        if config.cleaning_level == CleaningLevel::Advanced {
            cleaner = cleaner.with_model(Arc::new(PassthroughModel));
        }

        info!(
            lexicon_words = lexicon.len(),
            output_type = config.output_type.as_str(),
            cleaning_level = config.cleaning_level.as_str(),
            "initialized extraction pipeline"
        );

        Ok(Self {
            output_type: config.output_type,
            lines: LineProcessor::new(config.max_line_length)?,
            chapters,
            structure,
            cleaner,
            corrector,
        })
    }

    pub fn run(&self, text: &str) -> PipelineOutput {
        match self.output_type {
            OutputType::Raw => PipelineOutput {
                summary: DocumentSummary {
                    line_count: text.lines().count(),
                    ..DocumentSummary::default()
                },
                content: DocumentContent::Raw(text.to_string()),
            },
            OutputType::Lines => {
                let lines = self.lines.process(text);
                PipelineOutput {
                    summary: DocumentSummary {
                        line_count: lines.stats.total_lines,
                        ..DocumentSummary::default()
                    },
                    content: DocumentContent::Lines(lines),
                }
            }
            OutputType::Chapters | OutputType::Validated => {
                let lines = self.lines.process(text);
                let result = self.process_chapters(&lines.lines);
                chapters_output(lines.stats.total_lines, result)
            }
            OutputType::Cleaned => {
                let lines = self.lines.process(text);
                let mut result = self.process_chapters(&lines.lines);
                result.chapters = result
                    .chapters
                    .iter()
                    .map(|chapter| self.clean_and_correct(chapter))
                    .collect();
                chapters_output(lines.stats.total_lines, result)
            }
            OutputType::Structured => {
                let document = self.structure.process(text);
                let summary = DocumentSummary {
                    line_count: text.lines().count(),
                    chapter_count: document.chapters.len(),
                    table_count: document
                        .chapters
                        .iter()
                        .map(|chapter| chapter.content.tables.len())
                        .sum::<usize>()
                        + document
                            .appendices
                            .iter()
                            .map(|appendix| appendix.content.tables.len())
                            .sum::<usize>(),
                    fallback_numbered_chapters: document
                        .chapters
                        .iter()
                        .filter(|chapter| chapter.number == 0 && chapter.original_line.is_some())
                        .count(),
                    ..DocumentSummary::default()
                };
                PipelineOutput {
                    content: DocumentContent::Structured(document),
                    summary,
                }
            }
        }
    }

    fn process_chapters(&self, lines: &[String]) -> ChapterProcessingResult {
        self.chapters
            .process_with_progress(lines, &mut |closed: usize| {
                if closed % 10 == 0 {
                    info!(chapters = closed, "chapter processing progress");
                }
            })
    }

    /// Cleans a chapter, then runs word correction over every line list.
    pub fn clean_and_correct(&self, chapter: &Chapter) -> Chapter {
        let mut cleaned = self.cleaner.clean_chapter(chapter);
        cleaned.content.main_content = self
            .corrector
            .correct_document(&cleaned.content.main_content);
        for subchapter in &mut cleaned.content.subchapters {
            subchapter.lines = self.corrector.correct_document(&subchapter.lines);
        }
        cleaned
    }
}

fn chapters_output(line_count: usize, result: ChapterProcessingResult) -> PipelineOutput {
    let summary = DocumentSummary {
        line_count,
        chapter_count: result.chapters.len(),
        table_count: result.stats.tables_detected,
        flagged_line_count: result
            .validation
            .iter()
            .map(|validation| validation.flagged_line_count())
            .sum(),
        fallback_numbered_chapters: result.stats.fallback_numbered_chapters,
    };

    PipelineOutput {
        content: DocumentContent::Chapters(result),
        summary,
    }
}
