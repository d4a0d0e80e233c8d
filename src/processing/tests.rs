use std::sync::Arc;

use anyhow::{Result, bail};

use super::*;
use crate::model::{Chapter, ChapterValidation, TocEntry};
use crate::nlp::{
    ChapterValidator, Lexicon, TextValidator, ValidatorConfig, WordCorrector, WordCorrectorConfig,
};

fn lines(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

fn chapter_processor() -> ChapterProcessor {
    ChapterProcessor::new(Arc::new(Lexicon::builtin())).expect("chapter regexes compile")
}

fn structure_processor() -> StructureProcessor {
    StructureProcessor::new(
        LineProcessor::new(DEFAULT_MAX_LINE_LENGTH).expect("line regexes compile"),
        chapter_processor(),
    )
    .expect("structure regexes compile")
}

#[derive(Debug)]
struct FailingValidator;

impl ChapterValidator for FailingValidator {
    fn validate_chapter(&self, chapter: &Chapter) -> Result<ChapterValidation> {
        if chapter.number == 1 {
            bail!("dictionary unavailable");
        }
        Ok(ChapterValidation::empty_for(chapter))
    }
}

#[test]
fn line_processor_collapses_whitespace_and_drops_blank_lines() {
    let processor = LineProcessor::new(DEFAULT_MAX_LINE_LENGTH).expect("line regexes compile");
    let output = processor.process("  a   b  \n\n   \nc");

    assert_eq!(output.lines, vec!["a b", "c"]);
    assert_eq!(output.stats.total_lines, 2);
    assert_eq!(output.stats.total_words, 3);
    assert_eq!(output.stats.max_line_length, 3);
    assert!((output.stats.avg_line_length - 2.0).abs() < 1e-9);
}

#[test]
fn line_processor_packs_sentences_under_the_limit() {
    let processor = LineProcessor::new(20).expect("line regexes compile");
    let output = processor.process("First sentence here. Second one! Third?");

    assert_eq!(output.lines, vec!["First sentence here.", "Second one! Third?"]);
}

#[test]
fn line_processor_keeps_oversized_sentence_whole() {
    let processor = LineProcessor::new(5).expect("line regexes compile");
    let output = processor.process("abcdefghij");

    assert_eq!(output.lines, vec!["abcdefghij"]);
}

#[test]
fn table_threshold_needs_votes_for_every_required_pattern() {
    let tables = TableProcessor::new().expect("table regexes compile");

    let class_lines = lines(&["Barbarian", "d12", "Strength", "Wisdom", "d8"]);
    assert!(tables.detect_table(&class_lines, DEFAULT_MIN_ROWS));
    assert_eq!(
        tables.classify(&class_lines, DEFAULT_MIN_ROWS),
        Some(TableType::ClassTable)
    );

    let sparse_lines = lines(&[
        "Barbarian",
        "d12",
        "Strength & Wisdom",
        "a plain line",
        "another plain line",
    ]);
    assert!(!tables.detect_table(&sparse_lines, DEFAULT_MIN_ROWS));
}

#[test]
fn table_votes_ignore_case_of_value_cells() {
    let tables = TableProcessor::new().expect("table regexes compile");
    let shouted = lines(&["Barbarian", "D12", "STRENGTH", "wisdom", "D8"]);

    assert_eq!(
        tables.classify(&shouted, DEFAULT_MIN_ROWS),
        Some(TableType::ClassTable)
    );
    let table = tables.parse_table(&shouted).expect("lines classify as a class table");
    assert_eq!(table.rows, vec![vec!["Barbarian", "D12", "STRENGTH", "wisdom", "D8"]]);
}

#[test]
fn table_detection_requires_minimum_rows() {
    let tables = TableProcessor::new().expect("table regexes compile");
    let short = lines(&["Barbarian", "d12", "Strength", "Wisdom"]);
    assert!(tables.classify(&short, DEFAULT_MIN_ROWS).is_none());
    assert!(tables.parse_table(&short).is_none());
}

#[test]
fn class_table_rows_start_at_class_names() {
    let tables = TableProcessor::new().expect("table regexes compile");
    let table = tables
        .parse_table(&lines(&[
            "Barbarian",
            "A fierce warrior",
            "of primitive background",
            "d12",
            "Strength",
            "Bard",
            "An inspiring magician",
            "d8",
            "Charisma",
        ]))
        .expect("lines classify as a class table");

    assert_eq!(table.kind, "table");
    assert_eq!(table.table_type, "class_table");
    assert_eq!(table.columns[0], "Class");
    assert_eq!(
        table.rows,
        vec![
            vec![
                "Barbarian".to_string(),
                "A fierce warrior of primitive background".to_string(),
                "d12".to_string(),
                "Strength".to_string(),
            ],
            vec![
                "Bard".to_string(),
                "An inspiring magician".to_string(),
                "d8".to_string(),
                "Charisma".to_string(),
            ],
        ]
    );
}

#[test]
fn level_progression_rows_fill_declared_columns() {
    let tables = TableProcessor::new().expect("table regexes compile");
    let table = tables
        .parse_table(&lines(&[
            "1st",
            "+2",
            "Rage",
            "2",
            "+2",
            "2nd",
            "+2",
            "Reckless Attack",
            "2",
            "+2",
        ]))
        .expect("lines classify as a level progression");

    assert_eq!(table.table_type, TableType::LevelProgression.as_str());
    assert_eq!(table.rows.len(), 2);
    assert_eq!(table.rows[0], vec!["1st", "+2", "Rage", "2", "+2"]);
    assert_eq!(table.rows[1][2], "Reckless Attack");
}

#[test]
fn chapter_processor_builds_front_matter_and_spaced_chapters() {
    let result = chapter_processor().process(&lines(&[
        "C h a p t e r 1 : R a c e s",
        "Dwa r ves are short.",
        "C l a s s e s",
        "Fighters fight.",
    ]));

    assert_eq!(result.chapters.len(), 3);

    let front = &result.chapters[0];
    assert_eq!(front.number, 0);
    assert_eq!(front.title, "Front Matter");
    assert!(front.content.is_empty());

    let races = &result.chapters[1];
    assert_eq!(races.number, 1);
    assert_eq!(races.title, "Races");
    assert_eq!(races.content.main_content, vec!["Dwarves are short."]);
    assert_eq!(races.content.info.line_count, 1);

    let classes = &result.chapters[2];
    assert_eq!(classes.number, 0);
    assert_eq!(classes.title, "Classes");
    assert_eq!(classes.content.main_content, vec!["Fighters fight."]);

    assert_eq!(result.stats.total_chapters, 3);
    assert_eq!(result.stats.fallback_numbered_chapters, 1);
    assert!(result.validation.is_empty());
}

#[test]
fn toc_lines_never_open_chapters() {
    let processor = chapter_processor();
    assert!(processor.is_toc_line("Chapter 3 ..........42"));
    assert!(!processor.is_chapter_title("Chapter 3 ..........42", false));

    let result = processor.process(&lines(&[
        "C h a p t e r 1 : R a c e s",
        "Chapter 3 ..........42",
        "Dwarves are short.",
    ]));

    assert_eq!(result.chapters.len(), 2);
    assert_eq!(
        result.chapters[1].content.main_content,
        vec!["Chapter 3 ..........42", "Dwarves are short."]
    );
}

#[test]
fn chapter_titles_are_extracted_in_priority_order() {
    let result = chapter_processor().process(&lines(&[
        "S t e p B y S t e p C h a r a c t e r s",
        "C h a p t e r 3",
        "Chapter 4: Personalityand Background",
        "S p e l l c a s t i n g",
    ]));

    let titles = result
        .chapters
        .iter()
        .map(|chapter| (chapter.number, chapter.title.as_str()))
        .collect::<Vec<(u32, &str)>>();
    assert_eq!(
        titles,
        vec![
            (0, "Front Matter"),
            (1, "Step-by-Step Characters"),
            (3, "Chapter 3"),
            (4, "Personality and Background"),
            (0, "Spellcasting"),
        ]
    );
    assert_eq!(
        result.chapters[3].original_line.as_deref(),
        Some("Chapter 4: Personalityand Background")
    );
}

#[test]
fn plain_prose_never_opens_chapters() {
    let processor = chapter_processor();
    let result = processor.process(&lines(&[
        "Chapter 2 explains how to build a hero.",
        "Every adventurer needs a class.",
        "Combat",
        "Roll initiative at the start.",
        "Follow the step by step characters guide.",
        "42",
    ]));

    assert_eq!(result.chapters.len(), 1);
    assert_eq!(result.chapters[0].title, "Front Matter");
    assert_eq!(result.chapters[0].content.main_content.len(), 6);
    assert_eq!(result.stats.fallback_numbered_chapters, 0);

    assert!(processor.is_chapter_title("Chapter 2", false));
    assert!(processor.is_chapter_title("Chapter 2: Classes", false));
    assert!(!processor.is_chapter_title("Chapter 2 explains how to build a hero.", false));
    assert!(!processor.is_chapter_title("Combat", false));
    assert!(processor.is_chapter_title("Combat", true));
}

#[test]
fn every_content_line_lands_in_exactly_one_place() {
    let input = lines(&[
        "Preface text.",
        "C h a p t e r 1 : R a c e s",
        "Intro line.",
        "",
        "D w a r v e s",
        "Dwarves are short.",
        "H i l l D w a r f",
        "Hill dwarves are hardy.",
        "C h a p t e r 2 : C l a s s e s",
        "Barbarian",
        "d12",
        "Strength",
        "Wisdom",
        "d8",
    ]);
    let result = chapter_processor().process(&input);

    assert_eq!(result.chapters.len(), 3);
    assert_eq!(result.stats.blank_lines_skipped, 1);
    assert_eq!(result.stats.tables_detected, 1);

    assert_eq!(result.chapters[0].content.main_content, vec!["Preface text."]);

    let races = &result.chapters[1].content;
    assert_eq!(races.main_content, vec!["Intro line."]);
    assert_eq!(races.subchapters.len(), 2);
    assert_eq!(races.subchapters[0].title, "Dwarves");
    assert_eq!(races.subchapters[0].lines, vec!["Dwarves are short."]);
    assert_eq!(races.subchapters[1].title, "Hill Dwarf");
    assert_eq!(races.subchapters[1].lines, vec!["Hill dwarves are hardy."]);
    assert_eq!(races.info.line_count, 3);

    let classes = &result.chapters[2].content;
    assert!(classes.main_content.is_empty());
    assert_eq!(classes.tables.len(), 1);
    assert_eq!(classes.tables[0].table_type, "class_table");
    assert_eq!(classes.info.line_count, 5);

    let attributed = result
        .chapters
        .iter()
        .map(|chapter| chapter.content.info.line_count)
        .sum::<usize>();
    assert_eq!(attributed, 9);
}

#[test]
fn progress_reports_each_closed_chapter_in_order() {
    let mut seen = Vec::<usize>::new();
    chapter_processor().process_with_progress(
        &lines(&[
            "C h a p t e r 1 : R a c e s",
            "Dwarves are short.",
            "C l a s s e s",
            "Fighters fight.",
        ]),
        &mut |closed| seen.push(closed),
    );

    assert_eq!(seen, vec![1, 2, 3]);
}

#[test]
fn failing_chapter_validation_yields_empty_entry() {
    let processor = chapter_processor().with_validator(Arc::new(FailingValidator));
    let result = processor.process(&lines(&["C h a p t e r 1 : R a c e s", "Dwarves are short."]));

    assert_eq!(result.validation.len(), 2);
    assert_eq!(result.validation[1].chapter_number, 1);
    assert_eq!(result.validation[1].chapter_title, "Races");
    assert!(result.validation[1].main_content.is_empty());
}

#[test]
fn text_validator_reports_flagged_chapter_lines() {
    let lexicon = Arc::new(Lexicon::builtin());
    let corrector = WordCorrector::new(lexicon.clone(), WordCorrectorConfig::default())
        .expect("corrector regexes compile");
    let validator = TextValidator::new(Arc::new(corrector), ValidatorConfig::default())
        .expect("validator regexes compile");
    let processor = ChapterProcessor::new(lexicon)
        .expect("chapter regexes compile")
        .with_validator(Arc::new(validator));

    let result = processor.process(&lines(&[
        "C h a p t e r 1 : R a c e s",
        "The wizzard casts a spell",
    ]));

    assert_eq!(result.validation.len(), 2);
    assert_eq!(result.validation[0].flagged_line_count(), 0);
    assert_eq!(result.validation[1].flagged_line_count(), 1);
}

#[test]
fn structure_processor_splits_document_sections() {
    let document = structure_processor().process(
        "Player's Handbook\n\
         Contents\n\
         Chapter 1: Races ........ 11\n\
         Dwarves 18\n\
         Chapter 2: Classes ........ 45\n\
         Appendix A: Conditions ........ 290\n\
         Chapter 1: Races\n\
         Your race shapes your character.\n\
         Appendix A: Conditions\n\
         Blinded creatures cannot see.\n",
    );

    assert_eq!(document.metadata.title, "Player's Handbook");
    assert_eq!(document.front_matter, vec!["Player's Handbook"]);

    assert_eq!(document.table_of_contents.len(), 3);
    match &document.table_of_contents[0] {
        TocEntry::Chapter {
            number,
            title,
            page,
            sections,
        } => {
            assert_eq!((*number, title.as_str(), *page), (1, "Races", 11));
            assert_eq!(sections.len(), 1);
            assert_eq!(sections[0].title, "Dwarves");
            assert_eq!(sections[0].page, 18);
        }
        other => panic!("expected chapter entry, got {other:?}"),
    }
    assert_eq!(
        document.table_of_contents[2],
        TocEntry::Appendix {
            letter: "A".to_string(),
            title: "Conditions".to_string(),
            page: 290,
        }
    );

    assert_eq!(document.chapters.len(), 1);
    assert_eq!(document.chapters[0].number, 1);
    assert_eq!(
        document.chapters[0].content.main_content,
        vec!["Your race shapes your character."]
    );

    assert_eq!(document.appendices.len(), 1);
    assert_eq!(document.appendices[0].letter, "A");
    assert_eq!(document.appendices[0].title, "Conditions");
    assert_eq!(
        document.appendices[0].content.main_content,
        vec!["Blinded creatures cannot see."]
    );
}

#[test]
fn structure_without_contents_is_all_main_content() {
    let document = structure_processor().process("Chapter 1: Races\nDwarves are short.\n");

    assert_eq!(document.metadata.title, "Untitled");
    assert!(document.table_of_contents.is_empty());
    assert!(document.front_matter.is_empty());
    assert_eq!(document.chapters.len(), 1);
    assert_eq!(document.chapters[0].title, "Races");
}
