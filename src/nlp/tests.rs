use std::fs;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, bail};

use super::*;
use crate::cli::CleaningLevel;
use crate::model::{Chapter, ChapterContent, Subchapter};

fn corrector() -> WordCorrector {
    WordCorrector::new(Arc::new(Lexicon::builtin()), WordCorrectorConfig::default())
        .expect("corrector regexes compile")
}

fn cleaner(level: CleaningLevel) -> TextCleaner {
    TextCleaner::new(Arc::new(Lexicon::builtin()), level).expect("cleaner regexes compile")
}

fn validator(config: ValidatorConfig) -> TextValidator {
    TextValidator::new(Arc::new(corrector()), config).expect("validator regexes compile")
}

#[derive(Debug)]
struct FailingModel;

impl LinguisticModel for FailingModel {
    fn name(&self) -> &str {
        "failing"
    }

    fn refine(&self, _text: &str) -> Result<String> {
        bail!("model not loaded")
    }
}

#[test]
fn similarity_ratio_matches_block_counting() {
    let ratio = similarity_ratio("charcater", "character");
    assert!((ratio - 16.0 / 18.0).abs() < 1e-9);
    assert_eq!(similarity_ratio("wizard", "wizard"), 1.0);
    assert_eq!(similarity_ratio("abc", "xyz"), 0.0);
    assert_eq!(similarity_ratio("", ""), 1.0);
}

#[test]
fn correct_word_repairs_transposed_letters() {
    let corrector = corrector();
    let (word, confidence) = corrector.correct_word("charcater");
    assert_eq!(word, "character");
    assert!(confidence >= 0.7);
}

#[test]
fn correct_word_keeps_short_and_known_words() {
    let corrector = corrector();
    assert_eq!(corrector.correct_word("it"), ("it".to_string(), 1.0));
    assert_eq!(corrector.correct_word("Wizard"), ("Wizard".to_string(), 1.0));
}

#[test]
fn correct_word_keeps_real_words_missing_from_the_lexicon() {
    let corrector = corrector();
    assert_eq!(corrector.correct_word("walls"), ("walls".to_string(), 1.0));
    assert_eq!(corrector.correct_word("thick"), ("thick".to_string(), 1.0));
    assert!(corrector.suggest("thick").is_none());

    let sentence = "The walls are thick and the thing was heavy.";
    assert_eq!(corrector.correct_text(sentence), sentence);
}

#[test]
fn correct_word_preserves_leading_capital() {
    let (word, _) = corrector().correct_word("Charcater");
    assert_eq!(word, "Character");
}

#[test]
fn correct_word_without_candidates_is_unchanged() {
    assert_eq!(
        corrector().correct_word("xyzzyq"),
        ("xyzzyq".to_string(), 1.0)
    );
}

#[test]
fn correct_word_prefers_rule_table_over_candidates() {
    let (word, confidence) = corrector().correct_word("Dungeons&Dragons");
    assert_eq!(word, "Dungeons & Dragons");
    assert_eq!(confidence, 0.95);
}

#[test]
fn correct_text_joins_line_broken_words() {
    let corrected = corrector().correct_text("The dwar-\nves are short");
    assert_eq!(corrected, "The dwarves are short");
}

#[test]
fn correct_text_joins_spaced_hyphen_when_result_is_known() {
    let corrected = corrector().correct_text("Take the long - sword");
    assert_eq!(corrected, "Take the longsword");
}

#[test]
fn correct_text_applies_ocr_rules_before_word_pass() {
    let corrected = corrector().correct_text("m ore w ith t he wizzard");
    assert_eq!(corrected, "more with the wizard");
}

#[test]
fn correct_document_maps_every_paragraph() {
    let paragraphs = vec!["a charcater".to_string(), String::new()];
    let corrected = corrector().correct_document(&paragraphs);
    assert_eq!(corrected, vec!["a character".to_string(), String::new()]);
}

#[test]
fn ocr_rule_table_applies_rules_in_order() {
    let rules = RuleTable::ocr_errors().expect("rule regexes compile");
    assert_eq!(rules.apply("m ore w ith t he"), "more with the");
    assert!(rules.match_word("D&D").is_some());
    assert!(rules.match_word("xD&D").is_none());
}

#[test]
fn rule_categories_have_stable_names() {
    let rules = RuleTable::spacing_fixes().expect("rule regexes compile");
    let rule = rules.match_word("Doyou").expect("spacing rule matches");
    assert_eq!(rule.category.as_str(), "spacing");
}

#[test]
fn light_cleaning_joins_spaced_words_and_terms() {
    let cleaner = cleaner(CleaningLevel::Light);
    assert_eq!(
        cleaner.clean_paragraph("The D u n g e o n s & D r a g o n s game"),
        "The Dungeons & Dragons game"
    );
    assert_eq!(cleaner.clean_paragraph("D & D rules"), "D&D rules");
    assert_eq!(cleaner.clean_paragraph("Doyou know"), "Doyou know");
}

#[test]
fn advanced_cleaning_splits_run_together_words() {
    let cleaner = cleaner(CleaningLevel::Advanced);
    assert_eq!(
        cleaner.clean_paragraph("Doyou know the rules forcharacter creation"),
        "Do you know the rules for character creation"
    );
}

#[test]
fn advanced_cleaning_leaves_ordinary_words_whole() {
    let cleaner = cleaner(CleaningLevel::Advanced);
    let sentence = "Climb onto the wall today, anyway nowhere to behave.";
    assert_eq!(cleaner.clean_paragraph(sentence), sentence);
    assert_eq!(cleaner.clean_paragraph("Jump onto it"), "Jump onto it");
    assert_eq!(cleaner.clean_paragraph("Rest today"), "Rest today");
}

#[test]
fn advanced_cleaning_applies_spacing_rules() {
    let cleaner = cleaner(CleaningLevel::Advanced);
    assert_eq!(
        cleaner.clean_paragraph("Pick som e spells  for you r wizard"),
        "Pick some spells for your wizard"
    );
}

#[test]
fn spaced_word_joining_is_idempotent() {
    let cleaner = cleaner(CleaningLevel::Light);
    for input in [
        "C h a p t e r 1 : R a c e s",
        "a b c d e f the x y",
        "Dwa r ves are short.",
        "H i l l D w a r f and M o u n t a i n D w a r f",
    ] {
        let once = cleaner.clean_paragraph(input);
        assert_eq!(cleaner.clean_paragraph(&once), once, "input: {input}");
    }
}

#[test]
fn clean_chapter_returns_new_chapter() {
    let chapter = Chapter {
        number: 2,
        title: "Classes".to_string(),
        original_line: None,
        content: ChapterContent {
            main_content: vec!["The D u n g e o n s master".to_string()],
            subchapters: vec![Subchapter {
                title: "Fighter".to_string(),
                lines: vec!["D & D fighters".to_string()],
            }],
            ..ChapterContent::default()
        },
    };
    let snapshot = chapter.clone();

    let cleaned = cleaner(CleaningLevel::Light).clean_chapter(&chapter);

    assert_eq!(chapter, snapshot);
    assert_eq!(cleaned.content.main_content, vec!["The Dungeons master"]);
    assert_eq!(cleaned.content.subchapters[0].lines, vec!["D&D fighters"]);
    assert_eq!(cleaned.title, "Classes");
}

#[test]
fn failing_linguistic_model_keeps_rule_output() {
    let cleaner = cleaner(CleaningLevel::Advanced).with_model(Arc::new(FailingModel));
    assert_eq!(cleaner.clean_paragraph("Doyou know"), "Do you know");
}

#[test]
fn passthrough_model_returns_input() {
    let cleaner = cleaner(CleaningLevel::Advanced).with_model(Arc::new(PassthroughModel));
    assert_eq!(cleaner.clean_paragraph("Doyou know"), "Do you know");
}

#[test]
fn coalesce_letter_runs_rebuilds_headings() {
    assert_eq!(
        coalesce_letter_runs("C h a p t e r 1 : R a c e s"),
        "Chapter 1 : Races"
    );
    assert_eq!(coalesce_letter_runs("M onk"), "Monk");
    assert_eq!(coalesce_letter_runs("H i l l D w a r f"), "HillDwarf");

    let once = coalesce_letter_runs("C l a s s e s");
    assert_eq!(coalesce_letter_runs(&once), once);
}

#[test]
fn single_char_gaps_join_unknown_fragments() {
    let lexicon = Lexicon::builtin();
    assert_eq!(
        repair_single_char_gaps("Dwa r ves are short.", &lexicon),
        "Dwarves are short."
    );
    assert_eq!(repair_single_char_gaps("m ore rules", &lexicon), "more rules");
    assert_eq!(
        repair_single_char_gaps("option b or c", &lexicon),
        "option b or c"
    );
    assert_eq!(
        repair_single_char_gaps("I cast a spell", &lexicon),
        "I cast a spell"
    );
}

#[test]
fn pascal_case_and_case_boundaries_split() {
    assert_eq!(split_pascal_case("HillDwarf"), vec!["Hill", "Dwarf"]);
    assert_eq!(split_pascal_case("Races"), vec!["Races"]);
    assert_eq!(
        split_case_boundaries("Personality andBackground"),
        "Personality and Background"
    );
}

#[test]
fn spaced_signatures_match_letter_spaced_lines_only() {
    let spaced = SpacedText::new().expect("spacing regexes compile");
    assert!(spaced.has_signature("C h a p t e r 1 : R a c e s"));
    assert!(spaced.has_signature("R a c e s"));
    assert!(spaced.has_signature("H i l l D w a r f"));
    assert!(!spaced.has_signature("Races"));
    assert!(!spaced.has_signature("Dwa r ves are short."));
    assert_eq!(spaced.collapse_whitespace("  a   b \t c "), "a b c");
}

#[test]
fn lexicon_loads_external_word_list() {
    let dir = std::env::temp_dir().join(format!("rulebook_lexicon_{}", std::process::id()));
    fs::create_dir_all(&dir).expect("temp dir");
    let path = dir.join("words.txt");
    fs::write(&path, "Owlbear\n\nbeholder\n").expect("write word list");

    let lexicon = Lexicon::with_word_list(Some(&path));
    assert!(lexicon.contains("owlbear"));
    assert!(lexicon.contains("Beholder"));
    assert!(lexicon.contains("character"));

    let missing = Lexicon::with_word_list(Some(&dir.join("missing.txt")));
    assert_eq!(missing.len(), Lexicon::builtin().len());

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn validate_text_flags_unknown_words_with_suggestions() {
    let validator = validator(ValidatorConfig::default());
    let result = validator.validate_text("The wizzard casts a spell");

    assert!(!result.valid);
    assert!(!result.timed_out);
    assert!(
        result
            .issues
            .iter()
            .any(|issue| issue.word == "wizzard" && issue.suggestion == "wizard")
    );
    assert_eq!(result.metrics.total_words, 4);
}

#[test]
fn validate_text_skips_short_text() {
    let result = validator(ValidatorConfig::default()).validate_text("Hi there");
    assert!(result.valid);
    assert!(result.issues.is_empty());
}

#[test]
fn validate_text_returns_partial_result_when_budget_is_spent() {
    let validator = validator(ValidatorConfig {
        budget: Duration::ZERO,
        ..ValidatorConfig::default()
    });
    let result = validator.validate_text("The wizzard casts a spell");

    assert!(result.timed_out);
    assert!(result.issues.is_empty());
    assert_eq!(result.metrics.unknown_words, 2);
}

#[test]
fn validate_chapter_samples_at_most_configured_lines() {
    let validator = validator(ValidatorConfig {
        sample_size: 5,
        ..ValidatorConfig::default()
    });
    let chapter = Chapter {
        number: 1,
        title: "Races".to_string(),
        original_line: None,
        content: ChapterContent {
            main_content: (0..20)
                .map(|_| "The wizzard casts a spell".to_string())
                .collect(),
            ..ChapterContent::default()
        },
    };

    let validation = validator
        .validate_chapter(&chapter)
        .expect("validation succeeds");
    assert_eq!(validation.chapter_number, 1);
    assert_eq!(validation.main_content.len(), 5);
    assert_eq!(validation.flagged_line_count(), 5);
}
