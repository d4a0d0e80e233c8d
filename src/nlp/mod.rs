//! Text repair: lexicon, rewrite rules, word correction, paragraph cleaning
//! and advisory validation.

mod lexicon;
mod linguistic;
mod rules;
mod similarity;
mod spacing;
mod text_cleaner;
mod validator;
mod word_correction;
#[cfg(test)]
mod tests;

pub use lexicon::Lexicon;
pub use linguistic::{LinguisticModel, PassthroughModel};
pub use rules::RuleTable;
pub use similarity::similarity_ratio;
pub use spacing::{
    SpacedText, coalesce_letter_runs, repair_single_char_gaps, split_case_boundaries,
    split_pascal_case,
};
pub use text_cleaner::TextCleaner;
pub use validator::{ChapterValidator, TextValidator, ValidatorConfig};
pub use word_correction::{WordCorrector, WordCorrectorConfig};
