//! Structural parsing: raw text to lines, lines to chapters, chapters to a
//! whole document outline.

mod chapters;
mod lines;
mod structure;
mod tables;
#[cfg(test)]
mod tests;

pub use chapters::ChapterProcessor;
pub use lines::{DEFAULT_MAX_LINE_LENGTH, LineProcessor};
pub use structure::StructureProcessor;
pub use tables::{DEFAULT_MIN_ROWS, TableProcessor, TableType};
