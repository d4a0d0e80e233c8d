use anyhow::{Context, Result};
use regex::Regex;

use super::Lexicon;

/// Lone letters that are words in their own right and never glue to neighbours.
const STANDALONE_LETTERS: &[&str] = &["a", "A", "I", "O"];

#[derive(Debug)]
pub struct SpacedText {
    signatures: Vec<Regex>,
    spaced_run: Regex,
    whitespace: Regex,
}

impl SpacedText {
    pub fn new() -> Result<Self> {
        Ok(Self {
            signatures: vec![
                Regex::new(r"^C\s+h\s+a\s+p\s+t\s+e\s+r\s+\d+")
                    .context("failed to compile spaced chapter regex")?,
                Regex::new(r"^[A-Z](?:\s+[a-z])+$")
                    .context("failed to compile spaced title regex")?,
                Regex::new(r"^(?:[A-Z](?:\s+[a-z])+\s+)+[A-Z](?:\s+[a-z])+$")
                    .context("failed to compile spaced multi-word title regex")?,
            ],
            spaced_run: Regex::new(r"\b[A-Za-z](?:[ \t]+[A-Za-z]){2,}\b")
                .context("failed to compile spaced letter run regex")?,
            whitespace: Regex::new(r"\s+").context("failed to compile whitespace regex")?,
        })
    }

    pub fn has_signature(&self, line: &str) -> bool {
        self.signatures.iter().any(|pattern| pattern.is_match(line))
    }

    /// Joins runs of three or more single-letter tokens: `D u n g e o n s`.
    pub fn join_spaced_words(&self, text: &str) -> String {
        self.spaced_run
            .replace_all(text, |captures: &regex::Captures<'_>| {
                captures[0]
                    .chars()
                    .filter(|character| !character.is_whitespace())
                    .collect::<String>()
            })
            .into_owned()
    }

    pub fn collapse_whitespace(&self, text: &str) -> String {
        self.whitespace.replace_all(text.trim(), " ").into_owned()
    }
}

/// Token-level de-spacing for heading-like lines. Consecutive single-letter
/// tokens are joined; a lone capital followed by a lowercase fragment
/// (`M onk`) is joined as well.
pub fn coalesce_letter_runs(line: &str) -> String {
    let mut words = Vec::<String>::new();
    let mut run = String::new();

    for token in line.split_whitespace() {
        if is_single_letter(token) {
            run.push_str(token);
            continue;
        }

        if run.chars().count() == 1
            && run.chars().all(|character| character.is_ascii_uppercase())
            && !STANDALONE_LETTERS.contains(&run.as_str())
            && token.chars().all(|character| character.is_ascii_lowercase())
        {
            run.push_str(token);
            words.push(std::mem::take(&mut run));
            continue;
        }

        if !run.is_empty() {
            words.push(std::mem::take(&mut run));
        }
        words.push(token.to_string());
    }

    if !run.is_empty() {
        words.push(run);
    }

    words.join(" ")
}

/// Repairs a letter stranded inside a word (`Dwa r ves`, `m ore`). The letter
/// glues to a neighbour only when that neighbour is not itself a known word.
pub fn repair_single_char_gaps(line: &str, lexicon: &Lexicon) -> String {
    let tokens = line.split_whitespace().collect::<Vec<&str>>();
    let mut output = Vec::<String>::with_capacity(tokens.len());
    let mut glue_next = false;

    for (index, token) in tokens.iter().enumerate() {
        if glue_next {
            glue_next = false;
            if let Some(last) = output.last_mut() {
                last.push_str(token);
                continue;
            }
        }

        if !is_single_letter(token) || STANDALONE_LETTERS.contains(token) {
            output.push((*token).to_string());
            continue;
        }

        let lowercase = token.chars().all(|character| character.is_ascii_lowercase());
        let join_previous = lowercase
            && output.last().is_some_and(|previous| {
                previous
                    .chars()
                    .last()
                    .is_some_and(|character| character.is_alphabetic())
                    && !is_known_word(previous, lexicon)
            });
        let join_next = tokens.get(index + 1).is_some_and(|next| {
            next.chars()
                .next()
                .is_some_and(|character| character.is_lowercase())
                && !is_known_word(next, lexicon)
        });

        if join_previous && let Some(last) = output.last_mut() {
            last.push_str(token);
        } else {
            output.push((*token).to_string());
        }
        glue_next = join_next;
    }

    output.join(" ")
}

/// Splits `HillDwarf` into `["Hill", "Dwarf"]`. Text before the first capital
/// is kept as its own piece.
pub fn split_pascal_case(word: &str) -> Vec<String> {
    let mut pieces = Vec::<String>::new();
    let mut current = String::new();

    for character in word.chars() {
        if character.is_uppercase() && !current.is_empty() {
            pieces.push(std::mem::take(&mut current));
        }
        current.push(character);
    }

    if !current.is_empty() {
        pieces.push(current);
    }

    pieces
}

/// Inserts a space at lowercase-to-uppercase boundaries: `andBackground`.
pub fn split_case_boundaries(text: &str) -> String {
    let mut output = String::with_capacity(text.len() + 4);
    let mut previous: Option<char> = None;

    for character in text.chars() {
        if character.is_uppercase() && previous.is_some_and(|value| value.is_lowercase()) {
            output.push(' ');
        }
        output.push(character);
        previous = Some(character);
    }

    output
}

fn is_single_letter(token: &str) -> bool {
    let mut characters = token.chars();
    matches!(
        (characters.next(), characters.next()),
        (Some(character), None) if character.is_alphabetic()
    )
}

fn is_known_word(token: &str, lexicon: &Lexicon) -> bool {
    let trimmed = token.trim_matches(|character: char| !character.is_alphanumeric());
    !trimmed.is_empty() && lexicon.contains(trimmed)
}
