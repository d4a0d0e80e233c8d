use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, warn};

const ENGLISH_WORDS: &[&str] = &[
    "the", "be", "to", "of", "and", "a", "in", "that", "have", "it", "for", "not", "on", "with",
    "he", "as", "you", "do", "at", "this", "but", "his", "by", "from", "they", "we", "say", "her",
    "she", "or", "an", "will", "my", "one", "all", "would", "there", "their", "what", "so", "up",
    "out", "if", "about", "who", "get", "which", "go", "me", "when", "make", "can", "like", "time",
    "no", "just", "him", "know", "take", "people", "into", "year", "your", "good", "some",
    "could", "them", "see", "other", "than", "then", "now", "look", "only", "come", "its", "over",
    "think", "also", "back", "after", "use", "two", "how", "our", "work", "first", "well", "way",
    "even", "new", "want", "because", "any", "these", "give", "day", "most", "us", "is", "are",
    "was", "were", "been", "has", "had", "may", "might", "must", "each", "both", "between",
    "more", "many", "much", "such", "very", "own", "same", "few", "those", "through", "during",
    "before", "under", "again", "further", "once", "here", "where", "why", "while", "until",
    "above", "below", "against", "should", "does", "did", "doing", "being", "having", "shall",
    "short", "tall", "long", "high", "low", "small", "large", "great", "little", "old", "young",
    "whatever", "however", "every", "another", "often", "always", "never", "without", "within",
    "along", "among", "around", "across", "part", "place", "world", "life", "hand", "point",
    "turn", "number", "name", "rule", "rules", "book", "game", "play", "player", "players",
    "choose", "choice", "option", "options", "table", "page", "chapter", "section", "example",
    "fight", "fights", "live", "lives", "made", "makes", "stand", "stands", "best",
    "known", "called", "common", "others", "typically", "usually", "become", "became",
    "upon", "someone", "something", "sometimes", "everyone", "anyone", "itself", "himself",
    "herself", "themselves", "yourself", "cannot", "outside", "inside", "throughout",
    "together", "whenever", "wherever", "therefore", "otherwise", "understand", "overall",
    "anyway", "anything", "nothing", "everything", "nowhere", "somewhere", "today", "onto",
];

const DOMAIN_TERMS: &[&str] = &[
    "dungeons", "dragons", "d&d", "dnd", "dm", "pc", "npc", "gm", "hitpoints", "hp", "ac", "xp",
    "proficiency", "proficiencies", "initiative", "multiclass", "subclass", "feat", "feats",
    "cantrip", "cantrips", "spellcasting", "str", "dex", "con", "int", "wis", "cha", "strength",
    "dexterity", "constitution", "intelligence", "wisdom", "charisma", "barbarian", "bard",
    "cleric", "druid", "fighter", "fighters", "monk", "paladin", "ranger", "rogue", "sorcerer",
    "warlock", "wizard", "artificer", "dwarf", "dwarves", "elf", "elves", "halfling", "human",
    "dragonborn", "gnome", "tiefling", "half-elf", "half-orc", "orc", "aasimar", "genasi",
    "longsword", "shortsword", "greatsword", "greataxe", "battleaxe", "quarterstaff", "crossbow",
    "longbow", "shortbow", "warhammer", "mace", "dagger", "rapier", "shield", "armor", "armour",
    "potion", "weapon", "weapons", "adventurer", "adventurers", "adventuring", "spellcaster",
    "unarmored", "roleplaying", "dungeon", "monster", "monsters", "creature", "creatures",
    "alignment", "skill", "skills", "saving", "save", "throw", "throws", "attack", "damage",
    "magic", "magical", "spell", "spells", "circumstances", "circumstance", "character",
    "characters", "race", "races", "class", "classes", "abilities", "ability", "combat",
    "equipment", "level", "levels", "bonus", "modifier", "features", "feature", "background",
    "personality", "rage", "rages", "die", "dice",
];

/// Short words that commonly arrive glued to a neighbour in extracted text.
const RUN_TOGETHER_WORDS: &[&str] = &[
    "the", "and", "of", "to", "a", "in", "for", "is", "on", "that", "by", "this", "with", "you",
    "it", "not", "or", "be", "are", "from", "at", "as", "your", "have", "more", "an", "was", "we",
    "will", "can", "do", "use", "one", "they", "all", "their", "has", "been", "would", "make",
    "about", "if", "into", "time", "only", "how", "may", "its", "some", "what", "when", "out",
    "up", "no", "who", "see", "get", "which", "go", "than", "our", "know", "just", "any", "take",
    "give", "over", "think", "also", "back", "after", "other", "two", "these", "first", "way",
    "well", "even", "new", "want", "because", "most", "each", "look", "day", "could", "come",
    "both", "between", "must",
];

/// Valid-word set shared by the corrector, the cleaner and the validator.
#[derive(Debug, Clone)]
pub struct Lexicon {
    words: BTreeSet<String>,
    common: BTreeSet<String>,
}

impl Default for Lexicon {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Lexicon {
    pub fn builtin() -> Self {
        let words = ENGLISH_WORDS
            .iter()
            .chain(DOMAIN_TERMS)
            .chain(RUN_TOGETHER_WORDS)
            .map(|word| word.to_string())
            .collect();
        let common = RUN_TOGETHER_WORDS
            .iter()
            .map(|word| word.to_string())
            .collect();

        Self { words, common }
    }

    /// Built-in lexicon extended with an optional word-list file. A missing or
    /// unreadable file only degrades coverage.
    pub fn with_word_list(path: Option<&Path>) -> Self {
        let mut lexicon = Self::builtin();
        let Some(path) = path else {
            return lexicon;
        };

        match lexicon.load_word_list(path) {
            Ok(added) => {
                debug!(path = %path.display(), added, total = lexicon.len(), "loaded word list");
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "word list unavailable, using built-in lexicon");
            }
        }

        lexicon
    }

    pub fn load_word_list(&mut self, path: &Path) -> Result<usize> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read word list: {}", path.display()))?;

        let before = self.words.len();
        self.extend(raw.lines());
        Ok(self.words.len() - before)
    }

    pub fn extend<I, S>(&mut self, words: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for word in words {
            let word = word.as_ref().trim().to_lowercase();
            if !word.is_empty() {
                self.words.insert(word);
            }
        }
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word) || self.words.contains(&word.to_lowercase())
    }

    pub fn is_common(&self, word: &str) -> bool {
        self.common.contains(&word.to_lowercase())
    }

    /// Words in lexical order, which fixes tie-breaking for corrections.
    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.words.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }
}
