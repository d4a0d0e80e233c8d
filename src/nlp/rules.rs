use anyhow::{Context, Result};
use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleCategory {
    OcrError,
    TermNormalization,
    Spacing,
}

impl RuleCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OcrError => "ocr_error",
            Self::TermNormalization => "term_normalization",
            Self::Spacing => "spacing",
        }
    }
}

#[derive(Debug)]
pub struct RewriteRule {
    pub pattern: Regex,
    pub replacement: &'static str,
    pub confidence: f64,
    pub category: RuleCategory,
}

/// Ordered rewrite rules. Earlier rules run first and shadow later ones.
#[derive(Debug)]
pub struct RuleTable {
    rules: Vec<RewriteRule>,
}

const OCR_ERROR_RULES: &[(&str, &str)] = &[
    (r"\bD\s*&\s*D\b", "D&D"),
    (
        r"\bDun\s*geo\s*ns?\s*&\s*Dra\s*go\s*ns?\b",
        "Dungeons & Dragons",
    ),
    (r"\bm\s*ore\b", "more"),
    (r"\bw\s*ith\b", "with"),
    (r"\bt\s*hat\b", "that"),
    (r"\bt\s*he\b", "the"),
    (r"\ba\s*n\s*d\b", "and"),
    (r"\bf\s*or\b", "for"),
    (r"\by\s*ou\s*r\b", "your"),
    (r"\bt\s*o\b", "to"),
    (r"\bo\s*f\b", "of"),
];

const TERM_RULES: &[(&str, &str)] = &[
    (r"D\s*&\s*D", "D&D"),
    (
        r"(?i)Dun\s*g?e?o?n?s?\s*&\s*Dra\s*g?o?n?s?",
        "Dungeons & Dragons",
    ),
];

const SPACING_RULES: &[(&str, &str)] = &[
    (r"\byou\s+r\b", "your"),
    (r"\bm\s+ore\b", "more"),
    (r"\bDoyou\b", "Do you"),
    (r"\bthe\s+se\b", "these"),
    (r"\bwhat\s+ever\b", "whatever"),
    (r"\b([Ii])t'sa\b", "${1}t's a"),
    (r"\bsom\s+e\b", "some"),
    (r"[ \t]{2,}", " "),
];

impl RuleTable {
    pub fn ocr_errors() -> Result<Self> {
        Self::compile(OCR_ERROR_RULES, 0.95, RuleCategory::OcrError)
    }

    pub fn term_normalization() -> Result<Self> {
        Self::compile(TERM_RULES, 1.0, RuleCategory::TermNormalization)
    }

    pub fn spacing_fixes() -> Result<Self> {
        Self::compile(SPACING_RULES, 0.9, RuleCategory::Spacing)
    }

    fn compile(
        entries: &[(&str, &'static str)],
        confidence: f64,
        category: RuleCategory,
    ) -> Result<Self> {
        let mut rules = Vec::with_capacity(entries.len());
        for (pattern, replacement) in entries {
            let pattern = Regex::new(pattern).with_context(|| {
                format!(
                    "failed to compile {} rule regex: {pattern}",
                    category.as_str()
                )
            })?;
            rules.push(RewriteRule {
                pattern,
                replacement,
                confidence,
                category,
            });
        }

        Ok(Self { rules })
    }

    pub fn apply(&self, text: &str) -> String {
        let mut output = text.to_string();
        for rule in &self.rules {
            if rule.pattern.is_match(&output) {
                output = rule
                    .pattern
                    .replace_all(&output, rule.replacement)
                    .into_owned();
            }
        }
        output
    }

    /// First rule whose pattern matches at the start of `word`.
    pub fn match_word(&self, word: &str) -> Option<&RewriteRule> {
        self.rules.iter().find(|rule| {
            rule.pattern
                .find(word)
                .is_some_and(|found| found.start() == 0)
        })
    }
}
