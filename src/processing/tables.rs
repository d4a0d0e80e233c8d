use anyhow::{Context, Result};
use regex::Regex;

use crate::model::Table;

pub const DEFAULT_MIN_ROWS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableType {
    ClassTable,
    LevelProgression,
}

impl TableType {
    pub const ALL: [TableType; 2] = [TableType::ClassTable, TableType::LevelProgression];

    pub fn as_str(self) -> &'static str {
        match self {
            TableType::ClassTable => "class_table",
            TableType::LevelProgression => "level_progression",
        }
    }

    pub fn columns(self) -> &'static [&'static str] {
        match self {
            TableType::ClassTable => &[
                "Class",
                "Description",
                "Hit Die",
                "Primary Ability",
                "Saving Throws",
                "Proficiencies",
            ],
            TableType::LevelProgression => &[
                "Level",
                "Proficiency Bonus",
                "Features",
                "Rages",
                "Rage Damage",
            ],
        }
    }

    fn required_patterns(self) -> &'static [ColumnPattern] {
        match self {
            TableType::ClassTable => &[
                ColumnPattern::ClassName,
                ColumnPattern::HitDie,
                ColumnPattern::Ability,
            ],
            TableType::LevelProgression => &[
                ColumnPattern::Level,
                ColumnPattern::Modifier,
                ColumnPattern::Feature,
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnPattern {
    Level,
    Number,
    Modifier,
    Feature,
    ClassName,
    HitDie,
    Ability,
}

impl ColumnPattern {
    const ALL: [ColumnPattern; 7] = [
        ColumnPattern::Level,
        ColumnPattern::Number,
        ColumnPattern::Modifier,
        ColumnPattern::Feature,
        ColumnPattern::ClassName,
        ColumnPattern::HitDie,
        ColumnPattern::Ability,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

/// Classifies runs of lines as known table layouts by per-pattern voting.
#[derive(Debug)]
pub struct TableProcessor {
    level: Regex,
    number: Regex,
    modifier: Regex,
    feature: Regex,
    class_name: Regex,
    hit_die: Regex,
    ability: Regex,
}

impl TableProcessor {
    /// Value patterns (levels, hit dice, ability names) ignore case. Feature and
    /// class-name patterns key on capitalization and stay case-sensitive.
    pub fn new() -> Result<Self> {
        let ability_name = "(?:Strength|Dexterity|Constitution|Intelligence|Wisdom|Charisma)";

        Ok(Self {
            level: Regex::new(r"(?i)^\d{1,2}(?:st|nd|rd|th)?$")
                .context("failed to compile level column regex")?,
            number: Regex::new(r"^[+-]?\d+$").context("failed to compile number column regex")?,
            modifier: Regex::new(r"^[+-]\d+$")
                .context("failed to compile modifier column regex")?,
            feature: Regex::new(r"^[A-Z][a-zA-Z\s,]+$")
                .context("failed to compile feature column regex")?,
            class_name: Regex::new(r"^[A-Z][a-zA-Z]+$")
                .context("failed to compile class name column regex")?,
            hit_die: Regex::new(r"(?i)^d\d+$").context("failed to compile hit die column regex")?,
            ability: Regex::new(&format!(
                r"(?i)^{ability_name}(?:\s*(?:&|\+)\s*{ability_name})?$"
            ))
            .context("failed to compile ability column regex")?,
        })
    }

    fn pattern(&self, pattern: ColumnPattern) -> &Regex {
        match pattern {
            ColumnPattern::Level => &self.level,
            ColumnPattern::Number => &self.number,
            ColumnPattern::Modifier => &self.modifier,
            ColumnPattern::Feature => &self.feature,
            ColumnPattern::ClassName => &self.class_name,
            ColumnPattern::HitDie => &self.hit_die,
            ColumnPattern::Ability => &self.ability,
        }
    }

    fn votes(&self, lines: &[String]) -> [usize; 7] {
        let mut votes = [0usize; 7];
        for line in lines {
            let line = line.trim();
            for pattern in ColumnPattern::ALL {
                if self.pattern(pattern).is_match(line) {
                    votes[pattern.index()] += 1;
                }
            }
        }
        votes
    }

    /// First table type whose every required pattern matches at least
    /// `min_rows / 4` lines.
    pub fn classify(&self, lines: &[String], min_rows: usize) -> Option<TableType> {
        if lines.len() < min_rows {
            return None;
        }

        let votes = self.votes(lines);
        let threshold = min_rows as f64 / 4.0;

        TableType::ALL.into_iter().find(|table_type| {
            table_type
                .required_patterns()
                .iter()
                .all(|pattern| votes[pattern.index()] as f64 >= threshold)
        })
    }

    pub fn detect_table(&self, lines: &[String], min_rows: usize) -> bool {
        self.classify(lines, min_rows).is_some()
    }

    /// Parses `lines` into rows when they classify as a table. Lines before the
    /// first row start are kept as a leading single-cell row.
    pub fn parse_table(&self, lines: &[String]) -> Option<Table> {
        let table_type = self.classify(lines, DEFAULT_MIN_ROWS)?;

        let cells = lines
            .iter()
            .map(|line| line.trim())
            .filter(|line| !line.is_empty());
        let rows = match table_type {
            TableType::ClassTable => self.parse_class_rows(cells),
            TableType::LevelProgression => self.parse_level_rows(cells),
        };

        Some(Table {
            kind: "table".to_string(),
            table_type: table_type.as_str().to_string(),
            columns: table_type
                .columns()
                .iter()
                .map(|column| column.to_string())
                .collect(),
            rows,
        })
    }

    fn parse_class_rows<'a>(&self, lines: impl Iterator<Item = &'a str>) -> Vec<Vec<String>> {
        let mut rows = Vec::<Vec<String>>::new();
        let mut current = Vec::<String>::new();
        let mut in_row = false;

        for line in lines {
            let starts_row = self.class_name.is_match(line) && !self.ability.is_match(line);
            if starts_row {
                if !current.is_empty() {
                    rows.push(std::mem::take(&mut current));
                }
                current.push(line.to_string());
                in_row = true;
                continue;
            }

            let typed_cell = self.hit_die.is_match(line) || self.ability.is_match(line);
            if in_row && (typed_cell || current.len() == 1) {
                current.push(line.to_string());
            } else {
                append_continuation(&mut current, line);
            }
        }

        if !current.is_empty() {
            rows.push(current);
        }
        rows
    }

    fn parse_level_rows<'a>(&self, lines: impl Iterator<Item = &'a str>) -> Vec<Vec<String>> {
        let column_count = TableType::LevelProgression.columns().len();
        let mut rows = Vec::<Vec<String>>::new();
        let mut current = Vec::<String>::new();
        let mut in_row = false;

        for line in lines {
            let next_column = current.len();
            if in_row && next_column < column_count && self.matches_level_column(next_column, line)
            {
                current.push(line.to_string());
                continue;
            }

            if self.level.is_match(line) {
                if !current.is_empty() {
                    rows.push(std::mem::take(&mut current));
                }
                current.push(line.to_string());
                in_row = true;
                continue;
            }

            append_continuation(&mut current, line);
        }

        if !current.is_empty() {
            rows.push(current);
        }
        rows
    }

    fn matches_level_column(&self, column: usize, value: &str) -> bool {
        match column {
            0 => self.level.is_match(value),
            1 | 4 => self.modifier.is_match(value),
            2 => self.feature.is_match(value),
            3 => self.number.is_match(value) || value.eq_ignore_ascii_case("unlimited"),
            _ => false,
        }
    }
}

fn append_continuation(row: &mut Vec<String>, line: &str) {
    match row.last_mut() {
        Some(cell) => {
            cell.push(' ');
            cell.push_str(line);
        }
        None => row.push(line.to_string()),
    }
}
