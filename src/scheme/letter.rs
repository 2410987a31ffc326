use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::SchemeError;
use crate::types::GradeValue;

/// One row of a letter table: the letter and the inclusive range of numbers
/// it covers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "LetterRow")]
pub struct LetterRange {
    /// The letter, stored upper case.
    pub letter: String,
    /// Inclusive lower bound.
    pub min:    f64,
    /// Inclusive upper bound.
    pub max:    f64,
}

/// A letter table row as written in a file, before the letter is
/// normalized.
#[derive(Deserialize)]
struct LetterRow {
    /// The letter, in any case.
    letter: String,
    /// Inclusive lower bound.
    min:    f64,
    /// Inclusive upper bound.
    max:    f64,
}

impl From<LetterRow> for LetterRange {
    fn from(row: LetterRow) -> Self {
        LetterRange::new(row.letter, row.min, row.max)
    }
}

impl LetterRange {
    /// Creates a new row.
    pub fn new(letter: impl Into<String>, min: f64, max: f64) -> Self {
        Self {
            letter: letter.into().to_uppercase(),
            min,
            max,
        }
    }

    /// Whether `n` falls inside the range.
    fn contains(&self, n: f64) -> bool {
        n >= self.min && n <= self.max
    }
}

/// Letter grades backed by numeric ranges, highest range first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LetterGradeScheme {
    /// The table, in declaration order.
    #[serde(default = "default_table")]
    grades: Vec<LetterRange>,
}

/// The usual A-F table.
fn default_table() -> Vec<LetterRange> {
    vec![
        LetterRange::new("A", 90.0, 100.0),
        LetterRange::new("B", 80.0, 89.0),
        LetterRange::new("C", 70.0, 79.0),
        LetterRange::new("D", 40.0, 69.0),
        LetterRange::new("F", 0.0, 39.0),
    ]
}

impl Default for LetterGradeScheme {
    fn default() -> Self {
        Self {
            grades: default_table(),
        }
    }
}

impl LetterGradeScheme {
    /// Builds a scheme from an explicit table.
    pub fn new(grades: Vec<LetterRange>) -> Result<Self, SchemeError> {
        let scheme = Self { grades };
        scheme.check()?;
        Ok(scheme)
    }

    /// Returns the table.
    pub fn grades(&self) -> &[LetterRange] {
        &self.grades
    }

    /// Rejects empty tables and inverted ranges.
    pub fn check(&self) -> Result<(), SchemeError> {
        if self.grades.is_empty() {
            return Err(SchemeError::EmptyLetterTable);
        }
        let mut seen = HashSet::new();
        for range in &self.grades {
            if range.min > range.max {
                return Err(SchemeError::InvertedRange {
                    letter: range.letter.clone(),
                    min:    range.min,
                    max:    range.max,
                });
            }
            if !seen.insert(range.letter.to_uppercase()) {
                return Err(SchemeError::DuplicateLetter(range.letter.clone()));
            }
        }
        Ok(())
    }

    /// Largest upper bound in the table; correctness 1.0 maps onto it.
    fn top(&self) -> f64 {
        self.grades
            .iter()
            .map(|r| r.max)
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Maps a number onto a letter.
    ///
    /// The first declared range containing `n` wins. Numbers in a gap
    /// between two ranges take the first range whose lower bound they
    /// reach, numbers above the table take the first letter, and numbers
    /// below it take the last.
    pub fn to_letter(&self, n: f64) -> Result<&str, SchemeError> {
        let n = (n * 1e6).round() / 1e6;
        let found = self
            .grades
            .iter()
            .find(|r| r.contains(n))
            .or_else(|| self.grades.iter().find(|r| n >= r.min))
            .or_else(|| self.grades.last())
            .ok_or(SchemeError::EmptyLetterTable)?;
        Ok(found.letter.as_str())
    }

    /// Returns the upper bound of the letter's range.
    pub fn to_number(&self, letter: &str) -> Result<f64, SchemeError> {
        let wanted = letter.trim().to_uppercase();
        self.grades
            .iter()
            .find(|r| r.letter.eq_ignore_ascii_case(&wanted))
            .map(|r| r.max)
            .ok_or(SchemeError::UnknownLetter(letter.to_string()))
    }

    /// Parses a letter, case-insensitively.
    pub fn from_text(&self, text: &str) -> Result<GradeValue, SchemeError> {
        let letter = text.trim().to_uppercase();
        let value = GradeValue::Text(letter);
        self.validate(&value)?;
        Ok(value)
    }

    /// Accepts only letters present in the table.
    pub fn validate(&self, value: &GradeValue) -> Result<(), SchemeError> {
        match value {
            GradeValue::Text(letter) => self.to_number(letter).map(|_| ()),
            other => Err(SchemeError::WrongType {
                expected: "letter",
                found:    other.kind(),
            }),
        }
    }

    /// The letter's upper bound divided by the table's top.
    pub fn to_correctness(&self, value: &GradeValue) -> Result<f64, SchemeError> {
        let letter = match value {
            GradeValue::Text(letter) => letter,
            other => {
                return Err(SchemeError::WrongType {
                    expected: "letter",
                    found:    other.kind(),
                });
            }
        };
        let top = self.top();
        if top <= 0.0 {
            return Err(SchemeError::EmptyRange { min: 0.0, max: top });
        }
        Ok(self.to_number(letter)? / top)
    }

    /// The letter covering `correctness * top`.
    pub fn from_correctness(&self, correctness: f64) -> Result<GradeValue, SchemeError> {
        let letter = self.to_letter(correctness * self.top())?;
        Ok(GradeValue::Text(letter.to_string()))
    }
}
