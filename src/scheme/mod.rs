#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Grade schemes: conversions between a raw grade value and a normalized
//! correctness in `[0, 1]`.

/// Pass/fail scheme.
pub mod boolean;
/// Letter buckets.
pub mod letter;
/// Linear numeric and integer schemes.
pub mod numeric;

use std::fmt::Display;

pub use boolean::BooleanGradeScheme;
pub use letter::{LetterGradeScheme, LetterRange};
pub use numeric::{IntegerGradeScheme, NumericGradeScheme};
use serde::{Deserialize, Serialize};

use crate::types::GradeValue;

/// An enum to represent possible errors when converting grade values.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SchemeError {
    /// The letter is not part of the scheme's table.
    #[error("`{0}` is not a letter grade in this scheme")]
    UnknownLetter(String),
    /// The same letter appears twice in the table.
    #[error("Letter `{0}` is declared more than once")]
    DuplicateLetter(String),
    /// The letter table has no entries.
    #[error("The letter grade table is empty")]
    EmptyLetterTable,
    /// A range in the letter table has `min > max`.
    #[error("Letter `{letter}` has an inverted range [{min}, {max}]")]
    InvertedRange {
        /// The offending letter.
        letter: String,
        /// Lower bound.
        min:    f64,
        /// Upper bound.
        max:    f64,
    },
    /// The text could not be read as a number.
    #[error("`{0}` is not a number")]
    NotANumber(String),
    /// The number falls outside the scheme's bounds.
    #[error("{value} is outside of the range [{min}, {max}]")]
    OutOfRange {
        /// The rejected value.
        value: f64,
        /// Lower bound.
        min:   f64,
        /// Upper bound.
        max:   f64,
    },
    /// The scheme's bounds leave no room for scaling.
    #[error("Scheme bounds [{min}, {max}] are empty")]
    EmptyRange {
        /// Lower bound.
        min: f64,
        /// Upper bound.
        max: f64,
    },
    /// An integer scheme received a fractional value.
    #[error("{0} is not an integer")]
    NotAnInteger(f64),
    /// The text is not one of the accepted boolean spellings.
    #[error("`{0}` is not a boolean value")]
    NotABoolean(String),
    /// The value has the wrong shape for this scheme.
    #[error("Expected a {expected} grade but found a {found} value")]
    WrongType {
        /// What the scheme accepts.
        expected: &'static str,
        /// What was provided.
        found:    &'static str,
    },
    /// Correctness was not a finite number.
    #[error("Correctness {0} is not a finite number")]
    InvalidCorrectness(f64),
}

/// A conversion strategy between grade values and correctness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GradeScheme {
    /// Letters mapped onto numeric ranges.
    Letter(LetterGradeScheme),
    /// Real numbers scaled linearly between a minimum and a maximum.
    Numeric(NumericGradeScheme),
    /// Whole numbers scaled linearly between a minimum and a maximum.
    Integer(IntegerGradeScheme),
    /// Pass or fail.
    Boolean(BooleanGradeScheme),
}

impl Default for GradeScheme {
    fn default() -> Self {
        GradeScheme::Letter(LetterGradeScheme::default())
    }
}

impl GradeScheme {
    /// Parses user-entered text into a value of this scheme and validates
    /// it.
    pub fn from_text(&self, text: &str) -> Result<GradeValue, SchemeError> {
        match self {
            GradeScheme::Letter(s) => s.from_text(text),
            GradeScheme::Numeric(s) => s.from_text(text),
            GradeScheme::Integer(s) => s.from_text(text),
            GradeScheme::Boolean(s) => s.from_text(text),
        }
    }

    /// Checks that `value` is acceptable for this scheme.
    pub fn validate(&self, value: &GradeValue) -> Result<(), SchemeError> {
        match self {
            GradeScheme::Letter(s) => s.validate(value),
            GradeScheme::Numeric(s) => s.validate(value),
            GradeScheme::Integer(s) => s.validate(value),
            GradeScheme::Boolean(s) => s.validate(value),
        }
    }

    /// Converts a value of this scheme into a correctness.
    pub fn to_correctness(&self, value: &GradeValue) -> Result<f64, SchemeError> {
        match self {
            GradeScheme::Letter(s) => s.to_correctness(value),
            GradeScheme::Numeric(s) => s.to_correctness(value),
            GradeScheme::Integer(s) => s.to_correctness(value),
            GradeScheme::Boolean(s) => s.to_correctness(value),
        }
    }

    /// Converts a correctness back into a value of this scheme.
    pub fn from_correctness(&self, correctness: f64) -> Result<GradeValue, SchemeError> {
        if !correctness.is_finite() {
            return Err(SchemeError::InvalidCorrectness(correctness));
        }
        match self {
            GradeScheme::Letter(s) => s.from_correctness(correctness),
            GradeScheme::Numeric(s) => s.from_correctness(correctness),
            GradeScheme::Integer(s) => s.from_correctness(correctness),
            GradeScheme::Boolean(s) => Ok(s.from_correctness(correctness)),
        }
    }

    /// Brings a stored value into this scheme's canonical form.
    ///
    /// Text is parsed with [`GradeScheme::from_text`]; anything else is
    /// validated as-is.
    pub fn coerce(&self, value: &GradeValue) -> Result<GradeValue, SchemeError> {
        match value {
            GradeValue::Text(text) => self.from_text(text),
            other => {
                self.validate(other)?;
                Ok(other.clone())
            }
        }
    }

    /// Coerces `value` and returns its correctness.
    pub fn correctness(&self, value: &GradeValue) -> Result<f64, SchemeError> {
        let value = self.coerce(value)?;
        self.to_correctness(&value)
    }

    /// Checks the scheme's own configuration.
    pub fn check(&self) -> Result<(), SchemeError> {
        match self {
            GradeScheme::Letter(s) => s.check(),
            GradeScheme::Numeric(s) => s.check(),
            GradeScheme::Integer(s) => s.check(),
            GradeScheme::Boolean(_) => Ok(()),
        }
    }

    /// Short name of the scheme kind.
    pub fn kind(&self) -> &'static str {
        match self {
            GradeScheme::Letter(_) => "letter",
            GradeScheme::Numeric(_) => "numeric",
            GradeScheme::Integer(_) => "integer",
            GradeScheme::Boolean(_) => "boolean",
        }
    }
}

impl Display for GradeScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GradeScheme::Numeric(s) => write!(f, "numeric [{}, {}]", s.min, s.max),
            GradeScheme::Integer(s) => write!(f, "integer [{}, {}]", s.min, s.max),
            other => write!(f, "{}", other.kind()),
        }
    }
}

impl From<LetterGradeScheme> for GradeScheme {
    fn from(value: LetterGradeScheme) -> Self {
        GradeScheme::Letter(value)
    }
}

impl From<NumericGradeScheme> for GradeScheme {
    fn from(value: NumericGradeScheme) -> Self {
        GradeScheme::Numeric(value)
    }
}

impl From<IntegerGradeScheme> for GradeScheme {
    fn from(value: IntegerGradeScheme) -> Self {
        GradeScheme::Integer(value)
    }
}

impl From<BooleanGradeScheme> for GradeScheme {
    fn from(value: BooleanGradeScheme) -> Self {
        GradeScheme::Boolean(value)
    }
}
