use serde::{Deserialize, Serialize};

use super::SchemeError;
use crate::types::{GradeValue, normalize_text};

/// Default lower bound for numeric schemes.
fn default_min() -> f64 {
    0.0
}

/// Default upper bound for numeric schemes.
fn default_max() -> f64 {
    100.0
}

/// Real-valued grades scaled linearly between `min` and `max`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumericGradeScheme {
    /// Value that maps to correctness 0.
    #[serde(default = "default_min")]
    pub min: f64,
    /// Value that maps to correctness 1.
    #[serde(default = "default_max")]
    pub max: f64,
}

impl Default for NumericGradeScheme {
    fn default() -> Self {
        Self {
            min: default_min(),
            max: default_max(),
        }
    }
}

impl NumericGradeScheme {
    /// Creates a scheme over `[min, max]`.
    pub fn new(min: f64, max: f64) -> Result<Self, SchemeError> {
        let scheme = Self { min, max };
        scheme.check()?;
        Ok(scheme)
    }

    /// Rejects bounds that cannot be scaled over.
    pub fn check(&self) -> Result<(), SchemeError> {
        if self.max <= self.min || !self.min.is_finite() || !self.max.is_finite() {
            return Err(SchemeError::EmptyRange {
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }

    /// Reads a number and checks it against the bounds.
    pub fn from_text(&self, text: &str) -> Result<GradeValue, SchemeError> {
        let value = parse_number(text)?;
        self.validate(&value)?;
        Ok(value)
    }

    /// Accepts numbers inside `[min, max]`.
    pub fn validate(&self, value: &GradeValue) -> Result<(), SchemeError> {
        let n = number_of(value, "numeric")?;
        if n < self.min || n > self.max {
            return Err(SchemeError::OutOfRange {
                value: n,
                min:   self.min,
                max:   self.max,
            });
        }
        Ok(())
    }

    /// `(value - min) / (max - min)`.
    pub fn to_correctness(&self, value: &GradeValue) -> Result<f64, SchemeError> {
        self.check()?;
        let n = number_of(value, "numeric")?;
        Ok((n - self.min) / (self.max - self.min))
    }

    /// `correctness * (max - min) + min`.
    pub fn from_correctness(&self, correctness: f64) -> Result<GradeValue, SchemeError> {
        self.check()?;
        Ok(GradeValue::Number(correctness * (self.max - self.min) + self.min))
    }
}

/// Whole-number grades; otherwise identical to [`NumericGradeScheme`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntegerGradeScheme {
    /// Value that maps to correctness 0.
    #[serde(default = "default_min")]
    pub min: f64,
    /// Value that maps to correctness 1.
    #[serde(default = "default_max")]
    pub max: f64,
}

impl Default for IntegerGradeScheme {
    fn default() -> Self {
        Self {
            min: default_min(),
            max: default_max(),
        }
    }
}

impl IntegerGradeScheme {
    /// Creates a scheme over `[min, max]`.
    pub fn new(min: i64, max: i64) -> Result<Self, SchemeError> {
        let scheme = Self {
            min: min as f64,
            max: max as f64,
        };
        scheme.check()?;
        Ok(scheme)
    }

    /// The numeric scheme this one restricts.
    fn linear(&self) -> NumericGradeScheme {
        NumericGradeScheme {
            min: self.min,
            max: self.max,
        }
    }

    /// Rejects bounds that cannot be scaled over.
    pub fn check(&self) -> Result<(), SchemeError> {
        self.linear().check()
    }

    /// Reads an integer and checks it against the bounds.
    pub fn from_text(&self, text: &str) -> Result<GradeValue, SchemeError> {
        let value = parse_number(text)?;
        self.validate(&value)?;
        Ok(value)
    }

    /// Accepts whole numbers inside `[min, max]`.
    pub fn validate(&self, value: &GradeValue) -> Result<(), SchemeError> {
        let n = number_of(value, "integer")?;
        if n.fract() != 0.0 {
            return Err(SchemeError::NotAnInteger(n));
        }
        self.linear().validate(value)
    }

    /// Same scaling as the numeric scheme.
    pub fn to_correctness(&self, value: &GradeValue) -> Result<f64, SchemeError> {
        self.linear().to_correctness(value)
    }

    /// Scales back and rounds to the nearest whole number.
    pub fn from_correctness(&self, correctness: f64) -> Result<GradeValue, SchemeError> {
        self.check()?;
        let n = correctness * (self.max - self.min) + self.min;
        Ok(GradeValue::Number(n.round()))
    }
}

/// Parses text into a numeric grade value.
fn parse_number(text: &str) -> Result<GradeValue, SchemeError> {
    normalize_text(text)
        .parse::<f64>()
        .map(GradeValue::Number)
        .map_err(|_| SchemeError::NotANumber(text.to_string()))
}

/// Extracts the number out of a value, rejecting booleans and non-numeric
/// text.
fn number_of(value: &GradeValue, expected: &'static str) -> Result<f64, SchemeError> {
    match value {
        GradeValue::Bool(_) => Err(SchemeError::WrongType {
            expected,
            found: value.kind(),
        }),
        _ => value
            .as_number()
            .ok_or_else(|| SchemeError::NotANumber(value.to_string())),
    }
}
