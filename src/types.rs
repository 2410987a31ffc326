use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// A raw value entered for a grade. What it means depends on the grade
/// scheme of the entry it was recorded against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GradeValue {
    /// A pass/fail value.
    Bool(bool),
    /// A numeric value, points or a percentage.
    Number(f64),
    /// Free text, usually a letter or a number typed by an instructor.
    Text(String),
}

impl GradeValue {
    /// Returns the value as a number, if it is one or can be read as one.
    ///
    /// Text values have surrounding whitespace and a trailing `-` suffix
    /// removed first, so `"85 -"` reads as `85.0`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            GradeValue::Number(n) => Some(*n),
            GradeValue::Text(text) => normalize_text(text).parse::<f64>().ok(),
            GradeValue::Bool(_) => None,
        }
    }

    /// Returns a short name for the kind of value, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            GradeValue::Bool(_) => "boolean",
            GradeValue::Number(_) => "number",
            GradeValue::Text(_) => "text",
        }
    }
}

impl Display for GradeValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GradeValue::Bool(b) => write!(f, "{b}"),
            GradeValue::Number(n) => write!(f, "{n}"),
            GradeValue::Text(t) => write!(f, "{t}"),
        }
    }
}

impl From<f64> for GradeValue {
    fn from(value: f64) -> Self {
        GradeValue::Number(value)
    }
}

impl From<bool> for GradeValue {
    fn from(value: bool) -> Self {
        GradeValue::Bool(value)
    }
}

impl From<&str> for GradeValue {
    fn from(value: &str) -> Self {
        GradeValue::Text(value.to_string())
    }
}

impl From<String> for GradeValue {
    fn from(value: String) -> Self {
        GradeValue::Text(value)
    }
}

/// Trims a grade string and drops a trailing `-` marker.
pub fn normalize_text(text: &str) -> &str {
    let trimmed = text.trim();
    trimmed.strip_suffix('-').unwrap_or(trimmed).trim_end()
}

/// Rounds to two decimal places, half away from zero.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
