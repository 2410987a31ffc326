use serde::{Deserialize, Serialize};

use super::SchemeError;
use crate::types::GradeValue;

/// Correctness at or above this maps back to `true`.
pub const PASS_THRESHOLD: f64 = 0.999;

/// Spellings read as `true`.
const TRUE_VALUES: &[&str] = &["1", "y", "t", "yes", "true", "pass"];

/// Spellings read as `false`.
const FALSE_VALUES: &[&str] = &["0", "n", "f", "no", "false", "fail"];

/// Pass/fail grades.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BooleanGradeScheme {}

impl BooleanGradeScheme {
    /// Reads one of the accepted spellings, case-insensitively.
    pub fn from_text(&self, text: &str) -> Result<GradeValue, SchemeError> {
        let lowered = text.trim().to_lowercase();
        if TRUE_VALUES.contains(&lowered.as_str()) {
            Ok(GradeValue::Bool(true))
        } else if FALSE_VALUES.contains(&lowered.as_str()) {
            Ok(GradeValue::Bool(false))
        } else {
            Err(SchemeError::NotABoolean(text.to_string()))
        }
    }

    /// Only booleans are valid.
    pub fn validate(&self, value: &GradeValue) -> Result<(), SchemeError> {
        match value {
            GradeValue::Bool(_) => Ok(()),
            other => Err(SchemeError::WrongType {
                expected: "boolean",
                found:    other.kind(),
            }),
        }
    }

    /// `true` is 1.0 and `false` is 0.0.
    pub fn to_correctness(&self, value: &GradeValue) -> Result<f64, SchemeError> {
        self.validate(value)?;
        Ok(if matches!(value, GradeValue::Bool(true)) { 1.0 } else { 0.0 })
    }

    /// Passing needs a correctness of at least [`PASS_THRESHOLD`].
    pub fn from_correctness(&self, correctness: f64) -> GradeValue {
        GradeValue::Bool(correctness >= PASS_THRESHOLD)
    }
}
