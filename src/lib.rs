//! # gradebook
//!
//! A course gradebook that records assignment grades, converts them
//! through grade schemes, and predicts overall course grades from
//! configurable grading policies.

#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// The gradebook tree and its persistence
pub mod book;
/// Settings read from the environment
pub mod config;
/// D2L-compatible CSV export
pub mod export;
/// Grading policies and course grade predictions
pub mod policy;
/// Tables for evaluations
pub mod report;
/// Grade schemes
pub mod scheme;
/// Shared value types and helpers
pub mod types;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

pub use book::{Grade, GradeBook, GradeBookEntry, GradeBookPart};
pub use policy::{GradingPolicy, Policy, PredictedGrade};
pub use scheme::GradeScheme;
pub use types::GradeValue;

/// Parses an RFC 3339 instant, or returns the current time when none is
/// given.
pub fn instant(at: Option<&str>) -> Result<DateTime<Utc>> {
    match at {
        Some(text) => DateTime::parse_from_rfc3339(text)
            .map(|dt| dt.with_timezone(&Utc))
            .with_context(|| format!("`{text}` is not an RFC 3339 timestamp")),
        None => Ok(Utc::now()),
    }
}
