#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Grading policies: turning every grade a user has in the gradebook into a
//! single predicted course grade.

/// Category-weighted policy with drop-lowest and late penalties.
pub mod category;
/// Points-based totaling policy.
pub mod simple;

use std::{fmt::Display, fs, path::Path};

use anyhow::{Context, Result};
pub use category::{AssignmentWeight, CategoryGradePolicy, CategoryWeightedPolicy};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
pub use simple::{SimpleAssignment, SimpleTotalingPolicy};

use crate::{
    book::GradeBook,
    scheme::{GradeScheme, SchemeError},
    types::{GradeValue, round2},
};

/// How far a sum of weights may stray from its target.
pub const WEIGHT_TOLERANCE: f64 = 0.001;

/// An enum to represent possible errors when validating a policy.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum PolicyError {
    /// Category weights must add up to 1.
    #[error("Category weights add up to {total}, expected 1")]
    WeightsDoNotSumToOne {
        /// The actual sum.
        total: f64,
    },
    /// Explicit assignment weights in a category must add up to the
    /// category's weight.
    #[error("Assignment weights in `{category}` add up to {found}, expected {expected}")]
    CategoryWeightMismatch {
        /// The category.
        category: String,
        /// The category's weight.
        expected: f64,
        /// The sum of its assignment weights.
        found:    f64,
    },
    /// Weights can't be negative.
    #[error("`{name}` has a negative weight ({weight})")]
    NegativeWeight {
        /// Category or assignment name.
        name:   String,
        /// The weight.
        weight: f64,
    },
    /// Late penalties are fractions of credit.
    #[error("Late penalty {penalty} of `{category}` is outside [0, 1]")]
    InvalidLatePenalty {
        /// The category.
        category: String,
        /// The penalty.
        penalty:  f64,
    },
    /// The same assignment is configured twice.
    #[error("Assignment `{assignment_id}` appears in both `{first}` and `{second}`")]
    DuplicateAssignment {
        /// The assignment.
        assignment_id: String,
        /// Where it first appeared.
        first:         String,
        /// Where it appeared again.
        second:        String,
    },
    /// The policy names an assignment the gradebook doesn't have.
    #[error("Assignment `{0}` has no gradebook entry")]
    UnknownAssignment(String),
    /// Without points, an assignment needs a scheme to compute correctness.
    #[error("Assignment `{0}` has neither total points nor a grade scheme")]
    MissingScheme(String),
    /// Point totals must be positive.
    #[error("Assignment `{assignment_id}` has non-positive total points ({total_points})")]
    NonPositiveTotalPoints {
        /// The assignment.
        assignment_id: String,
        /// The configured points.
        total_points:  f64,
    },
    /// A scheme's own configuration is broken.
    #[error(transparent)]
    InvalidScheme(#[from] SchemeError),
}

/// The outcome of a policy for one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictedGrade {
    /// The correctness expressed in the presentation scheme.
    pub grade:            Option<GradeValue>,
    /// The correctness as a percentage.
    pub raw_value:        f64,
    /// Course correctness, clamped to `[0, 1]` and rounded to 2 decimals.
    pub correctness:      f64,
    /// Points earned, for points-based policies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points_earned:    Option<f64>,
    /// Points available, for points-based policies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points_available: Option<f64>,
}

impl PredictedGrade {
    /// Clamps and rounds `correctness`, then renders it with `presentation`.
    pub fn new(presentation: &GradeScheme, correctness: f64) -> Self {
        let correctness = round2(correctness.clamp(0.0, 1.0));
        let grade = match presentation.from_correctness(correctness) {
            Ok(grade) => Some(grade),
            Err(e) => {
                tracing::warn!("Could not present correctness {correctness}: {e}");
                None
            }
        };
        Self {
            grade,
            raw_value: round2(correctness * 100.0),
            correctness,
            points_earned: None,
            points_available: None,
        }
    }

    /// Attaches point totals.
    pub fn with_points(mut self, earned: f64, available: f64) -> Self {
        self.points_earned = Some(earned);
        self.points_available = Some(available);
        self
    }
}

impl Display for PredictedGrade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.grade {
            Some(grade) => write!(f, "{grade} ({:.2}%)", self.raw_value),
            None => write!(f, "{:.2}%", self.raw_value),
        }
    }
}

/// What happened to one assignment during evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    /// A value was entered and converted.
    Graded,
    /// Submitted but not graded yet; a proxy correctness was used.
    Placeholder,
    /// Past due with nothing submitted.
    Missing,
    /// Not due yet, or waiting on the instructor.
    Pending,
    /// Excused: counts as full credit.
    Excused,
    /// Removed by a drop-lowest rule.
    Dropped,
    /// Left out because it has no points configured.
    Unscored,
    /// Left out because the grade could not be used.
    Invalid(String),
}

impl Display for ItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemStatus::Graded => write!(f, "graded"),
            ItemStatus::Placeholder => write!(f, "awaiting grade"),
            ItemStatus::Missing => write!(f, "missing"),
            ItemStatus::Pending => write!(f, "pending"),
            ItemStatus::Excused => write!(f, "excused"),
            ItemStatus::Dropped => write!(f, "dropped"),
            ItemStatus::Unscored => write!(f, "unscored"),
            ItemStatus::Invalid(reason) => write!(f, "invalid: {reason}"),
        }
    }
}

/// One assignment's contribution to an evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemOutcome {
    /// The assignment.
    pub assignment_id: String,
    /// Entry title, or the id when the entry is missing.
    pub title:         String,
    /// Category, for category-weighted policies.
    pub category:      Option<String>,
    /// What happened to it.
    pub status:        ItemStatus,
    /// Correctness used, when one was computed.
    pub correctness:   Option<f64>,
    /// Weight (or points available) the item carried in the end.
    pub weight:        f64,
    /// Whether a late penalty applied.
    pub late:          bool,
}

/// The full result of evaluating a policy for one user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    /// The user evaluated.
    pub username:  String,
    /// Per-assignment breakdown, in policy order.
    pub items:     Vec<ItemOutcome>,
    /// Assignments with grades but no policy entry.
    pub ignored:   Vec<String>,
    /// The prediction, when one is possible.
    pub predicted: Option<PredictedGrade>,
}

impl Evaluation {
    /// Number of items with the given status.
    fn count(&self, pred: impl Fn(&ItemStatus) -> bool) -> usize {
        self.items.iter().filter(|i| pred(&i.status)).count()
    }

    /// Number of excused items.
    pub fn excused(&self) -> usize {
        self.count(|s| matches!(s, ItemStatus::Excused))
    }

    /// Number of items left out as invalid.
    pub fn invalid(&self) -> usize {
        self.count(|s| matches!(s, ItemStatus::Invalid(_)))
    }

    /// Number of items removed by drop-lowest rules.
    pub fn dropped(&self) -> usize {
        self.count(|s| matches!(s, ItemStatus::Dropped))
    }
}

/// A rule that predicts a course grade from a user's gradebook grades.
pub trait GradingPolicy {
    /// Checks the policy's configuration against the gradebook.
    fn validate(&self, book: &GradeBook) -> Result<(), PolicyError>;

    /// Evaluates the policy for `username` as of `now`.
    fn evaluate(&self, book: &GradeBook, username: &str, now: DateTime<Utc>) -> Evaluation;

    /// The scheme predictions are rendered with.
    fn presentation(&self) -> &GradeScheme;

    /// Predicted course grade, or `None` when nothing can be predicted yet.
    fn grade(&self, book: &GradeBook, username: &str, now: DateTime<Utc>) -> Option<PredictedGrade> {
        self.evaluate(book, username, now).predicted
    }
}

/// A policy as read from a configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Policy {
    /// Earned over available points.
    Simple(SimpleTotalingPolicy),
    /// Weighted categories.
    Category(CategoryWeightedPolicy),
}

impl Policy {
    /// Reads a policy from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("Could not read grading policy {}", path.display()))?;
        let policy: Policy = serde_json::from_str(&text)
            .with_context(|| format!("Could not parse grading policy {}", path.display()))?;
        Ok(policy)
    }

    /// The policy behind the enum.
    fn inner(&self) -> &dyn GradingPolicy {
        match self {
            Policy::Simple(p) => p,
            Policy::Category(p) => p,
        }
    }
}

impl GradingPolicy for Policy {
    fn validate(&self, book: &GradeBook) -> Result<(), PolicyError> {
        self.inner().validate(book)
    }

    fn evaluate(&self, book: &GradeBook, username: &str, now: DateTime<Utc>) -> Evaluation {
        self.inner().evaluate(book, username, now)
    }

    fn presentation(&self) -> &GradeScheme {
        self.inner().presentation()
    }
}

impl From<SimpleTotalingPolicy> for Policy {
    fn from(value: SimpleTotalingPolicy) -> Self {
        Policy::Simple(value)
    }
}

impl From<CategoryWeightedPolicy> for Policy {
    fn from(value: CategoryWeightedPolicy) -> Self {
        Policy::Category(value)
    }
}

/// Warns about and lists grades recorded for assignments the policy does
/// not cover.
fn ignored_assignments(
    book: &GradeBook,
    username: &str,
    covered: impl Fn(&str) -> bool,
) -> Vec<String> {
    book.grades_for_user(username)
        .into_iter()
        .filter(|(_, entry, _)| !covered(entry.assignment_id()))
        .map(|(_, entry, _)| {
            tracing::warn!(
                "Ignoring grade of {username} on {}: no grading policy entry",
                entry.assignment_id()
            );
            entry.assignment_id().to_string()
        })
        .collect()
}
