use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    Evaluation, GradingPolicy, ItemOutcome, ItemStatus, PolicyError, PredictedGrade,
    ignored_assignments,
};
use crate::{
    book::{GradeBook, GradeBookEntry},
    scheme::GradeScheme,
    types::GradeValue,
};

/// Points configuration of one assignment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimpleAssignment {
    /// Points the assignment is out of. Assignments without a total don't
    /// count.
    #[serde(default)]
    pub total_points: Option<f64>,
}

impl SimpleAssignment {
    /// An assignment out of `total_points`.
    pub fn out_of(total_points: f64) -> Self {
        Self {
            total_points: Some(total_points),
        }
    }
}

/// Earned points over available points.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimpleTotalingPolicy {
    /// Scheme predictions are rendered with.
    #[serde(default)]
    pub presentation: GradeScheme,
    /// Assignments keyed by id.
    #[serde(default)]
    pub assignments:  BTreeMap<String, SimpleAssignment>,
}

impl SimpleTotalingPolicy {
    /// Creates a policy with no assignments.
    pub fn new(presentation: impl Into<GradeScheme>) -> Self {
        Self {
            presentation: presentation.into(),
            assignments:  BTreeMap::new(),
        }
    }

    /// Adds an assignment.
    pub fn with_assignment(
        mut self,
        assignment_id: impl Into<String>,
        assignment: SimpleAssignment,
    ) -> Self {
        self.assignments.insert(assignment_id.into(), assignment);
        self
    }
}

/// Points earned for `value`: the number itself, or the scheme's correctness
/// scaled to the total for values that aren't numbers.
fn earned_points(entry: &GradeBookEntry, value: &GradeValue, total: f64) -> Result<f64, String> {
    if let Some(points) = value.as_number() {
        return Ok(points);
    }
    match entry.scheme() {
        Some(scheme) => scheme
            .correctness(value)
            .map(|c| c * total)
            .map_err(|e| e.to_string()),
        None => Err(format!("`{value}` is not a number")),
    }
}

impl GradingPolicy for SimpleTotalingPolicy {
    fn validate(&self, book: &GradeBook) -> Result<(), PolicyError> {
        self.presentation.check()?;
        for (assignment_id, assignment) in &self.assignments {
            if book.locate(assignment_id).is_none() {
                return Err(PolicyError::UnknownAssignment(assignment_id.clone()));
            }
            if let Some(points) = assignment.total_points
                && points <= 0.0
            {
                return Err(PolicyError::NonPositiveTotalPoints {
                    assignment_id: assignment_id.clone(),
                    total_points:  points,
                });
            }
        }
        Ok(())
    }

    fn evaluate(&self, book: &GradeBook, username: &str, now: DateTime<Utc>) -> Evaluation {
        let mut items = Vec::new();
        let mut earned = 0.0;
        let mut available = 0.0;

        for (assignment_id, assignment) in &self.assignments {
            let mut outcome = ItemOutcome {
                assignment_id: assignment_id.clone(),
                title:         assignment_id.clone(),
                category:      None,
                status:        ItemStatus::Pending,
                correctness:   None,
                weight:        0.0,
                late:          false,
            };

            let Some((part, entry)) = book.locate(assignment_id) else {
                tracing::warn!("Assignment {assignment_id} has no gradebook entry");
                outcome.status = ItemStatus::Invalid("no gradebook entry".to_string());
                items.push(outcome);
                continue;
            };
            outcome.title = entry.display_name().to_string();

            let Some(total) = assignment.total_points else {
                outcome.status = ItemStatus::Unscored;
                items.push(outcome);
                continue;
            };

            match entry.grade(username) {
                Some(grade) if grade.excused => outcome.status = ItemStatus::Excused,
                Some(grade) => match &grade.value {
                    Some(value) => match earned_points(entry, value, total) {
                        Ok(points) => {
                            earned += points;
                            available += total;
                            outcome.status = ItemStatus::Graded;
                            outcome.correctness = Some(points / total);
                            outcome.weight = total;
                        }
                        Err(reason) => {
                            tracing::warn!("Excluding {assignment_id} for {username}: {reason}");
                            outcome.status = ItemStatus::Invalid(reason);
                        }
                    },
                    None => outcome.status = ItemStatus::Placeholder,
                },
                None if entry.is_past_due(now) && !part.is_no_submit() => {
                    available += total;
                    outcome.status = ItemStatus::Missing;
                    outcome.correctness = Some(0.0);
                    outcome.weight = total;
                    outcome.late = true;
                }
                None => {}
            }
            items.push(outcome);
        }

        let predicted = if available > 0.0 {
            Some(
                PredictedGrade::new(&self.presentation, earned / available)
                    .with_points(earned, available),
            )
        } else {
            tracing::debug!("No points available for {username}; no prediction");
            None
        };

        Evaluation {
            username: username.to_string(),
            ignored: ignored_assignments(book, username, |id| self.assignments.contains_key(id)),
            items,
            predicted,
        }
    }

    fn presentation(&self) -> &GradeScheme {
        &self.presentation
    }
}
