use std::collections::{BTreeMap, HashMap};

use bon::Builder;
use chrono::{DateTime, Utc};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use super::{
    Evaluation, GradingPolicy, ItemOutcome, ItemStatus, PolicyError, PredictedGrade,
    WEIGHT_TOLERANCE, ignored_assignments,
};
use crate::{
    book::{GradeBook, GradeBookEntry},
    scheme::GradeScheme,
    types::GradeValue,
};

/// Late work earns nothing unless a category says otherwise.
fn full_penalty() -> f64 {
    1.0
}

/// One assignment inside a category.
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
#[builder(on(String, into))]
pub struct AssignmentWeight {
    /// The assignment.
    pub assignment_id: String,
    /// Share of the whole course grade. Assignments without one split what
    /// is left of the category's weight evenly.
    #[serde(default)]
    pub weight:        Option<f64>,
    /// When set, numeric values are read as points out of this total.
    #[serde(default)]
    pub total_points:  Option<f64>,
}

/// A weighted category of assignments.
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
pub struct CategoryGradePolicy {
    /// Share of the whole course grade.
    pub weight:       f64,
    /// How many of the worst grades to ignore.
    #[serde(default)]
    #[builder(default)]
    pub drop_lowest:  usize,
    /// Fraction of credit lost by late or missing work.
    #[serde(default = "full_penalty")]
    #[builder(default = full_penalty())]
    pub late_penalty: f64,
    /// The category's assignments, in display order.
    #[serde(default)]
    #[builder(default)]
    pub assignments:  Vec<AssignmentWeight>,
}

impl CategoryGradePolicy {
    /// Weight of each assignment, in declaration order.
    pub fn item_weights(&self) -> Vec<f64> {
        let explicit: f64 = self.assignments.iter().filter_map(|a| a.weight).sum();
        let implicit = self
            .assignments
            .iter()
            .filter(|a| a.weight.is_none())
            .count();
        let share = if implicit > 0 {
            ((self.weight - explicit) / implicit as f64).max(0.0)
        } else {
            0.0
        };
        self.assignments
            .iter()
            .map(|a| a.weight.unwrap_or(share))
            .collect()
    }

    /// Checks weights and penalties of this category.
    fn check(&self, name: &str) -> Result<(), PolicyError> {
        if self.weight < 0.0 {
            return Err(PolicyError::NegativeWeight {
                name:   name.to_string(),
                weight: self.weight,
            });
        }
        if !(0.0..=1.0).contains(&self.late_penalty) {
            return Err(PolicyError::InvalidLatePenalty {
                category: name.to_string(),
                penalty:  self.late_penalty,
            });
        }

        let mut explicit = 0.0;
        let mut all_explicit = true;
        for assignment in &self.assignments {
            match assignment.weight {
                Some(w) if w < 0.0 => {
                    return Err(PolicyError::NegativeWeight {
                        name:   assignment.assignment_id.clone(),
                        weight: w,
                    });
                }
                Some(w) => explicit += w,
                None => all_explicit = false,
            }
            if let Some(points) = assignment.total_points
                && points <= 0.0
            {
                return Err(PolicyError::NonPositiveTotalPoints {
                    assignment_id: assignment.assignment_id.clone(),
                    total_points:  points,
                });
            }
        }

        let overshoots = explicit > self.weight + WEIGHT_TOLERANCE;
        let falls_short = all_explicit
            && !self.assignments.is_empty()
            && (explicit - self.weight).abs() > WEIGHT_TOLERANCE;
        if overshoots || falls_short {
            return Err(PolicyError::CategoryWeightMismatch {
                category: name.to_string(),
                expected: self.weight,
                found:    explicit,
            });
        }
        Ok(())
    }
}

/// Weighted categories with drop-lowest rules and late penalties.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryWeightedPolicy {
    /// Scheme predictions are rendered with.
    #[serde(default)]
    pub presentation: GradeScheme,
    /// Categories keyed by name.
    #[serde(default)]
    pub categories:   BTreeMap<String, CategoryGradePolicy>,
}

impl CategoryWeightedPolicy {
    /// Creates a policy with no categories.
    pub fn new(presentation: impl Into<GradeScheme>) -> Self {
        Self {
            presentation: presentation.into(),
            categories:   BTreeMap::new(),
        }
    }

    /// Adds a category.
    pub fn with_category(mut self, name: impl Into<String>, category: CategoryGradePolicy) -> Self {
        self.categories.insert(name.into(), category);
        self
    }

    /// Sum of all category weights.
    pub fn total_weight(&self) -> f64 {
        self.categories.values().map(|c| c.weight).sum()
    }

    /// Whether any category lists `assignment_id`.
    pub fn covers(&self, assignment_id: &str) -> bool {
        self.categories
            .values()
            .flat_map(|c| &c.assignments)
            .any(|a| a.assignment_id == assignment_id)
    }
}

/// What evaluation needs to know about the request.
struct Assessment<'a> {
    /// The gradebook.
    book:     &'a GradeBook,
    /// The user.
    username: &'a str,
    /// The evaluation instant.
    now:      DateTime<Utc>,
}

impl Assessment<'_> {
    /// Works out one assignment's status and correctness. The flag is true
    /// when the assignment counts as due for this user.
    fn assess(
        &self,
        category_name: &str,
        category: &CategoryGradePolicy,
        assignment: &AssignmentWeight,
        weight: f64,
    ) -> (ItemOutcome, bool) {
        let mut outcome = ItemOutcome {
            assignment_id: assignment.assignment_id.clone(),
            title: assignment.assignment_id.clone(),
            category: Some(category_name.to_string()),
            status: ItemStatus::Pending,
            correctness: None,
            weight,
            late: false,
        };

        let Some((part, entry)) = self.book.locate(&assignment.assignment_id) else {
            tracing::warn!(
                "Assignment {} in {category_name} has no gradebook entry",
                assignment.assignment_id
            );
            outcome.status = ItemStatus::Invalid("no gradebook entry".to_string());
            return (outcome, false);
        };
        outcome.title = entry.display_name().to_string();

        let past_due = entry.is_past_due(self.now);
        let late_credit = 1.0 - category.late_penalty;

        let due = match entry.grade(self.username) {
            Some(grade) if grade.excused => {
                outcome.status = ItemStatus::Excused;
                outcome.correctness = Some(1.0);
                true
            }
            Some(grade) => match &grade.value {
                Some(value) => {
                    match assignment_correctness(entry, assignment, value) {
                        Ok(correctness) => {
                            outcome.status = ItemStatus::Graded;
                            outcome.correctness = Some(correctness);
                        }
                        Err(reason) => {
                            tracing::warn!(
                                "Excluding {} for {}: {reason}",
                                assignment.assignment_id,
                                self.username
                            );
                            outcome.status = ItemStatus::Invalid(reason);
                        }
                    }
                    true
                }
                None => {
                    outcome.late = !part.is_no_submit() && entry.is_late_at(grade.created);
                    outcome.status = ItemStatus::Placeholder;
                    outcome.correctness = Some(if outcome.late { late_credit } else { 1.0 });
                    past_due
                }
            },
            None if past_due && !part.is_no_submit() => {
                outcome.late = true;
                outcome.status = ItemStatus::Missing;
                outcome.correctness = Some(late_credit);
                true
            }
            None => {
                outcome.correctness = Some(1.0);
                past_due
            }
        };

        (outcome, due)
    }
}

/// Correctness of an entered value: points over total when the policy gives
/// a total and the value is numeric, the entry's scheme otherwise.
fn assignment_correctness(
    entry: &GradeBookEntry,
    assignment: &AssignmentWeight,
    value: &GradeValue,
) -> Result<f64, String> {
    if let Some(total) = assignment.total_points
        && let Some(points) = value.as_number()
    {
        return Ok(points / total);
    }
    let scheme = entry
        .scheme()
        .ok_or_else(|| "no grade scheme".to_string())?;
    scheme.correctness(value).map_err(|e| e.to_string())
}

/// Whether the item takes part in drop-lowest ranking.
fn droppable(status: &ItemStatus) -> bool {
    matches!(
        status,
        ItemStatus::Graded | ItemStatus::Placeholder | ItemStatus::Missing | ItemStatus::Pending
    )
}

/// Drops up to `count` of the lowest items (always keeping one) and splits
/// their combined weight evenly over the survivors.
fn drop_lowest(items: &mut [ItemOutcome], count: usize, category: &str) {
    if count == 0 {
        return;
    }
    let ranked: Vec<usize> = items
        .iter()
        .enumerate()
        .filter(|(_, item)| droppable(&item.status))
        .sorted_by(|(_, a), (_, b)| {
            a.correctness
                .unwrap_or(0.0)
                .total_cmp(&b.correctness.unwrap_or(0.0))
        })
        .map(|(idx, _)| idx)
        .collect();
    if ranked.len() < 2 {
        return;
    }

    let total: f64 = ranked.iter().map(|&idx| items[idx].weight).sum();

    let (dropped, kept) = ranked.split_at(count.min(ranked.len() - 1));
    let share = total / kept.len() as f64;
    for &idx in dropped {
        tracing::debug!("Dropping {} from {category}", items[idx].assignment_id);
        items[idx].status = ItemStatus::Dropped;
        items[idx].weight = 0.0;
    }
    for &idx in kept {
        items[idx].weight = share;
    }
}

impl GradingPolicy for CategoryWeightedPolicy {
    fn validate(&self, book: &GradeBook) -> Result<(), PolicyError> {
        self.presentation.check()?;

        let total = self.total_weight();
        if (total - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(PolicyError::WeightsDoNotSumToOne { total });
        }

        let mut seen: HashMap<&str, &str> = HashMap::new();
        for (name, category) in &self.categories {
            category.check(name)?;
            for assignment in &category.assignments {
                if let Some(first) = seen.insert(&assignment.assignment_id, name) {
                    return Err(PolicyError::DuplicateAssignment {
                        assignment_id: assignment.assignment_id.clone(),
                        first:         first.to_string(),
                        second:        name.clone(),
                    });
                }
                let (_, entry) = book
                    .locate(&assignment.assignment_id)
                    .ok_or_else(|| PolicyError::UnknownAssignment(assignment.assignment_id.clone()))?;
                match entry.scheme() {
                    Some(scheme) => scheme.check()?,
                    None if assignment.total_points.is_none() => {
                        return Err(PolicyError::MissingScheme(assignment.assignment_id.clone()));
                    }
                    None => {}
                }
            }
        }
        Ok(())
    }

    fn evaluate(&self, book: &GradeBook, username: &str, now: DateTime<Utc>) -> Evaluation {
        let assessment = Assessment {
            book,
            username,
            now,
        };
        let mut items: Vec<ItemOutcome> = Vec::new();
        let mut any_due = false;

        for (name, category) in &self.categories {
            let start = items.len();
            for (assignment, weight) in category.assignments.iter().zip(category.item_weights()) {
                let (outcome, due) = assessment.assess(name, category, assignment, weight);
                any_due |= due;
                items.push(outcome);
            }
            drop_lowest(&mut items[start..], category.drop_lowest, name);
        }

        let mut earned = 0.0;
        let mut excluded = 0.0;
        for item in &items {
            match item.status {
                ItemStatus::Excused => earned += item.weight,
                ItemStatus::Invalid(_) => excluded += item.weight,
                ItemStatus::Dropped | ItemStatus::Unscored => {}
                _ => earned += item.correctness.unwrap_or(0.0) * item.weight,
            }
        }

        let divisor = self.total_weight() - excluded;
        let predicted = if !any_due {
            tracing::debug!("Nothing is due yet for {username}; no prediction");
            None
        } else if divisor <= 0.0 {
            tracing::warn!("No usable weight left for {username}; no prediction");
            None
        } else {
            Some(PredictedGrade::new(&self.presentation, earned / divisor))
        };

        Evaluation {
            username: username.to_string(),
            ignored: ignored_assignments(book, username, |id| self.covers(id)),
            items,
            predicted,
        }
    }

    fn presentation(&self) -> &GradeScheme {
        &self.presentation
    }
}
