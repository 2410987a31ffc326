#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! The gradebook tree: book → parts (categories) → entries (assignment
//! columns) → grades.

/// Assignment columns.
pub mod entry;
/// Individual grades.
pub mod grade;
/// Categories.
pub mod part;

use std::{
    collections::{BTreeMap, BTreeSet},
    fs,
    path::Path,
};

use anyhow::{Context, Result};
use bon::Builder;
use chrono::{DateTime, Utc};
pub use entry::GradeBookEntry;
pub use grade::Grade;
pub use part::GradeBookPart;
use serde::{Deserialize, Serialize};

use crate::{
    scheme::{GradeScheme, SchemeError},
    types::GradeValue,
};

/// An enum to represent possible errors when changing the gradebook.
#[derive(thiserror::Error, Debug)]
pub enum GradebookError {
    /// No entry records this assignment.
    #[error("No gradebook entry records assignment `{0}`")]
    UnknownAssignment(String),
    /// No part has this name.
    #[error("No gradebook part named `{0}`")]
    UnknownPart(String),
    /// Another entry already records this assignment.
    #[error("Assignment `{0}` already has a gradebook entry")]
    DuplicateAssignment(String),
    /// The value was rejected by the entry's grade scheme.
    #[error("Invalid grade for `{username}` on `{assignment_id}`: {source}")]
    InvalidGrade {
        /// Assignment the grade was meant for.
        assignment_id: String,
        /// User the grade was meant for.
        username:      String,
        /// Why the scheme rejected it.
        #[source]
        source:        SchemeError,
    },
}

/// Describes an assignment the gradebook should have a column for.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(on(String, into))]
pub struct AssignmentDescriptor {
    /// Assignment identifier.
    pub assignment_id: String,
    /// Title; becomes the entry name.
    pub title:         String,
    /// Part (category) the entry lives in.
    pub category:      String,
    /// Due date, if any.
    #[serde(default)]
    pub due_date:      Option<DateTime<Utc>>,
    /// Grade scheme, if any.
    #[serde(default)]
    pub scheme:        Option<GradeScheme>,
    /// Whether students submit nothing for this assignment.
    #[serde(default)]
    #[builder(default)]
    pub no_submit:     bool,
    /// Sort position inside the part.
    #[serde(default)]
    #[builder(default)]
    pub order:         u32,
}

/// What [`GradeBook::synchronize`] changed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SyncReport {
    /// Assignments that got a new entry.
    pub created: Vec<String>,
    /// Assignments whose existing entry was refreshed.
    pub updated: Vec<String>,
}

/// The per-course root of the gradebook.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GradeBook {
    /// Course the book belongs to.
    #[serde(default)]
    course: String,
    /// Parts keyed by name.
    #[serde(default)]
    parts:  BTreeMap<String, GradeBookPart>,
}

impl GradeBook {
    /// Creates an empty book.
    pub fn new(course: impl Into<String>) -> Self {
        Self {
            course: course.into(),
            parts:  BTreeMap::new(),
        }
    }

    /// Reads a book from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("Could not read gradebook {}", path.display()))?;
        let book: GradeBook = serde_json::from_str(&text)
            .with_context(|| format!("Could not parse gradebook {}", path.display()))?;
        tracing::info!(
            "Loaded gradebook for {} with {} entries",
            book.course_label(),
            book.entries().len()
        );
        Ok(book)
    }

    /// Writes the book to a JSON file, replacing it.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let text = serde_json::to_string_pretty(self).context("Could not serialize gradebook")?;
        fs::write(path, text)
            .with_context(|| format!("Could not write gradebook {}", path.display()))?;
        tracing::info!("Saved gradebook to {}", path.display());
        Ok(())
    }

    /// Course identifier.
    pub fn course(&self) -> &str {
        &self.course
    }

    /// Course identifier, or a stand-in when none was set.
    fn course_label(&self) -> &str {
        if self.course.is_empty() { "<unnamed course>" } else { &self.course }
    }

    /// Adds a part, returning the one it replaced.
    pub fn insert_part(&mut self, part: GradeBookPart) -> Option<GradeBookPart> {
        self.parts.insert(part.name().to_string(), part)
    }

    /// Looks up a part.
    pub fn part(&self, name: &str) -> Option<&GradeBookPart> {
        self.parts.get(name)
    }

    /// Mutable lookup of a part.
    pub fn part_mut(&mut self, name: &str) -> Option<&mut GradeBookPart> {
        self.parts.get_mut(name)
    }

    /// Removes a part and everything in it.
    pub fn remove_part(&mut self, name: &str) -> Option<GradeBookPart> {
        self.parts.remove(name)
    }

    /// Parts sorted by order, then name.
    pub fn parts(&self) -> Vec<&GradeBookPart> {
        let mut parts: Vec<_> = self.parts.values().collect();
        parts.sort_by(|a, b| a.order().cmp(&b.order()).then_with(|| a.name().cmp(b.name())));
        parts
    }

    /// Every entry with its part, in book order.
    pub fn entries(&self) -> Vec<(&GradeBookPart, &GradeBookEntry)> {
        self.parts()
            .into_iter()
            .flat_map(|part| part.entries().into_iter().map(move |entry| (part, entry)))
            .collect()
    }

    /// Adds an entry to an existing part. Each assignment may only have one
    /// entry in the whole book.
    pub fn insert_entry(
        &mut self,
        part_name: &str,
        entry: GradeBookEntry,
    ) -> Result<(), GradebookError> {
        if self.locate(entry.assignment_id()).is_some() {
            return Err(GradebookError::DuplicateAssignment(entry.assignment_id().to_string()));
        }
        let part = self
            .parts
            .get_mut(part_name)
            .ok_or_else(|| GradebookError::UnknownPart(part_name.to_string()))?;
        part.insert_entry(entry);
        Ok(())
    }

    /// Finds the part and entry recording `assignment_id`.
    pub fn locate(&self, assignment_id: &str) -> Option<(&GradeBookPart, &GradeBookEntry)> {
        self.parts.values().find_map(|part| {
            part.entry_by_assignment(assignment_id)
                .map(|entry| (part, entry))
        })
    }

    /// Mutable lookup of the entry recording `assignment_id`.
    pub fn entry_mut(&mut self, assignment_id: &str) -> Option<&mut GradeBookEntry> {
        self.parts
            .values_mut()
            .find_map(|part| part.entry_by_assignment_mut(assignment_id))
    }

    /// Removes the entry recording `assignment_id` along with its grades.
    pub fn remove_assignment(&mut self, assignment_id: &str) -> Option<GradeBookEntry> {
        let (part_name, entry_name) = self
            .locate(assignment_id)
            .map(|(part, entry)| (part.name().to_string(), entry.name().to_string()))?;
        self.parts.get_mut(&part_name)?.remove_entry(&entry_name)
    }

    /// Looks up the grade `username` has on `assignment_id`.
    pub fn find_grade(&self, assignment_id: &str, username: &str) -> Option<&Grade> {
        self.locate(assignment_id)
            .and_then(|(_, entry)| entry.grade(username))
    }

    /// Every grade recorded for `username`, in book order.
    pub fn grades_for_user(&self, username: &str) -> Vec<(&GradeBookPart, &GradeBookEntry, &Grade)> {
        self.entries()
            .into_iter()
            .filter_map(|(part, entry)| entry.grade(username).map(|grade| (part, entry, grade)))
            .collect()
    }

    /// Every user with at least one grade.
    pub fn usernames(&self) -> BTreeSet<String> {
        self.parts
            .values()
            .flat_map(|part| part.entries())
            .flat_map(|entry| entry.usernames().map(str::to_string))
            .collect()
    }

    /// Records a grade on the entry for `assignment_id`.
    pub fn record_grade(
        &mut self,
        assignment_id: &str,
        username: &str,
        value: impl Into<GradeValue>,
        at: DateTime<Utc>,
    ) -> Result<&Grade, GradebookError> {
        self.entry_mut(assignment_id)
            .ok_or_else(|| GradebookError::UnknownAssignment(assignment_id.to_string()))?
            .set_grade(username, value, at)
    }

    /// Records an ungraded submission on the entry for `assignment_id`.
    pub fn record_submission(
        &mut self,
        assignment_id: &str,
        username: &str,
        at: DateTime<Utc>,
    ) -> Result<&Grade, GradebookError> {
        Ok(self
            .entry_mut(assignment_id)
            .ok_or_else(|| GradebookError::UnknownAssignment(assignment_id.to_string()))?
            .set_placeholder(username, at))
    }

    /// Excuses `username` from `assignment_id`.
    pub fn excuse(
        &mut self,
        assignment_id: &str,
        username: &str,
        at: DateTime<Utc>,
    ) -> Result<&Grade, GradebookError> {
        Ok(self
            .entry_mut(assignment_id)
            .ok_or_else(|| GradebookError::UnknownAssignment(assignment_id.to_string()))?
            .excuse(username, at))
    }

    /// Drops every grade of a user who left the course. Returns how many
    /// grades were removed.
    pub fn remove_user(&mut self, username: &str) -> usize {
        let removed = self
            .parts
            .values_mut()
            .flat_map(|part| part.entries_mut())
            .filter_map(|entry| entry.remove_grade(username))
            .count();
        if removed > 0 {
            tracing::info!("Removed {removed} grade(s) for {username}");
        }
        removed
    }

    /// Makes sure every assignment has an entry, and refreshes due dates,
    /// schemes and titles of the entries that already exist.
    pub fn synchronize(&mut self, assignments: &[AssignmentDescriptor]) -> SyncReport {
        let mut report = SyncReport::default();

        for assignment in assignments {
            if let Some(entry) = self.entry_mut(&assignment.assignment_id) {
                entry.set_due_date(assignment.due_date);
                if assignment.scheme.is_some() {
                    entry.set_scheme(assignment.scheme.clone());
                }
                entry.set_display_name(Some(assignment.title.clone()));
                report.updated.push(assignment.assignment_id.clone());
                continue;
            }

            let part = self
                .parts
                .entry(assignment.category.clone())
                .or_insert_with(|| {
                    GradeBookPart::new(assignment.category.clone())
                        .with_no_submit(assignment.no_submit)
                });

            let name = unique_name(part, &assignment.title);
            let mut entry = GradeBookEntry::new(name, assignment.assignment_id.clone())
                .with_display_name(assignment.title.clone())
                .with_order(assignment.order);
            entry.set_due_date(assignment.due_date);
            entry.set_scheme(assignment.scheme.clone());
            part.insert_entry(entry);

            tracing::info!(
                "Created gradebook entry for {} in {}",
                assignment.assignment_id,
                assignment.category
            );
            report.created.push(assignment.assignment_id.clone());
        }

        report
    }
}

/// Picks an entry name not yet used in `part`, suffixing ` (2)`, ` (3)`, ...
fn unique_name(part: &GradeBookPart, title: &str) -> String {
    if !part.contains(title) {
        return title.to_string();
    }
    (2..)
        .map(|n| format!("{title} ({n})"))
        .find(|candidate| !part.contains(candidate))
        .unwrap_or_else(|| title.to_string())
}
