use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{GradebookError, grade::Grade};
use crate::{scheme::GradeScheme, types::GradeValue};

/// One assignment column of the gradebook: username → grade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeBookEntry {
    /// Key of the entry inside its part.
    name:          String,
    /// Assignment this column records grades for.
    assignment_id: String,
    /// Title shown to people.
    #[serde(default)]
    display_name:  Option<String>,
    /// Sort position within the part.
    #[serde(default)]
    order:         u32,
    /// How values are read and converted.
    #[serde(default)]
    scheme:        Option<GradeScheme>,
    /// When the assignment is due.
    #[serde(default)]
    due_date:      Option<DateTime<Utc>>,
    /// Recorded grades keyed by username.
    #[serde(default)]
    grades:        BTreeMap<String, Grade>,
}

impl GradeBookEntry {
    /// Creates an empty column.
    pub fn new(name: impl Into<String>, assignment_id: impl Into<String>) -> Self {
        Self {
            name:          name.into(),
            assignment_id: assignment_id.into(),
            display_name:  None,
            order:         0,
            scheme:        None,
            due_date:      None,
            grades:        BTreeMap::new(),
        }
    }

    /// Sets the display name.
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    /// Sets the sort position.
    pub fn with_order(mut self, order: u32) -> Self {
        self.order = order;
        self
    }

    /// Sets the grade scheme.
    pub fn with_scheme(mut self, scheme: impl Into<GradeScheme>) -> Self {
        self.scheme = Some(scheme.into());
        self
    }

    /// Sets the due date.
    pub fn with_due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    /// Key of the entry inside its part.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Assignment id.
    pub fn assignment_id(&self) -> &str {
        &self.assignment_id
    }

    /// Display name, falling back to the key.
    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }

    /// Sort position.
    pub fn order(&self) -> u32 {
        self.order
    }

    /// Grade scheme, if one was configured.
    pub fn scheme(&self) -> Option<&GradeScheme> {
        self.scheme.as_ref()
    }

    /// Due date, if any.
    pub fn due_date(&self) -> Option<DateTime<Utc>> {
        self.due_date
    }

    /// Whether the due date lies before `now`.
    pub fn is_past_due(&self, now: DateTime<Utc>) -> bool {
        self.due_date.is_some_and(|due| due < now)
    }

    /// Whether `at` lies after the due date.
    pub fn is_late_at(&self, at: DateTime<Utc>) -> bool {
        self.due_date.is_some_and(|due| at > due)
    }

    /// Replaces the display name.
    pub(crate) fn set_display_name(&mut self, display_name: Option<String>) {
        self.display_name = display_name;
    }

    /// Replaces the due date.
    pub(crate) fn set_due_date(&mut self, due_date: Option<DateTime<Utc>>) {
        self.due_date = due_date;
    }

    /// Replaces the grade scheme.
    pub(crate) fn set_scheme(&mut self, scheme: Option<GradeScheme>) {
        self.scheme = scheme;
    }

    /// Looks up a user's grade.
    pub fn grade(&self, username: &str) -> Option<&Grade> {
        self.grades.get(username)
    }

    /// All grades, ordered by username.
    pub fn grades(&self) -> impl Iterator<Item = &Grade> {
        self.grades.values()
    }

    /// Usernames with a grade in this column.
    pub fn usernames(&self) -> impl Iterator<Item = &str> {
        self.grades.keys().map(String::as_str)
    }

    /// Number of recorded grades.
    pub fn len(&self) -> usize {
        self.grades.len()
    }

    /// Whether no grades are recorded.
    pub fn is_empty(&self) -> bool {
        self.grades.is_empty()
    }

    /// Records a value for `username`, replacing whatever was there.
    ///
    /// With a scheme configured the value is checked and stored in its
    /// canonical form. The creation time and excused flag of an existing
    /// grade are kept.
    pub fn set_grade(
        &mut self,
        username: &str,
        value: impl Into<GradeValue>,
        at: DateTime<Utc>,
    ) -> Result<&Grade, GradebookError> {
        let value = value.into();
        let value = match &self.scheme {
            Some(scheme) => {
                scheme
                    .coerce(&value)
                    .map_err(|source| GradebookError::InvalidGrade {
                        assignment_id: self.assignment_id.clone(),
                        username: username.to_string(),
                        source,
                    })?
            }
            None => value,
        };

        let grade = match self.grades.remove(username) {
            Some(previous) => Grade {
                value: Some(value),
                last_modified: at,
                ..previous
            },
            None => Grade::new(username, self.assignment_id.clone(), value, at),
        };
        tracing::debug!("Recorded grade for {username} on {}", self.assignment_id);
        Ok(self.grades.entry(username.to_string()).or_insert(grade))
    }

    /// Records a submission that has not been graded yet. Existing grades
    /// are left alone.
    pub fn set_placeholder(&mut self, username: &str, at: DateTime<Utc>) -> &Grade {
        let assignment_id = self.assignment_id.clone();
        self.grades
            .entry(username.to_string())
            .or_insert_with(|| Grade::placeholder(username, assignment_id, at))
    }

    /// Marks the user's grade excused, creating a placeholder if needed.
    pub fn excuse(&mut self, username: &str, at: DateTime<Utc>) -> &Grade {
        let assignment_id = self.assignment_id.clone();
        let grade = self
            .grades
            .entry(username.to_string())
            .or_insert_with(|| Grade::placeholder(username, assignment_id, at));
        grade.excused = true;
        grade.last_modified = at;
        grade
    }

    /// Clears the excused flag.
    pub fn unexcuse(&mut self, username: &str, at: DateTime<Utc>) -> Option<&Grade> {
        let grade = self.grades.get_mut(username)?;
        grade.excused = false;
        grade.last_modified = at;
        Some(grade)
    }

    /// Removes a user's grade.
    pub fn remove_grade(&mut self, username: &str) -> Option<Grade> {
        self.grades.remove(username)
    }
}
