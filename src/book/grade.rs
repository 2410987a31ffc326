use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::GradeValue;

/// A grade recorded for one user on one assignment.
///
/// A grade without a value is a placeholder: the user submitted but nobody
/// has graded the work yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grade {
    /// Who the grade belongs to.
    pub username:      String,
    /// Assignment the grade was recorded against.
    pub assignment_id: String,
    /// The entered value, if any.
    #[serde(default)]
    pub value:         Option<GradeValue>,
    /// Excused grades count as full credit whatever their value.
    #[serde(default)]
    pub excused:       bool,
    /// When the grade (or its placeholder) was first recorded.
    pub created:       DateTime<Utc>,
    /// When the grade was last replaced.
    pub last_modified: DateTime<Utc>,
}

impl Grade {
    /// Creates a placeholder grade.
    pub fn placeholder(
        username: impl Into<String>,
        assignment_id: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            username:      username.into(),
            assignment_id: assignment_id.into(),
            value:         None,
            excused:       false,
            created:       at,
            last_modified: at,
        }
    }

    /// Creates a grade with a value.
    pub fn new(
        username: impl Into<String>,
        assignment_id: impl Into<String>,
        value: GradeValue,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            value: Some(value),
            ..Self::placeholder(username, assignment_id, at)
        }
    }

    /// True when nothing has been entered yet.
    pub fn is_placeholder(&self) -> bool {
        self.value.is_none()
    }
}
