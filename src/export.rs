#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! D2L-compatible CSV export of the gradebook.

use std::{collections::BTreeMap, fs, io, path::Path};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{book::GradeBook, policy::GradingPolicy};

/// Marker D2L expects in the last column of every row.
pub const END_OF_LINE: &str = "#";

/// Denominator of the final grade column.
pub const FINAL_GRADE_DENOMINATOR: f64 = 100.0;

/// Identity details of a user, used to fill the name columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Login name; matches gradebook usernames.
    pub username:    String,
    /// Identifier in the institution's system.
    #[serde(default)]
    pub external_id: Option<String>,
    /// Given name.
    #[serde(default)]
    pub first_name:  Option<String>,
    /// Family name.
    #[serde(default)]
    pub last_name:   Option<String>,
    /// Full name as displayed.
    #[serde(default)]
    pub full_name:   Option<String>,
}

/// Users keyed by username.
pub type Roster = BTreeMap<String, UserProfile>;

/// Reads a roster from a JSON list of profiles.
pub fn load_roster(path: impl AsRef<Path>) -> Result<Roster> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .with_context(|| format!("Could not read roster {}", path.display()))?;
    let profiles: Vec<UserProfile> = serde_json::from_str(&text)
        .with_context(|| format!("Could not parse roster {}", path.display()))?;
    Ok(profiles
        .into_iter()
        .map(|p| (p.username.clone(), p))
        .collect())
}

/// Writes one row per user: identity columns, a points column per entry in
/// book order, the predicted final grade and the end-of-line marker.
pub fn write_csv<W: io::Write>(
    writer: W,
    book: &GradeBook,
    policy: &impl GradingPolicy,
    roster: &Roster,
    now: DateTime<Utc>,
) -> Result<()> {
    let entries = book.entries();
    let mut out = csv::Writer::from_writer(writer);

    let mut header = vec![
        "Username".to_string(),
        "External ID".to_string(),
        "First Name".to_string(),
        "Last Name".to_string(),
        "Full Name".to_string(),
    ];
    header.extend(
        entries
            .iter()
            .map(|(_, entry)| format!("{} Points Grade", entry.display_name())),
    );
    header.extend([
        "Adjusted Final Grade Numerator".to_string(),
        "Adjusted Final Grade Denominator".to_string(),
        "End-of-Line Indicator".to_string(),
    ]);
    out.write_record(&header)
        .context("Could not write CSV header")?;

    let mut usernames = book.usernames();
    usernames.extend(roster.keys().cloned());

    let blank = UserProfile::default();
    for username in &usernames {
        let profile = roster.get(username).unwrap_or(&blank);
        let mut row = vec![
            username.clone(),
            profile.external_id.clone().unwrap_or_default(),
            profile.first_name.clone().unwrap_or_default(),
            profile.last_name.clone().unwrap_or_default(),
            profile.full_name.clone().unwrap_or_default(),
        ];

        for (_, entry) in &entries {
            let points = entry
                .grade(username)
                .filter(|grade| !grade.excused)
                .and_then(|grade| grade.value.as_ref())
                .and_then(|value| value.as_number())
                .map(|n| n.to_string())
                .unwrap_or_default();
            row.push(points);
        }

        match policy.grade(book, username, now) {
            Some(predicted) => {
                row.push(predicted.raw_value.to_string());
                row.push(FINAL_GRADE_DENOMINATOR.to_string());
            }
            None => {
                row.push(String::new());
                row.push(String::new());
            }
        }
        row.push(END_OF_LINE.to_string());

        out.write_record(&row)
            .with_context(|| format!("Could not write CSV row for {username}"))?;
    }

    out.flush().context("Could not flush CSV output")?;
    tracing::info!("Exported {} user(s) to CSV", usernames.len());
    Ok(())
}
