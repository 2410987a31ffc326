#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Panel, Style, Width, object::Rows},
};

use crate::policy::{Evaluation, ItemOutcome};

/// A row of the breakdown table.
#[derive(Tabled)]
struct ItemRow {
    /// Assignment title.
    #[tabled(rename = "Assignment")]
    title:       String,
    /// Category, if the policy has categories.
    #[tabled(rename = "Category")]
    category:    String,
    /// What happened to the assignment.
    #[tabled(rename = "Status")]
    status:      String,
    /// Correctness as a percentage.
    #[tabled(rename = "Score")]
    correctness: String,
    /// Weight or points carried.
    #[tabled(rename = "Weight")]
    weight:      String,
}

impl From<&ItemOutcome> for ItemRow {
    fn from(item: &ItemOutcome) -> Self {
        let status = if item.late {
            format!("{} (late)", item.status)
        } else {
            item.status.to_string()
        };
        Self {
            title: item.title.clone(),
            category: item.category.clone().unwrap_or_default(),
            status,
            correctness: item
                .correctness
                .map(|c| format!("{:.2}%", c * 100.0))
                .unwrap_or_else(|| "-".to_string()),
            weight: format!("{:.3}", item.weight),
        }
    }
}

/// One-line summary of the prediction.
pub fn summary(evaluation: &Evaluation) -> String {
    match &evaluation.predicted {
        Some(predicted) => match (predicted.points_earned, predicted.points_available) {
            (Some(earned), Some(available)) => {
                format!("Predicted: {predicted} [{earned:.2}/{available:.2} points]")
            }
            _ => format!("Predicted: {predicted}"),
        },
        None => "Predicted: no prediction possible yet".to_string(),
    }
}

/// Renders the breakdown of an evaluation as a table.
pub fn render(evaluation: &Evaluation) -> String {
    let rows: Vec<ItemRow> = evaluation.items.iter().map(ItemRow::from).collect();
    let mut footer = summary(evaluation);
    if !evaluation.ignored.is_empty() {
        footer.push_str(&format!("\nIgnored (no policy): {}", evaluation.ignored.join(", ")));
    }

    Table::new(&rows)
        .with(Panel::header(format!("Grades for {}", evaluation.username)))
        .with(Panel::footer(footer))
        .with(Modify::new(Rows::new(1..)).with(Width::wrap(28).keep_words(true)))
        .with(
            Modify::new(Rows::first())
                .with(Alignment::center())
                .with(Alignment::center_vertical()),
        )
        .with(Style::modern())
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        policy::{ItemStatus, PredictedGrade},
        scheme::GradeScheme,
    };

    fn evaluation(predicted: Option<PredictedGrade>) -> Evaluation {
        Evaluation {
            username: "amy".into(),
            items: vec![ItemOutcome {
                assignment_id: "hw1".into(),
                title:         "Homework 1".into(),
                category:      Some("Homework".into()),
                status:        ItemStatus::Missing,
                correctness:   Some(0.0),
                weight:        0.5,
                late:          true,
            }],
            ignored: vec!["bonus".into()],
            predicted,
        }
    }

    #[test]
    fn table_shows_items_and_prediction() {
        let predicted = PredictedGrade::new(&GradeScheme::default(), 0.5);
        let table = render(&evaluation(Some(predicted)));

        assert!(table.contains("Grades for amy"));
        assert!(table.contains("missing (late)"));
        assert!(table.contains("Predicted: D (50.00%)"));
        assert!(table.contains("Ignored (no policy): bonus"));
    }

    #[test]
    fn summary_without_prediction() {
        assert_eq!(
            summary(&evaluation(None)),
            "Predicted: no prediction possible yet"
        );
    }
}
