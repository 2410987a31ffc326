use chrono::{DateTime, Duration, TimeZone, Utc};
use gradebook::{
    GradeBook, GradeBookEntry, GradeBookPart, GradeValue, GradingPolicy, Policy,
    policy::{
        AssignmentWeight, CategoryGradePolicy, CategoryWeightedPolicy, ItemStatus, PolicyError,
    },
    scheme::{LetterGradeScheme, NumericGradeScheme},
};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap()
}

fn past() -> DateTime<Utc> {
    now() - Duration::days(7)
}

fn future() -> DateTime<Utc> {
    now() + Duration::days(7)
}

/// A book with a `Homework` part and an instructor-only `Participation`
/// part. Every entry uses a 0..100 numeric scheme and is due a week ago.
fn book(homework: &[&str], participation: &[&str]) -> GradeBook {
    let mut book = GradeBook::new("CS 101");
    book.insert_part(GradeBookPart::new("Homework"));
    book.insert_part(GradeBookPart::new("Participation").with_no_submit(true));
    for (part, ids) in [("Homework", homework), ("Participation", participation)] {
        for id in ids {
            let entry = GradeBookEntry::new(*id, *id)
                .with_scheme(NumericGradeScheme::default())
                .with_due_date(past());
            book.insert_entry(part, entry).unwrap();
        }
    }
    book
}

fn category(weight: f64, ids: &[&str]) -> CategoryGradePolicy {
    CategoryGradePolicy::builder()
        .weight(weight)
        .assignments(
            ids.iter()
                .map(|id| AssignmentWeight::builder().assignment_id(*id).build())
                .collect(),
        )
        .build()
}

fn policy(categories: Vec<(&str, CategoryGradePolicy)>) -> CategoryWeightedPolicy {
    categories
        .into_iter()
        .fold(CategoryWeightedPolicy::default(), |p, (name, c)| p.with_category(name, c))
}

#[test]
fn two_perfect_categories_give_full_credit() {
    let mut book = book(&["hw1"], &["p1"]);
    book.record_grade("hw1", "alice", 100.0, past()).unwrap();
    book.record_grade("p1", "alice", 100.0, past()).unwrap();

    let policy = policy(vec![
        ("Homework", category(0.5, &["hw1"])),
        ("Participation", category(0.5, &["p1"])),
    ]);
    policy.validate(&book).unwrap();

    let predicted = policy.grade(&book, "alice", now()).unwrap();
    assert_eq!(predicted.correctness, 1.0);
    assert_eq!(predicted.raw_value, 100.0);
    assert_eq!(predicted.grade, Some(GradeValue::from("A")));
}

#[test]
fn drop_lowest_keeps_category_weight() {
    let mut book = book(&["hw1", "hw2", "hw3"], &[]);
    book.record_grade("hw1", "bob", 100.0, past()).unwrap();
    book.record_grade("hw2", "bob", 50.0, past()).unwrap();
    book.record_grade("hw3", "bob", 80.0, past()).unwrap();

    let mut homework = category(1.0, &["hw1", "hw2", "hw3"]);
    homework.drop_lowest = 1;
    let policy = policy(vec![("Homework", homework)]);

    let evaluation = policy.evaluate(&book, "bob", now());
    assert_eq!(evaluation.dropped(), 1);

    let dropped = evaluation
        .items
        .iter()
        .find(|item| item.status == ItemStatus::Dropped)
        .unwrap();
    assert_eq!(dropped.assignment_id, "hw2");

    let total: f64 = evaluation.items.iter().map(|item| item.weight).sum();
    assert!((total - 1.0).abs() < 1e-9);
    assert_eq!(evaluation.predicted.unwrap().correctness, 0.9);
}

#[test]
fn drop_lowest_always_leaves_one_item() {
    let mut book = book(&["hw1", "hw2"], &[]);
    book.record_grade("hw1", "bob", 40.0, past()).unwrap();
    book.record_grade("hw2", "bob", 60.0, past()).unwrap();

    let mut homework = category(1.0, &["hw1", "hw2"]);
    homework.drop_lowest = 5;
    let policy = policy(vec![("Homework", homework)]);

    let evaluation = policy.evaluate(&book, "bob", now());
    assert_eq!(evaluation.dropped(), 1);
    assert_eq!(evaluation.predicted.unwrap().correctness, 0.6);
}

#[test]
fn excused_grades_credit_full_weight() {
    let mut book = book(&["hw1", "hw2"], &[]);
    book.excuse("hw1", "carol", past()).unwrap();
    book.record_grade("hw2", "carol", 60.0, past()).unwrap();

    let policy = policy(vec![("Homework", category(1.0, &["hw1", "hw2"]))]);

    let evaluation = policy.evaluate(&book, "carol", now());
    assert_eq!(evaluation.excused(), 1);
    assert_eq!(evaluation.predicted.unwrap().correctness, 0.8);
}

#[test]
fn excused_grades_are_not_dropped() {
    let mut book = book(&["hw1", "hw2", "hw3"], &[]);
    book.record_grade("hw1", "carol", 10.0, past()).unwrap();
    book.excuse("hw1", "carol", past()).unwrap();
    book.record_grade("hw2", "carol", 70.0, past()).unwrap();
    book.record_grade("hw3", "carol", 90.0, past()).unwrap();

    let mut homework = category(0.9, &["hw1", "hw2", "hw3"]);
    homework.drop_lowest = 1;
    let mut policy = policy(vec![("Homework", homework)]);
    policy.categories.insert("Other".into(), category(0.1, &[]));

    let evaluation = policy.evaluate(&book, "carol", now());
    let statuses: Vec<_> = evaluation.items.iter().map(|i| i.status.clone()).collect();
    assert_eq!(
        statuses,
        vec![ItemStatus::Excused, ItemStatus::Dropped, ItemStatus::Graded]
    );
    // 0.3 excused + 0.9 * 0.6 kept over a total weight of 1.0
    assert_eq!(evaluation.predicted.unwrap().correctness, 0.84);
}

#[test]
fn missing_past_due_work_earns_nothing_by_default() {
    let mut book = book(&["hw1", "hw2"], &[]);
    book.record_grade("hw1", "dave", 100.0, past()).unwrap();

    let policy = policy(vec![("Homework", category(1.0, &["hw1", "hw2"]))]);

    let evaluation = policy.evaluate(&book, "dave", now());
    let missing = &evaluation.items[1];
    assert_eq!(missing.status, ItemStatus::Missing);
    assert!(missing.late);
    assert_eq!(evaluation.predicted.unwrap().correctness, 0.5);
}

#[test]
fn late_penalty_leaves_partial_credit() {
    let mut book = book(&["hw1", "hw2"], &[]);
    book.record_grade("hw1", "dave", 100.0, past()).unwrap();

    let mut homework = category(1.0, &["hw1", "hw2"]);
    homework.late_penalty = 0.25;
    let policy = policy(vec![("Homework", homework)]);

    assert_eq!(policy.grade(&book, "dave", now()).unwrap().correctness, 0.88);
}

#[test]
fn late_submissions_are_penalized_while_on_time_ones_are_not() {
    let mut book = book(&["hw1", "hw2"], &[]);
    book.record_submission("hw1", "erin", past() - Duration::hours(1))
        .unwrap();
    book.record_submission("hw2", "erin", past() + Duration::hours(1))
        .unwrap();

    let policy = policy(vec![("Homework", category(1.0, &["hw1", "hw2"]))]);

    let evaluation = policy.evaluate(&book, "erin", now());
    assert_eq!(evaluation.items[0].status, ItemStatus::Placeholder);
    assert!(!evaluation.items[0].late);
    assert!(evaluation.items[1].late);
    assert_eq!(evaluation.predicted.unwrap().correctness, 0.5);
}

#[test]
fn ungraded_no_submit_work_is_never_late() {
    let book = book(&[], &["p1"]);
    let policy = policy(vec![("Participation", category(1.0, &["p1"]))]);

    let evaluation = policy.evaluate(&book, "frank", now());
    assert!(!evaluation.items[0].late);
    assert_eq!(evaluation.items[0].status, ItemStatus::Pending);
    assert_eq!(evaluation.predicted.unwrap().correctness, 1.0);
}

#[test]
fn late_placeholders_on_no_submit_parts_are_not_penalized() {
    let mut book = book(&[], &["p1"]);
    book.record_submission("p1", "frank", past() + Duration::days(1))
        .unwrap();

    let policy = policy(vec![("Participation", category(1.0, &["p1"]))]);

    let evaluation = policy.evaluate(&book, "frank", now());
    assert_eq!(evaluation.items[0].status, ItemStatus::Placeholder);
    assert!(!evaluation.items[0].late);
    assert_eq!(evaluation.items[0].correctness, Some(1.0));
    assert_eq!(evaluation.predicted.unwrap().correctness, 1.0);
}

#[test]
fn negative_points_floor_the_course_grade_at_zero() {
    let mut book = book(&[], &["p1"]);
    book.insert_part(GradeBookPart::new("Labs"));
    book.insert_entry("Labs", GradeBookEntry::new("lab1", "lab1").with_due_date(past()))
        .unwrap();
    book.record_grade("lab1", "gus", -12.0, past()).unwrap();
    book.record_submission("p1", "gus", now()).unwrap();

    let policy = policy(vec![
        (
            "Labs",
            CategoryGradePolicy::builder()
                .weight(0.5)
                .assignments(vec![
                    AssignmentWeight::builder()
                        .assignment_id("lab1")
                        .total_points(5.0)
                        .build(),
                ])
                .build(),
        ),
        ("Participation", category(0.5, &["p1"])),
    ]);
    policy.validate(&book).unwrap();

    let evaluation = policy.evaluate(&book, "gus", now());
    assert_eq!(evaluation.items[0].correctness, Some(-2.4));
    assert!(!evaluation.items[1].late);

    let predicted = evaluation.predicted.unwrap();
    assert_eq!(predicted.correctness, 0.0);
    assert_eq!(predicted.raw_value, 0.0);
    assert_eq!(predicted.grade, Some(GradeValue::from("F")));
}

#[test]
fn nothing_due_means_no_prediction() {
    let mut book = GradeBook::new("CS 101");
    book.insert_part(GradeBookPart::new("Homework"));
    book.insert_entry(
        "Homework",
        GradeBookEntry::new("hw1", "hw1")
            .with_scheme(NumericGradeScheme::default())
            .with_due_date(future()),
    )
    .unwrap();

    let policy = policy(vec![("Homework", category(1.0, &["hw1"]))]);
    assert!(policy.grade(&book, "gina", now()).is_none());

    book.record_grade("hw1", "gina", 70.0, now()).unwrap();
    assert_eq!(policy.grade(&book, "gina", now()).unwrap().correctness, 0.7);
}

#[test]
fn points_can_exceed_the_total_but_the_result_is_clamped() {
    let mut book = GradeBook::new("CS 101");
    book.insert_part(GradeBookPart::new("Homework"));
    book.insert_entry(
        "Homework",
        GradeBookEntry::new("hw1", "hw1").with_due_date(past()),
    )
    .unwrap();
    book.record_grade("hw1", "hank", "12 -", past()).unwrap();

    let policy = policy(vec![(
        "Homework",
        CategoryGradePolicy::builder()
            .weight(1.0)
            .assignments(vec![
                AssignmentWeight::builder()
                    .assignment_id("hw1")
                    .total_points(10.0)
                    .build(),
            ])
            .build(),
    )]);
    policy.validate(&book).unwrap();

    let evaluation = policy.evaluate(&book, "hank", now());
    assert_eq!(evaluation.items[0].correctness, Some(1.2));
    assert_eq!(evaluation.predicted.unwrap().correctness, 1.0);
}

#[test]
fn unusable_grades_are_excluded_with_their_weight() {
    let mut book = book(&["hw1"], &[]);
    book.insert_part(GradeBookPart::new("Labs"));
    book.insert_entry("Labs", GradeBookEntry::new("lab1", "lab1").with_due_date(past()))
        .unwrap();
    book.record_grade("hw1", "ivan", 80.0, past()).unwrap();
    book.record_grade("lab1", "ivan", "incomplete", past()).unwrap();

    let policy = policy(vec![
        ("Homework", category(0.5, &["hw1"])),
        ("Labs", category(0.5, &["lab1"])),
    ]);

    let evaluation = policy.evaluate(&book, "ivan", now());
    assert_eq!(evaluation.invalid(), 1);
    assert_eq!(evaluation.predicted.unwrap().correctness, 0.8);
}

#[test]
fn grades_outside_the_policy_are_ignored() {
    let mut book = book(&["hw1", "bonus"], &[]);
    book.record_grade("hw1", "jane", 90.0, past()).unwrap();
    book.record_grade("bonus", "jane", 100.0, past()).unwrap();

    let policy = policy(vec![("Homework", category(1.0, &["hw1"]))]);

    let evaluation = policy.evaluate(&book, "jane", now());
    assert_eq!(evaluation.ignored, vec!["bonus".to_string()]);
    assert_eq!(evaluation.predicted.unwrap().correctness, 0.9);
}

#[test]
fn explicit_assignment_weights_are_used() {
    let mut book = book(&["hw1", "hw2"], &[]);
    book.record_grade("hw1", "kim", 100.0, past()).unwrap();
    book.record_grade("hw2", "kim", 0.0, past()).unwrap();

    let policy = policy(vec![(
        "Homework",
        CategoryGradePolicy::builder()
            .weight(1.0)
            .assignments(vec![
                AssignmentWeight::builder()
                    .assignment_id("hw1")
                    .weight(0.75)
                    .build(),
                AssignmentWeight::builder().assignment_id("hw2").build(),
            ])
            .build(),
    )]);

    assert_eq!(policy.grade(&book, "kim", now()).unwrap().correctness, 0.75);
}

#[test]
fn presentation_scheme_renders_the_prediction() {
    let mut book = book(&["hw1"], &[]);
    book.record_grade("hw1", "lee", 85.0, past()).unwrap();

    let policy = CategoryWeightedPolicy::new(LetterGradeScheme::default())
        .with_category("Homework", category(1.0, &["hw1"]));

    let predicted = policy.grade(&book, "lee", now()).unwrap();
    assert_eq!(predicted.grade, Some(GradeValue::from("B")));
    assert_eq!(predicted.to_string(), "B (85.00%)");
}

#[test]
fn weights_must_sum_to_one() {
    let book = book(&["hw1"], &["p1"]);
    let policy = policy(vec![
        ("Homework", category(0.5, &["hw1"])),
        ("Participation", category(0.4, &["p1"])),
    ]);

    assert!(matches!(
        policy.validate(&book),
        Err(PolicyError::WeightsDoNotSumToOne { .. })
    ));
}

#[test]
fn validation_reports_configuration_errors() {
    let book = book(&["hw1", "hw2"], &[]);

    let unknown = policy(vec![("Homework", category(1.0, &["hw1", "hw9"]))]);
    assert_eq!(
        unknown.validate(&book),
        Err(PolicyError::UnknownAssignment("hw9".into()))
    );

    let duplicate = policy(vec![
        ("Homework", category(0.5, &["hw1"])),
        ("Quizzes", category(0.5, &["hw1"])),
    ]);
    assert!(matches!(
        duplicate.validate(&book),
        Err(PolicyError::DuplicateAssignment { .. })
    ));

    let mut harsh = category(1.0, &["hw1"]);
    harsh.late_penalty = 1.5;
    assert!(matches!(
        policy(vec![("Homework", harsh)]).validate(&book),
        Err(PolicyError::InvalidLatePenalty { .. })
    ));

    let mismatched = policy(vec![(
        "Homework",
        CategoryGradePolicy::builder()
            .weight(1.0)
            .assignments(vec![
                AssignmentWeight::builder()
                    .assignment_id("hw1")
                    .weight(0.2)
                    .build(),
                AssignmentWeight::builder()
                    .assignment_id("hw2")
                    .weight(0.2)
                    .build(),
            ])
            .build(),
    )]);
    assert!(matches!(
        mismatched.validate(&book),
        Err(PolicyError::CategoryWeightMismatch { .. })
    ));
}

#[test]
fn entries_without_scheme_or_points_fail_validation() {
    let mut book = GradeBook::new("CS 101");
    book.insert_part(GradeBookPart::new("Homework"));
    book.insert_entry("Homework", GradeBookEntry::new("hw1", "hw1"))
        .unwrap();

    let policy = policy(vec![("Homework", category(1.0, &["hw1"]))]);
    assert_eq!(
        policy.validate(&book),
        Err(PolicyError::MissingScheme("hw1".into()))
    );
}

#[test]
fn category_policy_loads_from_json() {
    let policy: Policy = serde_json::from_str(
        r#"{
            "type": "category",
            "categories": {
                "Homework": {
                    "weight": 1.0,
                    "drop_lowest": 1,
                    "assignments": [{ "assignment_id": "hw1" }, { "assignment_id": "hw2" }]
                }
            }
        }"#,
    )
    .unwrap();

    let Policy::Category(inner) = &policy else {
        panic!("expected a category policy");
    };
    let homework = &inner.categories["Homework"];
    assert_eq!(homework.late_penalty, 1.0);
    assert_eq!(homework.item_weights(), vec![0.5, 0.5]);
    assert_eq!(policy.presentation(), &gradebook::GradeScheme::default());
}
