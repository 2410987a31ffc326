use gradebook::{
    GradeScheme, GradeValue,
    scheme::{
        BooleanGradeScheme, IntegerGradeScheme, LetterGradeScheme, LetterRange,
        NumericGradeScheme, SchemeError,
    },
};

#[test]
fn default_letter_table_maps_numbers_and_letters() {
    let scheme = LetterGradeScheme::default();

    assert_eq!(scheme.to_letter(91.0).unwrap(), "A");
    assert_eq!(scheme.to_letter(80.0).unwrap(), "B");
    assert_eq!(scheme.to_letter(55.0).unwrap(), "D");
    assert_eq!(scheme.to_number("A").unwrap(), 100.0);
    assert_eq!(scheme.to_number("c").unwrap(), 79.0);
}

#[test]
fn letter_correctness_round_trips() {
    let scheme = GradeScheme::from(LetterGradeScheme::default());

    for letter in ["A", "B", "C", "D", "F"] {
        let value = scheme.from_text(letter).unwrap();
        let correctness = scheme.to_correctness(&value).unwrap();
        assert_eq!(scheme.from_correctness(correctness).unwrap(), value);
    }
    assert_eq!(
        scheme.to_correctness(&GradeValue::from("A")).unwrap(),
        1.0
    );
}

#[test]
fn letters_are_case_insensitive() {
    let scheme = GradeScheme::default();

    assert_eq!(scheme.from_text(" b ").unwrap(), GradeValue::from("B"));
    assert!(matches!(
        scheme.from_text("E"),
        Err(SchemeError::UnknownLetter(_))
    ));
}

#[test]
fn custom_letter_table_uses_its_own_top() {
    let scheme = LetterGradeScheme::new(vec![
        LetterRange::new("H", 8.0, 10.0),
        LetterRange::new("P", 5.0, 7.0),
        LetterRange::new("N", 0.0, 4.0),
    ])
    .unwrap();
    let scheme = GradeScheme::from(scheme);

    assert_eq!(scheme.to_correctness(&"P".into()).unwrap(), 0.7);
    assert_eq!(scheme.from_correctness(0.75).unwrap(), GradeValue::from("P"));
}

#[test]
fn inverted_letter_range_is_rejected() {
    let err = LetterGradeScheme::new(vec![LetterRange::new("A", 100.0, 90.0)]).unwrap_err();
    assert!(matches!(err, SchemeError::InvertedRange { .. }));
}

#[test]
fn numeric_scheme_scales_linearly() {
    let scheme = GradeScheme::from(NumericGradeScheme::new(50.0, 150.0).unwrap());

    assert_eq!(scheme.to_correctness(&75.0.into()).unwrap(), 0.25);
    assert_eq!(scheme.from_correctness(0.5).unwrap(), GradeValue::Number(100.0));
    assert!(matches!(
        scheme.validate(&200.0.into()),
        Err(SchemeError::OutOfRange { .. })
    ));
}

#[test]
fn numeric_text_drops_trailing_dash() {
    let scheme = GradeScheme::from(NumericGradeScheme::default());

    assert_eq!(scheme.from_text("85 -").unwrap(), GradeValue::Number(85.0));
    assert!(matches!(
        scheme.from_text("eighty"),
        Err(SchemeError::NotANumber(_))
    ));
}

#[test]
fn integer_scheme_requires_whole_numbers() {
    let scheme = GradeScheme::from(IntegerGradeScheme::new(0, 10).unwrap());

    assert!(scheme.validate(&7.0.into()).is_ok());
    assert!(matches!(
        scheme.validate(&7.5.into()),
        Err(SchemeError::NotAnInteger(_))
    ));
    assert_eq!(scheme.from_correctness(0.66).unwrap(), GradeValue::Number(7.0));
}

#[test]
fn boolean_scheme_reads_spellings_and_thresholds() {
    let scheme = GradeScheme::from(BooleanGradeScheme::default());

    for yes in ["1", "Y", "t", "Yes", "TRUE", "pass"] {
        assert_eq!(scheme.from_text(yes).unwrap(), GradeValue::Bool(true));
    }
    for no in ["0", "n", "F", "no", "false", "Fail"] {
        assert_eq!(scheme.from_text(no).unwrap(), GradeValue::Bool(false));
    }
    assert!(scheme.from_text("maybe").is_err());

    assert_eq!(scheme.to_correctness(&true.into()).unwrap(), 1.0);
    assert_eq!(scheme.from_correctness(0.999).unwrap(), GradeValue::Bool(true));
    assert_eq!(scheme.from_correctness(0.998).unwrap(), GradeValue::Bool(false));
}

#[test]
fn schemes_deserialize_from_tagged_json() {
    let letter: GradeScheme = serde_json::from_str(r#"{"type":"letter"}"#).unwrap();
    assert_eq!(letter, GradeScheme::default());

    let numeric: GradeScheme =
        serde_json::from_str(r#"{"type":"numeric","min":0,"max":20}"#).unwrap();
    assert_eq!(numeric.to_string(), "numeric [0, 20]");
}

#[test]
fn non_finite_correctness_is_rejected() {
    let scheme = GradeScheme::default();
    assert!(matches!(
        scheme.from_correctness(f64::NAN),
        Err(SchemeError::InvalidCorrectness(_))
    ));
}

#[test]
fn lower_case_letter_table_from_json_round_trips() {
    let scheme: GradeScheme = serde_json::from_str(
        r#"{
            "type": "letter",
            "grades": [
                { "letter": "a", "min": 50, "max": 100 },
                { "letter": "f", "min": 0, "max": 49 }
            ]
        }"#,
    )
    .unwrap();

    let value = scheme.from_text("a").unwrap();
    let correctness = scheme.to_correctness(&value).unwrap();
    assert_eq!(scheme.from_correctness(correctness).unwrap(), GradeValue::from("A"));
    assert_eq!(scheme.from_correctness(0.2).unwrap(), GradeValue::from("F"));
}
