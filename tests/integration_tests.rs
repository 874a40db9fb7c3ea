use std::path::Path;

use weighted_grade::GradeError;
use weighted_grade::binding::GradingContext;
use weighted_grade::grading::letter::{LetterScheme, SchemeFormat};
use weighted_grade::groups::{load_groups, parse_groups};
use weighted_grade::output::{Delimiter, write_report};
use weighted_grade::report::{Grader, Report};
use weighted_grade::roster::{HumanRecord, IdentityColumns, Roster};

fn fixture(name: &str) -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn grade_fixture_roster(scheme: Option<&LetterScheme>) -> Report {
    let spec = load_groups(&fixture("groups.txt")).expect("Failed to parse groups");
    let file = std::fs::File::open(fixture("roster.csv")).unwrap();
    let mut roster = Roster::from_reader(file).unwrap();
    let ctx = GradingContext::new(spec, roster.headers(), IdentityColumns::default()).unwrap();
    Grader::new(&ctx, scheme).build_report(roster.rows()).unwrap()
}

#[test]
fn test_full_pipeline() {
    let report = grade_fixture_roster(None);

    let summary: Vec<_> = report
        .rows
        .iter()
        .map(|r| (r.key.username.as_str(), r.grade.percentage))
        .collect();
    assert_eq!(summary, vec![("adams", 64), ("baker", 33), ("zhang", 94)]);

    let zhang = &report.rows[2];
    assert!((zhang.grade.group("homework").unwrap() - 0.4).abs() < 1e-12);
    assert!((zhang.grade.group("midterm").unwrap() - 0.225).abs() < 1e-12);
    assert!((zhang.grade.group("final").unwrap() - 0.315).abs() < 1e-12);
}

#[test]
fn test_full_pipeline_output_with_letters() {
    let scheme = LetterScheme::load(&fixture("scheme.csv"), SchemeFormat::Csv).unwrap();
    let report = grade_fixture_roster(Some(&scheme));

    let mut buf = Vec::new();
    write_report(&mut buf, &report, Delimiter::Comma, true).unwrap();
    let out = String::from_utf8(buf).unwrap();
    let lines: Vec<_> = out.lines().collect();

    assert_eq!(
        lines,
        vec![
            "First,Last,Username,Letter,GPA,Grade,Course,homework(0.400),midterm(0.250),final(0.350)",
            "Jo,Adams,adams,D,1.00,64,0.635000,0.240000,0.150000,0.245000",
            "Sam,Baker,baker,D,1.00,33,0.325000,0.200000,0.125000,0.000000",
            "Wei,Zhang,zhang,A,4.00,94,0.940000,0.400000,0.225000,0.315000",
        ]
    );
}

#[test]
fn test_text_and_csv_schemes_agree() {
    let csv = LetterScheme::load(&fixture("scheme.csv"), SchemeFormat::Csv).unwrap();
    let text = LetterScheme::load(&fixture("scheme.txt"), SchemeFormat::Text).unwrap();
    assert_eq!(csv, text);
}

#[test]
fn test_universe_mismatch_names_missing_column() {
    let spec = parse_groups(
        "## header\nFirst Name\nLast Name\nUsername\n\n# quizzes 1.0\nQuiz 1 <Numeric MaxPoints:10>\n"
            .lines(),
    )
    .unwrap();
    let roster = Roster::from_reader("First Name,Last Name,Username,Quiz 1\n".as_bytes()).unwrap();

    let err = GradingContext::new(spec, roster.headers(), IdentityColumns::default()).unwrap_err();
    assert!(matches!(err, GradeError::ColumnMismatch { .. }));
    assert!(
        err.symmetric_difference()
            .contains(&"Quiz 1 <Numeric MaxPoints:10>")
    );
}

#[test]
fn test_human_record_matches_roster_row() {
    let spec = load_groups(&fixture("groups.txt")).unwrap();
    let text = std::fs::read_to_string(fixture("record.txt")).unwrap();
    let identity = IdentityColumns::default();

    let (headers, row) = HumanRecord::parse(&text)
        .unwrap()
        .into_row(&spec, &identity)
        .unwrap();
    let ctx = GradingContext::new(spec, &headers, identity).unwrap();
    let report = Grader::new(&ctx, None).build_report([Ok(row)]).unwrap();

    let from_roster = grade_fixture_roster(None);
    assert_eq!(report.rows.len(), 1);
    assert_eq!(report.rows[0].grade, from_roster.rows[2].grade);
    assert_eq!(report.rows[0].first, "Wei");
}
