//! Integration tests for the ledger update cycle
//!
//! Each test builds a scratch data folder with a small course and runs the
//! cycle end to end against it.

use asa_common::config::UpdateConfig;
use asa_common::{CourseFiles, Error, MonthToken};
use asa_ledger::snapshot;
use asa_ledger::update::{create_ledger, LedgerKind, UpdateCycle};
use asa_ledger::{CompletionCell, RecordStore, ResultCell};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const HEADER: &str = "Name,Date and time,Grade item,Revised grade,Feedback text";
const NOV_18: &str = "\"Thursday, 1 November 2018, 10:23 AM\"";
const FEB_19: &str = "\"Tuesday, 5 February 2019, 9:15 AM\"";

fn setup_course(ledger: &str) -> (TempDir, CourseFiles) {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    fs::write(root.join("Course_codes.txt"), "ABC\n").unwrap();
    fs::write(root.join("Assessment_Names_ABC.txt"), "A1\nA2\nA3\n").unwrap();
    fs::write(root.join("Passing_Scores_ABC.txt"), "50\n50\nNone\n").unwrap();
    fs::write(
        root.join("Enrolment_IDs_ABC.csv"),
        "EnrolmentID,StudentID,Name,Course\nE1,S1,Ana Smith,ABC\nE2,S2,Ben Jones,ABC\nE3,S3,Jo Bloggs,ABC\nE4,S4,Jo Bloggs,ABC\n",
    )
    .unwrap();
    fs::write(root.join("Duplicate_Names_ABC.txt"), "Jo Bloggs\n").unwrap();
    fs::write(root.join("Master_Completion_ABC.csv"), ledger).unwrap();
    fs::write(
        root.join("Master_Results_ABC.csv"),
        "EnrolmentID,StudentID,Name,Course,A1,A1 Date,A2,A2 Date,A3,A3 Date\n",
    )
    .unwrap();

    let files = CourseFiles::open(root, "ABC").unwrap();
    (dir, files)
}

fn write_delta(dir: &Path, rows: &[String]) -> PathBuf {
    let path = dir.join("export.csv");
    let mut text = format!("{}\n", HEADER);
    for row in rows {
        text.push_str(row);
        text.push('\n');
    }
    fs::write(&path, text).unwrap();
    path
}

fn month(token: &str) -> CompletionCell {
    CompletionCell::Month(MonthToken::parse(token).unwrap())
}

fn load_completions(path: &Path, files: &CourseFiles) -> RecordStore<CompletionCell> {
    let catalog = files.load_catalog().unwrap();
    snapshot::read(path, &catalog).unwrap()
}

const EXISTING_LEDGER: &str =
    "EnrolmentID,StudentID,Name,Course,A1,A2,A3\nE1,S1,Ana Smith,ABC,Jan-19,,\n";

#[test]
fn test_update_completions_end_to_end() {
    let (dir, files) = setup_course(EXISTING_LEDGER);
    let delta = write_delta(
        dir.path(),
        &[
            // Existing cell: must keep Jan-19
            format!("Ana Smith,{},A1,90.00,", NOV_18),
            format!("Ana Smith,{},A2,75.5,", FEB_19),
            // Graded row listed before the transfer for the same cell
            format!("Ben Jones,{},A2,88,", NOV_18),
            format!("Ben Jones,{},A2,-,Cross credit from previous provider", FEB_19),
            format!("Ben Jones,{},A1,20,", NOV_18),
            format!("Ben Jones,{},Course total,100,", NOV_18),
            format!("Jo Bloggs,{},A1,90,", NOV_18),
            format!("Zed Unknown,{},A1,90,", NOV_18),
        ],
    );
    let config = UpdateConfig::default();

    let outcome = UpdateCycle::new(&files, &config)
        .run(LedgerKind::Completions, &delta)
        .unwrap();

    let store = load_completions(&outcome.snapshot, &files);
    assert_eq!(store.len(), 2);
    for record in store.iter() {
        assert_eq!(record.cells().len(), 3);
    }

    let ana = store.get("E1").unwrap();
    assert_eq!(ana.cells(), &[month("Jan-19"), month("Feb-19"), CompletionCell::Empty]);

    let ben = store.get("E2").unwrap();
    assert_eq!(ben.identity.student_id, "S2");
    assert_eq!(
        ben.cells(),
        &[CompletionCell::Empty, CompletionCell::Transferred, CompletionCell::Empty]
    );

    // Transfers first, then graded facts
    assert_eq!(outcome.reports.len(), 2);
    assert_eq!(outcome.reports[0].created, vec!["E2"]);

    let unknown = fs::read_to_string(outcome.unresolved_list.unwrap()).unwrap();
    assert_eq!(unknown, "Zed Unknown\n");
    let duplicates = fs::read_to_string(outcome.duplicates_list.unwrap()).unwrap();
    assert!(duplicates.starts_with("Jo Bloggs"));

    // The current ledger is never rewritten
    assert_eq!(
        fs::read_to_string(files.completion_ledger()).unwrap(),
        EXISTING_LEDGER
    );
}

#[test]
fn test_side_list_collision_leaves_no_snapshot() {
    let (dir, files) = setup_course(EXISTING_LEDGER);
    let delta = write_delta(
        dir.path(),
        &[
            format!("Ana Smith,{},A2,75,", FEB_19),
            format!("Zed Unknown,{},A1,90,", NOV_18),
        ],
    );
    let stamp = "2019-03-01-120000";
    let taken = dir.path().join(format!("Unknown_students_ABC_{}.txt", stamp));
    fs::write(&taken, "Earlier Name\n").unwrap();
    let config = UpdateConfig::default();

    let result = UpdateCycle::new(&files, &config).run_at(LedgerKind::Completions, &delta, stamp);

    assert!(matches!(result, Err(Error::InvalidInput(_))));
    let snapshot = dir.path().join(format!("Master_Completion_ABC_{}.csv", stamp));
    assert!(!snapshot.exists());
    assert_eq!(fs::read_to_string(&taken).unwrap(), "Earlier Name\n");
}

#[test]
fn test_outputs_share_one_stamp() {
    let (dir, files) = setup_course(EXISTING_LEDGER);
    let delta = write_delta(
        dir.path(),
        &[
            format!("Ana Smith,{},A2,75,", FEB_19),
            format!("Zed Unknown,{},A1,90,", NOV_18),
        ],
    );
    let config = UpdateConfig::default();

    let outcome = UpdateCycle::new(&files, &config)
        .run_at(LedgerKind::Completions, &delta, "2019-03-01-120000")
        .unwrap();

    assert_eq!(
        outcome.snapshot,
        dir.path().join("Master_Completion_ABC_2019-03-01-120000.csv")
    );
    assert_eq!(
        outcome.unresolved_list,
        Some(dir.path().join("Unknown_students_ABC_2019-03-01-120000.txt"))
    );
    assert!(outcome.duplicates_list.is_none());
}

#[test]
fn test_update_results_records_passing_rows_only() {
    let (dir, files) = setup_course(EXISTING_LEDGER);
    let delta = write_delta(
        dir.path(),
        &[
            format!("Ana Smith,{},A2,75,", FEB_19),
            format!("Ana Smith,{},A2,95,", NOV_18),
            format!("Ben Jones,{},A1,-,transfer", FEB_19),
        ],
    );
    let config = UpdateConfig::default();

    let outcome = UpdateCycle::new(&files, &config)
        .run(LedgerKind::Results, &delta)
        .unwrap();

    let catalog = files.load_catalog().unwrap();
    let store: RecordStore<ResultCell> = snapshot::read(&outcome.snapshot, &catalog).unwrap();
    assert_eq!(store.len(), 1);
    let ana = store.get("E1").unwrap();
    assert_eq!(
        ana.cell(1),
        Some(&ResultCell::Graded {
            grade: "Competent".to_string(),
            date: chrono::NaiveDate::from_ymd_opt(2019, 2, 5).unwrap(),
        })
    );
    assert!(outcome.unresolved_list.is_none());
}

#[test]
fn test_empty_delta_is_fatal_and_writes_nothing() {
    let (dir, files) = setup_course(EXISTING_LEDGER);
    let delta = write_delta(
        dir.path(),
        &[
            format!("Ana Smith,{},A1,10,", NOV_18),
            format!("Ana Smith,{},Course total,100,", NOV_18),
        ],
    );
    let before = fs::read_dir(dir.path()).unwrap().count();

    let result = UpdateCycle::new(&files, &UpdateConfig::default())
        .run(LedgerKind::Completions, &delta);

    assert!(matches!(result, Err(Error::EmptyDelta(_))));
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), before);
}

#[test]
fn test_unknown_grade_item_is_fatal() {
    let (dir, files) = setup_course(EXISTING_LEDGER);
    let delta = write_delta(dir.path(), &[format!("Ana Smith,{},Essay 9,90,", NOV_18)]);
    let before = fs::read_dir(dir.path()).unwrap().count();

    let result = UpdateCycle::new(&files, &UpdateConfig::default())
        .run(LedgerKind::Completions, &delta);

    assert!(matches!(result, Err(Error::UnknownAssessment { .. })));
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), before);
}

#[test]
fn test_missing_inputs_reported_before_processing() {
    let (dir, files) = setup_course(EXISTING_LEDGER);
    fs::remove_file(files.duplicate_names()).unwrap();
    let missing_delta = dir.path().join("no_such_export.csv");

    match UpdateCycle::new(&files, &UpdateConfig::default())
        .run(LedgerKind::Completions, &missing_delta)
    {
        Err(Error::MissingFiles(paths)) => {
            assert_eq!(paths, vec![missing_delta, files.duplicate_names()]);
        }
        other => panic!("expected MissingFiles, got {:?}", other.map(|o| o.snapshot)),
    }
}

#[test]
fn test_create_ledger_refuses_existing() {
    let (_dir, files) = setup_course(EXISTING_LEDGER);
    assert!(create_ledger(&files, LedgerKind::Completions).is_err());

    fs::remove_file(files.results_ledger()).unwrap();
    let path = create_ledger(&files, LedgerKind::Results).unwrap();
    let text = fs::read_to_string(path).unwrap();
    assert_eq!(
        text,
        "EnrolmentID,StudentID,Name,Course,A1,A1 Date,A2,A2 Date,A3,A3 Date\n"
    );
}
