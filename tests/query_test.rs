mod common;

use logquery::{EngineConfig, Engine, QueryError};
use tempfile::TempDir;

fn numbered_lines(bad_line: usize) -> String {
    (1..=10)
        .map(|i| if i == bad_line { "oops".to_string() } else { i.to_string() })
        .collect::<Vec<_>>()
        .join("\n")
}

#[test]
fn test_bad_row_is_skipped_in_order() {
    let dir = TempDir::new().unwrap();
    common::write_file(dir.path(), "n.log", &numbered_lines(3), 0);
    let mut engine = common::engine(&dir);

    let out = common::query(&mut engine, "SELECT TO_INT(Line) FROM TEXT('n.log')").unwrap();
    assert_eq!(out, vec!["1", "2", "4", "5", "6", "7", "8", "9", "10"]);
    assert_eq!(engine.warnings().len(), 1);
    assert!(matches!(engine.warnings()[0], QueryError::LineIgnored { line: 3, .. }));
    assert!(engine.warnings()[0].is_warning());
}

#[test]
fn test_bad_row_in_where_is_skipped() {
    let dir = TempDir::new().unwrap();
    common::write_file(dir.path(), "n.log", &numbered_lines(3), 0);
    let mut engine = common::engine(&dir);

    let out = common::query(&mut engine, "SELECT @@LineNo FROM TEXT('n.log') WHERE TO_INT(Line) % 2 = 0").unwrap();
    assert_eq!(out, vec!["2", "4", "6", "8", "10"]);
    assert_eq!(engine.warnings().len(), 1);
}

#[test]
fn test_like_and_match() {
    let dir = TempDir::new().unwrap();
    common::write_file(
        dir.path(),
        "app.log",
        "ERROR disk full\nINFO started\nerror: timeout\nWARN a.b\n",
        0,
    );
    let mut engine = common::engine(&dir);

    let out = common::query(&mut engine, "SELECT Line FROM TEXT('app.log') WHERE Line LIKE 'error%'").unwrap();
    assert_eq!(out, vec!["ERROR disk full", "error: timeout"]);

    let out = common::query(&mut engine, "SELECT Line FROM TEXT('app.log') WHERE Line LIKE 'WARN a_b'").unwrap();
    assert_eq!(out, vec!["WARN a.b"]);

    let out = common::query(&mut engine, "SELECT Line FROM TEXT('app.log') WHERE Line MATCH '^(INFO|WARN)'").unwrap();
    assert_eq!(out, vec!["INFO started", "WARN a.b"]);
}

#[test]
fn test_order_by_and_top() {
    let dir = TempDir::new().unwrap();
    common::write_file(dir.path(), "w.log", "pear 3\napple 10\nfig 7\n", 0);
    let mut engine = common::engine(&dir);

    let out = common::query(
        &mut engine,
        "SELECT TOP 2 EXTRACT_TOKEN(Line, 0) AS Fruit, TO_INT(EXTRACT_TOKEN(Line, 1)) AS Qty \
         FROM TEXT('w.log') ORDER BY Qty DESC",
    )
    .unwrap();
    assert_eq!(out, vec!["apple\t10", "fig\t7"]);

    let out = common::query(&mut engine, "SELECT Line FROM TEXT('w.log') ORDER BY 1").unwrap();
    assert_eq!(out, vec!["apple 10", "fig 7", "pear 3"]);
}

#[test]
fn test_heading_and_delimiter() {
    let dir = TempDir::new().unwrap();
    common::write_file(dir.path(), "a.log", "x\n", 0);
    let mut engine = Engine::new(&EngineConfig {
        current_directory: Some(dir.path().to_path_buf()),
        delimiter: ";".into(),
        heading: "rule".into(),
        ..EngineConfig::default()
    })
    .unwrap();

    let out = common::query(&mut engine, "SELECT Line, @@LineNo AS No FROM TEXT('a.log')").unwrap();
    assert_eq!(out, vec!["Line;No", "----;--", "x;1"]);
}

#[test]
fn test_log_sink_mirrors_output() {
    let dir = TempDir::new().unwrap();
    common::write_file(dir.path(), "a.log", "x\ny\n", 0);
    let mut engine = common::engine(&dir);

    let mut out: Vec<String> = Vec::new();
    let mut log: Vec<String> = Vec::new();
    engine
        .execute_with_log("SELECT Line FROM TEXT('a.log')", &mut out, Some(&mut log))
        .unwrap();
    assert_eq!(out, vec!["x", "y"]);
    assert_eq!(out, log);
}

#[test]
fn test_interrupt_before_execute_is_cleared() {
    let dir = TempDir::new().unwrap();
    common::write_file(dir.path(), "a.log", "x\ny\n", 0);
    let mut engine = common::engine(&dir);

    // each execute starts with a cleared flag
    engine.interrupt();
    assert_eq!(common::query(&mut engine, "SELECT Line FROM TEXT('a.log')").unwrap().len(), 2);

    let handle = engine.interrupt_handle();
    handle.interrupt();
    assert!(engine.session().execution.is_interrupted());
}

#[test]
fn test_structural_conversion_fails_at_build() {
    let dir = TempDir::new().unwrap();
    common::write_file(dir.path(), "a.log", "x\n", 0);
    let mut engine = common::engine(&dir);

    let err = common::query(&mut engine, "SELECT TO_FLOAT(TRUE) FROM TEXT('a.log')").unwrap_err();
    assert!(matches!(err, QueryError::ParseTimeConversion { .. }));
    assert!(engine.warnings().is_empty());
}
