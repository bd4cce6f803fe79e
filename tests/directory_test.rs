mod common;

use tempfile::TempDir;

fn fixture() -> TempDir {
    let dir = TempDir::new().unwrap();
    // name order and write-time order differ on purpose
    common::write_file(dir.path(), "b.log", "bb", 30);
    common::write_file(dir.path(), "a.log", "a", 10);
    common::write_file(dir.path(), "d.log", "dddd", 40);
    common::write_file(dir.path(), "c.log", "ccc", 20);
    common::write_file(dir.path(), "notes.txt", "n", 5);
    common::write_file(dir.path(), "sub/e.log", "eeeee", 1);
    dir
}

#[test]
fn test_name_order_is_stable() {
    let dir = fixture();
    let mut engine = common::engine(&dir);

    let sql = "SELECT Name FROM DIR('*.log', NAME ASC)";
    let first = common::query(&mut engine, sql).unwrap();
    let second = common::query(&mut engine, sql).unwrap();
    assert_eq!(first, vec!["a.log", "b.log", "c.log", "d.log"]);
    assert_eq!(first, second);
}

#[test]
fn test_write_time_desc_inverts_asc() {
    let dir = fixture();
    let mut engine = common::engine(&dir);

    let asc = common::query(&mut engine, "SELECT Name FROM DIR('*.log', WRITETIME ASC)").unwrap();
    let mut desc = common::query(&mut engine, "SELECT Name FROM DIR('*.log', WRITETIME DESC)").unwrap();
    assert_eq!(asc, vec!["d.log", "b.log", "c.log", "a.log"]);
    desc.reverse();
    assert_eq!(asc, desc);
}

#[test]
fn test_recursive_listing_and_columns() {
    let dir = fixture();
    let mut engine = common::engine(&dir);

    let out = common::query(
        &mut engine,
        "SELECT Name, Extension, Length FROM DIR('*.log', RECURSIVE, NAME) WHERE Length >= 3",
    )
    .unwrap();
    assert_eq!(out, vec!["c.log\t.log\t3", "d.log\t.log\t4", "e.log\t.log\t5"]);
}

#[test]
fn test_file_name_system_variables() {
    let dir = fixture();
    let mut engine = common::engine(&dir);

    let out = common::query(&mut engine, "SELECT @@FileName, Line FROM TEXT('*.log')").unwrap();
    assert_eq!(out, vec!["a.log\ta", "b.log\tbb", "c.log\tccc", "d.log\tdddd"]);
}

#[test]
fn test_mask_is_case_insensitive_by_default() {
    let dir = fixture();
    let mut engine = common::engine(&dir);

    let out = common::query(&mut engine, "SELECT Name FROM DIR('NOTES.*', NAME)").unwrap();
    assert_eq!(out, vec!["notes.txt"]);
}

#[test]
fn test_missing_directory_is_an_error() {
    let dir = fixture();
    let mut engine = common::engine(&dir);

    assert!(common::query(&mut engine, "SELECT Name FROM DIR('nowhere/*.log')").is_err());
}
