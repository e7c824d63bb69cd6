#[path = "common/mod.rs"]
mod common;

use common::*;
use dq_harvest::{resolve_cursor, RecordStore, Schema, START_TIME};
use std::fs;

fn row_with_thread_ts(ts: &str, id: &str) -> String {
    let schema = Schema::comments();
    let mut cells = vec![String::new(); schema.len()];
    cells[schema.index_of("thread_created_utc").unwrap()] = ts.to_string();
    cells[schema.index_of("id").unwrap()] = id.to_string();
    cells.join("\t")
}

/// No store file at all: resume from the epoch constant.
#[test]
fn absent_store_resumes_from_start_time() {
    let tmp = tmp_dir();
    let dir = tmp.path();
    let store = RecordStore::new(dir.join("missing.tsv"), Schema::comments());
    assert_eq!(resolve_cursor(&store, START_TIME), START_TIME);
}

/// An existing but empty store behaves exactly like an absent one.
#[test]
fn empty_store_resumes_from_start_time() {
    let tmp = tmp_dir();
    let dir = tmp.path();
    let path = dir.join("empty.tsv");
    fs::write(&path, "").unwrap();
    let store = RecordStore::new(&path, Schema::comments());
    assert_eq!(resolve_cursor(&store, START_TIME), START_TIME);
}

/// The newest thread timestamp T gives T - 1, regardless of row order,
/// so the newest (possibly half-scraped) thread is fetched again.
#[test]
fn cursor_is_one_before_newest_thread() {
    let tmp = tmp_dir();
    let dir = tmp.path();
    let path = dir.join("store.tsv");
    let body = [
        row_with_thread_ts("1500000000", "a"),
        row_with_thread_ts("1600000500", "b"),
        row_with_thread_ts("1550000000", "c"),
    ]
    .join("\r\n");
    fs::write(&path, body + "\r\n").unwrap();

    let store = RecordStore::new(&path, Schema::comments());
    assert_eq!(resolve_cursor(&store, START_TIME), 1_600_000_499);
}

/// Malformed rows (non-numeric timestamp, truncated row) are skipped, not fatal.
#[test]
fn malformed_rows_are_ignored() {
    let tmp = tmp_dir();
    let dir = tmp.path();
    let path = dir.join("store.tsv");
    let body = format!(
        "{}\r\n{}\r\nshort\trow\r\n",
        row_with_thread_ts("not-a-number", "x"),
        row_with_thread_ts("1500000100", "y"),
    );
    fs::write(&path, body).unwrap();

    let store = RecordStore::new(&path, Schema::comments());
    assert_eq!(resolve_cursor(&store, START_TIME), 1_500_000_099);
}

/// A store holding only malformed rows resumes from the epoch constant.
#[test]
fn only_malformed_rows_resume_from_start_time() {
    let tmp = tmp_dir();
    let dir = tmp.path();
    let path = dir.join("store.tsv");
    fs::write(&path, "garbage\r\nmore\tgarbage\r\n").unwrap();

    let store = RecordStore::new(&path, Schema::comments());
    assert_eq!(resolve_cursor(&store, 42), 42);
}

/// A line that is not valid UTF-8 is skipped; rows after it still count.
#[test]
fn undecodable_row_does_not_hide_later_rows() {
    let tmp = tmp_dir();
    let dir = tmp.path();
    let path = dir.join("store.tsv");
    let mut body = Vec::new();
    body.extend_from_slice(row_with_thread_ts("100", "a").as_bytes());
    body.extend_from_slice(b"\r\n\xff\xfe garbage\r\n");
    body.extend_from_slice(row_with_thread_ts("500", "b").as_bytes());
    body.extend_from_slice(b"\r\n");
    fs::write(&path, body).unwrap();

    let store = RecordStore::new(&path, Schema::comments());
    assert_eq!(resolve_cursor(&store, 0), 499);
}

/// The smallest representable timestamp does not overflow the cursor.
#[test]
fn minimum_timestamp_saturates() {
    let tmp = tmp_dir();
    let dir = tmp.path();
    let path = dir.join("store.tsv");
    fs::write(&path, row_with_thread_ts(&i64::MIN.to_string(), "a") + "\r\n").unwrap();

    let store = RecordStore::new(&path, Schema::comments());
    assert_eq!(resolve_cursor(&store, START_TIME), i64::MIN);
}
