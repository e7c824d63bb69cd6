#[path = "common/mod.rs"]
mod common;

use anyhow::anyhow;
use common::*;
use dq_harvest::{CommentRecord, RecordStore, Schema, TsvReader, TsvWriter};
use serde_json::json;
use std::fs;

fn record(id: &str, body: &str) -> anyhow::Result<CommentRecord> {
    let v = json!({ "id": id, "body": body, "thread_id": "t", "thread_created_utc": 100 });
    Ok(CommentRecord::from_map(v.as_object().unwrap().clone()))
}

/// Rows `[a, b, a, c, b]` deduplicate to `[a, b, c]` in first-occurrence order,
/// keeping the first copy of each row, and report a count of 3.
#[test]
fn dedupe_keeps_first_occurrence_order() {
    let tmp = tmp_dir();
    let dir = tmp.path();
    let store = RecordStore::new(dir.join("store.tsv"), Schema::comments());
    let recs = vec![
        record("a", "first a"),
        record("b", "first b"),
        record("a", "second a"),
        record("c", "only c"),
        record("b", "second b"),
    ];
    assert_eq!(store.append_all(recs, None).unwrap(), 5);

    let out = dir.join("dedup.tsv");
    let unique = store.deduplicate(&out).unwrap();

    assert_eq!(unique, 3);
    assert_eq!(column(&out, "id"), vec!["a", "b", "c"]);
    assert_eq!(column(&out, "body"), vec!["first a", "first b", "only c"]);
}

/// Running dedupe twice over an unchanged store yields byte-identical output
/// and the same count; the output is overwritten, not appended to.
#[test]
fn dedupe_is_idempotent() {
    let tmp = tmp_dir();
    let dir = tmp.path();
    let store = RecordStore::new(dir.join("store.tsv"), Schema::comments());
    store
        .append_all(vec![record("x", "1"), record("y", "2"), record("x", "3")], None)
        .unwrap();

    let out = dir.join("dedup.tsv");
    let n1 = store.deduplicate(&out).unwrap();
    let first = fs::read(&out).unwrap();
    let n2 = store.deduplicate(&out).unwrap();
    let second = fs::read(&out).unwrap();

    assert_eq!(n1, 2);
    assert_eq!(n1, n2);
    assert_eq!(first, second);
    assert!(!dir.join("dedup.tsv.inprogress").exists());
}

/// Deduplicating an absent store produces an empty output and a zero count.
#[test]
fn dedupe_of_absent_store_is_empty() {
    let tmp = tmp_dir();
    let dir = tmp.path();
    let store = RecordStore::new(dir.join("never_written.tsv"), Schema::comments());
    let out = dir.join("dedup.tsv");
    assert_eq!(store.deduplicate(&out).unwrap(), 0);
    assert_eq!(fs::read_to_string(&out).unwrap(), "");
}

/// Crash simulation at the flush stage: the record stream fails after K of N
/// records. The K records are already durable; a restart that replays the whole
/// stream leaves all N records in the deduplicated output exactly once.
#[test]
fn interrupted_flush_then_restart_loses_nothing() {
    let tmp = tmp_dir();
    let dir = tmp.path();
    let store = RecordStore::new(dir.join("store.tsv"), Schema::comments());
    let ids = ["c1", "c2", "c3", "c4", "c5"];

    let interrupted = ids[..3]
        .iter()
        .map(|id| record(id, "x"))
        .chain(std::iter::once(Err(anyhow!("connection reset"))))
        .chain(ids[3..].iter().map(|id| record(id, "x")));
    let err = store.append_all(interrupted, None).unwrap_err();
    assert!(err.to_string().contains("connection reset"));
    assert_eq!(column(store.path(), "id"), vec!["c1", "c2", "c3"]);

    // Restart from the last partially written thread: everything again.
    store.append_all(ids.iter().map(|id| record(id, "x")), None).unwrap();
    let out = dir.join("dedup.tsv");
    assert_eq!(store.deduplicate(&out).unwrap(), 5);
    assert_eq!(column(&out, "id"), ids.to_vec());
}

/// Each record is projected onto the schema: missing keys become empty cells,
/// null becomes empty, non-string scalars keep their JSON text.
#[test]
fn records_are_projected_onto_schema() {
    let schema = Schema::new(["id", "parent_id", "score", "stickied", "gildings", "missing"]);
    let v = json!({
        "id": "abc", "parent_id": null, "score": 12, "stickied": false,
        "gildings": {"gid_1": 0}, "not_in_schema": "dropped"
    });
    let rec = CommentRecord::from_map(v.as_object().unwrap().clone());
    assert_eq!(rec.to_row(&schema), vec!["abc", "", "12", "false", "{\"gid_1\":0}", ""]);
}

/// Bodies carrying tabs, newlines and quotes survive the TSV codec intact.
#[test]
fn tsv_quoting_survives_multiline_bodies() {
    let tmp = tmp_dir();
    let dir = tmp.path();
    let path = dir.join("q.tsv");
    let rows = vec![
        vec!["plain".to_string(), "has\ttab".to_string(), "two\nlines".to_string()],
        vec!["say \"hi\"".to_string(), String::new(), "crlf\r\ninside".to_string()],
    ];
    let mut w = TsvWriter::create(&path, 8 * 1024).unwrap();
    for r in &rows {
        w.write_row(r).unwrap();
    }
    w.finish().unwrap();

    let back: Vec<Vec<String>> = TsvReader::open(&path, 8 * 1024)
        .unwrap()
        .collect::<std::io::Result<_>>()
        .unwrap();
    assert_eq!(back, rows);
}

/// The columns artifact is a single header row and is rewritten, not appended.
#[test]
fn columns_file_is_rewritten() {
    let tmp = tmp_dir();
    let dir = tmp.path();
    let store = RecordStore::new(dir.join("store.tsv"), Schema::comments());
    let cols = dir.join("columns.tsv");
    store.write_columns_file(&cols).unwrap();
    store.write_columns_file(&cols).unwrap();

    let rows = read_rows(&cols);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].len(), 44);
    assert_eq!(&rows[0][..3], &["thread_id", "thread_created_utc", "id"]);
}
