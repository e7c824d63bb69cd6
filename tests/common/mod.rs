#![allow(dead_code)]

use anyhow::{bail, Result};
use dq_harvest::{Harvester, Schema, Sleeper, Source, ThreadDescriptor, ThreadQuery};
use serde_json::{json, Map, Value};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;

/// One recorded call against the fake API.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    Search { title: String, after: i64, size: usize },
    CommentIds(String),
    Comments(Vec<String>),
}

/// In-memory stand-in for Pushshift. Threads are keyed by search term and served
/// ascending by creation time, strictly after the cursor, like the real search.
#[derive(Default)]
pub struct FakeSource {
    pub threads: HashMap<String, Vec<ThreadDescriptor>>,
    pub comment_ids: HashMap<String, Vec<String>>,
    pub comments: HashMap<String, Map<String, Value>>,
    pub calls: RefCell<Vec<Call>>,
    /// 1-based index of the `comments` call that fails once (global across runs).
    pub fail_comments_call: Cell<Option<usize>>,
    /// Number of upcoming `search_threads` calls that fail.
    pub failing_searches: Cell<u32>,
    comments_calls: Cell<usize>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a thread under `term` with its comments. Each comment is a
    /// `(id, parent_id)` pair; the body is derived from the id.
    pub fn add_thread(&mut self, term: &str, id: &str, created: i64, comments: &[(&str, &str)]) {
        self.threads.entry(term.to_string()).or_default().push(ThreadDescriptor {
            thread_id: id.to_string(),
            thread_created_utc: created,
            thread_title: format!("{term} thread {id}"),
        });
        self.threads.get_mut(term).unwrap().sort_by_key(|t| t.thread_created_utc);
        let ids = self.comment_ids.entry(id.to_string()).or_default();
        for (cid, parent) in comments {
            ids.push(cid.to_string());
            let obj = json!({
                "id": cid,
                "parent_id": parent,
                "author": "someone",
                "body": format!("body of {cid}"),
                "created_utc": created + 10,
                "score": 1,
                "link_id": format!("t3_{id}"),
            });
            self.comments.insert(cid.to_string(), obj.as_object().unwrap().clone());
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn comment_batches(&self) -> Vec<Vec<String>> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Comments(ids) => Some(ids),
                _ => None,
            })
            .collect()
    }

    pub fn searches(&self) -> Vec<(String, i64)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Search { title, after, .. } => Some((title, after)),
                _ => None,
            })
            .collect()
    }
}

impl Source for FakeSource {
    fn search_threads(&self, q: &ThreadQuery<'_>) -> Result<Vec<ThreadDescriptor>> {
        self.calls.borrow_mut().push(Call::Search { title: q.title.to_string(), after: q.after, size: q.size });
        if self.failing_searches.get() > 0 {
            self.failing_searches.set(self.failing_searches.get() - 1);
            bail!("Failed to fetch from /reddit/search/submission\n\nStatus code: 502");
        }
        Ok(self
            .threads
            .get(q.title)
            .map(|ts| ts.iter().filter(|t| t.thread_created_utc > q.after).take(q.size).cloned().collect())
            .unwrap_or_default())
    }

    fn comment_ids(&self, thread_id: &str) -> Result<Vec<String>> {
        self.calls.borrow_mut().push(Call::CommentIds(thread_id.to_string()));
        Ok(self.comment_ids.get(thread_id).cloned().unwrap_or_default())
    }

    fn comments(&self, ids: &[String], _fields: &Schema) -> Result<Vec<Map<String, Value>>> {
        self.calls.borrow_mut().push(Call::Comments(ids.to_vec()));
        let n = self.comments_calls.get() + 1;
        self.comments_calls.set(n);
        if self.fail_comments_call.get() == Some(n) {
            self.fail_comments_call.set(None);
            bail!("Failed to fetch from /reddit/search/comment\n\nStatus code: 503");
        }
        Ok(ids.iter().filter_map(|id| self.comments.get(id).cloned()).collect())
    }
}

/// Records requested delays instead of sleeping.
#[derive(Default)]
pub struct RecordingSleeper {
    pub delays: Vec<Duration>,
}

impl Sleeper for RecordingSleeper {
    fn sleep(&mut self, d: Duration) {
        self.delays.push(d);
    }
}

/// Harvester writing into `dir`, progress off, starting from the epoch.
pub fn harvester_in(dir: &Path) -> Harvester {
    Harvester::new()
        .output_file(dir.join("results.tsv"))
        .deduplicated_file(dir.join("results.dedup.tsv"))
        .columns_file(dir.join("columns.tsv"))
        .start_time(0)
        .progress(false)
}

/// Scratch directory, removed when the guard drops; keep it alive for the test.
pub fn tmp_dir() -> TempDir {
    tempfile::tempdir().unwrap()
}

/// Read a TSV file into rows (cells split on tabs; fixtures never need quoting).
pub fn read_rows(path: &Path) -> Vec<Vec<String>> {
    let f = File::open(path).unwrap();
    BufReader::new(f)
        .lines()
        .map(|l| l.unwrap())
        .filter(|s| !s.is_empty())
        .map(|s| s.trim_end_matches('\r').split('\t').map(str::to_string).collect())
        .collect()
}

/// Values of column `name` (per the comment schema) in file order.
pub fn column(path: &Path, name: &str) -> Vec<String> {
    let idx = Schema::comments().index_of(name).unwrap();
    read_rows(path).into_iter().map(|r| r[idx].clone()).collect()
}
