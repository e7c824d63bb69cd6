use crate::schema::Schema;
use serde::Deserialize;
use serde_json::{Map, Value};

/// One Daily/Simple Questions submission as returned by the submission search.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ThreadDescriptor {
    pub thread_id: String,
    pub thread_created_utc: i64,
    pub thread_title: String,
}

impl ThreadDescriptor {
    /// Build from a raw submission object (`id`, `created_utc`, `title`).
    pub fn from_submission(v: &Value) -> Option<Self> {
        let raw = RawSubmission::deserialize(v).ok()?;
        Some(Self {
            thread_created_utc: as_unix(&raw.created_utc)?,
            thread_id: raw.id,
            thread_title: raw.title.unwrap_or_default(),
        })
    }

    /// Insert the thread fields into `obj` wherever the key is not already present.
    pub fn merge_into(&self, obj: &mut Map<String, Value>) {
        obj.entry("thread_id").or_insert_with(|| Value::String(self.thread_id.clone()));
        obj.entry("thread_created_utc").or_insert_with(|| Value::from(self.thread_created_utc));
        obj.entry("thread_title").or_insert_with(|| Value::String(self.thread_title.clone()));
    }
}

/// Submission search row as requested with `fields=id,title,created_utc`.
#[derive(Deserialize)]
struct RawSubmission {
    id: String,
    created_utc: Value,
    #[serde(default)]
    title: Option<String>,
}

/// Pushshift occasionally serializes epoch seconds as floats or strings.
fn as_unix(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// A comment id paired with the thread it was listed under. Never persisted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommentRef {
    pub id: String,
    pub thread: ThreadDescriptor,
}

/// A fully resolved comment: the raw Pushshift object with `parent_id`
/// normalized and the thread fields merged in.
#[derive(Clone, Debug, PartialEq)]
pub struct CommentRecord {
    fields: Map<String, Value>,
}

impl CommentRecord {
    pub fn from_map(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn id(&self) -> Option<&str> {
        self.fields.get("id").and_then(|v| v.as_str())
    }

    pub fn parent_id(&self) -> Option<&str> {
        self.fields.get("parent_id").and_then(|v| v.as_str())
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Project onto `schema` as TSV cells. Missing keys become empty cells;
    /// keys outside the schema are dropped.
    pub fn to_row(&self, schema: &Schema) -> Vec<String> {
        schema.fields().iter().map(|k| render_cell(self.fields.get(k))).collect()
    }
}

fn render_cell(v: Option<&Value>) -> String {
    match v {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(other) => other.to_string(),
    }
}

/// A row as read back from the store, aligned to a schema.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredRow {
    pub cells: Vec<String>,
}

impl StoredRow {
    pub fn get<'a>(&'a self, schema: &Schema, name: &str) -> Option<&'a str> {
        schema.index_of(name).and_then(|i| self.cells.get(i)).map(String::as_str)
    }

    pub fn id<'a>(&'a self, schema: &Schema) -> Option<&'a str> {
        self.get(schema, "id").filter(|s| !s.is_empty())
    }

    /// `None` when the cell is missing or not an integer.
    pub fn thread_created_utc(&self, schema: &Schema) -> Option<i64> {
        self.get(schema, "thread_created_utc").and_then(|s| s.trim().parse().ok())
    }
}
