use serde_json::{Map, Value};

/// Reddit "fullname" prefixes. Pushshift hands back `parent_id` as a fullname:
/// `t1_` when the parent is another comment, `t3_` when it is the submission.
/// This reading is inferred from the Pushshift source; it is not documented.
pub const COMMENT_PREFIX: &str = "t1_";
pub const SUBMISSION_PREFIX: &str = "t3_";

/// What a raw `parent_id` points at after normalization.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParentRef {
    /// Bare comment id, usable as a foreign key into the same table.
    Comment(String),
    /// Top-level comment; the parent is the thread itself.
    Thread,
    /// Unrecognized prefix, left as-is.
    Other(String),
}

impl ParentRef {
    pub fn parse(raw: &str) -> Self {
        if let Some(rest) = raw.strip_prefix(COMMENT_PREFIX) {
            ParentRef::Comment(rest.to_string())
        } else if raw.starts_with(SUBMISSION_PREFIX) {
            ParentRef::Thread
        } else {
            ParentRef::Other(raw.to_string())
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            ParentRef::Comment(id) | ParentRef::Other(id) => Value::String(id),
            ParentRef::Thread => Value::Null,
        }
    }
}

/// Rewrite `parent_id` in place: `t1_x` -> `x`, `t3_x` -> null.
/// Non-string or missing values are left untouched.
pub fn normalize_parent_id(obj: &mut Map<String, Value>) {
    if let Some(v) = obj.get_mut("parent_id") {
        if let Some(raw) = v.as_str() {
            *v = ParentRef::parse(raw).into_value();
        }
    }
}
