mod config;
mod schema;
mod record;
mod parents;

mod util;
mod tsv;
mod progress;
mod store;
mod checkpoint;

mod source;
mod paginate;
mod join;
mod retry;
mod pipeline;

pub use crate::config::{
    HarvestOptions, BACKOFF_SECS, COLUMNS_FILE, DEDUPLICATED_FILE, DEFAULT_BASE_URL, OUTPUT_FILE, START_TIME,
};
pub use crate::schema::{Schema, COMMENT_FIELDS};
pub use crate::record::{CommentRecord, CommentRef, StoredRow, ThreadDescriptor};
pub use crate::pipeline::{HarvestSummary, Harvester};

// parent_id normalization (t1_/t3_ fullnames)
pub use crate::parents::{normalize_parent_id, ParentRef, COMMENT_PREFIX, SUBMISSION_PREFIX};

// storage: TSV codec, append-only store, resume cursor
pub use crate::tsv::{encode_row, TsvReader, TsvWriter};
pub use crate::store::RecordStore;
pub use crate::checkpoint::resolve_cursor;

// API seam and the lazy fetch stages built on it
pub use crate::source::{PushshiftClient, Source, ThreadQuery};
pub use crate::paginate::ThreadPages;
pub use crate::join::{join_comments, CommentBatches, CommentRefs};

// restart supervision
pub use crate::retry::{RunOutcome, Sleeper, Supervisor, SupervisorState, ThreadSleeper};

pub use crate::progress::ProgressScope;
pub use crate::util::{fmt_unix, init_tracing_once, replace_file_atomic_backoff};
