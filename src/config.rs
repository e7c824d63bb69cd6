use crate::schema::Schema;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.pushshift.io";

/// 2017-05-06, the day after the Simple Questions rule was introduced.
pub const START_TIME: i64 = 1_494_028_860;

pub const OUTPUT_FILE: &str = "./scrape_mfa_results.tsv";
pub const DEDUPLICATED_FILE: &str = "./scrape_mfa_results.deduplicted.tsv";
pub const COLUMNS_FILE: &str = "./columns.tsv";

/// Restart delays in seconds, consumed from the back (0s first, 80s last).
pub const BACKOFF_SECS: [u64; 7] = [80, 60, 30, 20, 10, 10, 0];

/// User-facing options with sensible defaults and builder chaining.
#[derive(Clone, Debug)]
pub struct HarvestOptions {
    pub output_file: PathBuf,
    pub deduplicated_file: PathBuf,
    pub columns_file: PathBuf,

    pub base_url: String,
    pub user_agent: String,
    pub http_timeout: Duration,

    pub subreddit: String,         // no "r/"
    pub author: String,            // poster of the recurring thread
    pub search_terms: Vec<String>, // queried in order; historical names of the thread
    pub start_time: i64,           // cursor when the store is empty
    pub page_size: usize,
    pub batch_size: usize,
    pub backoff: Vec<Duration>,    // consumed from the back

    pub schema: Schema,
    pub progress: bool,

    // IO tuning
    pub read_buffer_bytes: usize,
    pub write_buffer_bytes: usize,
}

impl Default for HarvestOptions {
    fn default() -> Self {
        Self {
            output_file: PathBuf::from(OUTPUT_FILE),
            deduplicated_file: PathBuf::from(DEDUPLICATED_FILE),
            columns_file: PathBuf::from(COLUMNS_FILE),

            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: concat!("dq-harvest/", env!("CARGO_PKG_VERSION")).to_string(),
            http_timeout: Duration::from_secs(60),

            subreddit: "malefashionadvice".to_string(),
            author: "AutoModerator".to_string(),
            search_terms: vec!["Simple Questions".to_string(), "Daily Questions".to_string()],
            start_time: START_TIME,
            page_size: 100,
            batch_size: 500,
            backoff: BACKOFF_SECS.iter().map(|s| Duration::from_secs(*s)).collect(),

            schema: Schema::comments(),
            progress: true,

            read_buffer_bytes: 256 * 1024,
            write_buffer_bytes: 64 * 1024,
        }
    }
}

impl HarvestOptions {
    pub fn with_output_file(mut self, p: impl AsRef<Path>) -> Self {
        self.output_file = p.as_ref().to_path_buf();
        self
    }
    pub fn with_deduplicated_file(mut self, p: impl AsRef<Path>) -> Self {
        self.deduplicated_file = p.as_ref().to_path_buf();
        self
    }
    pub fn with_columns_file(mut self, p: impl AsRef<Path>) -> Self {
        self.columns_file = p.as_ref().to_path_buf();
        self
    }
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }
    pub fn with_user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = ua.into();
        self
    }
    pub fn with_http_timeout(mut self, t: Duration) -> Self {
        self.http_timeout = t;
        self
    }
    pub fn with_subreddit(mut self, sub: impl AsRef<str>) -> Self {
        let s = sub.as_ref().trim();
        self.subreddit = s.strip_prefix("r/").unwrap_or(s).to_string();
        self
    }
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }
    pub fn with_search_terms<I, S>(mut self, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.search_terms = terms.into_iter().map(Into::into).collect();
        self
    }
    pub fn with_start_time(mut self, ts: i64) -> Self {
        self.start_time = ts;
        self
    }
    pub fn with_page_size(mut self, n: usize) -> Self {
        self.page_size = n.max(1);
        self
    }
    pub fn with_batch_size(mut self, n: usize) -> Self {
        self.batch_size = n.max(1);
        self
    }
    pub fn with_backoff<I>(mut self, delays: I) -> Self
    where
        I: IntoIterator<Item = Duration>,
    {
        self.backoff = delays.into_iter().collect();
        self
    }
    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = schema;
        self
    }
    pub fn with_progress(mut self, yes: bool) -> Self {
        self.progress = yes;
        self
    }

    /// Apply `DQ_HARVEST_BASE_URL` / `DQ_HARVEST_USER_AGENT` when set and non-empty.
    pub fn merge_env(mut self) -> Self {
        if let Ok(url) = std::env::var("DQ_HARVEST_BASE_URL") {
            if !url.trim().is_empty() {
                tracing::info!("Using API base URL from DQ_HARVEST_BASE_URL: {}", url.trim());
                self = self.with_base_url(url.trim());
            }
        }
        if let Ok(ua) = std::env::var("DQ_HARVEST_USER_AGENT") {
            if !ua.trim().is_empty() {
                self.user_agent = ua.trim().to_string();
            }
        }
        self
    }
}
