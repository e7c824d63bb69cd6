use crate::checkpoint::resolve_cursor;
use crate::config::HarvestOptions;
use crate::join::join_comments;
use crate::paginate::ThreadPages;
use crate::progress::ProgressScope;
use crate::retry::{RunOutcome, Sleeper, Supervisor, ThreadSleeper};
use crate::schema::Schema;
use crate::source::{PushshiftClient, Source};
use crate::store::RecordStore;
use crate::util::{fmt_unix, init_tracing_once};
use anyhow::{Context, Result};
use std::path::Path;
use std::time::Duration;

/// Result of one successful pipeline pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HarvestSummary {
    /// Exclusive lower bound the pass started from.
    pub cursor: i64,
    /// Rows appended to the store during this pass.
    pub appended: u64,
    /// Rows in the deduplicated output after this pass.
    pub unique: usize,
}

#[derive(Clone, Debug, Default)]
pub struct Harvester {
    pub(crate) opts: HarvestOptions,
}

impl Harvester {
    pub fn new() -> Self {
        Self { opts: HarvestOptions::default() }
    }

    pub fn from_options(opts: HarvestOptions) -> Self {
        Self { opts }
    }

    // -------- Builder methods --------
    pub fn output_file(mut self, p: impl AsRef<Path>) -> Self { self.opts = self.opts.with_output_file(p); self }
    pub fn deduplicated_file(mut self, p: impl AsRef<Path>) -> Self { self.opts = self.opts.with_deduplicated_file(p); self }
    pub fn columns_file(mut self, p: impl AsRef<Path>) -> Self { self.opts = self.opts.with_columns_file(p); self }
    pub fn base_url(mut self, url: impl Into<String>) -> Self { self.opts = self.opts.with_base_url(url); self }
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self { self.opts = self.opts.with_user_agent(ua); self }
    pub fn http_timeout(mut self, t: Duration) -> Self { self.opts = self.opts.with_http_timeout(t); self }
    pub fn subreddit(mut self, sub: impl AsRef<str>) -> Self { self.opts = self.opts.with_subreddit(sub); self }
    pub fn author(mut self, author: impl Into<String>) -> Self { self.opts = self.opts.with_author(author); self }
    pub fn search_terms<I, S>(mut self, terms: I) -> Self where I: IntoIterator<Item = S>, S: Into<String> { self.opts = self.opts.with_search_terms(terms); self }
    pub fn start_time(mut self, ts: i64) -> Self { self.opts = self.opts.with_start_time(ts); self }
    pub fn page_size(mut self, n: usize) -> Self { self.opts = self.opts.with_page_size(n); self }
    pub fn batch_size(mut self, n: usize) -> Self { self.opts = self.opts.with_batch_size(n); self }
    pub fn backoff<I>(mut self, delays: I) -> Self where I: IntoIterator<Item = Duration> { self.opts = self.opts.with_backoff(delays); self }
    pub fn schema(mut self, schema: Schema) -> Self { self.opts = self.opts.with_schema(schema); self }
    pub fn progress(mut self, yes: bool) -> Self { self.opts = self.opts.with_progress(yes); self }
    pub fn merge_env(mut self) -> Self { self.opts = self.opts.merge_env(); self }

    pub fn options(&self) -> &HarvestOptions {
        &self.opts
    }

    pub fn store(&self) -> RecordStore {
        RecordStore::new(&self.opts.output_file, self.opts.schema.clone())
            .with_io_buffers(self.opts.read_buffer_bytes, self.opts.write_buffer_bytes)
    }

    /// One end-to-end pass: rewrite the columns file, resume from the store,
    /// stream every new comment into it, then rebuild the deduplicated output.
    pub fn run_once<S: Source>(&self, source: &S) -> Result<HarvestSummary> {
        init_tracing_once();
        let opts = &self.opts;
        let store = self.store();

        store.write_columns_file(&opts.columns_file)?;
        store.ensure_exists()?;

        let cursor = resolve_cursor(&store, opts.start_time);
        tracing::info!("Fetching data starting at time {} ({})", cursor, fmt_unix(cursor));

        let (subreddit, author, page_size) = (opts.subreddit.as_str(), opts.author.as_str(), opts.page_size);
        let threads = opts
            .search_terms
            .iter()
            .flat_map(move |term| ThreadPages::new(source, subreddit, author, term, cursor, page_size));
        let records = join_comments(source, threads, opts.schema.clone(), opts.batch_size);

        let pb = if opts.progress { ProgressScope::spinner("Appending") } else { ProgressScope::hidden() };
        let appended = store
            .append_all(records, Some(&pb))
            .with_context(|| format!("harvest into {}", store.path().display()))?;
        pb.finish(format!("{appended} comments appended"));

        tracing::info!("Deduplicating results");
        let unique = store
            .deduplicate(&opts.deduplicated_file)
            .with_context(|| format!("deduplicate into {}", opts.deduplicated_file.display()))?;
        tracing::info!("Wrote {} comments to {}", unique, opts.deduplicated_file.display());

        Ok(HarvestSummary { cursor, appended, unique })
    }

    /// Supervised run against `source`: every failed pass is restarted from the
    /// top after the next backoff delay, until a pass succeeds or the schedule
    /// is spent.
    pub fn run_with<S: Source>(&self, source: &S, sleeper: &mut dyn Sleeper) -> RunOutcome<HarvestSummary> {
        init_tracing_once();
        Supervisor::new(self.opts.backoff.clone()).run(sleeper, |attempt| {
            if attempt > 1 {
                tracing::info!("Attempt {}", attempt);
            }
            self.run_once(source)
        })
    }

    /// Supervised run against the live Pushshift API.
    pub fn run(&self) -> Result<RunOutcome<HarvestSummary>> {
        let client = PushshiftClient::from_options(&self.opts)?;
        Ok(self.run_with(&client, &mut ThreadSleeper))
    }
}
