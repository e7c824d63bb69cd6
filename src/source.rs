//! The three read-only queries the harvester needs from the archive API, and the
//! Pushshift-backed implementation.

use crate::config::HarvestOptions;
use crate::record::ThreadDescriptor;
use crate::schema::Schema;
use anyhow::{anyhow, bail, Context, Result};
use reqwest::blocking::Client;
use serde_json::{Map, Value};

/// Submission search parameters for one page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ThreadQuery<'a> {
    pub subreddit: &'a str,
    pub author: &'a str,
    pub title: &'a str,
    /// Exclusive lower bound on `created_utc`.
    pub after: i64,
    pub size: usize,
}

/// Seam between the pipeline and the archive API. Every call either returns the
/// full `data` payload or fails; no call is retried here.
pub trait Source {
    /// One page of threads with `num_comments > 0`, ascending by creation time.
    fn search_threads(&self, query: &ThreadQuery<'_>) -> Result<Vec<ThreadDescriptor>>;

    /// All comment ids listed under `thread_id`.
    fn comment_ids(&self, thread_id: &str) -> Result<Vec<String>>;

    /// Resolve `ids` into raw comment objects, projecting `fields`.
    fn comments(&self, ids: &[String], fields: &Schema) -> Result<Vec<Map<String, Value>>>;
}

impl<S: Source + ?Sized> Source for &S {
    fn search_threads(&self, query: &ThreadQuery<'_>) -> Result<Vec<ThreadDescriptor>> {
        (**self).search_threads(query)
    }
    fn comment_ids(&self, thread_id: &str) -> Result<Vec<String>> {
        (**self).comment_ids(thread_id)
    }
    fn comments(&self, ids: &[String], fields: &Schema) -> Result<Vec<Map<String, Value>>> {
        (**self).comments(ids, fields)
    }
}

/// Blocking Pushshift client.
pub struct PushshiftClient {
    client: Client,
    base_url: String,
}

impl PushshiftClient {
    pub fn new(base_url: impl Into<String>, client: Client) -> Self {
        Self { client, base_url: base_url.into().trim_end_matches('/').to_string() }
    }

    pub fn from_options(opts: &HarvestOptions) -> Result<Self> {
        let client = Client::builder()
            .user_agent(opts.user_agent.as_str())
            .timeout(opts.http_timeout)
            .build()
            .context("build HTTP client")?;
        Ok(Self::new(opts.base_url.as_str(), client))
    }

    /// GET `path` and return the `data` array of the JSON body.
    /// Non-200 status, a non-JSON body or a missing `data` array are hard failures.
    fn fetch_data(&self, path: &str, params: &[(&str, String)]) -> Result<Vec<Value>> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("GET {} {:?}", url, params);

        let resp = self
            .client
            .get(&url)
            .query(params)
            .send()
            .with_context(|| format!("request {url} with params {params:?}"))?;
        let status = resp.status();
        let body = resp.text().with_context(|| format!("read body from {url}"))?;

        if status.as_u16() == 200 {
            if let Ok(mut v) = serde_json::from_str::<Value>(&body) {
                return match v.get_mut("data").map(Value::take) {
                    Some(Value::Array(data)) => Ok(data),
                    _ => Err(anyhow!("Response from {url} with params {params:?} has no `data` list")),
                };
            }
        }
        bail!(
            "Failed to fetch from {url} with params {params:?}\n\nStatus code: {}\nBody:\n{body}",
            status.as_u16()
        )
    }
}

impl Source for PushshiftClient {
    fn search_threads(&self, q: &ThreadQuery<'_>) -> Result<Vec<ThreadDescriptor>> {
        let params = [
            ("subreddit", q.subreddit.to_string()),
            ("author", q.author.to_string()),
            ("title", q.title.to_string()),
            ("fields", "id,title,created_utc".to_string()),
            ("num_comments", ">0".to_string()),
            ("sort", "asc".to_string()),
            ("sort_type", "created_utc".to_string()),
            ("size", q.size.to_string()),
            ("after", q.after.to_string()),
        ];
        let data = self.fetch_data("/reddit/search/submission", &params)?;
        data.iter()
            .map(|row| {
                ThreadDescriptor::from_submission(row)
                    .ok_or_else(|| anyhow!("malformed submission in search results: {row}"))
            })
            .collect()
    }

    fn comment_ids(&self, thread_id: &str) -> Result<Vec<String>> {
        let data = self.fetch_data(&format!("/reddit/submission/comment_ids/{thread_id}"), &[])?;
        data.into_iter()
            .map(|v| match v {
                Value::String(s) => Ok(s),
                other => Err(anyhow!("non-string comment id for thread {thread_id}: {other}")),
            })
            .collect()
    }

    fn comments(&self, ids: &[String], fields: &Schema) -> Result<Vec<Map<String, Value>>> {
        let params = [("ids", ids.join(",")), ("fields", fields.projection())];
        let data = self.fetch_data("/reddit/search/comment", &params)?;
        data.into_iter()
            .map(|v| match v {
                Value::Object(m) => Ok(m),
                other => Err(anyhow!("non-object comment in search results: {other}")),
            })
            .collect()
    }
}
