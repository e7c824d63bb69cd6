use crate::record::ThreadDescriptor;
use crate::source::{Source, ThreadQuery};
use anyhow::Result;
use std::collections::VecDeque;

/// Lazy, cursor-driven walk over the submission search for one search term.
///
/// A page is only requested once the previous one has been drained. The cursor
/// advances to the `thread_created_utc` of each yielded thread, so the next
/// page starts strictly after the last thread handed out. An empty page ends
/// the walk; an error is yielded once and then the iterator is fused.
pub struct ThreadPages<'a, S: Source> {
    source: &'a S,
    subreddit: &'a str,
    author: &'a str,
    search_term: &'a str,
    after: i64,
    page_size: usize,
    page: VecDeque<ThreadDescriptor>,
    done: bool,
    pages_fetched: usize,
}

impl<'a, S: Source> ThreadPages<'a, S> {
    pub fn new(
        source: &'a S,
        subreddit: &'a str,
        author: &'a str,
        search_term: &'a str,
        after: i64,
        page_size: usize,
    ) -> Self {
        Self {
            source,
            subreddit,
            author,
            search_term,
            after,
            page_size: page_size.max(1),
            page: VecDeque::new(),
            done: false,
            pages_fetched: 0,
        }
    }

    /// Current exclusive lower bound.
    pub fn cursor(&self) -> i64 {
        self.after
    }

    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    fn fetch_page(&mut self) -> Result<()> {
        let query = ThreadQuery {
            subreddit: self.subreddit,
            author: self.author,
            title: self.search_term,
            after: self.after,
            size: self.page_size,
        };
        let page = self.source.search_threads(&query)?;
        self.pages_fetched += 1;

        if page.is_empty() {
            tracing::info!("No {} threads found after time {}", self.search_term, self.after);
            self.done = true;
        } else {
            tracing::info!(
                "Fetched {} {} thread IDs starting at time {}",
                page.len(),
                self.search_term,
                self.after
            );
            self.page.extend(page);
        }
        Ok(())
    }
}

impl<S: Source> Iterator for ThreadPages<'_, S> {
    type Item = Result<ThreadDescriptor>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.page.is_empty() && !self.done {
            if let Err(e) = self.fetch_page() {
                self.done = true;
                return Some(Err(e));
            }
        }
        let thread = self.page.pop_front()?;
        self.after = thread.thread_created_utc;
        Some(Ok(thread))
    }
}
