//! Threads -> comment ids -> full comments, as two lazy stages.

use crate::parents::normalize_parent_id;
use crate::record::{CommentRecord, CommentRef, ThreadDescriptor};
use crate::schema::Schema;
use crate::source::Source;
use ahash::AHashMap;
use anyhow::Result;
use std::collections::VecDeque;

/// Stage 1: one `CommentRef` per comment id listed under each incoming thread.
pub struct CommentRefs<'a, S: Source, I> {
    source: &'a S,
    threads: I,
    pending: VecDeque<CommentRef>,
    done: bool,
}

impl<'a, S, I> CommentRefs<'a, S, I>
where
    S: Source,
    I: Iterator<Item = Result<ThreadDescriptor>>,
{
    pub fn new(source: &'a S, threads: I) -> Self {
        Self { source, threads, pending: VecDeque::new(), done: false }
    }
}

impl<S, I> Iterator for CommentRefs<'_, S, I>
where
    S: Source,
    I: Iterator<Item = Result<ThreadDescriptor>>,
{
    type Item = Result<CommentRef>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.pending.is_empty() {
            if self.done {
                return None;
            }
            let thread = match self.threads.next()? {
                Ok(t) => t,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            };
            let ids = match self.source.comment_ids(&thread.thread_id) {
                Ok(ids) => ids,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            };
            tracing::info!(
                "Fetched {} comment IDs for thread '{}' ({}) submitted at time {}",
                ids.len(),
                thread.thread_title,
                thread.thread_id,
                thread.thread_created_utc
            );
            self.pending
                .extend(ids.into_iter().map(|id| CommentRef { id, thread: thread.clone() }));
        }
        self.pending.pop_front().map(Ok)
    }
}

/// Stage 2: group refs into batches of `batch_size` and resolve each batch with
/// a single comment query, yielding enriched records in response order.
pub struct CommentBatches<'a, S: Source, I> {
    source: &'a S,
    refs: I,
    schema: Schema,
    batch_size: usize,
    ready: VecDeque<CommentRecord>,
    done: bool,
    batches_fetched: usize,
}

impl<'a, S, I> CommentBatches<'a, S, I>
where
    S: Source,
    I: Iterator<Item = Result<CommentRef>>,
{
    pub fn new(source: &'a S, refs: I, schema: Schema, batch_size: usize) -> Self {
        Self {
            source,
            refs,
            schema,
            batch_size: batch_size.max(1),
            ready: VecDeque::new(),
            done: false,
            batches_fetched: 0,
        }
    }

    pub fn batches_fetched(&self) -> usize {
        self.batches_fetched
    }

    /// Pull up to `batch_size` refs. An upstream error ends the stream after it
    /// is reported; refs gathered before it are discarded with the batch.
    fn next_batch(&mut self) -> Result<Vec<CommentRef>> {
        let mut batch = Vec::with_capacity(self.batch_size);
        while batch.len() < self.batch_size {
            match self.refs.next() {
                Some(Ok(r)) => batch.push(r),
                Some(Err(e)) => return Err(e),
                None => {
                    self.done = true;
                    break;
                }
            }
        }
        Ok(batch)
    }

    fn resolve(&mut self, batch: Vec<CommentRef>) -> Result<()> {
        let ids: Vec<String> = batch.iter().map(|r| r.id.clone()).collect();
        let by_id: AHashMap<String, ThreadDescriptor> =
            batch.into_iter().map(|r| (r.id, r.thread)).collect();

        let raw = self.source.comments(&ids, &self.schema)?;
        self.batches_fetched += 1;
        tracing::info!("Fetched {} comments", raw.len());

        for mut obj in raw {
            let id = obj.get("id").and_then(|v| v.as_str()).map(str::to_string);
            let thread = match id.as_deref().and_then(|id| by_id.get(id)) {
                Some(t) => t,
                None => {
                    tracing::warn!("Skipping comment {:?} that was not requested in this batch", id);
                    continue;
                }
            };
            normalize_parent_id(&mut obj);
            thread.merge_into(&mut obj);
            self.ready.push_back(CommentRecord::from_map(obj));
        }
        Ok(())
    }
}

impl<S, I> Iterator for CommentBatches<'_, S, I>
where
    S: Source,
    I: Iterator<Item = Result<CommentRef>>,
{
    type Item = Result<CommentRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.ready.is_empty() {
            if self.done {
                return None;
            }
            let step = self.next_batch().and_then(|batch| {
                if batch.is_empty() { Ok(()) } else { self.resolve(batch) }
            });
            if let Err(e) = step {
                self.done = true;
                return Some(Err(e));
            }
        }
        self.ready.pop_front().map(Ok)
    }
}

/// Chain both stages over a thread stream.
pub fn join_comments<'a, S, I>(
    source: &'a S,
    threads: I,
    schema: Schema,
    batch_size: usize,
) -> CommentBatches<'a, S, CommentRefs<'a, S, I>>
where
    S: Source,
    I: Iterator<Item = Result<ThreadDescriptor>>,
{
    CommentBatches::new(source, CommentRefs::new(source, threads), schema, batch_size)
}
