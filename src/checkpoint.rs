use crate::store::RecordStore;
use std::io;

/// Where to resume: one second before the newest thread already in the store,
/// so that thread is fetched again in full (it may have been cut short by a
/// crash). An empty or absent store resumes from `start_time`.
///
/// Never fails. An unreadable store counts as empty. Malformed rows, including
/// lines that are not valid UTF-8, are left out of the max.
pub fn resolve_cursor(store: &RecordStore, start_time: i64) -> i64 {
    let rows = match store.rows() {
        Ok(rows) => rows,
        Err(e) => {
            tracing::warn!("Cannot read {} ({e:#}); starting from the beginning", store.path().display());
            return start_time;
        }
    };

    let schema = store.schema();
    let mut latest: Option<i64> = None;
    for (n, row) in rows.enumerate() {
        let row = match row {
            Ok(row) => row,
            // The reader has already consumed the offending line.
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                tracing::debug!("Skipping unreadable row {} of {}: {e}", n + 1, store.path().display());
                continue;
            }
            Err(e) => {
                tracing::warn!("Stopped reading {} at row {} ({e})", store.path().display(), n + 1);
                break;
            }
        };
        if let Some(ts) = row.thread_created_utc(schema) {
            latest = Some(latest.map_or(ts, |cur| cur.max(ts)));
        }
    }

    match latest {
        Some(ts) => ts.saturating_sub(1),
        None => start_time,
    }
}
