use crate::progress::ProgressScope;
use crate::record::{CommentRecord, StoredRow};
use crate::schema::Schema;
use crate::tsv::{TsvReader, TsvWriter};
use crate::util::open_append_with_backoff;
use ahash::AHashSet;
use anyhow::{Context, Result};
use std::io;
use std::path::{Path, PathBuf};

/// Append-only TSV file of comment rows. Absent is equivalent to empty.
#[derive(Clone, Debug)]
pub struct RecordStore {
    path: PathBuf,
    schema: Schema,
    read_buf_bytes: usize,
    write_buf_bytes: usize,
}

impl RecordStore {
    pub fn new(path: impl AsRef<Path>, schema: Schema) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            schema,
            read_buf_bytes: 256 * 1024,
            write_buf_bytes: 64 * 1024,
        }
    }

    pub fn with_io_buffers(mut self, read_bytes: usize, write_bytes: usize) -> Self {
        self.read_buf_bytes = read_bytes;
        self.write_buf_bytes = write_bytes;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Create the store file if missing. Existing rows are never touched.
    pub fn ensure_exists(&self) -> Result<()> {
        open_append_with_backoff(&self.path, 16, 50)
            .with_context(|| format!("create {}", self.path.display()))?;
        Ok(())
    }

    /// Rewrite the header artifact (the column list) at `columns_path`.
    pub fn write_columns_file(&self, columns_path: &Path) -> Result<()> {
        let mut w = TsvWriter::create(columns_path, 8 * 1024)
            .with_context(|| format!("create {}", columns_path.display()))?;
        w.write_row(self.schema.fields())?;
        w.finish().with_context(|| format!("flush {}", columns_path.display()))?;
        Ok(())
    }

    /// Iterate every stored row in file order. A missing store yields nothing.
    pub fn rows(&self) -> Result<Box<dyn Iterator<Item = io::Result<StoredRow>>>> {
        match TsvReader::open(&self.path, self.read_buf_bytes) {
            Ok(r) => Ok(Box::new(
                r.filter(|row| !matches!(row, Ok(cells) if cells.is_empty()))
                    .map(|row| row.map(|cells| StoredRow { cells })),
            )),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Box::new(std::iter::empty())),
            Err(e) => Err(e).with_context(|| format!("open {}", self.path.display())),
        }
    }

    /// Stream `records` into the store, flushing each row before pulling the
    /// next one. Returns the number of rows appended, or the first error from
    /// the stream once every earlier row is on disk.
    pub fn append_all<I>(&self, records: I, progress: Option<&ProgressScope>) -> Result<u64>
    where
        I: IntoIterator<Item = Result<CommentRecord>>,
    {
        let mut w = TsvWriter::append(&self.path, self.write_buf_bytes)
            .with_context(|| format!("open {} for append", self.path.display()))?;
        let mut written = 0u64;

        for rec in records {
            let rec = match rec {
                Ok(r) => r,
                Err(e) => {
                    w.finish().with_context(|| format!("flush {}", self.path.display()))?;
                    return Err(e);
                }
            };
            w.write_row(&rec.to_row(&self.schema))?;
            w.flush().with_context(|| format!("flush {}", self.path.display()))?;
            written += 1;
            if let Some(pb) = progress {
                pb.inc_items(1);
            }
        }

        w.finish().with_context(|| format!("flush {}", self.path.display()))?;
        Ok(written)
    }

    /// Write every row whose `id` has not been seen before to a fresh `output`,
    /// in first-occurrence order. The output is built next to the target and
    /// promoted atomically. Returns the number of unique rows.
    pub fn deduplicate(&self, output: &Path) -> Result<usize> {
        let tmp = output.with_extension("tsv.inprogress");
        let mut w = TsvWriter::create(&tmp, self.write_buf_bytes)
            .with_context(|| format!("create {}", tmp.display()))?;
        let mut seen: AHashSet<String> = AHashSet::with_capacity(64_000);

        for row in self.rows()? {
            let row = row.with_context(|| format!("read {}", self.path.display()))?;
            let id = row.id(&self.schema).unwrap_or_default();
            if seen.contains(id) {
                continue;
            }
            w.write_row(&row.cells)?;
            seen.insert(id.to_string());
        }

        w.finish_atomic(output)?;
        Ok(seen.len())
    }
}
