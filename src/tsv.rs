//! Tab-separated rows compatible with the `excel-tab` dialect: a field is wrapped in
//! double quotes when it contains a tab, newline, carriage return or quote, and
//! embedded quotes are doubled. Quoted fields may span several physical lines.

use crate::util::{create_with_backoff, open_append_with_backoff, open_with_backoff, replace_file_atomic_backoff};
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

fn needs_quoting(field: &str) -> bool {
    field.contains(['\t', '\n', '\r', '"'])
}

/// Encode one row (no trailing newline handling; callers use `write_row`).
pub fn encode_row<S: AsRef<str>>(fields: &[S], out: &mut String) {
    for (i, f) in fields.iter().enumerate() {
        if i > 0 {
            out.push('\t');
        }
        let f = f.as_ref();
        if needs_quoting(f) {
            out.push('"');
            out.push_str(&f.replace('"', "\"\""));
            out.push('"');
        } else {
            out.push_str(f);
        }
    }
}

/// Buffered row reader. Handles quoted fields spanning lines and `\r\n` endings.
pub struct TsvReader<R: BufRead> {
    rdr: R,
    line: String,
}

impl TsvReader<BufReader<File>> {
    pub fn open(path: &Path, buf_bytes: usize) -> io::Result<Self> {
        let f = open_with_backoff(path, 16, 50)?;
        Ok(Self::new(BufReader::with_capacity(buf_bytes.max(8 * 1024), f)))
    }
}

impl<R: BufRead> TsvReader<R> {
    pub fn new(rdr: R) -> Self {
        Self { rdr, line: String::with_capacity(4 * 1024) }
    }

    /// Read the next row. Returns `Ok(None)` on EOF. Blank lines yield an empty row.
    pub fn read_row(&mut self) -> io::Result<Option<Vec<String>>> {
        self.line.clear();
        if self.rdr.read_line(&mut self.line)? == 0 {
            return Ok(None);
        }

        let mut fields = Vec::new();
        let mut field = String::new();
        let mut in_quotes = false;
        let mut at_field_start = true;
        let mut pos = 0;

        loop {
            let rest = &self.line[pos..];
            let mut chars = rest.char_indices().peekable();
            let mut consumed = rest.len();
            let mut row_done = false;

            while let Some((i, c)) = chars.next() {
                if in_quotes {
                    if c == '"' {
                        if matches!(chars.peek(), Some((_, '"'))) {
                            chars.next();
                            field.push('"');
                        } else {
                            in_quotes = false;
                        }
                    } else {
                        field.push(c);
                    }
                    continue;
                }
                match c {
                    '"' if at_field_start => {
                        in_quotes = true;
                        at_field_start = false;
                    }
                    '\t' => {
                        fields.push(std::mem::take(&mut field));
                        at_field_start = true;
                    }
                    '\n' => {
                        consumed = i + 1;
                        row_done = true;
                        break;
                    }
                    '\r' if matches!(chars.peek(), Some((_, '\n')) | None) => {}
                    _ => {
                        field.push(c);
                        at_field_start = false;
                    }
                }
            }
            pos += consumed;

            if row_done || !in_quotes {
                break;
            }
            // Quoted field continues on the next physical line.
            if self.rdr.read_line(&mut self.line)? == 0 {
                break;
            }
        }

        if !(fields.is_empty() && field.is_empty()) {
            fields.push(field);
        }
        Ok(Some(fields))
    }
}

impl<R: BufRead> Iterator for TsvReader<R> {
    type Item = io::Result<Vec<String>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_row().transpose()
    }
}

/// Buffered row writer with robust file creation.
pub struct TsvWriter {
    path: PathBuf,
    w: Option<BufWriter<File>>,
    scratch: String,
}

impl TsvWriter {
    /// Truncate-or-create `path`.
    pub fn create(path: &Path, buf_bytes: usize) -> io::Result<Self> {
        let f = create_with_backoff(path, 16, 50)?;
        Ok(Self::from_file(path, f, buf_bytes))
    }

    /// Open `path` for appending, creating it if missing.
    pub fn append(path: &Path, buf_bytes: usize) -> io::Result<Self> {
        let f = open_append_with_backoff(path, 16, 50)?;
        Ok(Self::from_file(path, f, buf_bytes))
    }

    fn from_file(path: &Path, f: File, buf_bytes: usize) -> Self {
        Self {
            path: path.to_path_buf(),
            w: Some(BufWriter::with_capacity(buf_bytes.max(8 * 1024), f)),
            scratch: String::with_capacity(4 * 1024),
        }
    }

    pub fn write_row<S: AsRef<str>>(&mut self, fields: &[S]) -> io::Result<()> {
        self.scratch.clear();
        encode_row(fields, &mut self.scratch);
        self.scratch.push_str("\r\n");
        if let Some(w) = &mut self.w {
            w.write_all(self.scratch.as_bytes())?;
        }
        Ok(())
    }

    /// Push buffered rows down to the OS.
    pub fn flush(&mut self) -> io::Result<()> {
        if let Some(w) = &mut self.w {
            w.flush()?;
        }
        Ok(())
    }

    pub fn finish(mut self) -> io::Result<()> {
        if let Some(mut w) = self.w.take() {
            w.flush()?;
        }
        Ok(())
    }

    /// Flushes and atomically promotes the temp file to `final_path`.
    pub fn finish_atomic(mut self, final_path: &Path) -> Result<()> {
        if let Some(mut w) = self.w.take() {
            w.flush().with_context(|| format!("flush {}", self.path.display()))?;
        }
        replace_file_atomic_backoff(&self.path, final_path)
    }
}
