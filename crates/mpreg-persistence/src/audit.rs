//! JSON Lines audit log of committed events.
//!
//! One file per UTC day (`events_YYYY-MM-DD.jsonl`), opened in append mode.
//! Each line is one `EventEnvelope`, so an interrupted write loses at most
//! the last line.

use crate::error::{PersistenceError, PersistenceResult};
use chrono::Utc;
use mpreg_core::EventEnvelope;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Open file for the current day.
struct ActiveFile {
    writer: BufWriter<File>,
    date: String,
    records_written: usize,
}

/// Buffered audit log writer.
pub struct AuditLogWriter {
    base_dir: PathBuf,
    buffer: Vec<EventEnvelope>,
    /// Buffered envelopes before an automatic flush.
    max_buffer_size: usize,
    active: Option<ActiveFile>,
}

impl AuditLogWriter {
    /// Create a writer rooted at `base_dir`, creating the directory if needed.
    pub fn new(base_dir: impl AsRef<Path>, max_buffer_size: usize) -> PersistenceResult<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&base_dir)?;
        Ok(Self {
            base_dir,
            buffer: Vec::with_capacity(max_buffer_size),
            max_buffer_size: max_buffer_size.max(1),
            active: None,
        })
    }

    /// File the writer uses for `date` (`YYYY-MM-DD`).
    pub fn file_for(&self, date: &str) -> PathBuf {
        self.base_dir.join(format!("events_{date}.jsonl"))
    }

    /// Queue an envelope; flushes once the buffer is full.
    pub fn append(&mut self, envelope: EventEnvelope) -> PersistenceResult<()> {
        self.buffer.push(envelope);
        if self.buffer.len() >= self.max_buffer_size {
            self.flush()?;
        }
        Ok(())
    }

    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Write buffered envelopes to today's file.
    pub fn flush(&mut self) -> PersistenceResult<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        let today = Utc::now().format("%Y-%m-%d").to_string();
        if self.active.as_ref().is_some_and(|a| a.date != today) {
            self.close_active();
        }
        let path = self.file_for(&today);
        let active = match self.active.take() {
            Some(active) => active,
            None => Self::open(&path, &today)?,
        };
        let active = self.active.insert(active);

        let count = self.buffer.len();
        for envelope in &self.buffer {
            let line = serde_json::to_string(envelope)?;
            writeln!(active.writer, "{line}")?;
        }
        active.writer.flush()?;
        active.records_written += count;

        debug!(date = %today, records = count, "Flushed audit events");
        self.buffer.clear();
        Ok(())
    }

    /// Flush pending envelopes and close the file.
    pub fn close(&mut self) -> PersistenceResult<()> {
        self.flush()?;
        self.close_active();
        Ok(())
    }

    fn open(path: &Path, date: &str) -> PersistenceResult<ActiveFile> {
        info!(path = %path.display(), "Opening audit log (append mode)");
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(ActiveFile {
            writer: BufWriter::new(file),
            date: date.to_string(),
            records_written: 0,
        })
    }

    fn close_active(&mut self) {
        if let Some(mut active) = self.active.take() {
            if let Err(e) = active.writer.flush() {
                warn!(?e, "Failed to flush audit log on close");
            }
            info!(
                date = %active.date,
                records = active.records_written,
                "Closed audit log"
            );
        }
    }
}

impl Drop for AuditLogWriter {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            warn!(?e, "Failed to flush audit buffer on drop");
        }
        self.close_active();
    }
}

/// Read every envelope from one audit file.
///
/// A truncated final line (interrupted write) is skipped with a warning;
/// a malformed line anywhere else is an error.
pub fn read_audit_log(path: impl AsRef<Path>) -> PersistenceResult<Vec<EventEnvelope>> {
    let path = path.as_ref();
    let lines = BufReader::new(File::open(path)?)
        .lines()
        .collect::<Result<Vec<_>, _>>()?;

    let last = lines.len().saturating_sub(1);
    let mut envelopes = Vec::with_capacity(lines.len());
    for (n, line) in lines.iter().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str(line) {
            Ok(envelope) => envelopes.push(envelope),
            Err(e) if n == last => {
                warn!(path = %path.display(), line = n + 1, ?e, "Skipping truncated audit line");
            }
            Err(e) => {
                return Err(PersistenceError::Corrupt {
                    path: path.to_path_buf(),
                    reason: format!("line {}: {e}", n + 1),
                })
            }
        }
    }
    Ok(envelopes)
}
