//! Write-Ahead Log (WAL) for append-only records.
//!
//! Records are appended to a JSONL (JSON Lines) file with file locking
//! to ensure safe concurrent access. The assistant audit trail is the
//! main user.

use crate::Result;
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Sink trait for persisting append-only records
pub trait RecordSink<T> {
    fn append(&mut self, record: &T) -> Result<()>;
}

/// In-memory sink, handy when persistence is not wanted
impl<T: Clone> RecordSink<T> for Vec<T> {
    fn append(&mut self, record: &T) -> Result<()> {
        self.push(record.clone());
        Ok(())
    }
}

/// Exclusive hold on a journal's sidecar `<journal>.lock` file
///
/// Appends and rollups both take this lock. The sidecar is never renamed,
/// so a rollup that archives the journal cannot race a writer that opened
/// the journal just before the rename. Released on drop.
pub struct JournalLock {
    file: File,
}

impl JournalLock {
    pub fn acquire(journal: &Path) -> Result<Self> {
        let mut name = journal.as_os_str().to_owned();
        name.push(".lock");
        let lock_path = PathBuf::from(name);
        if let Some(parent) = lock_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .open(&lock_path)?;
        file.lock_exclusive()?;
        Ok(Self { file })
    }
}

impl Drop for JournalLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            tracing::warn!("Failed to release journal lock: {}", e);
        }
    }
}

/// JSONL-based record sink with file locking
pub struct JsonlSink {
    path: PathBuf,
}

impl JsonlSink {
    /// Create a new JSONL sink for the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl<T: Serialize> RecordSink<T> for JsonlSink {
    fn append(&mut self, record: &T) -> Result<()> {
        let _journal = JournalLock::acquire(&self.path)?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        // Keeps shared-lock readers from seeing a half-written line
        file.lock_exclusive()?;

        let mut writer = std::io::BufWriter::new(&file);
        let line = serde_json::to_string(record)?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        drop(writer);

        file.unlock()?;

        tracing::debug!("Appended record to WAL {:?}", self.path);
        Ok(())
    }
}

/// Read all records from a WAL file
///
/// Lines that fail to parse are skipped with a warning.
pub fn read_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    file.lock_shared()?;

    let reader = BufReader::new(&file);
    let mut records = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<T>(&line) {
            Ok(record) => records.push(record),
            Err(e) => {
                tracing::warn!("Failed to parse record at line {}: {}", line_num + 1, e);
            }
        }
    }

    file.unlock()?;
    tracing::debug!("Read {} records from WAL", records.len());
    Ok(records)
}
