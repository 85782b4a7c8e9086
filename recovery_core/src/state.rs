//! Patient record persistence with file locking.
//!
//! Each patient's record is one JSON document under
//! `<data_dir>/patients/<patient_id>.json`. Reads take a shared lock and
//! writes go through a locked temp file that is renamed into place.
//! Load-modify-save cycles are serialized on a sidecar `<patient_id>.lock`
//! so concurrent processes never drop each other's changes.

use crate::{Error, PatientRecord, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

impl PatientRecord {
    /// Load a record from a file with shared locking
    ///
    /// Returns an empty record if the file doesn't exist. A file that cannot
    /// be parsed is moved aside (see [`quarantine_path`]) and an empty record
    /// is returned, so the next save does not destroy the evidence.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("No patient record at {:?}, starting empty", path);
            return Ok(Self::default());
        }

        let file = File::open(path)?;
        file.lock_shared()?;

        let mut contents = String::new();
        let mut reader = std::io::BufReader::new(&file);
        let read_result = reader.read_to_string(&mut contents);
        drop(reader);
        file.unlock()?;
        read_result?;

        match serde_json::from_str::<PatientRecord>(&contents) {
            Ok(record) => {
                tracing::debug!("Loaded patient record from {:?}", path);
                Ok(record)
            }
            Err(e) => {
                let quarantine = quarantine_path(path);
                tracing::warn!(
                    "Failed to parse patient record {:?}: {}. Moved to {:?}, starting empty.",
                    path,
                    e,
                    quarantine
                );
                std::fs::rename(path, &quarantine)?;
                Ok(Self::default())
            }
        }
    }

    /// Save the record to a file with exclusive locking
    ///
    /// Atomically writes the record by:
    /// 1. Writing to a temp file
    /// 2. Syncing to disk
    /// 3. Renaming over the original
    pub fn save(&self, path: &Path) -> Result<()> {
        let parent = path
            .parent()
            .ok_or_else(|| Error::State(format!("record path {:?} has no parent", path)))?;
        std::fs::create_dir_all(parent)?;

        let temp = NamedTempFile::new_in(parent)?;
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string(self)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        temp.persist(path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved patient record to {:?}", path);
        Ok(())
    }

    /// Load the record, modify it, and save it back
    ///
    /// The whole cycle runs under an exclusive lock on the record's sidecar
    /// lock file. The closure's return value is handed back to the caller;
    /// if the closure fails nothing is written.
    pub fn update<F, T>(path: &Path, f: F) -> Result<T>
    where
        F: FnOnce(&mut PatientRecord) -> Result<T>,
    {
        let lock = lock_record(path)?;

        let result = Self::load(path).and_then(|mut record| {
            let value = f(&mut record)?;
            record.save(path)?;
            Ok(value)
        });

        lock.unlock()?;
        result
    }
}

/// Take the writer lock for the record at `path`
fn lock_record(path: &Path) -> Result<File> {
    let parent = path
        .parent()
        .ok_or_else(|| Error::State(format!("record path {:?} has no parent", path)))?;
    std::fs::create_dir_all(parent)?;

    let lock = OpenOptions::new()
        .create(true)
        .write(true)
        .open(path.with_extension("lock"))?;
    lock.lock_exclusive()?;
    Ok(lock)
}

/// First free `<name>.corrupt`, `<name>.corrupt.1`, ... next to `path`
fn quarantine_path(path: &Path) -> PathBuf {
    let base = path.with_extension("json.corrupt");
    let mut candidate = base.clone();
    let mut n = 1;
    while candidate.exists() {
        let mut name = base.clone().into_os_string();
        name.push(format!(".{}", n));
        candidate = PathBuf::from(name);
        n += 1;
    }
    candidate
}

/// Locates patient records inside a data directory
#[derive(Clone, Debug)]
pub struct PatientStore {
    dir: PathBuf,
}

impl PatientStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            dir: data_dir.join("patients"),
        }
    }

    /// Path of a patient's record file
    ///
    /// Ids are limited to ASCII letters, digits, `-` and `_` so they can
    /// never escape the patients directory.
    pub fn record_path(&self, patient_id: &str) -> Result<PathBuf> {
        let valid = !patient_id.is_empty()
            && patient_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(Error::Validation(format!(
                "invalid patient id '{}': use letters, digits, '-' or '_'",
                patient_id
            )));
        }
        Ok(self.dir.join(format!("{}.json", patient_id)))
    }

    pub fn load(&self, patient_id: &str) -> Result<PatientRecord> {
        PatientRecord::load(&self.record_path(patient_id)?)
    }

    pub fn update<F, T>(&self, patient_id: &str, f: F) -> Result<T>
    where
        F: FnOnce(&mut PatientRecord) -> Result<T>,
    {
        PatientRecord::update(&self.record_path(patient_id)?, f)
    }
}
