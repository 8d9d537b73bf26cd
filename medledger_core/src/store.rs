//! Medication persistence.
//!
//! Medications own their intake logs, so every store operation reads or
//! writes a medication together with its complete log. Deleting a medication
//! therefore removes its log entries with it.
//!
//! [`JsonFileStore`] keeps all medications in one JSON document and is safe
//! to share between processes (the CLI, a widget refresher, automation
//! hooks):
//! - readers hold a shared lock on a sidecar `.lock` file,
//! - writers hold an exclusive lock across the whole read-modify-write,
//! - the document is replaced atomically (temp file, fsync, rename).

use crate::{Error, Medication, Result};
use chrono::Utc;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// File name of the medication document inside the data directory
pub const STORE_FILE_NAME: &str = "medications.json";

/// Current on-disk document version
const STORE_VERSION: u32 = 1;

/// Durable record store for medications and their logs
pub trait MedicationStore {
    /// Add a new medication; fails if its id is already stored
    fn insert(&mut self, medication: Medication) -> Result<()>;

    /// All medications, in insertion order
    fn fetch_all(&self) -> Result<Vec<Medication>>;

    fn fetch(&self, id: &str) -> Result<Option<Medication>> {
        Ok(self.fetch_all()?.into_iter().find(|med| med.id == id))
    }

    fn fetch_where<P>(&self, predicate: P) -> Result<Vec<Medication>>
    where
        P: Fn(&Medication) -> bool,
        Self: Sized,
    {
        Ok(self
            .fetch_all()?
            .into_iter()
            .filter(|med| predicate(med))
            .collect())
    }

    /// Remove a medication and every log entry it owns
    fn delete(&mut self, id: &str) -> Result<Medication>;

    /// Persist in-place edits to a previously fetched medication
    ///
    /// Fails with [`Error::Conflict`] if the stored revision moved on since
    /// `medication` was fetched. On success the revision is bumped in both
    /// the store and `medication`.
    fn commit(&mut self, medication: &mut Medication) -> Result<()>;

    /// Load, modify and persist one medication as a single durable write
    ///
    /// If `f` fails nothing is written. Returns the committed medication.
    fn transact<F>(&mut self, id: &str, f: F) -> Result<Medication>
    where
        F: FnOnce(&mut Medication) -> Result<()>,
        Self: Sized;
}

fn check_revision(stored: &Medication, incoming: &Medication) -> Result<()> {
    if stored.revision != incoming.revision {
        return Err(Error::Conflict {
            id: incoming.id.clone(),
            expected: incoming.revision,
            found: stored.revision,
        });
    }
    Ok(())
}

// ============================================================================
// In-memory store
// ============================================================================

/// Vec-backed store for tests and embedding
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    medications: Vec<Medication>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, id: &str) -> Result<usize> {
        self.medications
            .iter()
            .position(|med| med.id == id)
            .ok_or_else(|| Error::MedicationNotFound(id.to_string()))
    }
}

impl MedicationStore for MemoryStore {
    fn insert(&mut self, medication: Medication) -> Result<()> {
        if self.medications.iter().any(|med| med.id == medication.id) {
            return Err(Error::DuplicateId(medication.id));
        }
        self.medications.push(medication);
        Ok(())
    }

    fn fetch_all(&self) -> Result<Vec<Medication>> {
        Ok(self.medications.clone())
    }

    fn delete(&mut self, id: &str) -> Result<Medication> {
        let idx = self.position(id)?;
        Ok(self.medications.remove(idx))
    }

    fn commit(&mut self, medication: &mut Medication) -> Result<()> {
        let idx = self.position(&medication.id)?;
        check_revision(&self.medications[idx], medication)?;
        medication.revision += 1;
        self.medications[idx] = medication.clone();
        Ok(())
    }

    fn transact<F>(&mut self, id: &str, f: F) -> Result<Medication>
    where
        F: FnOnce(&mut Medication) -> Result<()>,
    {
        let idx = self.position(id)?;
        let mut working = self.medications[idx].clone();
        f(&mut working)?;
        working.revision += 1;
        self.medications[idx] = working.clone();
        Ok(working)
    }
}

// ============================================================================
// JSON file store
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
struct StoreDocument {
    version: u32,
    #[serde(default)]
    medications: Vec<Medication>,
}

impl Default for StoreDocument {
    fn default() -> Self {
        Self {
            version: STORE_VERSION,
            medications: Vec::new(),
        }
    }
}

impl StoreDocument {
    fn position(&self, id: &str) -> Result<usize> {
        self.medications
            .iter()
            .position(|med| med.id == id)
            .ok_or_else(|| Error::MedicationNotFound(id.to_string()))
    }
}

/// Held advisory lock on the store's sidecar lock file
struct StoreLock {
    file: File,
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

/// Append `suffix` to the file name of `path`
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| STORE_FILE_NAME.into());
    name.push(suffix);
    path.with_file_name(name)
}

/// Single-document JSON store with cross-process file locking
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    lock_path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let lock_path = sibling(&path, ".lock");
        Self { path, lock_path }
    }

    /// Store at `<data_dir>/medications.json`
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join(STORE_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    fn lock(&self, exclusive: bool) -> Result<StoreLock> {
        std::fs::create_dir_all(self.parent_dir())?;
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(&self.lock_path)?;
        if exclusive {
            file.lock_exclusive()?;
        } else {
            file.lock_shared()?;
        }
        Ok(StoreLock { file })
    }

    /// Read the document; caller must hold the lock
    ///
    /// An unparseable document is quarantined when `writable`, otherwise
    /// ignored, and the store reads as empty either way.
    fn read_document(&self, writable: bool) -> Result<StoreDocument> {
        if !self.path.exists() {
            tracing::debug!("No store file at {:?}, starting empty", self.path);
            return Ok(StoreDocument::default());
        }

        let mut contents = String::new();
        BufReader::new(File::open(&self.path)?).read_to_string(&mut contents)?;
        if contents.trim().is_empty() {
            return Ok(StoreDocument::default());
        }

        let document = match serde_json::from_str::<StoreDocument>(&contents) {
            Ok(document) => document,
            Err(e) => {
                if writable {
                    let quarantine = sibling(
                        &self.path,
                        &format!(".corrupt-{}", Utc::now().format("%Y%m%d%H%M%S")),
                    );
                    std::fs::rename(&self.path, &quarantine)?;
                    tracing::warn!(
                        "Failed to parse store {:?}: {}. Moved it to {:?} and starting empty.",
                        self.path,
                        e,
                        quarantine
                    );
                } else {
                    tracing::warn!(
                        "Failed to parse store {:?}: {}. Reading as empty.",
                        self.path,
                        e
                    );
                }
                return Ok(StoreDocument::default());
            }
        };

        if document.version > STORE_VERSION {
            return Err(Error::Invalid(format!(
                "store {:?} has version {}, newer than supported version {}",
                self.path, document.version, STORE_VERSION
            )));
        }

        tracing::debug!(
            "Read {} medications from {:?}",
            document.medications.len(),
            self.path
        );
        Ok(document)
    }

    /// Atomically replace the document; caller must hold the exclusive lock
    fn write_document(&self, document: &StoreDocument) -> Result<()> {
        let temp = NamedTempFile::new_in(self.parent_dir())?;
        {
            let mut writer = BufWriter::new(temp.as_file());
            serde_json::to_writer(&mut writer, document)?;
            writer.flush()?;
        }
        temp.as_file().sync_all()?;
        temp.persist(&self.path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!(
            "Wrote {} medications to {:?}",
            document.medications.len(),
            self.path
        );
        Ok(())
    }

    fn read_locked(&self) -> Result<StoreDocument> {
        let _lock = self.lock(false)?;
        self.read_document(false)
    }

    /// Run `f` on the document under the exclusive lock and write it back if `f` succeeds
    fn update<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut StoreDocument) -> Result<T>,
    {
        let _lock = self.lock(true)?;
        let mut document = self.read_document(true)?;
        document.version = STORE_VERSION;
        let out = f(&mut document)?;
        self.write_document(&document)?;
        Ok(out)
    }
}

impl MedicationStore for JsonFileStore {
    fn insert(&mut self, medication: Medication) -> Result<()> {
        self.update(|document| {
            if document.medications.iter().any(|med| med.id == medication.id) {
                return Err(Error::DuplicateId(medication.id));
            }
            tracing::debug!("Inserting medication {} ({})", medication.name, medication.id);
            document.medications.push(medication);
            Ok(())
        })
    }

    fn fetch_all(&self) -> Result<Vec<Medication>> {
        Ok(self.read_locked()?.medications)
    }

    fn delete(&mut self, id: &str) -> Result<Medication> {
        self.update(|document| {
            let idx = document.position(id)?;
            Ok(document.medications.remove(idx))
        })
    }

    fn commit(&mut self, medication: &mut Medication) -> Result<()> {
        let committed = self.update(|document| {
            let idx = document.position(&medication.id)?;
            check_revision(&document.medications[idx], medication)?;
            let mut next = medication.clone();
            next.revision += 1;
            document.medications[idx] = next.clone();
            Ok(next)
        })?;
        medication.revision = committed.revision;
        Ok(())
    }

    fn transact<F>(&mut self, id: &str, f: F) -> Result<Medication>
    where
        F: FnOnce(&mut Medication) -> Result<()>,
    {
        self.update(|document| {
            let idx = document.position(id)?;
            let mut working = document.medications[idx].clone();
            f(&mut working)?;
            working.revision += 1;
            document.medications[idx] = working.clone();
            Ok(working)
        })
    }
}
