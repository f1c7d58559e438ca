// Checksum store module
// Loads, indexes and persists the flat text store of digest records

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::error::HashkeepError;
use crate::paths;
use crate::record::ChecksumRecord;

/// In-memory view of one checksum store file.
///
/// Records are keyed by their normalized path; iteration and save order is
/// ascending key, so output is deterministic regardless of insertion order.
pub struct ChecksumStore {
    path: PathBuf,
    entries: BTreeMap<String, ChecksumRecord>,
    dirty: bool,
    read_failed: bool,
}

impl ChecksumStore {
    /// Open a store bound to `path`, loading its contents when the file
    /// exists. A missing file is not an error; the store starts empty.
    /// An unreadable existing file is logged and treated as empty too,
    /// with `read_failed` set for diagnostics.
    pub fn open(path: PathBuf) -> Self {
        let mut store = Self::unloaded(path);
        store.load();
        store
    }

    /// Create a store bound to `path` without touching the disk
    pub fn unloaded(path: PathBuf) -> Self {
        Self {
            path: paths::absolutize(&path),
            entries: BTreeMap::new(),
            dirty: false,
            read_failed: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn read_failed(&self) -> bool {
        self.read_failed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate records in key order
    pub fn records(&self) -> impl Iterator<Item = &ChecksumRecord> {
        self.entries.values()
    }

    fn load(&mut self) {
        let raw = match fs::read(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return,
            Err(err) => {
                warn!("failed to read hash store {}: {}", self.path.display(), err);
                self.read_failed = true;
                return;
            }
        };

        // Decode line by line: one undecodable line must not discard the
        // rest of the store
        let text = raw.strip_suffix(b"\n").unwrap_or(&raw);
        if text.is_empty() {
            return;
        }
        for (index, line) in text.split(|&b| b == b'\n').enumerate() {
            let line = line.strip_suffix(b"\r").unwrap_or(line);
            let record = match std::str::from_utf8(line) {
                Ok(line) => ChecksumRecord::parse(line),
                Err(_) => ChecksumRecord::malformed(&String::from_utf8_lossy(line)),
            };
            let key = match record.key() {
                Some(key) => key,
                // NUL cannot appear in a text line, so this key can never
                // collide with a real path key
                None => format!("\u{0}{:08}", index),
            };
            self.entries.insert(key, record);
        }

        debug!("loaded {} entries from {}", self.entries.len(), self.path.display());
    }

    /// Look up the record for a path, tolerating both the stored convention
    /// (no `./` prefix) and the raw form
    pub fn lookup(&self, path: &str) -> Option<&ChecksumRecord> {
        self.entries
            .get(&path.to_lowercase())
            .or_else(|| self.entries.get(&paths::key(path)))
    }

    /// Replace any record for `path` with a fresh one carrying `digest`.
    /// The new record is flagged as updated for this run.
    pub fn upsert(&mut self, path: &str, algorithm: &str, digest: Vec<u8>) -> ChecksumRecord {
        self.remove(path);
        let mut record = ChecksumRecord::new(path, algorithm, digest);
        record.updated = true;
        self.entries.insert(paths::key(path), record.clone());
        self.dirty = true;
        record
    }

    /// Remove the record for `path` under both key variants; the store is
    /// marked dirty only when something was actually removed
    pub fn remove(&mut self, path: &str) -> bool {
        let mut removed = self.entries.remove(&path.to_lowercase()).is_some();
        removed |= self.entries.remove(&paths::key(path)).is_some();
        if removed {
            self.dirty = true;
        }
        removed
    }

    /// Drop every record that was not refreshed during this run, keeping
    /// malformed lines when `keep_malformed` is set
    pub fn purge(&mut self, keep_malformed: bool) {
        let before = self.entries.len();
        self.entries
            .retain(|_, record| (keep_malformed && record.is_malformed()) || record.updated);
        if self.entries.len() != before {
            self.dirty = true;
        }
    }

    /// Serialize all records in key order and atomically replace the store
    /// file via a sibling temp file. The dirty flag is cleared only on
    /// success, so a failed save can be retried within the run.
    ///
    /// `hide` requests the platform "hidden" attribute on the saved file;
    /// that attribute only exists on Windows and the request is a no-op
    /// elsewhere.
    pub fn save(&mut self, hide: bool) -> Result<(), HashkeepError> {
        let mut out = String::new();
        for record in self.entries.values() {
            out.push_str(&record.format());
            out.push('\n');
        }

        let file_name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "hashkeep.chk".to_string());
        let temp = self.path.with_file_name(format!("{}.tmp", file_name));

        fs::write(&temp, out).map_err(|err| HashkeepError::StoreWriteError {
            path: self.path.clone(),
            source: err,
        })?;
        fs::rename(&temp, &self.path).map_err(|err| {
            let _ = fs::remove_file(&temp);
            HashkeepError::StoreWriteError {
                path: self.path.clone(),
                source: err,
            }
        })?;

        let _ = hide; // hidden attribute is Windows-only; nothing to set here

        debug!("wrote {} entries to {}", self.entries.len(), self.path.display());
        self.dirty = false;
        Ok(())
    }
}
