// Store routing module
// Maps each target file to the checksum store that owns its record

use std::path::{Path, PathBuf};

use log::warn;

use crate::cli::Config;
use crate::digest::Algorithm;
use crate::paths;
use crate::record::ChecksumRecord;
use crate::store::ChecksumStore;

/// Resolves, opens and flushes checksum stores for the duration of a run.
///
/// At most one store is open at a time: switching to a target whose store
/// lives elsewhere closes the previous one (purging it when configured and
/// saving it when dirty), so each store is written at most once per run.
pub struct StoreRouter {
    store_path: PathBuf,
    single_store: bool,
    console_only: bool,
    local: bool,
    absolute_paths: bool,
    purge: bool,
    hide: bool,
    current: Option<ChecksumStore>,
    read_failed: bool,
    write_failed: bool,
}

impl StoreRouter {
    pub fn new(config: &Config) -> Self {
        Self {
            store_path: config.store_file.clone(),
            single_store: config.single_store,
            console_only: config.console_only,
            local: config.local,
            absolute_paths: config.absolute_paths,
            purge: config.purge,
            hide: config.hide,
            current: None,
            read_failed: false,
            write_failed: false,
        }
    }

    /// Lowercased file name of the configured store, used by the engines to
    /// skip the store file itself while scanning
    pub fn store_file_name(&self) -> String {
        self.store_path
            .file_name()
            .map(|name| name.to_string_lossy().to_lowercase())
            .unwrap_or_default()
    }

    /// True when any store load failed during this run
    pub fn read_failed(&self) -> bool {
        self.read_failed
    }

    /// True when any store flush failed during this run
    pub fn write_failed(&self) -> bool {
        self.write_failed
    }

    fn resolve_store_path(&self, target: &Path) -> PathBuf {
        if self.single_store {
            return self.store_path.clone();
        }
        let name = match self.store_path.file_name() {
            Some(name) => name,
            None => return self.store_path.clone(),
        };
        let dir = if self.local {
            target
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."))
        } else {
            PathBuf::from(".")
        };
        paths::absolutize(&dir.join(name))
    }

    /// Get the store owning `target`, opening it (and closing the previously
    /// open store) when the resolved location changed
    pub fn store_for(&mut self, target: &Path) -> &mut ChecksumStore {
        let store_path = self.resolve_store_path(target);
        let current = match self.current.take() {
            Some(store) if store.path() == store_path => store,
            stale => {
                if let Some(store) = stale {
                    self.close_store(store);
                }
                if self.console_only {
                    ChecksumStore::unloaded(store_path)
                } else {
                    ChecksumStore::open(store_path)
                }
            }
        };
        if current.read_failed() {
            self.read_failed = true;
        }
        self.current.insert(current)
    }

    /// Merge a freshly computed digest into the owning store, converting the
    /// target to the store's path convention (absolute, or relative to the
    /// store's folder) and dropping any stale record under either form
    pub fn update(&mut self, target: &Path, algorithm: Algorithm, digest: Vec<u8>) -> ChecksumRecord {
        let absolute_paths = self.absolute_paths;
        let store = self.store_for(target);
        let store_dir = store.path().parent().map(Path::to_path_buf).unwrap_or_default();

        let raw = target.to_string_lossy().into_owned();
        store.remove(&raw);

        let stored = if absolute_paths {
            raw
        } else {
            let relative = paths::relative_to(&store_dir, target);
            store.remove(&relative);
            relative
        };

        store.upsert(&stored, algorithm.name(), digest)
    }

    /// Look up the record for `target`, trying the raw path first and the
    /// store-relative form second
    pub fn record_for(&mut self, target: &Path) -> Option<ChecksumRecord> {
        let store = self.store_for(target);
        let store_dir = store.path().parent().map(Path::to_path_buf).unwrap_or_default();

        let raw = target.to_string_lossy();
        if let Some(record) = store.lookup(&raw) {
            return Some(record.clone());
        }

        let relative = paths::relative_to(&store_dir, target);
        store.lookup(&relative).cloned()
    }

    /// Flush whatever store is currently open; called once at shutdown and
    /// also on the interrupt path
    pub fn close(&mut self) {
        if let Some(store) = self.current.take() {
            self.close_store(store);
        }
    }

    fn close_store(&mut self, mut store: ChecksumStore) {
        if self.console_only {
            return;
        }
        if self.purge {
            store.purge(true);
        }
        if store.is_dirty() {
            if let Err(err) = store.save(self.hide) {
                warn!("{}", err);
                self.write_failed = true;
            }
        }
    }
}
