//! Load-once dataset cache.
//!
//! Contract: a [`DatasetCache`] is bound to one path for its whole lifetime.
//! The first successful [`DatasetCache::load`] parses the file; every later
//! call returns the same shared table. A failed load stores nothing, so the
//! caller sees the error and may retry. There is no eviction: the only way to
//! pick up a changed file is a new cache (in practice, a process restart).
//!
//! The process-wide session cache is installed once with [`install`] and read
//! with [`session`] / [`session_table`].

use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use super::error::{CacheError, LoadError};
use super::loader::load_file;
use super::model::SalesTable;

static SESSION: OnceLock<DatasetCache> = OnceLock::new();

/// A dataset path plus the table parsed from it, once loaded.
#[derive(Debug)]
pub struct DatasetCache {
    path: PathBuf,
    table: OnceLock<Arc<SalesTable>>,
}

impl DatasetCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            table: OnceLock::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Return the cached table, loading it on first use.
    pub fn load(&self) -> Result<Arc<SalesTable>, LoadError> {
        if let Some(table) = self.table.get() {
            log::debug!("Dataset cache hit for {}", self.path.display());
            return Ok(Arc::clone(table));
        }
        let table = Arc::new(load_file(&self.path)?);
        Ok(Arc::clone(self.table.get_or_init(|| table)))
    }

    /// The cached table, without triggering a load.
    pub fn get(&self) -> Option<Arc<SalesTable>> {
        self.table.get().cloned()
    }

    pub fn is_loaded(&self) -> bool {
        self.table.get().is_some()
    }
}

/// Install the process-wide cache for `path`.
///
/// Installing the same path again is a no-op; a different path is rejected.
pub fn install(path: impl Into<PathBuf>) -> Result<&'static DatasetCache, CacheError> {
    let path = path.into();
    let mut installed_now = false;
    let cache = SESSION.get_or_init(|| {
        installed_now = true;
        DatasetCache::new(path.clone())
    });
    if !installed_now && cache.path() != path {
        return Err(CacheError::AlreadyInstalled(cache.path().to_path_buf()));
    }
    Ok(cache)
}

/// The installed process-wide cache.
pub fn session() -> Result<&'static DatasetCache, CacheError> {
    SESSION.get().ok_or(CacheError::NotInstalled)
}

/// Load (or reuse) the process-wide table.
pub fn session_table() -> Result<Arc<SalesTable>, CacheError> {
    Ok(session()?.load()?)
}
