//! Cached front for catalog scans and table loads.

use crate::cache::{Clock, SystemClock, TtlCache};
use crate::catalog::{CsvCatalog, OrderBookFile};
use crate::loader::{OrderBookLoader, Table};
use orderbook_core::{Config, Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{debug, warn};

/// Length and modification time of a file when it was loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Fingerprint {
    len: u64,
    modified: Option<SystemTime>,
}

impl Fingerprint {
    fn of(path: &Path) -> Result<Self> {
        let meta = fs::metadata(path).map_err(|e| Error::unavailable(path, e))?;
        if !meta.is_file() {
            return Err(Error::unavailable(path, "not a regular file"));
        }
        Ok(Self {
            len: meta.len(),
            modified: meta.modified().ok(),
        })
    }
}

type SharedClock = Arc<dyn Clock>;

/// Catalog and loader behind a time-bounded cache.
///
/// Cached results never outlive the file they came from: a file that has
/// disappeared is reported as unavailable, and a file that changed on disk is
/// re-read before its entry expires.
pub struct DepthSource {
    config: Config,
    catalog: CsvCatalog,
    files: TtlCache<PathBuf, Vec<OrderBookFile>, SharedClock>,
    tables: TtlCache<PathBuf, (Fingerprint, Arc<Table>), SharedClock>,
}

impl DepthSource {
    /// Create a source on the wall clock.
    pub fn new(config: Config) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a source on an explicit clock.
    pub fn with_clock(config: Config, clock: SharedClock) -> Self {
        let ttl_ms = config.cache.ttl_ms();
        Self {
            catalog: CsvCatalog::from_config(&config.catalog),
            files: TtlCache::with_clock(ttl_ms, clock.clone()),
            tables: TtlCache::with_clock(ttl_ms, clock),
            config,
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Directory scanned by default.
    pub fn data_dir(&self) -> &Path {
        &self.config.catalog.data_dir
    }

    /// Discover order-book files in `directory`.
    pub fn discover(&mut self, directory: &Path) -> Result<Vec<OrderBookFile>> {
        if !self.config.cache.enabled {
            return self.catalog.discover(directory);
        }

        let key = directory.to_path_buf();
        if let Some(files) = self.files.get(&key) {
            if let Some(gone) = files.iter().find(|f| !f.path.is_file()) {
                warn!("{:?} disappeared, rescanning {:?}", gone.path, directory);
                self.files.invalidate(&key);
            } else {
                debug!("Catalog cache hit for {:?}", directory);
                return Ok(files);
            }
        }

        let files = self.catalog.discover(directory)?;
        self.files.insert(key, files.clone());

        let purged = self.tables.purge_expired();
        if purged > 0 {
            debug!("Dropped {} expired tables, {} still cached", purged, self.tables.len());
        }
        Ok(files)
    }

    /// Load a discovered file.
    pub fn load(&mut self, file: &OrderBookFile) -> Result<Arc<Table>> {
        self.load_path(&file.path)
    }

    /// Load the file at `path`.
    pub fn load_path(&mut self, path: &Path) -> Result<Arc<Table>> {
        let key = path.to_path_buf();
        let fingerprint = match Fingerprint::of(path) {
            Ok(fingerprint) => fingerprint,
            Err(e) => {
                if self.tables.invalidate(&key).is_some() {
                    warn!("Cached table for {:?} dropped: {}", path, e);
                }
                return Err(e);
            }
        };

        if self.config.cache.enabled {
            match self.tables.get(&key) {
                Some((cached, table)) if cached == fingerprint => {
                    debug!("Table cache hit for {:?}", path);
                    return Ok(table);
                }
                Some(_) => debug!("{:?} changed on disk, reloading", path),
                None => {}
            }
        }

        let table = Arc::new(OrderBookLoader::load_path(path)?);
        if self.config.cache.enabled {
            self.tables.insert(key, (fingerprint, table.clone()));
        }
        Ok(table)
    }

    /// Forget every cached scan and table.
    pub fn refresh(&mut self) {
        self.files.clear();
        self.tables.clear();
    }
}
