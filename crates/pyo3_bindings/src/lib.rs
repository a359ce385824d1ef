//! PyO3 bindings for the order-book depth terminal.
//!
//! Exposes the render pipeline to the Python dashboard:
//! - Order-book file listing
//! - Snapshot listing
//! - Render models as JSON
//! - Raw snapshot export

use pyo3::exceptions::{PyIOError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyBytes;
use std::path::PathBuf;

use orderbook_core::{Config, Error as RustError, SnapshotKey};
use orderbook_features::{export_selection, render, Selection};
use orderbook_ingestion::{DepthSource, OrderBookFile};

// ============================================================================
// Conversions
// ============================================================================

fn to_py_err(err: RustError) -> PyErr {
    if err.is_recoverable() || matches!(err, RustError::Io(_)) {
        PyIOError::new_err(err.to_string())
    } else {
        PyValueError::new_err(err.to_string())
    }
}

fn parse_snapshot(label: Option<String>) -> PyResult<Option<SnapshotKey>> {
    label
        .map(|l| {
            SnapshotKey::parse_label(&l)
                .ok_or_else(|| PyValueError::new_err(format!("invalid snapshot: {l}")))
        })
        .transpose()
}

// ============================================================================
// Terminal
// ============================================================================

/// Cached depth terminal over one data directory.
#[pyclass]
pub struct PyDepthTerminal {
    inner: DepthSource,
}

impl PyDepthTerminal {
    fn directory(&self, directory: Option<PathBuf>) -> PathBuf {
        directory.unwrap_or_else(|| self.inner.data_dir().to_path_buf())
    }

    fn find_file(&mut self, file_name: &str, directory: Option<PathBuf>) -> PyResult<OrderBookFile> {
        let directory = self.directory(directory);
        self.inner
            .discover(&directory)
            .map_err(to_py_err)?
            .into_iter()
            .find(|f| f.file_name == file_name)
            .ok_or_else(|| PyValueError::new_err(format!("{file_name} is not an order-book file")))
    }
}

#[pymethods]
impl PyDepthTerminal {
    #[new]
    #[pyo3(signature = (data_dir=None, ttl_secs=None, config_path=None))]
    fn new(
        data_dir: Option<PathBuf>,
        ttl_secs: Option<u64>,
        config_path: Option<PathBuf>,
    ) -> PyResult<Self> {
        let mut config = match config_path {
            Some(path) => Config::from_json_file(path).map_err(to_py_err)?,
            None => Config::default(),
        };
        if let Some(dir) = data_dir {
            config.catalog.data_dir = dir;
        }
        if let Some(ttl) = ttl_secs {
            config.cache.ttl_secs = ttl;
        }
        Ok(PyDepthTerminal {
            inner: DepthSource::new(config),
        })
    }

    /// List order-book files as (file_name, item_name) pairs.
    #[pyo3(signature = (directory=None))]
    fn files(&mut self, directory: Option<PathBuf>) -> PyResult<Vec<(String, String)>> {
        let directory = self.directory(directory);
        let files = self.inner.discover(&directory).map_err(to_py_err)?;
        Ok(files
            .into_iter()
            .map(|f| (f.file_name, f.item_name))
            .collect())
    }

    /// List snapshot labels of a file, newest first.
    #[pyo3(signature = (file_name, directory=None))]
    fn snapshots(&mut self, file_name: String, directory: Option<PathBuf>) -> PyResult<Vec<String>> {
        let file = self.find_file(&file_name, directory)?;
        let table = self.inner.load(&file).map_err(to_py_err)?;
        Ok(table
            .available_snapshots()
            .iter()
            .map(SnapshotKey::label)
            .collect())
    }

    /// Render the depth view of a selection as JSON.
    #[pyo3(signature = (file_name=None, snapshot=None, directory=None))]
    fn render(
        &mut self,
        file_name: Option<String>,
        snapshot: Option<String>,
        directory: Option<PathBuf>,
    ) -> PyResult<String> {
        let selection = Selection {
            directory,
            file: file_name,
            snapshot: parse_snapshot(snapshot)?,
        };
        let model = render(&mut self.inner, &selection);
        serde_json::to_string(&model).map_err(|e| PyValueError::new_err(e.to_string()))
    }

    /// Export a snapshot as (download_name, csv_bytes).
    #[pyo3(signature = (file_name, snapshot=None, directory=None))]
    fn export<'py>(
        &mut self,
        py: Python<'py>,
        file_name: String,
        snapshot: Option<String>,
        directory: Option<PathBuf>,
    ) -> PyResult<(String, Bound<'py, PyBytes>)> {
        // Resolve first so an unknown name is an error rather than a fallback.
        self.find_file(&file_name, directory.clone())?;
        let selection = Selection {
            directory,
            file: Some(file_name),
            snapshot: parse_snapshot(snapshot)?,
        };
        let export = export_selection(&mut self.inner, &selection).map_err(to_py_err)?;
        Ok((export.file_name, PyBytes::new_bound(py, &export.data)))
    }

    /// Drop every cached scan and table.
    fn refresh(&mut self) {
        self.inner.refresh();
    }
}

// ============================================================================
// Module Definition
// ============================================================================

/// Install a `RUST_LOG`-driven log subscriber. Returns False if one exists.
#[pyfunction]
fn init_logging() -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init()
        .is_ok()
}

/// Order-book depth terminal - Rust core for the Python dashboard.
#[pymodule]
fn orderbook_depth(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(init_logging, m)?)?;
    m.add_class::<PyDepthTerminal>()?;

    Ok(())
}
