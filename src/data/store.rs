use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Local};

use super::error::LoadError;
use super::loader::load_file;
use super::model::Dataset;

// ---------------------------------------------------------------------------
// DatasetStore – the one loaded dataset and where it came from
// ---------------------------------------------------------------------------

/// Owns the current dataset snapshot.
///
/// The dataset is loaded once and only replaced by an explicit
/// [`reload`](Self::reload) or [`replace`](Self::replace).  Readers hold
/// `Arc<Dataset>` snapshots, which stay valid across reloads.
#[derive(Debug)]
pub struct DatasetStore {
    path: PathBuf,
    snapshot: Arc<Dataset>,
    loaded_at: DateTime<Local>,
}

impl DatasetStore {
    /// Load `path` eagerly.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, LoadError> {
        let path = path.into();
        let dataset = load_file(&path)?;
        Ok(DatasetStore {
            path,
            snapshot: Arc::new(dataset),
            loaded_at: Local::now(),
        })
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> Arc<Dataset> {
        Arc::clone(&self.snapshot)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn loaded_at(&self) -> DateTime<Local> {
        self.loaded_at
    }

    /// Re-read the source file.  On failure the previous snapshot is kept.
    pub fn reload(&mut self) -> Result<Arc<Dataset>, LoadError> {
        let dataset = load_file(&self.path)?;
        self.install(dataset);
        Ok(self.snapshot())
    }

    /// Switch to a different source file.  The path only changes on success.
    pub fn replace(&mut self, path: impl Into<PathBuf>) -> Result<Arc<Dataset>, LoadError> {
        let path = path.into();
        let dataset = load_file(&path)?;
        self.path = path;
        self.install(dataset);
        Ok(self.snapshot())
    }

    fn install(&mut self, dataset: Dataset) {
        self.snapshot = Arc::new(dataset);
        self.loaded_at = Local::now();
    }
}
