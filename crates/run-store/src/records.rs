//! Append-only execution-record logs
//!
//! The history log is the one piece of state shared across concurrent test
//! workers. Appends go through a single writer guard so parallel runs can
//! never interleave partial lines; reads tolerate torn or malformed lines
//! by skipping them, so one corrupt entry cannot poison analysis.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use testkeel_core_types::ExecutionRecord;
use tracing::{debug, warn};

use crate::errors::StoreError;

/// Append-only log of execution records.
#[async_trait]
pub trait RecordLog: Send + Sync {
    /// Append one record. Serialized across concurrent callers.
    async fn append(&self, record: &ExecutionRecord) -> Result<(), StoreError>;

    /// Read every record in append order. Eventually consistent with
    /// respect to concurrent appends.
    async fn read_all(&self) -> Result<Vec<ExecutionRecord>, StoreError>;
}

/// JSON-lines log on the filesystem.
pub struct FsRecordLog {
    path: PathBuf,
    writer: Mutex<()>,
}

impl FsRecordLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            writer: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl RecordLog for FsRecordLog {
    async fn append(&self, record: &ExecutionRecord) -> Result<(), StoreError> {
        let line = serde_json::to_string(record)?;

        let _guard = self.writer.lock();
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", line)?;
        debug!(test_id = %record.test_id, path = %self.path.display(), "record appended");
        Ok(())
    }

    async fn read_all(&self) -> Result<Vec<ExecutionRecord>, StoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let raw = fs::read_to_string(&self.path)?;
        let mut records = Vec::new();
        for (idx, line) in raw.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<ExecutionRecord>(line) {
                Ok(record) => records.push(record),
                Err(err) => {
                    warn!(
                        line = idx + 1,
                        path = %self.path.display(),
                        %err,
                        "skipping malformed history line"
                    );
                }
            }
        }
        Ok(records)
    }
}

/// In-memory log for tests and ephemeral workers.
#[derive(Default)]
pub struct MemoryRecordLog {
    records: RwLock<Vec<ExecutionRecord>>,
}

impl MemoryRecordLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

#[async_trait]
impl RecordLog for MemoryRecordLog {
    async fn append(&self, record: &ExecutionRecord) -> Result<(), StoreError> {
        self.records.write().push(record.clone());
        Ok(())
    }

    async fn read_all(&self) -> Result<Vec<ExecutionRecord>, StoreError> {
        Ok(self.records.read().clone())
    }
}
