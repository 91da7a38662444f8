//! Whole-document JSON persistence.
//!
//! Every store keeps its state in memory and rewrites one JSON document after
//! each mutation. A [`Document`] owns the path plus an async writer lock:
//! stores take the lock before mutating, serialize the new state while still
//! holding it, and write the snapshot before releasing it, so two mutations
//! can never land on disk out of order.

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::sync::{Mutex, MutexGuard};

use hb_core::{Error, Result};

/// A JSON document on disk, or nothing at all for in-memory stores.
#[derive(Debug)]
pub struct Document {
    path: Option<PathBuf>,
    writer: Mutex<()>,
}

impl Document {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self {
            path,
            writer: Mutex::new(()),
        }
    }

    /// A document that is never read or written.
    pub fn in_memory() -> Self {
        Self::new(None)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Read and parse the document.
    ///
    /// A missing, unreadable, or corrupt document yields `T::default()`.
    pub fn load<T: DeserializeOwned + Default>(&self) -> T {
        let Some(ref path) = self.path else {
            return T::default();
        };

        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No document at {}; starting empty", path.display());
                return T::default();
            }
            Err(e) => {
                tracing::warn!("Failed to read {}: {e}; starting empty", path.display());
                return T::default();
            }
        };

        if contents.trim().is_empty() {
            return T::default();
        }

        serde_json::from_str(&contents).unwrap_or_else(|e| {
            tracing::warn!("Corrupt document {}: {e}; starting empty", path.display());
            T::default()
        })
    }

    /// Acquire the writer lock. Hold the returned guard across the in-memory
    /// mutation and the following [`DocumentWriter::persist`].
    pub async fn lock(&self) -> DocumentWriter<'_> {
        DocumentWriter {
            path: self.path.as_deref(),
            _guard: self.writer.lock().await,
        }
    }
}

/// Exclusive write access to a [`Document`].
pub struct DocumentWriter<'a> {
    path: Option<&'a Path>,
    _guard: MutexGuard<'a, ()>,
}

impl DocumentWriter<'_> {
    /// Write a serialized snapshot, replacing the document atomically
    /// (temp file then rename).
    pub async fn write(&self, snapshot: serde_json::Result<String>) -> Result<()> {
        let Some(path) = self.path else {
            return Ok(());
        };

        let json = snapshot.map_err(|e| Error::persistence(path, e))?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::persistence(path, e))?;
        }

        let tmp = temp_path(path);
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| Error::persistence(path, e))?;
        tokio::fs::rename(&tmp, path)
            .await
            .map_err(|e| Error::persistence(path, e))?;
        Ok(())
    }

    /// Like [`DocumentWriter::write`], but a failure is only logged. The
    /// in-memory state stays authoritative and the next mutation retries.
    pub async fn persist(&self, snapshot: serde_json::Result<String>) {
        if let Err(e) = self.write(snapshot).await {
            tracing::warn!("{e}");
        }
    }
}

/// Decode one record of a loaded document, logging and skipping it when it
/// does not parse. Lets hand-edited documents lose a bad record instead of
/// everything.
pub(crate) fn decode_record<T: DeserializeOwned>(what: &str, value: Value) -> Option<T> {
    serde_json::from_value(value)
        .map_err(|e| tracing::warn!("Skipping unreadable {what}: {e}"))
        .ok()
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
