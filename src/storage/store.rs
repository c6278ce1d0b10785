use std::{
    ffi::OsString,
    fs::File,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use crate::storage::Snapshot;

/// Somewhere a garage snapshot can be kept between runs.
pub trait SnapshotStore {
    /// Reads the stored snapshot.
    ///
    /// Returns `Ok(None)` if nothing has been stored yet.
    ///
    /// # Errors
    ///
    /// Returns an error if stored data exists but cannot be read or decoded.
    fn load(&self) -> Result<Option<Snapshot>, PersistenceError>;

    /// Replaces the stored snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be written. What was stored
    /// before is left in place.
    fn save(&mut self, snapshot: &Snapshot) -> Result<(), PersistenceError>;

    /// Moves the stored snapshot out of the way of later saves.
    ///
    /// Called when the stored data cannot be used, before anything new is
    /// saved over it.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored data cannot be kept.
    fn set_aside(&mut self) -> Result<(), PersistenceError>;
}

/// Errors raised by a [`SnapshotStore`].
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    /// The snapshot file exists but could not be read.
    #[error("failed to read snapshot {path}")]
    Read {
        /// The snapshot file.
        path: PathBuf,
        /// The underlying error.
        source: io::Error,
    },

    /// The snapshot file could not be written.
    #[error("failed to write snapshot {path}")]
    Write {
        /// The snapshot file.
        path: PathBuf,
        /// The underlying error.
        source: io::Error,
    },

    /// The snapshot file is not valid snapshot JSON.
    #[error("failed to decode snapshot {path}")]
    Decode {
        /// The snapshot file.
        path: PathBuf,
        /// The underlying error.
        source: serde_json::Error,
    },

    /// The snapshot could not be encoded.
    #[error("failed to encode snapshot")]
    Encode(#[source] serde_json::Error),

    /// An unusable snapshot could not be moved aside.
    #[error("failed to move unusable snapshot {path} aside")]
    SetAside {
        /// The snapshot file.
        path: PathBuf,
        /// The underlying error.
        source: io::Error,
    },

    /// Saving was refused because it would overwrite a snapshot that could
    /// not be moved aside.
    #[error("refusing to overwrite an unusable snapshot that could not be moved aside")]
    Protected,
}

/// Stores the snapshot as a pretty-printed JSON file.
///
/// Saving writes a temporary file next to the target and renames it into
/// place, so a failed save never leaves a truncated snapshot behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Creates a store backed by the file at `path`.
    ///
    /// The file does not need to exist yet.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The snapshot file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn sibling_path(&self, suffix: &str) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map_or_else(|| OsString::from("garage"), ToOwned::to_owned);
        name.push(suffix);
        self.path.with_file_name(name)
    }

    fn temporary_path(&self) -> PathBuf {
        self.sibling_path(".tmp")
    }

    /// The first `<file>.rejected[.N]` name not already taken.
    fn rejected_path(&self) -> PathBuf {
        std::iter::once(self.sibling_path(".rejected"))
            .chain((1..).map(|n| self.sibling_path(&format!(".rejected.{n}"))))
            .find(|path| !path.exists())
            .unwrap_or_else(|| self.sibling_path(".rejected"))
    }

    fn write_temporary(
        &self,
        snapshot: &Snapshot,
        temporary: &Path,
    ) -> Result<(), PersistenceError> {
        let write_error = |source| PersistenceError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = temporary.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(write_error)?;
        }

        let file = File::create(temporary).map_err(write_error)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, snapshot).map_err(PersistenceError::Encode)?;
        writer.write_all(b"\n").map_err(write_error)?;
        writer
            .into_inner()
            .map_err(io::IntoInnerError::into_error)
            .and_then(|file| file.sync_all())
            .map_err(write_error)
    }
}

impl SnapshotStore for JsonFileStore {
    fn load(&self) -> Result<Option<Snapshot>, PersistenceError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no snapshot file");
                return Ok(None);
            }
            Err(source) => {
                return Err(PersistenceError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %self.path.display(), "snapshot file is empty");
            return Ok(None);
        }

        serde_json::from_str(&content)
            .map(Some)
            .map_err(|source| PersistenceError::Decode {
                path: self.path.clone(),
                source,
            })
    }

    fn save(&mut self, snapshot: &Snapshot) -> Result<(), PersistenceError> {
        let temporary = self.temporary_path();
        if let Err(e) = self.write_temporary(snapshot, &temporary) {
            if let Err(cleanup) = std::fs::remove_file(&temporary) {
                tracing::debug!(
                    path = %temporary.display(),
                    "no temporary file to remove: {cleanup}"
                );
            }
            return Err(e);
        }
        std::fs::rename(&temporary, &self.path).map_err(|source| PersistenceError::Write {
            path: self.path.clone(),
            source,
        })?;
        tracing::debug!(path = %self.path.display(), "saved snapshot");
        Ok(())
    }

    fn set_aside(&mut self) -> Result<(), PersistenceError> {
        let rejected = self.rejected_path();
        match std::fs::rename(&self.path, &rejected) {
            Ok(()) => {
                tracing::warn!(
                    path = %self.path.display(),
                    "moved unusable snapshot to {}",
                    rejected.display()
                );
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(PersistenceError::SetAside {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

/// Keeps the snapshot in memory.
///
/// Useful for tests and for embedding the garage without a filesystem.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStore {
    snapshot: Option<Snapshot>,
    set_aside: Vec<Snapshot>,
}

impl MemoryStore {
    /// Creates a store that already holds `snapshot`.
    #[must_use]
    pub const fn with_snapshot(snapshot: Snapshot) -> Self {
        Self {
            snapshot: Some(snapshot),
            set_aside: Vec::new(),
        }
    }

    /// The last snapshot saved.
    #[must_use]
    pub const fn snapshot(&self) -> Option<&Snapshot> {
        self.snapshot.as_ref()
    }

    /// Snapshots moved aside, oldest first.
    #[must_use]
    pub fn set_aside_snapshots(&self) -> &[Snapshot] {
        &self.set_aside
    }
}

impl SnapshotStore for MemoryStore {
    fn load(&self) -> Result<Option<Snapshot>, PersistenceError> {
        Ok(self.snapshot.clone())
    }

    fn save(&mut self, snapshot: &Snapshot) -> Result<(), PersistenceError> {
        self.snapshot = Some(snapshot.clone());
        Ok(())
    }

    fn set_aside(&mut self) -> Result<(), PersistenceError> {
        self.set_aside.extend(self.snapshot.take());
        Ok(())
    }
}
