// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Snapshot persistence

use crate::snapshot::Snapshot;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur reading or writing snapshots
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Durable home for the coordinator snapshot
///
/// Called synchronously from the coordinator loop, never concurrently.
pub trait SnapshotStore: Send + 'static {
    /// Load the last saved snapshot, or `None` if nothing was ever saved
    fn load(&self) -> Result<Option<Snapshot>, StorageError>;

    /// Replace the saved snapshot
    fn save(&self, snapshot: &Snapshot) -> Result<(), StorageError>;
}

/// Snapshot stored as a JSON file, replaced atomically on save
#[derive(Clone, Debug)]
pub struct FileSnapshotStore {
    path: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        match self.path.file_name() {
            Some(name) => {
                let mut name = name.to_os_string();
                name.push(".tmp");
                self.path.with_file_name(name)
            }
            None => self.path.with_extension("tmp"),
        }
    }

    fn write_temp(&self, temp_path: &Path, snapshot: &Snapshot) -> Result<(), StorageError> {
        let file = File::create(temp_path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, snapshot)?;
        writer.write_all(b"\n")?;
        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
        Ok(())
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn load(&self) -> Result<Option<Snapshot>, StorageError> {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let snapshot = serde_json::from_reader(BufReader::new(file))?;
        Ok(Some(snapshot))
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), StorageError> {
        let parent = self.path.parent().filter(|p| !p.as_os_str().is_empty());
        if let Some(parent) = parent {
            fs::create_dir_all(parent)?;
        }

        let temp_path = self.temp_path();
        if let Err(e) = self.write_temp(&temp_path, snapshot) {
            let _ = fs::remove_file(&temp_path);
            return Err(e);
        }

        // Atomic replace (rename is atomic on POSIX)
        fs::rename(&temp_path, &self.path)?;

        // Make the rename itself durable; not every platform can open a directory
        if let Some(parent) = parent {
            if let Ok(dir) = File::open(parent) {
                let _ = dir.sync_all();
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
