// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Atomic read/replace of the single persisted state document.
//!
//! `update` acquires an exclusive file lock on a sibling `.lock` file,
//! reads the current document (the default if absent), applies the
//! mutation, writes the result to a sibling temp file, `fsync`s it, and
//! renames it over the canonical path before releasing the lock. Readers
//! racing an in-flight `update` block on the lock rather than observing a
//! partially written file — `load` takes the same lock in shared mode.
//!
//! This is blocking, synchronous I/O by design: callers run it via
//! `spawn_blocking` so the request scheduler is never stalled (see the
//! scheduling model in the crate-level docs of `demo-daemon`).

use demo_core::PersistedDocument;
use fs2::FileExt;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to (de)serialize state document: {0}")]
    Json(#[from] serde_json::Error),
}

impl PersistenceError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Handle to the durable state document at `<DURABLE_DIR>/demo_state.json`.
#[derive(Debug, Clone)]
pub struct PersistenceStore {
    path: PathBuf,
    lock_path: PathBuf,
}

impl PersistenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let lock_path = path.with_extension("json.lock");
        Self { path, lock_path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the current document under a shared lock. Returns the default
    /// (empty) document if the file does not yet exist.
    pub fn load(&self) -> Result<PersistedDocument, PersistenceError> {
        let lock_file = self.open_lock_file()?;
        lock_file
            .lock_shared()
            .map_err(|e| PersistenceError::io(&self.lock_path, e))?;
        let doc = self.read_document()?;
        fs2::FileExt::unlock(&lock_file).map_err(|e| PersistenceError::io(&self.lock_path, e))?;
        Ok(doc)
    }

    /// Atomically read-modify-write the document: exclusive-lock, read,
    /// apply `f`, write to a temp file, `fsync`, rename, unlock.
    pub fn update<F>(&self, f: F) -> Result<PersistedDocument, PersistenceError>
    where
        F: FnOnce(PersistedDocument) -> PersistedDocument,
    {
        let lock_file = self.open_lock_file()?;
        lock_file
            .lock_exclusive()
            .map_err(|e| PersistenceError::io(&self.lock_path, e))?;

        let result = (|| {
            let current = self.read_document()?;
            let next = f(current);
            self.write_document(&next)?;
            Ok(next)
        })();

        fs2::FileExt::unlock(&lock_file).map_err(|e| PersistenceError::io(&self.lock_path, e))?;
        result
    }

    fn open_lock_file(&self) -> Result<File, PersistenceError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| PersistenceError::io(parent, e))?;
        }
        File::options()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&self.lock_path)
            .map_err(|e| PersistenceError::io(&self.lock_path, e))
    }

    fn read_document(&self) -> Result<PersistedDocument, PersistenceError> {
        if !self.path.exists() {
            return Ok(PersistedDocument::default());
        }
        let file = File::open(&self.path).map_err(|e| PersistenceError::io(&self.path, e))?;
        let reader = BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }

    fn write_document(&self, doc: &PersistedDocument) -> Result<(), PersistenceError> {
        let tmp_path = self.path.with_extension("json.tmp");
        {
            let file =
                File::create(&tmp_path).map_err(|e| PersistenceError::io(&tmp_path, e))?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, doc)?;
            writer
                .flush()
                .map_err(|e| PersistenceError::io(&tmp_path, e))?;
            let file = writer
                .into_inner()
                .map_err(|e| PersistenceError::io(&tmp_path, e.into_error()))?;
            file.sync_all()
                .map_err(|e| PersistenceError::io(&tmp_path, e))?;
        }
        fs::rename(&tmp_path, &self.path).map_err(|e| PersistenceError::io(&self.path, e))?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "persistence_tests.rs"]
mod tests;
