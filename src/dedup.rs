//! Duplicate detection over normalized audio.
//!
//! The store is a flat directory of WAV files committed during the current run,
//! named by a zero-based sequence (`0.wav`, `1.wav`, …). A candidate that matches
//! an already-committed entry is deleted instead of committed, so repeated audio
//! content is converted (and billed) at most once per run.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::Result;

/// How candidates are compared against committed entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DedupStrategy {
    /// Byte-size equality. Cheap, with an accepted false-positive risk: two
    /// different files of identical length are treated as duplicates.
    #[default]
    ByteSize,

    /// SHA-256 content equality. Stricter, at the cost of hashing every entry.
    ContentHash,
}

/// A directory of already-normalized audio, scoped to one run.
#[derive(Debug)]
pub struct DedupStore {
    dir: PathBuf,
    strategy: DedupStrategy,
    committed: usize,
}

impl DedupStore {
    /// Create a store over `dir` using the default byte-size strategy.
    ///
    /// The directory is not touched until [`DedupStore::purge_all`] or
    /// [`DedupStore::commit`] runs.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_strategy(dir, DedupStrategy::default())
    }

    /// Create a store with an explicit comparison strategy.
    pub fn with_strategy(dir: impl Into<PathBuf>, strategy: DedupStrategy) -> Self {
        Self {
            dir: dir.into(),
            strategy,
            committed: 0,
        }
    }

    /// The store directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Number of entries committed so far in this run.
    pub fn len(&self) -> usize {
        self.committed
    }

    pub fn is_empty(&self) -> bool {
        self.committed == 0
    }

    /// Remove every file directly inside the store directory (non-recursive).
    ///
    /// Used both at run start (stale state from a crashed prior run) and at run
    /// end (final cleanup). A missing directory is created, so purging a fresh
    /// store is fine.
    pub fn purge_all(&mut self) -> Result<()> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir)?;
            self.committed = 0;
            return Ok(());
        }

        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                fs::remove_file(entry.path())?;
            }
        }

        self.committed = 0;
        Ok(())
    }

    /// Whether `candidate` matches any committed entry.
    ///
    /// On a match the candidate file is deleted; duplicates never get committed,
    /// and the caller must not touch the candidate path again.
    pub fn is_duplicate(&self, candidate: &Path) -> Result<bool> {
        let candidate_key = self.key_of(candidate)?;

        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }

            if self.key_of(&entry.path())? == candidate_key {
                debug!(
                    candidate = %candidate.display(),
                    matches = %entry.path().display(),
                    "duplicate normalized audio"
                );
                fs::remove_file(candidate)?;
                return Ok(true);
            }
        }

        Ok(false)
    }

    /// Move `candidate` into the store under the next sequential name.
    pub fn commit(&mut self, candidate: &Path) -> Result<PathBuf> {
        let stored = self.dir.join(format!("{}.wav", self.committed));
        fs::rename(candidate, &stored)?;
        self.committed += 1;
        Ok(stored)
    }

    /// The comparison key for one file under the current strategy.
    fn key_of(&self, path: &Path) -> Result<FileKey> {
        match self.strategy {
            DedupStrategy::ByteSize => Ok(FileKey::Size(fs::metadata(path)?.len())),
            DedupStrategy::ContentHash => Ok(FileKey::Hash(sha256_file(path)?)),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum FileKey {
    Size(u64),
    Hash([u8; 32]),
}

fn sha256_file(path: &Path) -> Result<[u8; 32]> {
    let mut file = fs::File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(hasher.finalize().into())
}
