//! Per-run shared state
//!
//! Holds what the workers of one run report back: index entries and outcome
//! counters, plus the guard that lets the index be finalized only once.

use crate::config::ChunkSettings;
use crate::output::IndexEntry;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

/// Mutable state shared by the workers of one run
///
/// Owned by the coordinator and lent to workers by reference. Entries are only
/// ever appended; each counter is bumped once per task by the worker that owns
/// the task.
#[derive(Debug)]
pub struct RunContext {
    pub project: String,
    pub project_dir: PathBuf,
    pub chunking: ChunkSettings,
    entries: Mutex<Vec<IndexEntry>>,
    succeeded: AtomicUsize,
    failed: AtomicUsize,
    skipped: AtomicUsize,
    finalized: AtomicBool,
}

/// Snapshot of the run counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl RunContext {
    pub fn new(project: String, project_dir: PathBuf, chunking: ChunkSettings) -> Self {
        Self {
            project,
            project_dir,
            chunking,
            entries: Mutex::new(Vec::new()),
            succeeded: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
            skipped: AtomicUsize::new(0),
            finalized: AtomicBool::new(false),
        }
    }

    /// Path of an artifact relative to the output root, as listed in the index
    pub fn index_path_for(&self, relative_path: &str) -> String {
        format!("{}/{}", self.project, relative_path)
    }

    pub fn record_success(&self, entry: IndexEntry) {
        self.push_entry(entry);
        self.succeeded.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_failure(&self, entry: IndexEntry) {
        self.push_entry(entry);
        self.failed.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::SeqCst);
    }

    fn push_entry(&self, entry: IndexEntry) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
    }

    /// Copy of the entries accumulated so far
    pub fn entries(&self) -> Vec<IndexEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn counters(&self) -> Counters {
        Counters {
            succeeded: self.succeeded.load(Ordering::SeqCst),
            failed: self.failed.load(Ordering::SeqCst),
            skipped: self.skipped.load(Ordering::SeqCst),
        }
    }

    /// Claims the right to finalize; true for the first caller only
    pub fn begin_finalize(&self) -> bool {
        !self.finalized.swap(true, Ordering::SeqCst)
    }
}
