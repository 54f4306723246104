// src/state/mod.rs

//! In-memory view of which files and directories exist.
//!
//! A [`GlobState`] always holds the live `files` / `directories` sets. When
//! diff tracking is enabled it also carries [`DiffSets`]: what was added,
//! removed or changed since the last [`GlobState::clean`].
//!
//! Which paths a state accepts, and in what form it stores them, is decided
//! by a [`PathPolicy`]. The factory uses [`Unfiltered`]; every live glob has
//! its own glob-filtered policy.

pub mod reconcile;

use std::collections::BTreeSet;
use std::path::Path;

use crate::paths::path_to_string;

pub use reconcile::{GlobEvent, GlobEventKind, apply};

/// Set of normalized paths.
pub type PathSet = BTreeSet<String>;

/// Inclusion test and canonical form for raw backend paths.
pub trait PathPolicy {
    /// Should `raw` be tracked at all?
    fn matches(&self, _raw: &Path) -> bool {
        true
    }

    /// Canonical form of `raw` for this state's owner.
    fn normalize_path(&self, raw: &Path) -> String;
}

/// Accepts every path and stores it exactly as the backend reported it.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unfiltered;

impl PathPolicy for Unfiltered {
    fn normalize_path(&self, raw: &Path) -> String {
        path_to_string(raw)
    }
}

/// Transitions observed since the last checkpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffSets {
    /// Files that did not exist at the last checkpoint.
    pub added_files: PathSet,
    /// Files that existed at the last checkpoint and are gone now.
    pub removed_files: PathSet,
    /// Files modified, or deleted and recreated, since the last checkpoint.
    pub changed_files: PathSet,
    pub added_directories: PathSet,
    pub removed_directories: PathSet,
}

impl DiffSets {
    pub fn clear(&mut self) {
        self.added_files.clear();
        self.removed_files.clear();
        self.changed_files.clear();
        self.added_directories.clear();
        self.removed_directories.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.added_files.is_empty()
            && self.removed_files.is_empty()
            && self.changed_files.is_empty()
            && self.added_directories.is_empty()
            && self.removed_directories.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct GlobState {
    pub(crate) files: PathSet,
    pub(crate) directories: PathSet,
    pub(crate) diff: Option<DiffSets>,
}

impl GlobState {
    /// State without diff bookkeeping.
    pub fn new() -> Self {
        Self::default()
    }

    /// State that also records added/removed/changed sets.
    pub fn with_diff() -> Self {
        Self {
            diff: Some(DiffSets::default()),
            ..Self::default()
        }
    }

    pub fn tracks_diff(&self) -> bool {
        self.diff.is_some()
    }

    pub fn files(&self) -> &PathSet {
        &self.files
    }

    pub fn directories(&self) -> &PathSet {
        &self.directories
    }

    /// `None` when diff tracking is off.
    pub fn diff(&self) -> Option<&DiffSets> {
        self.diff.as_ref()
    }

    /// Start a new checkpoint window. Live sets are left untouched.
    pub fn clean(&mut self) {
        if let Some(diff) = self.diff.as_mut() {
            diff.clear();
        }
    }

    /// Seed this state from another state's raw entries.
    ///
    /// `source` must store raw paths (as the factory's [`Unfiltered`] state
    /// does). Every entry accepted by `policy` is added in normalized form;
    /// with `mark_added` the entries also land in the `added_*` sets.
    pub fn populate_from(&mut self, source: &GlobState, policy: &dyn PathPolicy, mark_added: bool) {
        for raw in &source.files {
            let raw = Path::new(raw);
            if policy.matches(raw) {
                let path = policy.normalize_path(raw);
                if mark_added {
                    if let Some(diff) = self.diff.as_mut() {
                        diff.added_files.insert(path.clone());
                    }
                }
                self.files.insert(path);
            }
        }

        for raw in &source.directories {
            let raw = Path::new(raw);
            if policy.matches(raw) {
                let path = policy.normalize_path(raw);
                if mark_added {
                    if let Some(diff) = self.diff.as_mut() {
                        diff.added_directories.insert(path.clone());
                    }
                }
                self.directories.insert(path);
            }
        }
    }
}
