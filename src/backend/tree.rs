// src/backend/tree.rs

use std::collections::BTreeMap;
use std::ops::Bound;
use std::path::{Path, PathBuf};

/// What a known path was last reported as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// Paths the backend has already announced.
///
/// OS events for deletions carry no type information once the entry is gone,
/// and removing a directory rarely produces one event per descendant. The
/// tree remembers what was reported so removals can be classified and
/// cascaded.
#[derive(Debug, Default)]
pub struct KnownTree {
    entries: BTreeMap<PathBuf, EntryKind>,
}

impl KnownTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `path`. Returns the previous kind, if any.
    pub fn insert(&mut self, path: impl Into<PathBuf>, kind: EntryKind) -> Option<EntryKind> {
        self.entries.insert(path.into(), kind)
    }

    pub fn kind(&self, path: &Path) -> Option<EntryKind> {
        self.entries.get(path).copied()
    }

    pub fn remove(&mut self, path: &Path) -> Option<EntryKind> {
        self.entries.remove(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every entry strictly below `dir`, deepest first.
    pub fn subtree(&self, dir: &Path) -> Vec<(PathBuf, EntryKind)> {
        let mut entries: Vec<(PathBuf, EntryKind)> = self
            .entries
            .range::<Path, _>((Bound::Excluded(dir), Bound::Unbounded))
            .take_while(|(path, _)| path.starts_with(dir))
            .map(|(path, kind)| (path.clone(), *kind))
            .collect();
        entries.sort_by(|(a, _), (b, _)| {
            b.components()
                .count()
                .cmp(&a.components().count())
                .then_with(|| b.cmp(a))
        });
        entries
    }

    /// Forget every entry strictly below `dir`, deepest first.
    ///
    /// `dir` itself is left alone.
    pub fn drain_subtree(&mut self, dir: &Path) -> Vec<(PathBuf, EntryKind)> {
        let drained = self.subtree(dir);
        for (path, _) in &drained {
            self.entries.remove(path);
        }
        drained
    }
}
