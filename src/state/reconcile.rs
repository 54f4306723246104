// src/state/reconcile.rs

//! Applying canonical notifications to a [`GlobState`].
//!
//! The same logic serves the factory's unfiltered state and every live glob.
//! Diff bookkeeping only runs when the state tracks diffs.
//!
//! Diff sets describe what changed between two checkpoints, not an event
//! log:
//! - a file created and deleted inside one window leaves no trace;
//! - a file deleted and recreated inside one window is "changed";
//! - a file created inside the window stays "added" however often it is
//!   written afterwards.

use std::fmt;

use tracing::trace;

use crate::notification::Notification;
use crate::state::{GlobState, PathPolicy};

/// Granular change reported to live glob subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GlobEventKind {
    Add,
    AddDir,
    Change,
    Unlink,
    UnlinkDir,
}

impl GlobEventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            GlobEventKind::Add => "add",
            GlobEventKind::AddDir => "addDir",
            GlobEventKind::Change => "change",
            GlobEventKind::Unlink => "unlink",
            GlobEventKind::UnlinkDir => "unlinkDir",
        }
    }
}

impl fmt::Display for GlobEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reconciled change, carrying the normalized path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobEvent {
    pub kind: GlobEventKind,
    pub path: String,
}

/// Apply one notification to `state`.
///
/// Returns the event to emit, or `None` when the notification is not a path
/// signal, is rejected by `policy`, or does not change the live sets.
pub fn apply(
    state: &mut GlobState,
    policy: &dyn PathPolicy,
    notification: &Notification,
) -> Option<GlobEvent> {
    let raw = notification.raw_path()?;
    if !policy.matches(raw) {
        return None;
    }
    let path = policy.normalize_path(raw);

    let kind = match notification {
        Notification::FileUpserted(_) => Some(file_upserted(state, &path)),
        Notification::FileRemoved(_) => file_removed(state, &path),
        Notification::DirectoryAdded(_) => directory_added(state, &path),
        Notification::DirectoryRemoved(_) => directory_removed(state, &path),
        Notification::Ready | Notification::Warning(_) | Notification::Info(_) => None,
    }?;

    trace!(%kind, %path, "reconciled");
    Some(GlobEvent { kind, path })
}

fn file_upserted(state: &mut GlobState, path: &str) -> GlobEventKind {
    if state.files.contains(path) {
        if let Some(diff) = state.diff.as_mut() {
            if !diff.added_files.contains(path) {
                diff.changed_files.insert(path.to_string());
            }
        }
        return GlobEventKind::Change;
    }

    state.files.insert(path.to_string());
    if let Some(diff) = state.diff.as_mut() {
        if diff.removed_files.remove(path) {
            diff.changed_files.insert(path.to_string());
        } else {
            diff.added_files.insert(path.to_string());
        }
    }
    GlobEventKind::Add
}

fn file_removed(state: &mut GlobState, path: &str) -> Option<GlobEventKind> {
    if !state.files.remove(path) {
        return None;
    }
    if let Some(diff) = state.diff.as_mut() {
        if !diff.added_files.remove(path) {
            diff.removed_files.insert(path.to_string());
        }
    }
    Some(GlobEventKind::Unlink)
}

fn directory_added(state: &mut GlobState, path: &str) -> Option<GlobEventKind> {
    if !state.directories.insert(path.to_string()) {
        return None;
    }
    if let Some(diff) = state.diff.as_mut() {
        if !diff.removed_directories.remove(path) {
            diff.added_directories.insert(path.to_string());
        }
    }
    Some(GlobEventKind::AddDir)
}

fn directory_removed(state: &mut GlobState, path: &str) -> Option<GlobEventKind> {
    if !state.directories.remove(path) {
        return None;
    }
    if let Some(diff) = state.diff.as_mut() {
        if !diff.added_directories.remove(path) {
            diff.removed_directories.insert(path.to_string());
        }
    }
    Some(GlobEventKind::UnlinkDir)
}
