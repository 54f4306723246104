// src/backend/translate.rs

//! Turning raw `notify` events into canonical notifications.
//!
//! `notify` events differ between platforms: removals carry no type, renames
//! may arrive as one event or two, and directory removals are not cascaded.
//! [`EventTranslator`] keeps a [`KnownTree`] of what it has announced and
//! uses it (plus the filesystem, for paths that still exist) to emit exactly
//! one notification per observable transition.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use notify::Event;
use notify::event::{EventKind, ModifyKind, RenameMode};
use tracing::trace;

use crate::backend::tree::{EntryKind, KnownTree};
use crate::fs::FileSystem;
use crate::notification::NotificationReceiver;

pub struct EventTranslator {
    root: PathBuf,
    tree: KnownTree,
    fs: Arc<dyn FileSystem>,
    receiver: NotificationReceiver,
}

impl std::fmt::Debug for EventTranslator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventTranslator")
            .field("root", &self.root)
            .field("known", &self.tree.len())
            .finish_non_exhaustive()
    }
}

impl EventTranslator {
    pub fn new(root: PathBuf, fs: Arc<dyn FileSystem>, receiver: NotificationReceiver) -> Self {
        Self {
            root,
            tree: KnownTree::new(),
            fs,
            receiver,
        }
    }

    pub fn tree(&self) -> &KnownTree {
        &self.tree
    }

    pub fn receiver(&self) -> &NotificationReceiver {
        &self.receiver
    }

    /// Announce everything currently under the root.
    ///
    /// Only an unreadable root is an error; unreadable subdirectories are
    /// reported as warnings and skipped.
    pub fn scan(&mut self) -> Result<usize> {
        scan_tree(self.fs.as_ref(), &self.root, &mut self.tree, &self.receiver)
    }

    pub fn handle(&mut self, event: Event) {
        trace!(?event, "notify event");

        let paths: Vec<PathBuf> = event
            .paths
            .into_iter()
            .filter(|path| path.starts_with(&self.root))
            .collect();

        match event.kind {
            EventKind::Create(_) => {
                for path in &paths {
                    self.path_created(path);
                }
            }
            EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
                for path in &paths {
                    self.path_gone(path);
                }
            }
            EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
                for path in &paths {
                    self.path_appeared(path);
                }
            }
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)) if paths.len() == 2 => {
                self.path_gone(&paths[0]);
                self.path_appeared(&paths[1]);
            }
            EventKind::Modify(ModifyKind::Name(_)) | EventKind::Any => {
                for path in &paths {
                    self.reconcile(path);
                }
            }
            EventKind::Modify(_) => {
                for path in &paths {
                    self.path_modified(path);
                }
            }
            EventKind::Remove(_) => {
                for path in &paths {
                    self.path_gone(path);
                }
            }
            _ => {}
        }
    }

    fn present(&self, path: &Path) -> bool {
        self.fs.is_symlink(path) || self.fs.exists(path)
    }

    /// A create event. The initial scan overlaps the OS watch, so a create
    /// for something already announced with the same kind is a duplicate.
    fn path_created(&mut self, path: &Path) {
        if path == self.root {
            return;
        }
        let is_file = self.fs.is_symlink(path) || self.fs.is_file(path);
        match self.tree.kind(path) {
            Some(EntryKind::File) if is_file => {}
            Some(EntryKind::Directory) if !is_file && self.fs.is_dir(path) => {
                self.scan_new_entries(path);
            }
            _ => self.path_appeared(path),
        }
    }

    /// Classify a path that was just created or moved in.
    fn path_appeared(&mut self, path: &Path) {
        if path == self.root {
            return;
        }
        if self.fs.is_symlink(path) || self.fs.is_file(path) {
            self.file_appeared(path);
        } else if self.fs.is_dir(path) {
            self.directory_appeared(path);
        } else {
            // Created and deleted again before we looked.
            self.path_gone(path);
        }
    }

    fn file_appeared(&mut self, path: &Path) {
        if self.tree.kind(path) == Some(EntryKind::File) {
            // Moved over an existing file: same path, new contents.
            self.receiver.file_upserted(path);
            return;
        }
        announce(&mut self.tree, &self.receiver, path, EntryKind::File);
    }

    fn directory_appeared(&mut self, path: &Path) {
        if path == self.root {
            return;
        }
        if !announce(&mut self.tree, &self.receiver, path, EntryKind::Directory) {
            // Moved over an existing directory; what we knew below it is stale.
            self.refresh_subtree(path);
        }
        self.scan_new_entries(path);
    }

    /// Check every known entry below `dir` against the filesystem.
    fn refresh_subtree(&mut self, dir: &Path) {
        for (path, kind) in self.tree.subtree(dir) {
            if !self.present(&path) {
                self.path_gone(&path);
            } else if kind == EntryKind::File
                && (self.fs.is_symlink(&path) || self.fs.is_file(&path))
            {
                self.receiver.file_upserted(&path);
            }
        }
    }

    /// Announce entries below `dir` that are not known yet, or whose kind
    /// changed. Entries created before the OS watch reached a new directory
    /// produce no events of their own.
    fn scan_new_entries(&mut self, path: &Path) {
        if let Err(err) = scan_tree(self.fs.as_ref(), path, &mut self.tree, &self.receiver) {
            self.receiver.warning(format!(
                "failed to scan new directory {}: {err:#}",
                path.display()
            ));
        }
    }

    fn path_modified(&mut self, path: &Path) {
        match self.tree.kind(path) {
            Some(EntryKind::Directory) => {}
            Some(EntryKind::File) if self.present(path) => self.receiver.file_upserted(path),
            Some(EntryKind::File) => self.path_gone(path),
            // A modification to something never announced means its
            // creation was missed.
            None if path != self.root => self.path_appeared(path),
            None => {}
        }
    }

    /// Bring one path in line with the filesystem when the event kind says
    /// nothing useful.
    fn reconcile(&mut self, path: &Path) {
        if path == self.root {
            if !self.fs.is_dir(path) {
                self.path_gone(path);
            }
            return;
        }
        match (self.tree.kind(path), self.present(path)) {
            (None, true) => self.path_appeared(path),
            (Some(_), false) => self.path_gone(path),
            (Some(EntryKind::File), true) if self.fs.is_dir(path) && !self.fs.is_symlink(path) => {
                self.directory_appeared(path)
            }
            (Some(EntryKind::Directory), true) if !self.fs.is_dir(path) => self.file_appeared(path),
            _ => {}
        }
    }

    fn path_gone(&mut self, path: &Path) {
        if path == self.root {
            self.receiver.warning(format!(
                "watched directory {} was removed",
                self.root.display()
            ));
            let drained = self.tree.drain_subtree(&self.root);
            retract(&self.receiver, drained);
            return;
        }
        match self.tree.remove(path) {
            Some(EntryKind::File) => self.receiver.file_removed(path),
            Some(EntryKind::Directory) => {
                let drained = self.tree.drain_subtree(path);
                retract(&self.receiver, drained);
                self.receiver.directory_removed(path);
            }
            // Never announced, or already cascaded by a parent removal.
            None => {}
        }
    }
}

/// Walk `dir` and announce every entry not already in `tree`.
///
/// Directories are announced before their contents. Symlinks are reported
/// as files and never followed. Returns how many entries were announced.
pub fn scan_tree(
    fs: &dyn FileSystem,
    dir: &Path,
    tree: &mut KnownTree,
    receiver: &NotificationReceiver,
) -> Result<usize> {
    let mut stack = vec![dir.to_path_buf()];
    let mut announced = 0usize;

    while let Some(current) = stack.pop() {
        let entries = match fs.read_dir(&current) {
            Ok(entries) => entries,
            Err(err) if current == dir => return Err(err),
            Err(err) => {
                receiver.warning(format!(
                    "skipping unreadable directory {}: {err:#}",
                    current.display()
                ));
                continue;
            }
        };

        for entry in entries {
            let kind = if fs.is_symlink(&entry) || fs.is_file(&entry) {
                EntryKind::File
            } else if fs.is_dir(&entry) {
                EntryKind::Directory
            } else {
                continue;
            };

            if announce(tree, receiver, &entry, kind) {
                announced += 1;
            }
            if kind == EntryKind::Directory {
                stack.push(entry);
            }
        }
    }

    Ok(announced)
}

/// Record `path` as `kind`, emitting whatever the change implies. Returns
/// false if `path` was already known as `kind`.
fn announce(
    tree: &mut KnownTree,
    receiver: &NotificationReceiver,
    path: &Path,
    kind: EntryKind,
) -> bool {
    match tree.insert(path, kind) {
        Some(previous) if previous == kind => return false,
        Some(EntryKind::File) => receiver.file_removed(path),
        Some(EntryKind::Directory) => {
            let drained = tree.drain_subtree(path);
            retract(receiver, drained);
            receiver.directory_removed(path);
        }
        None => {}
    }
    match kind {
        EntryKind::File => receiver.file_upserted(path),
        EntryKind::Directory => receiver.directory_added(path),
    }
    true
}

fn retract(receiver: &NotificationReceiver, drained: Vec<(PathBuf, EntryKind)>) {
    for (path, kind) in drained {
        match kind {
            EntryKind::File => receiver.file_removed(path),
            EntryKind::Directory => receiver.directory_removed(path),
        }
    }
}
