// src/glob/live_glob.rs

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::errors::{LiveGlobError, Result};
use crate::glob::factory::LiveGlobFactory;
use crate::glob::matcher::GlobMatcher;
use crate::notification::{Fanout, Notification, SubscriptionId};
use crate::ownership::OwnerId;
use crate::paths::{path_to_string, relative_path, relative_str, to_posix};
use crate::state::{DiffSets, GlobEvent, GlobState, PathPolicy, PathSet, apply};
use crate::types::{Delimiter, ViewOptions};

/// Glob filter plus output path format for one live glob.
#[derive(Debug)]
struct ViewPolicy {
    cwd: PathBuf,
    matcher: GlobMatcher,
    absolute: bool,
    delimiter: Delimiter,
}

impl PathPolicy for ViewPolicy {
    fn matches(&self, raw: &Path) -> bool {
        let rel = relative_str(&self.cwd, raw);
        // The working directory itself and anything outside it never match.
        if rel.is_empty() || rel == ".." || rel.starts_with("../") {
            return false;
        }
        self.matcher.is_match(&rel)
    }

    fn normalize_path(&self, raw: &Path) -> String {
        let path = if self.absolute {
            path_to_string(raw)
        } else {
            path_to_string(&relative_path(&self.cwd, raw))
        };
        match self.delimiter {
            Delimiter::Native => path,
            Delimiter::Posix => to_posix(&path),
        }
    }
}

struct ViewShared {
    policy: ViewPolicy,
    state: Mutex<GlobState>,
    subscribers: Fanout<GlobEvent>,
    closed: AtomicBool,
}

impl ViewShared {
    fn lock_state(&self) -> MutexGuard<'_, GlobState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn handle(&self, notification: &Notification) {
        if self.closed.load(Ordering::SeqCst) {
            return;
        }
        let (event, delivery) = {
            let mut state = self.lock_state();
            match apply(&mut state, &self.policy, notification) {
                Some(event) => (event, self.subscribers.snapshot()),
                None => return,
            }
        };
        delivery.deliver(&event);
    }
}

/// Everything a live glob knows at one instant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobSnapshot {
    pub files: PathSet,
    pub directories: PathSet,
    pub diff: DiffSets,
}

/// A glob-filtered, incrementally maintained view of a directory tree.
///
/// Created by [`LiveGlobFactory::create`] (or [`crate::glob`]). Paths are
/// relative to the factory's working directory unless the view was created
/// with `absolute`.
///
/// Alongside the live `files`/`directories` sets a view tracks what changed
/// since the last [`Self::clean`]. Subscribers get one [`GlobEvent`] per
/// change as it happens.
///
/// Clones share the same view. Closing any clone closes the view; once
/// closed it stops changing and delivers no further events.
#[derive(Clone)]
pub struct LiveGlob {
    shared: Arc<ViewShared>,
    factory: LiveGlobFactory,
    owner: OwnerId,
}

impl fmt::Debug for LiveGlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveGlob")
            .field("patterns", &self.patterns())
            .field("cwd", &self.shared.policy.cwd)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

impl LiveGlob {
    pub(crate) fn attach(
        factory: &LiveGlobFactory,
        matcher: GlobMatcher,
        options: ViewOptions,
    ) -> Result<Self> {
        let shared = Arc::new(ViewShared {
            policy: ViewPolicy {
                cwd: factory.cwd().to_path_buf(),
                matcher,
                absolute: options.absolute,
                delimiter: options.delimiter,
            },
            state: Mutex::new(GlobState::with_diff()),
            subscribers: Fanout::new(),
            closed: AtomicBool::new(false),
        });

        let owners = factory.owners();
        let owner = owners.add_node(format!(
            "live glob {:?}",
            shared.policy.matcher.patterns()
        ));

        let weak = Arc::downgrade(&shared);
        let listener = factory.subscribe_view(
            |source| {
                shared.lock_state().populate_from(
                    source,
                    &shared.policy,
                    options.initial_state_considered_dirty,
                );
            },
            move |notification| {
                if let Some(view) = weak.upgrade() {
                    view.handle(notification);
                }
            },
        );

        let views = factory.views().clone();
        let weak = Arc::downgrade(&shared);
        owners.on_disposal(owner, move || {
            views.unsubscribe(listener);
            if let Some(view) = weak.upgrade() {
                view.closed.store(true, Ordering::SeqCst);
                view.subscribers.clear();
                debug!(patterns = ?view.policy.matcher.patterns(), "live glob closed");
            }
        });
        owners.set_owner(owner, factory.owner());

        if factory.is_closed() {
            owners.dispose(owner);
            return Err(LiveGlobError::AlreadyClosed);
        }

        {
            let state = shared.lock_state();
            info!(
                patterns = ?shared.policy.matcher.patterns(),
                cwd = %shared.policy.cwd.display(),
                files = state.files().len(),
                directories = state.directories().len(),
                "live glob created"
            );
        }

        Ok(Self {
            shared,
            factory: factory.clone(),
            owner,
        })
    }

    fn read<T>(&self, f: impl FnOnce(&GlobState) -> T) -> T {
        f(&self.shared.lock_state())
    }

    fn read_diff(&self, f: impl FnOnce(&DiffSets) -> PathSet) -> PathSet {
        self.read(|state| state.diff().map(f).unwrap_or_default())
    }

    pub fn patterns(&self) -> &[String] {
        self.shared.policy.matcher.patterns()
    }

    /// The factory this view belongs to.
    pub fn factory(&self) -> &LiveGlobFactory {
        &self.factory
    }

    /// Whether a raw (absolute) path is selected by this view's patterns.
    pub fn matches(&self, raw: &Path) -> bool {
        self.shared.policy.matches(raw)
    }

    /// The form `raw` takes in this view's sets and events.
    pub fn normalize_path(&self, raw: &Path) -> String {
        self.shared.policy.normalize_path(raw)
    }

    pub fn files(&self) -> PathSet {
        self.read(|state| state.files().clone())
    }

    pub fn directories(&self) -> PathSet {
        self.read(|state| state.directories().clone())
    }

    pub fn added_files(&self) -> PathSet {
        self.read_diff(|diff| diff.added_files.clone())
    }

    pub fn removed_files(&self) -> PathSet {
        self.read_diff(|diff| diff.removed_files.clone())
    }

    pub fn changed_files(&self) -> PathSet {
        self.read_diff(|diff| diff.changed_files.clone())
    }

    pub fn added_directories(&self) -> PathSet {
        self.read_diff(|diff| diff.added_directories.clone())
    }

    pub fn removed_directories(&self) -> PathSet {
        self.read_diff(|diff| diff.removed_directories.clone())
    }

    /// All sets, read under one lock.
    pub fn snapshot(&self) -> GlobSnapshot {
        self.read(|state| GlobSnapshot {
            files: state.files().clone(),
            directories: state.directories().clone(),
            diff: state.diff().cloned().unwrap_or_default(),
        })
    }

    /// Empty the diff sets, starting a new change window.
    pub fn clean(&self) {
        self.shared.lock_state().clean();
    }

    /// Register a callback for every change to this view.
    ///
    /// Callbacks run on whichever thread delivers the notification and must
    /// not block.
    pub fn subscribe(&self, listener: impl Fn(&GlobEvent) + Send + Sync + 'static) -> SubscriptionId {
        self.shared.subscribers.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.shared.subscribers.unsubscribe(id)
    }

    /// Changes to this view as an async stream.
    ///
    /// The stream ends when the view is closed.
    pub fn event_stream(&self) -> mpsc::UnboundedReceiver<GlobEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        if !self.is_closed() {
            self.subscribe(move |event| {
                let _ = tx.send(event.clone());
            });
        }
        rx
    }

    /// Stop tracking changes.
    ///
    /// Returns `false` if the view was already closed. Closing the last view
    /// of an auto-disposing factory also disposes the factory.
    pub fn close(&self) -> bool {
        self.factory.owners().dispose(self.owner)
    }

    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::SeqCst)
    }
}
