// src/glob/factory.rs

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use crate::backend::{Watcher, WatcherProvider, provider_for};
use crate::errors::{LiveGlobError, Result};
use crate::glob::live_glob::LiveGlob;
use crate::glob::matcher::GlobMatcher;
use crate::glob::registry::resolve_cwd;
use crate::notification::{Fanout, Notification, NotificationChannel, SubscriptionId};
use crate::ownership::{OwnerId, Owners};
use crate::state::{GlobState, PathSet, Unfiltered, apply};
use crate::types::{ProviderKind, ViewOptions};

struct FactoryShared {
    cwd: PathBuf,
    source: NotificationChannel,
    /// Every path under `cwd`, exactly as the backend reports it.
    state: Mutex<GlobState>,
    /// Live globs created by this factory.
    views: Fanout<Notification>,
    backend: Mutex<Option<Box<dyn Watcher>>>,
}

impl FactoryShared {
    fn lock_state(&self) -> MutexGuard<'_, GlobState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn take_backend(&self) -> Option<Box<dyn Watcher>> {
        self.backend
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// Apply `notification` to the unfiltered state, then hand it to every
    /// view that was registered at the moment it was applied.
    fn handle(&self, notification: &Notification) {
        match notification {
            Notification::Warning(message) => {
                warn!(target: "liveglob::backend", cwd = %self.cwd.display(), "{message}");
            }
            Notification::Info(message) => {
                info!(target: "liveglob::backend", cwd = %self.cwd.display(), "{message}");
            }
            _ => {}
        }

        let delivery = {
            let mut state = self.lock_state();
            if let Some(event) = apply(&mut state, &Unfiltered, notification) {
                debug!(kind = %event.kind, path = %event.path, "factory state updated");
            }
            if *notification == Notification::Ready {
                debug!(
                    cwd = %self.cwd.display(),
                    files = state.files().len(),
                    directories = state.directories().len(),
                    "initial state observed"
                );
            }
            self.views.snapshot()
        };
        delivery.deliver(notification);
    }
}

/// Shared, unfiltered state for one working directory.
///
/// A factory subscribes once to a notification source and keeps a complete
/// picture of the directory tree. [`LiveGlob`]s made by [`Self::create`] are
/// seeded from that picture and then follow the same notification stream.
///
/// The factory is the root of its ownership graph. By default it disposes
/// itself (and releases the backend) once the last live glob is closed; see
/// [`Self::set_auto_dispose`].
///
/// Cloning is cheap and yields another handle to the same factory.
#[derive(Clone)]
pub struct LiveGlobFactory {
    shared: Arc<FactoryShared>,
    owners: Owners,
    owner: OwnerId,
}

impl fmt::Debug for LiveGlobFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveGlobFactory")
            .field("cwd", &self.shared.cwd)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

impl LiveGlobFactory {
    /// Factory for `cwd` fed by `provider`.
    ///
    /// Resolves once the backend has reported the initial tree. A backend
    /// failure is returned unchanged and leaves nothing running.
    pub async fn open_with(cwd: impl AsRef<Path>, provider: &dyn WatcherProvider) -> Result<Self> {
        let cwd = resolve_cwd(Some(cwd.as_ref()))?;
        // Backends may report canonical paths (e.g. /private/var on macOS).
        let cwd = cwd.canonicalize().unwrap_or(cwd);

        let source = NotificationChannel::new();
        let factory = Self::from_source(cwd.clone(), &source);

        let mut watcher = match provider.watcher(&cwd, source.receiver()) {
            Ok(watcher) => watcher,
            Err(err) => {
                factory.dispose();
                return Err(err.into());
            }
        };

        if let Err(err) = watcher.start().await {
            factory.dispose();
            if let Err(dispose_err) = watcher.dispose().await {
                debug!(error = %dispose_err, "backend cleanup after failed start also failed");
            }
            return Err(err.into());
        }

        if factory.is_closed() {
            release_backend(watcher, cwd);
            return Err(LiveGlobError::AlreadyClosed);
        }
        *factory
            .shared
            .backend
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(watcher);

        info!(cwd = %cwd.display(), "live glob factory ready");
        Ok(factory)
    }

    /// Factory for `cwd` using the bundled backend of the given kind.
    pub async fn open(cwd: impl AsRef<Path>, kind: ProviderKind) -> Result<Self> {
        let provider = provider_for(kind);
        Self::open_with(cwd, provider.as_ref()).await
    }

    /// Factory fed by an existing channel, with no backend of its own.
    ///
    /// Whoever holds the channel's receiver drives the state. `cwd` is made
    /// absolute against the process working directory.
    pub fn detached(cwd: impl AsRef<Path>, source: &NotificationChannel) -> Result<Self> {
        let cwd = resolve_cwd(Some(cwd.as_ref()))?;
        Ok(Self::from_source(cwd, source))
    }

    fn from_source(cwd: PathBuf, source: &NotificationChannel) -> Self {
        let shared = Arc::new(FactoryShared {
            cwd,
            source: source.clone(),
            state: Mutex::new(GlobState::new()),
            views: Fanout::new(),
            backend: Mutex::new(None),
        });

        let owners = Owners::new();
        let owner = owners.add_node(format!("factory {}", shared.cwd.display()));
        owners.dispose_on_last_child_disposed(owner, true);

        let weak = Arc::downgrade(&shared);
        let listener = source.subscribe(move |notification| {
            if let Some(shared) = weak.upgrade() {
                shared.handle(notification);
            }
        });

        let weak = Arc::downgrade(&shared);
        owners.on_disposal(owner, move || {
            let Some(shared) = weak.upgrade() else {
                return;
            };
            shared.source.unsubscribe(listener);
            shared.views.clear();
            if let Some(watcher) = shared.take_backend() {
                release_backend(watcher, shared.cwd.clone());
            }
            info!(cwd = %shared.cwd.display(), "live glob factory closed");
        });

        Self {
            shared,
            owners,
            owner,
        }
    }

    /// Create a live glob over `patterns`.
    ///
    /// The new view starts from a snapshot of the current state and then
    /// follows the notification stream. Fails with
    /// [`LiveGlobError::AlreadyClosed`] once the factory is disposed.
    pub fn create<I, S>(&self, patterns: I, options: ViewOptions) -> Result<LiveGlob>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if self.is_closed() {
            return Err(LiveGlobError::AlreadyClosed);
        }
        let matcher = GlobMatcher::new(patterns)?;
        LiveGlob::attach(self, matcher, options)
    }

    /// Absolute working directory of this factory.
    pub fn cwd(&self) -> &Path {
        &self.shared.cwd
    }

    pub fn is_closed(&self) -> bool {
        self.owners.is_disposed(self.owner)
    }

    /// Whether the notification source has reported its initial tree.
    pub fn is_ready(&self) -> bool {
        self.shared.source.is_ready()
    }

    /// Snapshot of every known file (raw paths).
    pub fn files(&self) -> PathSet {
        self.shared.lock_state().files().clone()
    }

    /// Snapshot of every known directory (raw paths).
    pub fn directories(&self) -> PathSet {
        self.shared.lock_state().directories().clone()
    }

    /// Number of live globs that are still open.
    pub fn view_count(&self) -> usize {
        self.owners.nondisposed_children(self.owner)
    }

    /// Control whether closing the last live glob disposes the factory.
    /// Enabled by default.
    pub fn set_auto_dispose(&self, enabled: bool) {
        self.owners.dispose_on_last_child_disposed(self.owner, enabled);
    }

    /// Register a callback to run once when the factory is disposed.
    pub fn on_disposal(&self, callback: impl FnOnce() + Send + 'static) {
        self.owners.on_disposal(self.owner, callback);
    }

    /// Dispose the factory and every live glob it made.
    ///
    /// The backend is released in the background. Returns `false` if the
    /// factory was already disposed.
    pub fn dispose(&self) -> bool {
        self.owners.dispose(self.owner)
    }

    /// Dispose the factory and wait for the backend to shut down.
    pub async fn close(&self) -> Result<()> {
        let backend = self.shared.take_backend();
        self.dispose();
        if let Some(mut watcher) = backend {
            watcher.dispose().await?;
        }
        Ok(())
    }

    pub(crate) fn owners(&self) -> &Owners {
        &self.owners
    }

    pub(crate) fn owner(&self) -> OwnerId {
        self.owner
    }

    pub(crate) fn views(&self) -> &Fanout<Notification> {
        &self.shared.views
    }

    /// Seed a new view from the current state and register its listener in
    /// one step, so no notification falls between the two.
    pub(crate) fn subscribe_view(
        &self,
        seed: impl FnOnce(&GlobState),
        listener: impl Fn(&Notification) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let state = self.shared.lock_state();
        seed(&state);
        self.shared.views.subscribe(listener)
    }
}

/// Stop a backend from a synchronous context.
fn release_backend(mut watcher: Box<dyn Watcher>, cwd: PathBuf) {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn(async move {
                if let Err(err) = watcher.dispose().await {
                    warn!(cwd = %cwd.display(), error = %err, "failed to release watcher backend");
                }
            });
        }
        Err(_) => {
            debug!(cwd = %cwd.display(), "no async runtime; dropping watcher backend");
            drop(watcher);
        }
    }
}
