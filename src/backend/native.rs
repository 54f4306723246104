// src/backend/native.rs

//! Backend built on the `notify` crate.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{Config, Event, PollWatcher, RecommendedWatcher, RecursiveMode, Watcher as _};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::backend::translate::EventTranslator;
use crate::backend::{BackendFuture, Watcher, WatcherProvider};
use crate::errors::BackendError;
use crate::fs::{FileSystem, RealFileSystem};
use crate::notification::NotificationReceiver;
use crate::types::ProviderKind;

/// Provider for [`NativeWatcher`]s.
#[derive(Debug, Clone)]
pub struct NativeProvider {
    kind: ProviderKind,
    fs: Arc<dyn FileSystem>,
}

impl NativeProvider {
    pub fn new(kind: ProviderKind) -> Self {
        Self::with_fs(kind, Arc::new(RealFileSystem))
    }

    /// Provider that classifies and scans paths through `fs`.
    pub fn with_fs(kind: ProviderKind, fs: Arc<dyn FileSystem>) -> Self {
        Self { kind, fs }
    }
}

impl WatcherProvider for NativeProvider {
    fn watcher(
        &self,
        cwd: &Path,
        receiver: NotificationReceiver,
    ) -> Result<Box<dyn Watcher>, BackendError> {
        if let ProviderKind::Poll { interval_ms: 0 } = self.kind {
            return Err(BackendError::Capability(
                "poll interval must be greater than zero".to_string(),
            ));
        }
        if !self.fs.is_dir(cwd) {
            return Err(BackendError::Capability(format!(
                "{} is not a directory",
                cwd.display()
            )));
        }
        Ok(Box::new(NativeWatcher::new(
            cwd.to_path_buf(),
            self.kind,
            Arc::clone(&self.fs),
            receiver,
        )))
    }
}

enum OsWatcher {
    Recommended(RecommendedWatcher),
    Poll(PollWatcher),
}

impl OsWatcher {
    fn watch(&mut self, path: &Path) -> notify::Result<()> {
        match self {
            OsWatcher::Recommended(w) => w.watch(path, RecursiveMode::Recursive),
            OsWatcher::Poll(w) => w.watch(path, RecursiveMode::Recursive),
        }
    }

    fn unwatch(&mut self, path: &Path) -> notify::Result<()> {
        match self {
            OsWatcher::Recommended(w) => w.unwatch(path),
            OsWatcher::Poll(w) => w.unwatch(path),
        }
    }
}

/// A recursive `notify` subscription on one directory.
///
/// `start` registers the OS watch first and scans second, so nothing created
/// in between is lost; duplicates from that overlap are filtered by the
/// translator. Raw events are forwarded from notify's callback thread into
/// a tokio task that owns the translator.
pub struct NativeWatcher {
    root: PathBuf,
    kind: ProviderKind,
    fs: Arc<dyn FileSystem>,
    receiver: NotificationReceiver,
    os: Option<OsWatcher>,
    pump: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for NativeWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeWatcher")
            .field("root", &self.root)
            .field("kind", &self.kind)
            .field("running", &self.os.is_some())
            .finish_non_exhaustive()
    }
}

impl NativeWatcher {
    pub fn new(
        root: PathBuf,
        kind: ProviderKind,
        fs: Arc<dyn FileSystem>,
        receiver: NotificationReceiver,
    ) -> Self {
        Self {
            root,
            kind,
            fs,
            receiver,
            os: None,
            pump: None,
        }
    }

    fn os_watcher(&self, tx: mpsc::UnboundedSender<notify::Result<Event>>) -> notify::Result<OsWatcher> {
        // Called synchronously on notify's own thread.
        let handler = move |res: notify::Result<Event>| {
            // The receiver is gone only after dispose; late events are moot.
            let _ = tx.send(res);
        };
        match self.kind {
            ProviderKind::Native => {
                RecommendedWatcher::new(handler, Config::default()).map(OsWatcher::Recommended)
            }
            ProviderKind::Poll { interval_ms } => PollWatcher::new(
                handler,
                Config::default().with_poll_interval(Duration::from_millis(interval_ms)),
            )
            .map(OsWatcher::Poll),
        }
    }

    fn start_inner(&mut self) -> Result<(), BackendError> {
        if self.os.is_some() {
            return Ok(());
        }

        let (tx, mut rx) = mpsc::unbounded_channel::<notify::Result<Event>>();
        let mut os = self
            .os_watcher(tx)
            .map_err(|e| BackendError::subscription("creating watcher", e))?;
        os.watch(&self.root).map_err(|e| {
            BackendError::subscription(format!("watching {}", self.root.display()), e)
        })?;

        let mut translator =
            EventTranslator::new(self.root.clone(), Arc::clone(&self.fs), self.receiver.clone());
        match translator.scan() {
            Ok(count) => debug!(root = %self.root.display(), entries = count, "initial scan complete"),
            Err(source) => {
                let _ = os.unwatch(&self.root);
                return Err(BackendError::Scan {
                    path: self.root.clone(),
                    source,
                });
            }
        }

        self.receiver
            .info(format!("watch established on {}", self.root.display()));
        self.receiver.ready();

        let root = self.root.clone();
        self.pump = Some(tokio::spawn(async move {
            while let Some(result) = rx.recv().await {
                match result {
                    Ok(event) => translator.handle(event),
                    Err(err) => translator
                        .receiver()
                        .warning(format!("file watch error: {err}")),
                }
            }
            debug!(root = %root.display(), "notify event pump finished");
        }));
        self.os = Some(os);

        info!(root = %self.root.display(), kind = ?self.kind, "native watcher started");
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(mut os) = self.os.take() {
            // Fails routinely when the root itself was deleted.
            if let Err(err) = os.unwatch(&self.root) {
                debug!(root = %self.root.display(), error = %err, "unwatch failed");
            }
            debug!(root = %self.root.display(), "native watcher stopped");
        }
        if let Some(pump) = self.pump.take() {
            pump.abort();
        }
    }
}

impl Watcher for NativeWatcher {
    fn start(&mut self) -> BackendFuture<'_> {
        Box::pin(async move { self.start_inner() })
    }

    fn dispose(&mut self) -> BackendFuture<'_> {
        Box::pin(async move {
            self.stop();
            Ok(())
        })
    }
}

impl Drop for NativeWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}
