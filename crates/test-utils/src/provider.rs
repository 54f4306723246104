use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use liveglob::NotificationReceiver;
use liveglob::backend::{BackendFuture, Watcher, WatcherProvider};
use liveglob::errors::BackendError;

#[derive(Debug, Default)]
struct ProviderInner {
    /// Initial tree, relative to the watched directory; `true` for directories.
    initial: Mutex<Vec<(PathBuf, bool)>>,
    receiver: Mutex<Option<(PathBuf, NotificationReceiver)>>,
    starts: AtomicUsize,
    disposes: AtomicUsize,
    fail_start: AtomicBool,
    capability_error: Mutex<Option<String>>,
}

/// In-memory [`WatcherProvider`] with a scripted initial tree.
///
/// `start()` reports the initial entries and `ready()`. Afterwards tests push
/// further notifications through [`Self::receiver`]. Counters record how
/// often the backend was started and disposed.
#[derive(Debug, Clone, Default)]
pub struct ScriptedProvider {
    inner: Arc<ProviderInner>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(self, rel: &str) -> Self {
        self.inner.initial.lock().unwrap().push((PathBuf::from(rel), false));
        self
    }

    pub fn with_dir(self, rel: &str) -> Self {
        self.inner.initial.lock().unwrap().push((PathBuf::from(rel), true));
        self
    }

    /// Make `start()` fail after reporting nothing.
    pub fn failing_start(self) -> Self {
        self.inner.fail_start.store(true, Ordering::SeqCst);
        self
    }

    /// Make `watcher()` refuse with a capability error.
    pub fn unsupported(self, message: &str) -> Self {
        *self.inner.capability_error.lock().unwrap() = Some(message.to_string());
        self
    }

    /// Receiver handed to the most recent watcher.
    pub fn receiver(&self) -> NotificationReceiver {
        self.inner
            .receiver
            .lock()
            .unwrap()
            .as_ref()
            .map(|(_, receiver)| receiver.clone())
            .expect("no watcher has been created yet")
    }

    /// Absolute path under the most recently watched directory.
    pub fn path(&self, rel: &str) -> PathBuf {
        self.inner
            .receiver
            .lock()
            .unwrap()
            .as_ref()
            .map(|(cwd, _)| cwd.join(rel))
            .expect("no watcher has been created yet")
    }

    pub fn starts(&self) -> usize {
        self.inner.starts.load(Ordering::SeqCst)
    }

    pub fn disposes(&self) -> usize {
        self.inner.disposes.load(Ordering::SeqCst)
    }
}

impl WatcherProvider for ScriptedProvider {
    fn watcher(
        &self,
        cwd: &Path,
        receiver: NotificationReceiver,
    ) -> Result<Box<dyn Watcher>, BackendError> {
        if let Some(message) = self.inner.capability_error.lock().unwrap().clone() {
            return Err(BackendError::Capability(message));
        }
        *self.inner.receiver.lock().unwrap() = Some((cwd.to_path_buf(), receiver.clone()));
        Ok(Box::new(ScriptedWatcher {
            cwd: cwd.to_path_buf(),
            receiver,
            inner: Arc::clone(&self.inner),
        }))
    }
}

struct ScriptedWatcher {
    cwd: PathBuf,
    receiver: NotificationReceiver,
    inner: Arc<ProviderInner>,
}

impl Watcher for ScriptedWatcher {
    fn start(&mut self) -> BackendFuture<'_> {
        Box::pin(async move {
            self.inner.starts.fetch_add(1, Ordering::SeqCst);
            if self.inner.fail_start.load(Ordering::SeqCst) {
                return Err(BackendError::Scan {
                    path: self.cwd.clone(),
                    source: anyhow!("scripted start failure"),
                });
            }
            let initial = self.inner.initial.lock().unwrap().clone();
            for (rel, is_dir) in initial {
                let path = self.cwd.join(rel);
                if is_dir {
                    self.receiver.directory_added(path);
                } else {
                    self.receiver.file_upserted(path);
                }
            }
            self.receiver.ready();
            Ok(())
        })
    }

    fn dispose(&mut self) -> BackendFuture<'_> {
        Box::pin(async move {
            self.inner.disposes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }
}
