use std::path::{Path, PathBuf};

use liveglob::{LiveGlobFactory, NotificationChannel, NotificationReceiver};

/// Drives a [`NotificationChannel`] the way a backend would, using paths
/// relative to a fixed absolute root.
///
/// ```ignore
/// let script = EventScript::new();
/// let factory = script.factory();
/// script.dir("src").file("src/a.rs").ready();
/// ```
pub struct EventScript {
    root: PathBuf,
    channel: NotificationChannel,
    receiver: NotificationReceiver,
}

impl Default for EventScript {
    fn default() -> Self {
        Self::new()
    }
}

impl EventScript {
    /// Script rooted at a fixed directory under the system temp dir. Nothing
    /// is created on disk.
    pub fn new() -> Self {
        Self::with_root(std::env::temp_dir().join("liveglob-script-root"))
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        let channel = NotificationChannel::new();
        let receiver = channel.receiver();
        Self {
            root: root.into(),
            channel,
            receiver,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn channel(&self) -> &NotificationChannel {
        &self.channel
    }

    /// Absolute path for `rel`.
    pub fn path(&self, rel: &str) -> PathBuf {
        self.root.join(rel)
    }

    /// A factory fed by this script.
    pub fn factory(&self) -> LiveGlobFactory {
        LiveGlobFactory::detached(&self.root, &self.channel).expect("detached factory")
    }

    pub fn file(&self, rel: &str) -> &Self {
        self.receiver.file_upserted(self.path(rel));
        self
    }

    pub fn remove_file(&self, rel: &str) -> &Self {
        self.receiver.file_removed(self.path(rel));
        self
    }

    pub fn dir(&self, rel: &str) -> &Self {
        self.receiver.directory_added(self.path(rel));
        self
    }

    pub fn remove_dir(&self, rel: &str) -> &Self {
        self.receiver.directory_removed(self.path(rel));
        self
    }

    pub fn ready(&self) -> &Self {
        self.receiver.ready();
        self
    }

    pub fn warning(&self, message: &str) -> &Self {
        self.receiver.warning(message);
        self
    }

    pub fn info(&self, message: &str) -> &Self {
        self.receiver.info(message);
        self
    }
}
