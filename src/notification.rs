// src/notification.rs

//! Backend-agnostic notification surface.
//!
//! A watcher backend pushes exactly seven kinds of signal through a
//! [`NotificationReceiver`]; any number of listeners registered on the
//! matching [`NotificationChannel`] observe them synchronously, in
//! registration order, in the order the backend produced them.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

/// One canonical signal from a watcher backend.
///
/// Paths are raw: absolute, with native separators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// A file was created or its contents changed.
    FileUpserted(PathBuf),
    FileRemoved(PathBuf),
    DirectoryAdded(PathBuf),
    DirectoryRemoved(PathBuf),
    /// The initial tree has been fully reported.
    Ready,
    Warning(String),
    Info(String),
}

impl Notification {
    /// Raw path carried by the four path-level signals.
    pub fn raw_path(&self) -> Option<&Path> {
        match self {
            Notification::FileUpserted(p)
            | Notification::FileRemoved(p)
            | Notification::DirectoryAdded(p)
            | Notification::DirectoryRemoved(p) => Some(p),
            Notification::Ready | Notification::Warning(_) | Notification::Info(_) => None,
        }
    }
}

/// Identifies a registered listener so it can be removed again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener<E> = Arc<dyn Fn(&E) + Send + Sync>;

struct Listeners<E> {
    next_id: u64,
    entries: Vec<(SubscriptionId, Listener<E>)>,
}

/// Ordered list of callbacks for values of type `E`.
///
/// Delivery clones the current listener list and invokes it without holding
/// the lock, so a listener may subscribe or unsubscribe while being called.
pub struct Fanout<E> {
    listeners: Arc<Mutex<Listeners<E>>>,
}

impl<E> Clone for Fanout<E> {
    fn clone(&self) -> Self {
        Self {
            listeners: Arc::clone(&self.listeners),
        }
    }
}

impl<E> Default for Fanout<E> {
    fn default() -> Self {
        Self {
            listeners: Arc::new(Mutex::new(Listeners {
                next_id: 0,
                entries: Vec::new(),
            })),
        }
    }
}

impl<E> fmt::Debug for Fanout<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fanout")
            .field("listeners", &self.len())
            .finish()
    }
}

impl<E> Fanout<E> {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Listeners<E>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn subscribe(&self, listener: impl Fn(&E) + Send + Sync + 'static) -> SubscriptionId {
        let mut listeners = self.lock();
        let id = SubscriptionId(listeners.next_id);
        listeners.next_id += 1;
        listeners.entries.push((id, Arc::new(listener)));
        id
    }

    /// Returns `false` if `id` was not registered (or already removed).
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.lock();
        let before = listeners.entries.len();
        listeners.entries.retain(|(entry_id, _)| *entry_id != id);
        listeners.entries.len() != before
    }

    pub fn clear(&self) {
        self.lock().entries.clear();
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Capture the listeners registered right now.
    ///
    /// Callers that must decide "who sees this value" atomically with some
    /// other state change take the snapshot under their own lock and deliver
    /// after releasing it.
    pub fn snapshot(&self) -> Delivery<E> {
        Delivery {
            listeners: self.lock().entries.iter().map(|(_, l)| Arc::clone(l)).collect(),
        }
    }

    pub fn emit(&self, value: &E) {
        self.snapshot().deliver(value);
    }
}

/// Listener list captured by [`Fanout::snapshot`].
pub struct Delivery<E> {
    listeners: Vec<Listener<E>>,
}

impl<E> fmt::Debug for Delivery<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Delivery")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl<E> Delivery<E> {
    pub fn deliver(&self, value: &E) {
        for listener in &self.listeners {
            listener(value);
        }
    }
}

/// Channel a backend publishes into and listeners subscribe to.
#[derive(Debug, Clone, Default)]
pub struct NotificationChannel {
    fanout: Fanout<Notification>,
    ready: Arc<AtomicBool>,
}

impl NotificationChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(
        &self,
        listener: impl Fn(&Notification) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.fanout.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.fanout.unsubscribe(id)
    }

    pub fn listener_count(&self) -> usize {
        self.fanout.len()
    }

    /// Whether `Ready` has been published.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    /// Deliver `notification` to every listener.
    ///
    /// `Ready` is delivered at most once per channel; later copies are
    /// dropped.
    pub fn publish(&self, notification: Notification) {
        if notification == Notification::Ready && self.ready.swap(true, Ordering::SeqCst) {
            debug!("dropping duplicate ready notification");
            return;
        }
        self.fanout.emit(&notification);
    }

    /// Backend-facing handle for this channel.
    pub fn receiver(&self) -> NotificationReceiver {
        NotificationReceiver {
            channel: self.clone(),
        }
    }
}

/// What a watcher backend calls to report filesystem activity.
#[derive(Debug, Clone)]
pub struct NotificationReceiver {
    channel: NotificationChannel,
}

impl NotificationReceiver {
    /// Called for every file that appears or changes, including during the
    /// initial enumeration.
    pub fn file_upserted(&self, path: impl Into<PathBuf>) {
        self.channel.publish(Notification::FileUpserted(path.into()));
    }

    pub fn file_removed(&self, path: impl Into<PathBuf>) {
        self.channel.publish(Notification::FileRemoved(path.into()));
    }

    pub fn directory_added(&self, path: impl Into<PathBuf>) {
        self.channel.publish(Notification::DirectoryAdded(path.into()));
    }

    pub fn directory_removed(&self, path: impl Into<PathBuf>) {
        self.channel.publish(Notification::DirectoryRemoved(path.into()));
    }

    /// Called exactly once, after the initial tree has been reported.
    pub fn ready(&self) {
        self.channel.publish(Notification::Ready);
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.channel.publish(Notification::Warning(message.into()));
    }

    pub fn info(&self, message: impl Into<String>) {
        self.channel.publish(Notification::Info(message.into()));
    }
}
