// src/backend/mod.rs

//! Native watcher backends.
//!
//! A backend turns OS-level filesystem activity under one directory into
//! calls on a [`NotificationReceiver`]. The rest of the crate only sees those
//! canonical notifications; it does not know which backend produced them.
//!
//! The bundled backend is built on `notify` (see [`native`]). Other backends
//! plug in by implementing [`WatcherProvider`] and [`Watcher`] and passing the
//! provider to [`crate::LiveGlobFactory::open_with`].

pub mod native;
pub mod translate;
pub mod tree;

use std::future::Future;
use std::path::Path;
use std::pin::Pin;

use crate::errors::BackendError;
use crate::notification::NotificationReceiver;
use crate::types::ProviderKind;

pub use native::{NativeProvider, NativeWatcher};
pub use tree::{EntryKind, KnownTree};

/// Future returned by [`Watcher`] methods.
pub type BackendFuture<'a> = Pin<Box<dyn Future<Output = Result<(), BackendError>> + Send + 'a>>;

/// Creates watchers for a directory.
pub trait WatcherProvider: Send + Sync {
    /// Build a watcher for `cwd` that reports into `receiver`.
    ///
    /// `cwd` is absolute. Capability problems are reported here, before
    /// anything is started.
    fn watcher(
        &self,
        cwd: &Path,
        receiver: NotificationReceiver,
    ) -> Result<Box<dyn Watcher>, BackendError>;
}

/// A running (or startable) subscription on one directory.
pub trait Watcher: Send {
    /// Start watching the whole directory.
    ///
    /// Resolves once every pre-existing file and directory has been reported
    /// and `ready()` has been sent.
    fn start(&mut self) -> BackendFuture<'_>;

    /// Stop watching and release backend resources.
    fn dispose(&mut self) -> BackendFuture<'_>;
}

/// Resolve a configured provider kind into a provider.
pub fn provider_for(kind: ProviderKind) -> Box<dyn WatcherProvider> {
    Box::new(NativeProvider::new(kind))
}
