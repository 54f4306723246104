// src/lib.rs

//! Live, glob-filtered views of a directory tree.
//!
//! A [`LiveGlobFactory`] watches one directory through a backend and keeps
//! the full set of files and directories under it. Each [`LiveGlob`] made
//! from it is a glob-filtered view of that set that stays current as the
//! tree changes. It records what was added, removed or changed since the
//! last [`LiveGlob::clean`] and can push every change to subscribers.
//!
//! ```no_run
//! # async fn demo() -> liveglob::Result<()> {
//! let view = liveglob::glob(["src/**/*.rs"], liveglob::Options::default()).await?;
//! println!("{:?}", view.files());
//! view.close();
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod cli;
pub mod config;
pub mod errors;
pub mod fs;
pub mod glob;
pub mod logging;
pub mod notification;
pub mod ownership;
pub mod paths;
pub mod state;
pub mod types;

use anyhow::{Result as AnyResult, bail};
use tracing::{info, warn};

pub use crate::errors::{BackendError, LiveGlobError, Result};
pub use crate::glob::{FactoryRegistry, GlobMatcher, GlobSnapshot, LiveGlob, LiveGlobFactory, glob};
pub use crate::notification::{
    Notification, NotificationChannel, NotificationReceiver, SubscriptionId,
};
pub use crate::state::{DiffSets, GlobEvent, GlobEventKind, PathSet};
pub use crate::types::{Delimiter, Options, ProviderKind, ViewOptions};

use crate::cli::CliArgs;
use crate::config::loader::{default_config_path, load_resolved};
use crate::config::model::{ConfigFile, RawConfigFile};
use crate::glob::resolve_cwd;

/// High-level entry point used by `main.rs`.
///
/// Merges the config file with CLI flags, opens a factory on the working
/// directory and either prints the current matches (`--once`) or streams
/// events until Ctrl-C.
pub async fn run(args: CliArgs) -> AnyResult<()> {
    let config = resolve_settings(&args)?;
    let (patterns, options) = config.into_parts();

    let cwd = resolve_cwd(options.cwd.as_deref())?;
    let factory = LiveGlobFactory::open(&cwd, options.provider).await?;
    // The view is closed before the factory; keep the factory for `close()`.
    factory.set_auto_dispose(false);
    let view = factory.create(&patterns, options.view_options())?;

    if args.once {
        print_listing(&view);
        view.close();
        factory.close().await?;
        return Ok(());
    }

    let mut events = view.event_stream();
    info!(cwd = %cwd.display(), ?patterns, "watching; press Ctrl-C to stop");

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(event) => println!("{} {}", event.kind, event.path),
                None => break,
            },
            signal = tokio::signal::ctrl_c() => {
                if let Err(err) = signal {
                    warn!(error = %err, "failed to listen for Ctrl-C");
                }
                break;
            }
        }
    }

    view.close();
    factory.close().await?;
    Ok(())
}

/// Config file values overridden by CLI flags, validated as a whole.
fn resolve_settings(args: &CliArgs) -> AnyResult<ConfigFile> {
    let mut raw = match &args.config {
        Some(path) => load_resolved(path)?,
        None => {
            let default_path = default_config_path();
            if default_path.is_file() {
                load_resolved(&default_path)?
            } else {
                RawConfigFile::default()
            }
        }
    };

    if !args.patterns.is_empty() {
        raw.patterns = args.patterns.clone();
    }
    if raw.patterns.is_empty() {
        bail!("no glob patterns given; pass them as arguments or in a config file");
    }
    if let Some(cwd) = &args.cwd {
        raw.cwd = Some(cwd.clone());
    }
    if args.absolute {
        raw.absolute = true;
    }
    if let Some(delimiter) = args.delimiter {
        raw.delimiter = delimiter;
    }
    if args.dirty {
        raw.initial_state_considered_dirty = true;
    }
    if let Some(interval_ms) = args.poll_interval_ms {
        raw.provider = ProviderKind::Poll { interval_ms };
    }

    Ok(ConfigFile::try_from(raw)?)
}

fn print_listing(view: &LiveGlob) {
    let snapshot = view.snapshot();
    for dir in &snapshot.directories {
        println!("{dir}/");
    }
    for file in &snapshot.files {
        println!("{file}");
    }
}
