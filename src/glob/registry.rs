// src/glob/registry.rs

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use tokio::sync::Mutex;
use tracing::debug;

use crate::errors::{LiveGlobError, Result};
use crate::glob::factory::LiveGlobFactory;
use crate::glob::live_glob::LiveGlob;
use crate::paths::absolutize;
use crate::types::Options;

/// Absolute form of an optional working directory, resolved against the
/// process working directory. No filesystem lookups beyond that.
pub fn resolve_cwd(cwd: Option<&Path>) -> Result<PathBuf> {
    let base = std::env::current_dir()?;
    Ok(match cwd {
        Some(cwd) => absolutize(&base, cwd),
        None => absolutize(&base, Path::new(".")),
    })
}

/// One factory per working directory, created on first use.
///
/// Factories auto-dispose when their last view closes; the next request for
/// that directory then opens a fresh one.
#[derive(Debug, Default)]
pub struct FactoryRegistry {
    factories: Mutex<HashMap<PathBuf, LiveGlobFactory>>,
}

impl FactoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Live glob over `patterns`, sharing a factory with every other live
    /// glob for the same working directory.
    pub async fn glob<I, S>(&self, patterns: I, options: &Options) -> Result<LiveGlob>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns: Vec<String> = patterns
            .into_iter()
            .map(|p| p.as_ref().to_string())
            .collect();
        let cwd = resolve_cwd(options.cwd.as_deref())?;
        let view_options = options.view_options();

        let mut factories = self.factories.lock().await;

        if let Some(factory) = factories.get(&cwd) {
            match factory.create(&patterns, view_options) {
                Err(LiveGlobError::AlreadyClosed) => {
                    debug!(cwd = %cwd.display(), "cached factory was closed; reopening");
                    factories.remove(&cwd);
                }
                other => return other,
            }
        }

        let factory = LiveGlobFactory::open(&cwd, options.provider).await?;
        let view = factory.create(&patterns, view_options)?;
        factories.insert(cwd, factory);
        Ok(view)
    }

    /// Number of cached factories that are still open.
    pub async fn open_factories(&self) -> usize {
        let mut factories = self.factories.lock().await;
        factories.retain(|_, factory| !factory.is_closed());
        factories.len()
    }
}

static REGISTRY: LazyLock<FactoryRegistry> = LazyLock::new(FactoryRegistry::new);

/// Watch `patterns` under `options.cwd` (default: the process working
/// directory).
///
/// Resolves once the initial tree has been loaded. Calls for the same
/// working directory share one watcher backend.
pub async fn glob<I, S>(patterns: I, options: Options) -> Result<LiveGlob>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    REGISTRY.glob(patterns, &options).await
}
