use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

/// Separator style used for paths handed out by a live glob.
///
/// - `Native`: keep the platform separator (`\` on Windows).
/// - `Posix`: rewrite every native separator to `/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Delimiter {
    #[default]
    Native,
    Posix,
}

impl FromStr for Delimiter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "native" => Ok(Delimiter::Native),
            "posix" => Ok(Delimiter::Posix),
            other => Err(format!(
                "invalid delimiter: {other} (expected \"native\" or \"posix\")"
            )),
        }
    }
}

/// Which notification backend a factory should watch its directory with.
///
/// Chosen once (from options or config) and handed to
/// [`crate::backend::provider_for`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ProviderKind {
    /// The platform's recommended notify backend (inotify, FSEvents, ...).
    #[default]
    Native,
    /// Periodic rescans; useful on network mounts and in containers.
    Poll {
        #[serde(default = "default_poll_interval_ms")]
        interval_ms: u64,
    },
}

fn default_poll_interval_ms() -> u64 {
    500
}

impl ProviderKind {
    pub fn poll(interval: Duration) -> Self {
        ProviderKind::Poll {
            interval_ms: interval.as_millis() as u64,
        }
    }
}

/// Options accepted by [`crate::glob`].
///
/// `initial_state_considered_dirty` defaults to `false`: entries that already
/// exist when a view is created form a quiet baseline and only show up in
/// `files`/`directories`, not in the `added_*` sets.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
#[serde(default)]
pub struct Options {
    /// Directory to watch. `None` means the process working directory.
    pub cwd: Option<PathBuf>,
    /// Hand out absolute paths instead of cwd-relative ones.
    pub absolute: bool,
    pub delimiter: Delimiter,
    pub initial_state_considered_dirty: bool,
    pub provider: ProviderKind,
}

impl Options {
    /// The per-view subset of these options.
    pub fn view_options(&self) -> ViewOptions {
        ViewOptions {
            absolute: self.absolute,
            delimiter: self.delimiter,
            initial_state_considered_dirty: self.initial_state_considered_dirty,
        }
    }
}

/// Options for a single [`crate::LiveGlob`], as passed to
/// [`crate::LiveGlobFactory::create`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewOptions {
    pub absolute: bool,
    pub delimiter: Delimiter,
    pub initial_state_considered_dirty: bool,
}
