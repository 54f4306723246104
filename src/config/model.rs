// src/config/model.rs

use std::path::PathBuf;

use serde::Deserialize;

use crate::types::{Delimiter, Options, ProviderKind};

/// Configuration exactly as read from TOML.
///
/// ```toml
/// patterns = ["src/**/*.rs", "!src/generated/**"]
/// cwd = "."
/// delimiter = "posix"
///
/// [provider]
/// kind = "poll"
/// interval_ms = 250
/// ```
///
/// Every field is optional at this stage; see [`ConfigFile`] for the
/// validated form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawConfigFile {
    pub patterns: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub absolute: bool,
    pub delimiter: Delimiter,
    pub initial_state_considered_dirty: bool,
    pub provider: ProviderKind,
}

/// A validated configuration: non-empty, compilable patterns and usable
/// options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    patterns: Vec<String>,
    options: Options,
}

impl ConfigFile {
    /// Build without validation. Callers are expected to go through
    /// `TryFrom<RawConfigFile>` unless the values are known to be good.
    pub fn new_unchecked(patterns: Vec<String>, options: Options) -> Self {
        Self { patterns, options }
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn into_parts(self) -> (Vec<String>, Options) {
        (self.patterns, self.options)
    }
}

impl RawConfigFile {
    pub(crate) fn options(&self) -> Options {
        Options {
            cwd: self.cwd.clone(),
            absolute: self.absolute,
            delimiter: self.delimiter,
            initial_state_considered_dirty: self.initial_state_considered_dirty,
            provider: self.provider,
        }
    }
}
