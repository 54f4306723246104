// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;
use crate::paths::absolutize;

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation (pattern syntax, etc.). Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file and resolve its `cwd`.
///
/// A relative `cwd` is taken relative to the directory holding the file, so
/// a config can be used from anywhere. No validation happens here; callers
/// that merge in other settings validate the result themselves.
pub fn load_resolved(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let mut raw_config = load_from_path(path)?;

    if let Some(cwd) = raw_config.cwd.take() {
        let base = path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        raw_config.cwd = Some(absolutize(&std::env::current_dir()?.join(base), &cwd));
    }

    Ok(raw_config)
}

/// Load a configuration file from path and validate it.
///
/// This is the recommended entry point for the rest of the application.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    ConfigFile::try_from(load_resolved(path)?)
}

/// Config file looked for when `--config` is not given: `LiveGlob.toml` in
/// the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("LiveGlob.toml")
}
