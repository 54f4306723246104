// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::types::Delimiter;

/// Command-line arguments for `liveglob`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "liveglob",
    version,
    about = "Watch a directory and report every change to files matching glob patterns.",
    long_about = None
)]
pub struct CliArgs {
    /// Glob patterns, relative to the working directory. Prefix with `!` to
    /// exclude. Replaces the patterns from the config file.
    #[arg(value_name = "PATTERNS")]
    pub patterns: Vec<String>,

    /// Directory to watch. Default: the config's `cwd`, else the current
    /// directory.
    #[arg(long, value_name = "DIR")]
    pub cwd: Option<PathBuf>,

    /// Path to a config file (TOML).
    ///
    /// Without this flag `LiveGlob.toml` is read if it exists.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Print absolute paths.
    #[arg(long)]
    pub absolute: bool,

    /// Separator style for printed paths (native, posix).
    #[arg(long, value_name = "STYLE")]
    pub delimiter: Option<Delimiter>,

    /// Treat entries that already exist at startup as added.
    #[arg(long)]
    pub dirty: bool,

    /// Poll the directory at this interval instead of using OS notifications.
    #[arg(long, value_name = "MS")]
    pub poll_interval_ms: Option<u64>,

    /// Print the current matches and exit instead of watching.
    #[arg(long)]
    pub once: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `LIVEGLOB_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
