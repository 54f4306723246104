// tests/common/mod.rs

#![allow(dead_code)]

use std::path::PathBuf;

use liveglob::PathSet;

pub use liveglob_test_utils::{
    EventScript, RecordingSubscriber, ScriptedProvider, init_tracing, with_timeout,
};

/// `rel` ("src/a.rs") in the platform's native separator form, as a live
/// glob with default options stores it.
pub fn native(rel: &str) -> String {
    rel.split('/')
        .collect::<PathBuf>()
        .to_string_lossy()
        .into_owned()
}

/// Set of native-form relative paths.
pub fn set(items: &[&str]) -> PathSet {
    items.iter().map(|item| native(item)).collect()
}

pub fn empty() -> PathSet {
    PathSet::new()
}
