// src/paths.rs

//! Lexical path helpers.
//!
//! Everything here is pure: no filesystem access, no canonicalisation. Paths
//! coming from a backend are already absolute, so relative paths are computed
//! purely from their components.

use std::path::{Component, MAIN_SEPARATOR, Path, PathBuf};

/// Fold `.` and `..` components away without touching the filesystem.
///
/// `..` directly under the root stays at the root; leading `..` in a relative
/// path is preserved.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Resolve `path` against `base` (if relative) and normalise the result.
pub fn absolutize(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        normalize_lexically(path)
    } else {
        normalize_lexically(&base.join(path))
    }
}

/// Path of `to` relative to the directory `from`.
///
/// Both inputs are expected to be absolute and normalised. Entries outside
/// `from` come back with leading `..` components; `from` itself maps to an
/// empty path.
pub fn relative_path(from: &Path, to: &Path) -> PathBuf {
    let from: Vec<Component<'_>> = from.components().collect();
    let to: Vec<Component<'_>> = to.components().collect();

    let common = from
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut rel = PathBuf::new();
    for _ in common..from.len() {
        rel.push("..");
    }
    for component in &to[common..] {
        rel.push(component.as_os_str());
    }
    rel
}

/// Rewrite native separators to `/`. A no-op on POSIX platforms.
pub fn to_posix(path: &str) -> String {
    if MAIN_SEPARATOR == '/' {
        path.to_string()
    } else {
        path.replace(MAIN_SEPARATOR, "/")
    }
}

/// String form of a path, as stored in glob state sets.
///
/// Lossy: bytes that are not valid UTF-8 become `U+FFFD`, so two such names
/// differing only in those bytes share one entry. Seeding a view re-parses
/// the stored string, which is exact for every UTF-8 path.
pub fn path_to_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// `path` relative to `root`, with forward slashes. This is the form glob
/// patterns are matched against.
pub fn relative_str(root: &Path, path: &Path) -> String {
    to_posix(&path_to_string(&relative_path(root, path)))
}
