// src/glob/matcher.rs

use std::fmt;

use globset::{Glob, GlobBuilder, GlobSet, GlobSetBuilder};

use crate::errors::{LiveGlobError, Result};

/// Compiled glob patterns for one live glob.
///
/// Patterns are matched against cwd-relative paths with forward slashes,
/// e.g. `"src/foo/bar.rs"`. A pattern prefixed with `!` excludes whatever it
/// matches. `*` and `?` never cross a `/`; `**` spans directories.
#[derive(Clone)]
pub struct GlobMatcher {
    patterns: Vec<String>,
    include_set: GlobSet,
    exclude_set: Option<GlobSet>,
}

impl fmt::Debug for GlobMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlobMatcher")
            .field("patterns", &self.patterns)
            .finish_non_exhaustive()
    }
}

impl GlobMatcher {
    /// Compile a pattern list.
    ///
    /// Fails with [`LiveGlobError::EmptyPatterns`] unless at least one
    /// non-negated pattern is given.
    pub fn new<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns: Vec<String> = patterns
            .into_iter()
            .map(|p| p.as_ref().to_string())
            .collect();

        let mut include = GlobSetBuilder::new();
        let mut exclude = GlobSetBuilder::new();
        let mut include_count = 0usize;
        let mut exclude_count = 0usize;

        for pattern in &patterns {
            match pattern.strip_prefix('!') {
                Some(negated) => {
                    exclude.add(compile(pattern, negated)?);
                    exclude_count += 1;
                }
                None => {
                    include.add(compile(pattern, pattern)?);
                    include_count += 1;
                }
            }
        }

        if include_count == 0 {
            return Err(LiveGlobError::EmptyPatterns);
        }

        let include_set = build(&patterns, include)?;
        let exclude_set = if exclude_count == 0 {
            None
        } else {
            Some(build(&patterns, exclude)?)
        };

        Ok(Self {
            patterns,
            include_set,
            exclude_set,
        })
    }

    /// Patterns as given, including negations.
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Returns true if `rel_path` (relative to the working directory, forward
    /// slashes) is selected by these patterns.
    pub fn is_match(&self, rel_path: &str) -> bool {
        if !self.include_set.is_match(rel_path) {
            return false;
        }
        if let Some(exclude) = &self.exclude_set {
            if exclude.is_match(rel_path) {
                return false;
            }
        }
        true
    }
}

fn compile(original: &str, glob: &str) -> Result<Glob> {
    let glob = glob.strip_prefix("./").unwrap_or(glob);
    GlobBuilder::new(glob)
        .literal_separator(true)
        .build()
        .map_err(|source| LiveGlobError::InvalidPattern {
            pattern: original.to_string(),
            source,
        })
}

fn build(patterns: &[String], builder: GlobSetBuilder) -> Result<GlobSet> {
    builder.build().map_err(|source| LiveGlobError::InvalidPattern {
        pattern: patterns.join(", "),
        source,
    })
}
