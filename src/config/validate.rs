// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{LiveGlobError, Result};
use crate::glob::GlobMatcher;
use crate::types::ProviderKind;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = LiveGlobError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        let options = raw.options();
        Ok(ConfigFile::new_unchecked(raw.patterns, options))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_patterns(cfg)?;
    validate_patterns(cfg)?;
    validate_provider(cfg)?;
    Ok(())
}

fn ensure_has_patterns(cfg: &RawConfigFile) -> Result<()> {
    if cfg.patterns.is_empty() {
        return Err(LiveGlobError::Config(
            "config must list at least one entry in `patterns`".to_string(),
        ));
    }
    Ok(())
}

fn validate_patterns(cfg: &RawConfigFile) -> Result<()> {
    // Compiling reports both syntax errors and negation-only sets.
    GlobMatcher::new(&cfg.patterns).map_err(|err| match err {
        LiveGlobError::EmptyPatterns => LiveGlobError::Config(
            "`patterns` must contain at least one pattern without `!`".to_string(),
        ),
        other => other,
    })?;
    Ok(())
}

fn validate_provider(cfg: &RawConfigFile) -> Result<()> {
    if let ProviderKind::Poll { interval_ms: 0 } = cfg.provider {
        return Err(LiveGlobError::Config(
            "[provider].interval_ms must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}
