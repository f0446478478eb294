// src/config/validate.rs

use globset::Glob;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{PylingsError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = PylingsError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw))
    }
}

/// Check the semantic invariants that serde defaults cannot express.
pub fn validate_config(cfg: &RawConfigFile) -> Result<()> {
    validate_runner(cfg)?;
    validate_watch(cfg)?;
    validate_paths(cfg)?;
    Ok(())
}

fn validate_runner(cfg: &RawConfigFile) -> Result<()> {
    if cfg.runner.interpreter.trim().is_empty() {
        return Err(PylingsError::ConfigError(
            "[runner].interpreter must not be empty".to_string(),
        ));
    }

    if cfg.runner.timeout_secs == 0 {
        return Err(PylingsError::ConfigError(
            "[runner].timeout_secs must be >= 1 (got 0)".to_string(),
        ));
    }

    Ok(())
}

fn validate_watch(cfg: &RawConfigFile) -> Result<()> {
    if cfg.watch.debounce_ms == 0 {
        return Err(PylingsError::ConfigError(
            "[watch].debounce_ms must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_paths(cfg: &RawConfigFile) -> Result<()> {
    if cfg.paths.pattern.trim().is_empty() {
        return Err(PylingsError::ConfigError(
            "[paths].pattern must not be empty".to_string(),
        ));
    }

    Glob::new(&cfg.paths.pattern)?;
    Ok(())
}
