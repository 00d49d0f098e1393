// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{BotError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::BotError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_adb(cfg)?;
    validate_target(cfg)?;
    validate_sequence(cfg)?;
    validate_events(cfg)?;
    Ok(())
}

fn validate_adb(cfg: &RawConfigFile) -> Result<()> {
    if let Some(path) = &cfg.adb.path {
        if path.trim().is_empty() {
            return Err(config_error("[adb].path must not be empty"));
        }
    }
    if cfg.adb.command_timeout_ms == Some(0) {
        return Err(config_error("[adb].command_timeout_ms must be >= 1 (got 0)"));
    }
    Ok(())
}

fn validate_target(cfg: &RawConfigFile) -> Result<()> {
    let target = &cfg.target;

    if target.package.trim().is_empty() {
        return Err(config_error("[target].package must not be empty"));
    }
    if target.package.chars().any(char::is_whitespace) {
        return Err(config_error(format!(
            "[target].package must not contain whitespace (got '{}')",
            target.package
        )));
    }
    if target.marker.trim().is_empty() {
        return Err(config_error("[target].marker must not be empty"));
    }
    if target.url.trim().is_empty() {
        return Err(config_error("[target].url must not be empty"));
    }
    if target.url.contains('"') {
        return Err(config_error("[target].url must not contain '\"'"));
    }
    Ok(())
}

fn validate_sequence(cfg: &RawConfigFile) -> Result<()> {
    if cfg.sequence.ready_attempts == 0 {
        return Err(config_error("[sequence].ready_attempts must be >= 1 (got 0)"));
    }
    Ok(())
}

fn validate_events(cfg: &RawConfigFile) -> Result<()> {
    if cfg.events.capacity == 0 {
        return Err(config_error("[events].capacity must be >= 1 (got 0)"));
    }
    Ok(())
}

fn config_error(msg: impl Into<String>) -> BotError {
    BotError::ConfigError(msg.into())
}
