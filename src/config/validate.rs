// src/config/validate.rs

use crate::config::model::{Config, RawConfig};
use crate::errors::{Result, WorkdagError};

impl TryFrom<RawConfig> for Config {
    type Error = WorkdagError;

    fn try_from(raw: RawConfig) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(Config::new_unchecked(raw))
    }
}

fn validate_raw_config(cfg: &RawConfig) -> Result<()> {
    if cfg.workers == 0 {
        return Err(WorkdagError::ConfigError(
            "workers must be >= 1 (got 0)".to_string(),
        ));
    }

    if cfg.task_wait_ms == 0 {
        return Err(WorkdagError::ConfigError(
            "task_wait_ms must be >= 1 (got 0)".to_string(),
        ));
    }

    Ok(())
}
