use std::path::Path;
use std::time::Duration;

use adaptive_backoff::prelude::{BackoffBuilder, ExponentialBackoff, ExponentialBackoffBuilder};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use ordo_types::config_file::SaveLoadConfig;
use ordo_types::defaults::{
    DEFAULT_NAMESPACE, OWNER_UPDATE_BACKOFF_FACTOR, OWNER_UPDATE_BACKOFF_MAX_DURATION,
    OWNER_UPDATE_BACKOFF_MIN_DURATION, OWNER_UPDATE_MAX_ATTEMPTS,
};

use crate::OperatorError;

/// Operator settings, loaded from toml
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperatorConfig {
    pub namespace: String,
    pub retry: RetryConfig,
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_owned(),
            retry: RetryConfig::default(),
        }
    }
}

impl OperatorConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        Self::load_from(path).with_context(|| format!("loading operator config {}", path.display()))
    }
}

/// Bounded retry of owner set compare-and-swap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    #[serde(with = "humantime_serde")]
    pub min_backoff: Duration,
    #[serde(with = "humantime_serde")]
    pub max_backoff: Duration,
    pub factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: OWNER_UPDATE_MAX_ATTEMPTS,
            min_backoff: OWNER_UPDATE_BACKOFF_MIN_DURATION,
            max_backoff: OWNER_UPDATE_BACKOFF_MAX_DURATION,
            factor: OWNER_UPDATE_BACKOFF_FACTOR,
        }
    }
}

impl RetryConfig {
    pub fn backoff(&self) -> Result<ExponentialBackoff, OperatorError> {
        ExponentialBackoffBuilder::default()
            .factor(self.factor)
            .min(self.min_backoff)
            .max(self.max_backoff)
            .build()
            .map_err(|err| OperatorError::Configuration(format!("invalid retry backoff: {err}")))
    }
}
