//! Board configuration.
//!
//! Values resolve in this order: explicit setter (CLI flag), environment
//! variable, built-in default.
//!
//! | Field | Default | Environment |
//! |-------|---------|-------------|
//! | `columns` | 16 | `TICKERBOARD_COLUMNS` |
//! | `max_concurrency` | 4 | `TICKERBOARD_MAX_CONCURRENCY` |
//! | `rate_limit_per_minute` | 120 | `TICKERBOARD_RATE_LIMIT` |
//! | `request_timeout_ms` | 10000 | `TICKERBOARD_TIMEOUT_MS` |
//! | `scheme` | `fine` | `TICKERBOARD_SCHEME` |

use std::env;
use std::num::NonZeroUsize;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::classifier::Scheme;
use crate::ValidationError;

pub const ENV_COLUMNS: &str = "TICKERBOARD_COLUMNS";
pub const ENV_MAX_CONCURRENCY: &str = "TICKERBOARD_MAX_CONCURRENCY";
pub const ENV_RATE_LIMIT: &str = "TICKERBOARD_RATE_LIMIT";
pub const ENV_TIMEOUT_MS: &str = "TICKERBOARD_TIMEOUT_MS";
pub const ENV_SCHEME: &str = "TICKERBOARD_SCHEME";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardConfig {
    pub columns: usize,
    /// `1` reproduces a strictly sequential build.
    pub max_concurrency: usize,
    pub rate_limit_per_minute: u32,
    pub request_timeout_ms: u64,
    pub scheme: Scheme,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            columns: 16,
            max_concurrency: 4,
            rate_limit_per_minute: 120,
            request_timeout_ms: 10_000,
            scheme: Scheme::Fine,
        }
    }
}

impl BoardConfig {
    /// Defaults overlaid with `TICKERBOARD_*` environment variables.
    ///
    /// Values are parsed but not range-checked; call [`validate`](Self::validate)
    /// once every override has been applied.
    pub fn from_env() -> Result<Self, ValidationError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ValidationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(ENV_COLUMNS) {
            config.columns = parse_setting("columns", &value)?;
        }
        if let Some(value) = lookup(ENV_MAX_CONCURRENCY) {
            config.max_concurrency = parse_setting("max_concurrency", &value)?;
        }
        if let Some(value) = lookup(ENV_RATE_LIMIT) {
            config.rate_limit_per_minute = parse_setting("rate_limit_per_minute", &value)?;
        }
        if let Some(value) = lookup(ENV_TIMEOUT_MS) {
            config.request_timeout_ms = parse_setting("request_timeout_ms", &value)?;
        }
        if let Some(value) = lookup(ENV_SCHEME) {
            config.scheme = Scheme::from_str(&value)?;
        }

        Ok(config)
    }

    pub fn with_columns(mut self, columns: usize) -> Self {
        self.columns = columns;
        self
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    pub fn with_rate_limit_per_minute(mut self, rate_limit: u32) -> Self {
        self.rate_limit_per_minute = rate_limit;
        self
    }

    pub fn with_request_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.request_timeout_ms = timeout_ms;
        self
    }

    pub fn with_scheme(mut self, scheme: Scheme) -> Self {
        self.scheme = scheme;
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.grid_columns()?;
        if self.max_concurrency == 0 {
            return Err(ValidationError::ZeroConcurrency);
        }
        if self.rate_limit_per_minute == 0 {
            return Err(ValidationError::ZeroRateLimit);
        }
        if self.request_timeout_ms == 0 {
            return Err(ValidationError::ZeroTimeout);
        }
        Ok(())
    }

    pub fn grid_columns(&self) -> Result<NonZeroUsize, ValidationError> {
        NonZeroUsize::new(self.columns).ok_or(ValidationError::ZeroColumns)
    }
}

fn parse_setting<T: FromStr>(field: &'static str, value: &str) -> Result<T, ValidationError> {
    value
        .trim()
        .parse()
        .map_err(|_| ValidationError::InvalidSetting {
            field,
            value: value.to_owned(),
        })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_match_reference_board() {
        let config = BoardConfig::from_lookup(lookup(&[])).expect("defaults are valid");
        assert_eq!(config, BoardConfig::default());
        assert_eq!(config.columns, 16);
        assert_eq!(config.scheme, Scheme::Fine);
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = BoardConfig::from_lookup(lookup(&[
            (ENV_COLUMNS, " 8 "),
            (ENV_MAX_CONCURRENCY, "1"),
            (ENV_SCHEME, "coarse"),
        ]))
        .expect("valid overrides");

        assert_eq!(config.columns, 8);
        assert_eq!(config.max_concurrency, 1);
        assert_eq!(config.scheme, Scheme::Coarse);
        assert_eq!(config.rate_limit_per_minute, 120);
    }

    #[test]
    fn rejects_unparsable_and_zero_values() {
        let err = BoardConfig::from_lookup(lookup(&[(ENV_COLUMNS, "wide")])).expect_err("must fail");
        assert!(matches!(err, ValidationError::InvalidSetting { field: "columns", .. }));

        let config = BoardConfig::from_lookup(lookup(&[(ENV_COLUMNS, "0")])).expect("parses");
        assert_eq!(config.validate(), Err(ValidationError::ZeroColumns));

        let err = BoardConfig::default()
            .with_max_concurrency(0)
            .validate()
            .expect_err("must fail");
        assert_eq!(err, ValidationError::ZeroConcurrency);
    }

    #[test]
    fn explicit_setting_replaces_zero_environment_value() {
        let config = BoardConfig::from_lookup(lookup(&[(ENV_COLUMNS, "0")]))
            .expect("parses")
            .with_columns(8);

        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.columns, 8);
    }
}
