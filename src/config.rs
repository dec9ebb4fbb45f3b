use crate::error::{BatchError, Result};
use crate::item::ErrorKind;
use crate::orchestration::SkipPolicy;
use crate::resilience::{BackoffPolicy, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Option set consumed by one chunk-oriented step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepConfig {
    pub chunk_size: usize,
    /// Maximum attempts per item, first attempt included
    pub retry_limit: u32,
    pub retryable_error_kinds: Vec<ErrorKind>,
    pub backoff: BackoffConfig,
    pub skip_limit: u64,
    pub skippable_error_kinds: Vec<ErrorKind>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffStrategy {
    None,
    Fixed,
    Exponential,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackoffConfig {
    pub strategy: BackoffStrategy,
    pub delay_ms: u64,
    pub multiplier: f64,
    pub max_delay_ms: u64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            strategy: BackoffStrategy::Fixed,
            delay_ms: 0,
            multiplier: 2.0,
            max_delay_ms: 30_000,
        }
    }
}

impl BackoffConfig {
    pub fn policy(&self) -> BackoffPolicy {
        match self.strategy {
            BackoffStrategy::None => BackoffPolicy::NoBackoff,
            BackoffStrategy::Fixed => BackoffPolicy::fixed(Duration::from_millis(self.delay_ms)),
            BackoffStrategy::Exponential => BackoffPolicy::Exponential {
                initial: Duration::from_millis(self.delay_ms),
                multiplier: self.multiplier,
                max: Duration::from_millis(self.max_delay_ms.max(self.delay_ms)),
            },
        }
    }
}

impl Default for StepConfig {
    fn default() -> Self {
        Self {
            chunk_size: 5,
            retry_limit: 3,
            retryable_error_kinds: vec![ErrorKind::NOT_FOUND],
            backoff: BackoffConfig::default(),
            skip_limit: 100,
            skippable_error_kinds: vec![ErrorKind::NOT_FOUND],
        }
    }
}

impl StepConfig {
    /// Defaults overridden by `BATCH_*` environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(chunk_size) = std::env::var("BATCH_CHUNK_SIZE") {
            config.chunk_size = chunk_size.trim().parse().map_err(|e| {
                BatchError::Configuration(format!("Invalid chunk_size: {e}"))
            })?;
        }

        if let Ok(retry_limit) = std::env::var("BATCH_RETRY_LIMIT") {
            config.retry_limit = retry_limit.trim().parse().map_err(|e| {
                BatchError::Configuration(format!("Invalid retry_limit: {e}"))
            })?;
        }

        if let Ok(skip_limit) = std::env::var("BATCH_SKIP_LIMIT") {
            config.skip_limit = skip_limit.trim().parse().map_err(|e| {
                BatchError::Configuration(format!("Invalid skip_limit: {e}"))
            })?;
        }

        if let Ok(delay_ms) = std::env::var("BATCH_BACKOFF_DELAY_MS") {
            config.backoff.delay_ms = delay_ms.trim().parse().map_err(|e| {
                BatchError::Configuration(format!("Invalid backoff delay_ms: {e}"))
            })?;
        }

        if let Ok(kinds) = std::env::var("BATCH_RETRYABLE_ERROR_KINDS") {
            config.retryable_error_kinds = parse_kind_list(&kinds);
        }

        if let Ok(kinds) = std::env::var("BATCH_SKIPPABLE_ERROR_KINDS") {
            config.skippable_error_kinds = parse_kind_list(&kinds);
        }

        config.validate()?;
        Ok(config)
    }

    /// Layer defaults, a config file (format by extension) and `BATCH__*` env
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let defaults = config::Config::try_from(&Self::default())
            .map_err(|e| BatchError::Configuration(e.to_string()))?;

        let config = config::Config::builder()
            .add_source(defaults)
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("BATCH")
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("retryable_error_kinds")
                    .with_list_parse_key("skippable_error_kinds")
                    .try_parsing(true),
            )
            .build()
            .and_then(|settings| settings.try_deserialize::<Self>())
            .map_err(|e| BatchError::Configuration(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(BatchError::Configuration(
                "chunk_size must be greater than 0".to_string(),
            ));
        }
        if self.retry_limit == 0 {
            return Err(BatchError::Configuration(
                "retry_limit must be at least 1".to_string(),
            ));
        }
        if self.backoff.strategy == BackoffStrategy::Exponential
            && (self.backoff.multiplier.is_nan() || self.backoff.multiplier < 1.0)
        {
            return Err(BatchError::Configuration(format!(
                "backoff multiplier must be >= 1.0, got {}",
                self.backoff.multiplier
            )));
        }
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry_limit, self.retryable_error_kinds.iter().cloned())
    }

    pub fn skip_policy(&self) -> SkipPolicy {
        SkipPolicy::new(self.skip_limit, self.skippable_error_kinds.iter().cloned())
    }
}

fn parse_kind_list(raw: &str) -> Vec<ErrorKind> {
    raw.split(',')
        .map(str::trim)
        .filter(|kind| !kind.is_empty())
        .map(|kind| ErrorKind::from(kind.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_reference_job() {
        let config = StepConfig::default();
        assert_eq!(config.chunk_size, 5);
        assert_eq!(config.retry_limit, 3);
        assert_eq!(config.skip_limit, 100);
        assert_eq!(config.backoff.policy(), BackoffPolicy::NoBackoff);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = StepConfig {
            chunk_size: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(BatchError::Configuration(_))));

        let config = StepConfig {
            retry_limit: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = StepConfig {
            backoff: BackoffConfig {
                strategy: BackoffStrategy::Exponential,
                multiplier: 0.5,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_env_overrides() {
        std::env::set_var("BATCH_CHUNK_SIZE", "10");
        std::env::set_var("BATCH_RETRY_LIMIT", "4");
        std::env::set_var("BATCH_SKIPPABLE_ERROR_KINDS", "not_found, parse");
        let config = StepConfig::from_env().unwrap();
        std::env::remove_var("BATCH_CHUNK_SIZE");
        std::env::remove_var("BATCH_RETRY_LIMIT");
        std::env::remove_var("BATCH_SKIPPABLE_ERROR_KINDS");

        assert_eq!(config.chunk_size, 10);
        assert_eq!(config.retry_limit, 4);
        assert_eq!(
            config.skippable_error_kinds,
            vec![ErrorKind::NOT_FOUND, ErrorKind::PARSE]
        );
        assert_eq!(config.skip_limit, 100);
    }

    #[test]
    fn test_parse_kind_list_ignores_blanks() {
        assert_eq!(
            parse_kind_list(" not_found ,,parse, "),
            vec![ErrorKind::NOT_FOUND, ErrorKind::PARSE]
        );
        assert!(parse_kind_list("").is_empty());
    }

    #[test]
    fn test_load_layers_file_over_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
chunk_size = 2
skip_limit = 0
skippable_error_kinds = ["notification_undeliverable"]

[backoff]
strategy = "exponential"
delay_ms = 100
multiplier = 2.0
max_delay_ms = 1000
"#
        )
        .unwrap();

        let config = StepConfig::load(file.path()).unwrap();
        assert_eq!(config.chunk_size, 2);
        assert_eq!(config.skip_limit, 0);
        assert_eq!(config.retry_limit, 3);
        assert_eq!(
            config.skippable_error_kinds,
            vec![ErrorKind::NOTIFICATION_UNDELIVERABLE]
        );
        assert_eq!(
            config.backoff.policy().delay_for(2),
            Duration::from_millis(200)
        );
        assert!(!config.skip_policy().is_skippable_kind(&ErrorKind::NOT_FOUND));
        assert!(config.retry_policy().is_retryable(&crate::item::ItemError::not_found("x")));
    }

    #[test]
    fn test_load_rejects_invalid_file_values() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"chunk_size": 0}}"#).unwrap();

        assert!(matches!(
            StepConfig::load(file.path()),
            Err(BatchError::Configuration(_))
        ));
    }
}
