//! Explicit runtime configuration.
//!
//! Business logic never reads the environment; the CLI builds a
//! [`SignalConfig`] once and hands it to the adapters and the pipeline.

use std::time::Duration;

use thiserror::Error;

use crate::{DerivationPolicy, Symbol};

pub const DEFAULT_FMP_BASE_URL: &str = "https://financialmodelingprep.com";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4";

const DEFAULT_UNIVERSE: [&str; 20] = [
    "AAPL", "MSFT", "NVDA", "AMZN", "GOOGL", "META", "TSLA", "AMD", "NFLX", "JPM", "V", "DIS",
    "BA", "INTC", "PLTR", "SOFI", "UBER", "CRM", "COIN", "SHOP",
];

/// Configuration errors raised while reading key/value settings.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: '{value}' ({reason})")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Indicator periods requested from the indicator source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndicatorPeriods {
    pub rsi: u32,
    pub short_moving_average: u32,
    pub long_moving_average: u32,
}

impl Default for IndicatorPeriods {
    fn default() -> Self {
        Self {
            rsi: 14,
            short_moving_average: 50,
            long_moving_average: 200,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignalConfig {
    pub fmp_base_url: String,
    pub fmp_api_key: Option<String>,
    pub openai_base_url: String,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    /// Applied to every upstream call.
    pub timeout: Duration,
    /// Applied to text generation, which runs far slower than data calls.
    pub narration_timeout: Duration,
    /// Policy used when a request names none.
    pub policy: DerivationPolicy,
    pub periods: IndicatorPeriods,
    /// Fixed universe, in ranking order.
    pub universe: Vec<Symbol>,
    pub sample_size: usize,
    pub top_n: usize,
    /// Data-provider calls admitted per `request_window`.
    pub request_limit: u32,
    pub request_window: Duration,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            fmp_base_url: String::from(DEFAULT_FMP_BASE_URL),
            fmp_api_key: None,
            openai_base_url: String::from(DEFAULT_OPENAI_BASE_URL),
            openai_api_key: None,
            openai_model: String::from(DEFAULT_OPENAI_MODEL),
            timeout: Duration::from_millis(5_000),
            narration_timeout: Duration::from_secs(60),
            policy: DerivationPolicy::swing(),
            periods: IndicatorPeriods::default(),
            universe: DEFAULT_UNIVERSE
                .iter()
                .filter_map(|raw| Symbol::parse(raw).ok())
                .collect(),
            sample_size: 10,
            top_n: 5,
            request_limit: 300,
            request_window: Duration::from_secs(60),
        }
    }
}

impl SignalConfig {
    /// Build a configuration from an arbitrary key lookup. Unset keys keep
    /// their defaults; blank values count as unset.
    ///
    /// | Key | Fallback |
    /// |-----|----------|
    /// | `SWINGSIG_FMP_API_KEY` | `FMP_API_KEY` |
    /// | `SWINGSIG_FMP_BASE_URL` | |
    /// | `SWINGSIG_OPENAI_API_KEY` | `OPENAI_API_KEY` |
    /// | `SWINGSIG_OPENAI_BASE_URL` | |
    /// | `SWINGSIG_OPENAI_MODEL` | |
    /// | `SWINGSIG_TIMEOUT_MS` | |
    /// | `SWINGSIG_NARRATION_TIMEOUT_MS` | |
    /// | `SWINGSIG_POLICY` | policy selector, e.g. `band:4-9/2-3` |
    /// | `SWINGSIG_UNIVERSE` | comma-separated symbols |
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self::default();

        config.fmp_api_key = get("SWINGSIG_FMP_API_KEY").or_else(|| get("FMP_API_KEY"));
        config.openai_api_key = get("SWINGSIG_OPENAI_API_KEY").or_else(|| get("OPENAI_API_KEY"));
        if let Some(url) = get("SWINGSIG_FMP_BASE_URL") {
            config.fmp_base_url = url.trim_end_matches('/').to_owned();
        }
        if let Some(url) = get("SWINGSIG_OPENAI_BASE_URL") {
            config.openai_base_url = url.trim_end_matches('/').to_owned();
        }
        if let Some(model) = get("SWINGSIG_OPENAI_MODEL") {
            config.openai_model = model;
        }

        if let Some(raw) = get("SWINGSIG_TIMEOUT_MS") {
            config.timeout = positive_millis("SWINGSIG_TIMEOUT_MS", raw)?;
        }
        if let Some(raw) = get("SWINGSIG_NARRATION_TIMEOUT_MS") {
            config.narration_timeout = positive_millis("SWINGSIG_NARRATION_TIMEOUT_MS", raw)?;
        }

        if let Some(raw) = get("SWINGSIG_POLICY") {
            config.policy = raw.parse().map_err(|error: crate::SignalError| {
                ConfigError::InvalidValue {
                    key: "SWINGSIG_POLICY",
                    value: raw.clone(),
                    reason: error.to_string(),
                }
            })?;
        }

        if let Some(raw) = get("SWINGSIG_UNIVERSE") {
            let universe = Symbol::parse_list(raw.split(',')).map_err(|error| {
                ConfigError::InvalidValue {
                    key: "SWINGSIG_UNIVERSE",
                    value: raw.clone(),
                    reason: error.to_string(),
                }
            })?;
            if universe.is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: "SWINGSIG_UNIVERSE",
                    value: raw,
                    reason: String::from("expected at least one symbol"),
                });
            }
            config.universe = universe;
        }

        Ok(config)
    }

    /// [`SignalConfig::from_lookup`] over the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

fn positive_millis(key: &'static str, raw: String) -> Result<Duration, ConfigError> {
    match raw.parse::<u64>() {
        Ok(millis) if millis > 0 => Ok(Duration::from_millis(millis)),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: raw,
            reason: String::from("expected a positive integer"),
        }),
    }
}
