//! Configuration types
//!
//! Top-level application configuration as read from YAML.

use serde::Deserialize;

use crate::adapters::errors::ExchangeError;
use crate::adapters::itbit::ItBitConfig;
use crate::error::AppError;

/// Market queried when the config names none
pub const DEFAULT_MARKET: &str = "XBTUSD";

fn default_markets() -> Vec<String> {
    vec![DEFAULT_MARKET.to_string()]
}

/// Lift an adapter config failure into AppError without doubling its prefix
fn config_error(err: ExchangeError, scope: &str) -> AppError {
    match err {
        ExchangeError::Config(msg) if scope.is_empty() => AppError::Config(msg),
        ExchangeError::Config(msg) => AppError::Config(format!("{}: {}", scope, msg)),
        other => AppError::Exchange(other),
    }
}

// ============================================================================
// AppConfig
// ============================================================================

/// Root configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// itBit connection settings
    pub itbit: ItBitConfig,
    /// Markets to query (e.g. "XBTUSD"); the first 3 chars are the currency
    #[serde(default = "default_markets")]
    pub markets: Vec<String>,
}

impl AppConfig {
    /// Build from environment variables, querying the default market
    pub fn from_env() -> Result<Self, AppError> {
        let itbit = ItBitConfig::from_env().map_err(|e| config_error(e, ""))?;
        let config = Self {
            itbit,
            markets: default_markets(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration rules
    pub fn validate(&self) -> Result<(), AppError> {
        self.itbit
            .validate()
            .map_err(|e| config_error(e, "itbit"))?;

        if self.markets.is_empty() {
            return Err(AppError::Config(
                "Configuration must contain at least one market".to_string(),
            ));
        }
        for market in &self.markets {
            if market.len() < 3 || !market.chars().all(|c| c.is_ascii_alphanumeric()) {
                return Err(AppError::Config(format!(
                    "Market '{}' must be at least 3 ASCII letters or digits",
                    market
                )));
            }
        }
        Ok(())
    }
}
