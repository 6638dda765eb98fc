//! itBit Configuration
//!
//! Credentials, fees and connection settings for the itBit adapter,
//! including environment loading and validation.

use std::fmt;
use std::time::Duration;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Deserialize;

use crate::adapters::errors::{ExchangeError, ExchangeResult};

// =============================================================================
// Constants
// =============================================================================

/// Versioned REST API root; every public and authenticated path hangs off it
pub const DEFAULT_BASE_URL: &str = "https://api.itbit.com/v1/";

/// Decimal places kept when turning a fee percentage into a fraction
const FEE_FRACTION_SCALE: u32 = 8;

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for the itBit exchange connection
///
/// Loaded once at startup and immutable afterwards. `Debug` output never
/// includes the API secret.
#[derive(Clone, Deserialize)]
pub struct ItBitConfig {
    /// itBit user ID (used to list wallets)
    pub user_id: String,
    /// API client key
    pub api_key: String,
    /// API secret used as the HMAC key
    pub api_secret: String,
    /// Buy fee in percent (e.g., 0.25 for 0.25%)
    pub buy_fee_percent: Decimal,
    /// Sell fee in percent
    pub sell_fee_percent: Decimal,
    /// Connect and read timeout in seconds
    pub connection_timeout_secs: u64,
    /// REST base URL, must end with '/'
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

impl ItBitConfig {
    /// Create configuration from environment variables
    ///
    /// Required: `ITBIT_USER_ID`, `ITBIT_API_KEY`, `ITBIT_API_SECRET`,
    /// `ITBIT_BUY_FEE`, `ITBIT_SELL_FEE`, `ITBIT_CONNECTION_TIMEOUT`.
    /// Optional: `ITBIT_BASE_URL`.
    pub fn from_env() -> ExchangeResult<Self> {
        let config = Self {
            user_id: required_env("ITBIT_USER_ID")?,
            api_key: required_env("ITBIT_API_KEY")?,
            api_secret: required_env("ITBIT_API_SECRET")?,
            buy_fee_percent: required_env("ITBIT_BUY_FEE")?
                .parse()
                .map_err(|_| ExchangeError::Config("ITBIT_BUY_FEE must be a decimal number".into()))?,
            sell_fee_percent: required_env("ITBIT_SELL_FEE")?
                .parse()
                .map_err(|_| ExchangeError::Config("ITBIT_SELL_FEE must be a decimal number".into()))?,
            connection_timeout_secs: required_env("ITBIT_CONNECTION_TIMEOUT")?
                .parse()
                .map_err(|_| {
                    ExchangeError::Config("ITBIT_CONNECTION_TIMEOUT must be a whole number of seconds".into())
                })?,
            base_url: std::env::var("ITBIT_BASE_URL").unwrap_or_else(|_| default_base_url()),
        };
        config.validate()?;
        Ok(config)
    }

    /// Check every value; a failing config never produces an adapter
    pub fn validate(&self) -> ExchangeResult<()> {
        if self.user_id.trim().is_empty() {
            return Err(ExchangeError::Config("user_id cannot be empty".into()));
        }
        if self.api_key.trim().is_empty() {
            return Err(ExchangeError::Config("api_key cannot be empty".into()));
        }
        if self.api_secret.is_empty() {
            return Err(ExchangeError::Config("api_secret cannot be empty".into()));
        }
        if self.buy_fee_percent.is_sign_negative() {
            return Err(ExchangeError::Config(format!(
                "buy_fee_percent cannot be negative (got {})",
                self.buy_fee_percent
            )));
        }
        if self.sell_fee_percent.is_sign_negative() {
            return Err(ExchangeError::Config(format!(
                "sell_fee_percent cannot be negative (got {})",
                self.sell_fee_percent
            )));
        }
        if self.connection_timeout_secs == 0 {
            return Err(ExchangeError::Config("connection_timeout_secs cannot be 0".into()));
        }
        if !self.base_url.ends_with('/') {
            return Err(ExchangeError::Config(format!(
                "base_url must end with '/' (got {})",
                self.base_url
            )));
        }
        Ok(())
    }

    /// Connect/read timeout as a Duration
    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout_secs)
    }

    /// Buy fee as a fraction (percent / 100, half-up to 8 dp)
    pub fn buy_fee_fraction(&self) -> Decimal {
        percent_to_fraction(self.buy_fee_percent)
    }

    /// Sell fee as a fraction (percent / 100, half-up to 8 dp)
    pub fn sell_fee_fraction(&self) -> Decimal {
        percent_to_fraction(self.sell_fee_percent)
    }
}

fn percent_to_fraction(percent: Decimal) -> Decimal {
    (percent / Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(FEE_FRACTION_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

fn required_env(name: &str) -> ExchangeResult<String> {
    let value = std::env::var(name).map_err(|_| ExchangeError::Config(format!("{} not set", name)))?;
    if value.is_empty() {
        return Err(ExchangeError::Config(format!("{} is empty", name)));
    }
    Ok(value)
}

impl fmt::Debug for ItBitConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ItBitConfig")
            .field("user_id", &self.user_id)
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .field("buy_fee_percent", &self.buy_fee_percent)
            .field("sell_fee_percent", &self.sell_fee_percent)
            .field("connection_timeout_secs", &self.connection_timeout_secs)
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[cfg(test)]
pub(crate) fn test_config(base_url: &str) -> ItBitConfig {
    ItBitConfig {
        user_id: "test-user".to_string(),
        api_key: "test-key".to_string(),
        api_secret: "test-secret".to_string(),
        buy_fee_percent: Decimal::new(25, 2),
        sell_fee_percent: Decimal::new(25, 2),
        connection_timeout_secs: 5,
        base_url: base_url.to_string(),
    }
}
