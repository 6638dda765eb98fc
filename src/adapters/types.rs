//! Core data types for exchange adapters
//!
//! These types form the generic domain model handed to the trading engine:
//! orders, order book levels and balances. Exchange wire shapes live in each
//! adapter's own `types` module and are converted into these.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::adapters::errors::{ExchangeError, ExchangeResult};

// =============================================================================
// HTTP Client Constants
// =============================================================================

/// Max idle connections per host in connection pool
const HTTP_POOL_MAX_IDLE: usize = 2;
/// How long idle connections stay in the pool (seconds)
const HTTP_POOL_IDLE_TIMEOUT_SECS: u64 = 60;
/// TCP keepalive interval (seconds)
const HTTP_TCP_KEEPALIVE_SECS: u64 = 30;

/// Browser-like user agent; some exchange edges reject library defaults
pub const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/35.0.1916.114 Safari/537.36";

/// Create the HTTP client used by an adapter
///
/// The connect timeout and the overall request timeout are both set to
/// `timeout`, so a call either completes or fails within that bound.
pub fn create_http_client(exchange_name: &str, timeout: Duration) -> ExchangeResult<reqwest::Client> {
    let client = reqwest::Client::builder()
        .connect_timeout(timeout)
        .timeout(timeout)
        .pool_max_idle_per_host(HTTP_POOL_MAX_IDLE)
        .pool_idle_timeout(Duration::from_secs(HTTP_POOL_IDLE_TIMEOUT_SECS))
        .tcp_keepalive(Duration::from_secs(HTTP_TCP_KEEPALIVE_SECS))
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| ExchangeError::Config(format!("Failed to create HTTP client: {}", e)))?;
    tracing::info!(
        phase = "init",
        exchange = %exchange_name,
        timeout_s = timeout.as_secs(),
        pool_max_idle = HTTP_POOL_MAX_IDLE,
        pool_idle_timeout_s = HTTP_POOL_IDLE_TIMEOUT_SECS,
        tcp_keepalive_s = HTTP_TCP_KEEPALIVE_SECS,
        "HTTP client configured"
    );
    Ok(client)
}

// =============================================================================
// Order Types
// =============================================================================

/// Order side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "BUY"),
            OrderSide::Sell => write!(f, "SELL"),
        }
    }
}

/// An order of ours still resting on the exchange
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenOrder {
    /// Exchange-assigned order ID
    pub id: String,
    /// When the exchange accepted the order
    pub created_at: DateTime<Utc>,
    /// Market the order belongs to (e.g., "XBTUSD")
    pub market_id: String,
    pub side: OrderSide,
    pub price: Decimal,
    /// Quantity still unfilled
    pub quantity: Decimal,
    /// Quantity when the order was placed
    pub original_quantity: Decimal,
    /// price * original_quantity
    pub total: Decimal,
}

// =============================================================================
// Orderbook Types
// =============================================================================

/// A single level in the order book
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketOrder {
    pub side: OrderSide,
    pub price: Decimal,
    pub quantity: Decimal,
    /// price * quantity
    pub total: Decimal,
}

impl MarketOrder {
    /// Create a level, computing its total value locally
    pub fn new(side: OrderSide, price: Decimal, quantity: Decimal) -> Self {
        Self {
            side,
            price,
            quantity,
            total: price * quantity,
        }
    }
}

/// Order book snapshot for one market
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketOrderBook {
    pub market_id: String,
    /// Asks, in exchange order (best first)
    pub sell_orders: Vec<MarketOrder>,
    /// Bids, in exchange order (best first)
    pub buy_orders: Vec<MarketOrder>,
}

impl MarketOrderBook {
    /// Best (first) bid price
    pub fn best_bid(&self) -> Option<Decimal> {
        self.buy_orders.first().map(|l| l.price)
    }

    /// Best (first) ask price
    pub fn best_ask(&self) -> Option<Decimal> {
        self.sell_orders.first().map(|l| l.price)
    }
}

// =============================================================================
// Balance Types
// =============================================================================

/// Wallet balances keyed by currency code
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BalanceInfo {
    /// Funds available for trading
    pub available: HashMap<String, Decimal>,
    /// Funds reserved by open orders (empty when the exchange does not report it)
    pub on_hold: HashMap<String, Decimal>,
}
