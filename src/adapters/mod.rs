//! Exchange adapters
//!
//! This module provides the core abstractions for trading on an exchange
//! over its REST API, plus the itBit implementation.

pub mod errors;
pub mod itbit;
pub mod traits;
pub mod types;

// Re-export commonly used types for convenience
pub use errors::{ExchangeError, ExchangeResult};
pub use itbit::{ItBitAdapter, ItBitConfig};
pub use traits::TradingApi;
pub use types::{BalanceInfo, MarketOrder, MarketOrderBook, OpenOrder, OrderSide};
