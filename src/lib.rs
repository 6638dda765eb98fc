//! itBit exchange adapter
//!
//! REST client for the itBit exchange exposing a uniform trading API:
//! - Request signing (HMAC-SHA512 over nonce, timestamp and message hash)
//! - Transport with soft/retryable/fatal response classification
//! - Trading gateway: orders, order book, ticker, balances, fees

pub mod adapters;
pub mod config;
pub mod error;

pub use error::AppError;
