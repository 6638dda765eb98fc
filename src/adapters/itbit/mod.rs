//! itBit Exchange Adapter
//!
//! Implements the TradingApi trait for the itBit REST API (v1).
//! Uses HMAC-SHA512 request signing with a per-key nonce for authentication.
//!
//! This module is organized into submodules:
//! - `config` - Configuration and environment loading
//! - `signing` - Nonce counter and request signature derivation
//! - `transport` - HTTP execution and response classification
//! - `types` - API response types and conversion into domain types
//! - `adapter` - Main ItBitAdapter implementation

mod adapter;
mod config;
mod signing;
mod transport;
mod types;

// Re-export public items
pub use adapter::{format_price, format_quantity, ItBitAdapter, WalletReference, IMPL_NAME};
pub use config::{ItBitConfig, DEFAULT_BASE_URL};
pub use signing::{HttpMethod, NonceCounter, RequestParams, RequestSigner, SignedRequest};
pub use transport::{classify_response, ExchangeResponse, Transport};
pub use types::{
    parse_last_price, parse_new_order_id, parse_open_orders, parse_order_book, parse_side,
    parse_wallet_balances,
};
