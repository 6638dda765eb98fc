//! Trading API trait definition
//!
//! The TradingApi trait is the uniform interface the trading engine drives.
//! Each call either returns a domain value, or fails with an ExchangeError
//! whose `is_retryable()` tells the caller whether trying again makes sense.

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::adapters::errors::ExchangeResult;
use crate::adapters::types::{BalanceInfo, MarketOrderBook, OpenOrder, OrderSide};

/// Common trait for exchange adapters
///
/// Implementations assume one logical caller driving calls in sequence, so
/// order submissions reach the exchange in the order they were issued.
#[async_trait]
pub trait TradingApi: Send + Sync {
    /// Human-readable implementation name (e.g., "itBit REST API v1")
    fn impl_name(&self) -> &'static str;

    /// Place a limit order
    ///
    /// # Returns
    /// The exchange-assigned order ID
    async fn create_order(
        &self,
        market_id: &str,
        side: OrderSide,
        quantity: Decimal,
        price: Decimal,
    ) -> ExchangeResult<String>;

    /// Cancel an order
    ///
    /// Returns `Ok(false)` when the exchange declines the cancel; only
    /// transport and protocol failures surface as errors.
    async fn cancel_order(&self, order_id: &str, market_id: &str) -> ExchangeResult<bool>;

    /// List our open orders for a market
    async fn get_your_open_orders(&self, market_id: &str) -> ExchangeResult<Vec<OpenOrder>>;

    /// Fetch the public order book for a market
    async fn get_market_orders(&self, market_id: &str) -> ExchangeResult<MarketOrderBook>;

    /// Last traded price for a market
    async fn get_latest_market_price(&self, market_id: &str) -> ExchangeResult<Decimal>;

    /// Wallet balances
    async fn get_balance_info(&self) -> ExchangeResult<BalanceInfo>;

    /// Fraction of an order taken as fee (e.g., 0.0025 for 0.25%)
    fn get_fee_percentage(&self, side: OrderSide) -> Decimal;

    /// Fee fraction taken on buy orders
    fn get_percentage_of_buy_order_taken_for_exchange_fee(&self, _market_id: &str) -> Decimal {
        self.get_fee_percentage(OrderSide::Buy)
    }

    /// Fee fraction taken on sell orders
    fn get_percentage_of_sell_order_taken_for_exchange_fee(&self, _market_id: &str) -> Decimal {
        self.get_fee_percentage(OrderSide::Sell)
    }
}
