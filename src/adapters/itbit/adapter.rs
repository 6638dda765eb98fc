//! itBit Adapter Implementation
//!
//! Main ItBitAdapter struct implementing the TradingApi trait.
//! Uses modules: config, signing, transport, types for sub-components.

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::{Decimal, RoundingStrategy};
use tokio::sync::RwLock;

use crate::adapters::errors::{ExchangeError, ExchangeResult};
use crate::adapters::traits::TradingApi;
use crate::adapters::types::{BalanceInfo, MarketOrderBook, OpenOrder, OrderSide};

use super::config::ItBitConfig;
use super::signing::{HttpMethod, NonceCounter, RequestParams};
use super::transport::{ExchangeResponse, Transport};
use super::types::{
    parse_last_price, parse_new_order_id, parse_open_orders, parse_order_book,
    parse_wallet_balances,
};

/// Name reported by `impl_name()`
pub const IMPL_NAME: &str = "itBit REST API v1";

/// Decimal places sent for order amounts
const QUANTITY_DECIMAL_PLACES: u32 = 4;
/// Decimal places sent for order prices
const PRICE_DECIMAL_PLACES: u32 = 2;

const STATUS_OK: u16 = 200;
const STATUS_CREATED: u16 = 201;
const STATUS_ACCEPTED: u16 = 202;

// =============================================================================
// Wallet State
// =============================================================================

/// The wallet every authenticated order call is routed through
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletReference {
    pub wallet_id: String,
}

/// Resolved lazily on first need, then fixed for the adapter's lifetime
#[derive(Debug, Clone, PartialEq, Eq)]
enum WalletState {
    Unresolved,
    Resolved(WalletReference),
}

// =============================================================================
// Number Formatting
// =============================================================================

/// Round half-to-even to `dp` places and drop trailing zeros
fn format_decimal(value: Decimal, dp: u32) -> String {
    value
        .round_dp_with_strategy(dp, RoundingStrategy::MidpointNearestEven)
        .normalize()
        .to_string()
}

/// Order amount as sent on the wire (at most 4 dp)
pub fn format_quantity(quantity: Decimal) -> String {
    format_decimal(quantity, QUANTITY_DECIMAL_PLACES)
}

/// Order price as sent on the wire (at most 2 dp)
pub fn format_price(price: Decimal) -> String {
    format_decimal(price, PRICE_DECIMAL_PLACES)
}

/// Currency code of a market, e.g. "XBT" for "XBTUSD"
fn currency_of(market_id: &str) -> ExchangeResult<&str> {
    market_id.get(..3).ok_or_else(|| {
        ExchangeError::InvalidRequest(format!(
            "Market ID '{}' is too short to derive a currency",
            market_id
        ))
    })
}

fn expect_status(response: ExchangeResponse, expected: u16, context: &str) -> ExchangeResult<ExchangeResponse> {
    if response.status_code == expected {
        return Ok(response);
    }
    tracing::error!(
        exchange = "itbit",
        expected,
        status = response.status_code,
        body = %response.body,
        "{}",
        context
    );
    Err(ExchangeError::UnexpectedStatus {
        context: context.to_string(),
        response,
    })
}

// =============================================================================
// ItBitAdapter
// =============================================================================

/// itBit exchange adapter
pub struct ItBitAdapter {
    config: ItBitConfig,
    transport: Transport,
    wallet: RwLock<WalletState>,
    buy_fee: Decimal,
    sell_fee: Decimal,
}

impl ItBitAdapter {
    /// Create a new adapter with its nonce seeded from the wall clock
    pub fn new(config: ItBitConfig) -> ExchangeResult<Self> {
        Self::with_nonce_counter(config, Arc::new(NonceCounter::seeded_from_clock()))
    }

    /// Create a new adapter drawing nonces from a shared counter
    ///
    /// Use this when several adapters sign with the same API key.
    pub fn with_nonce_counter(config: ItBitConfig, nonces: Arc<NonceCounter>) -> ExchangeResult<Self> {
        config.validate()?;
        let transport = Transport::new(&config, nonces)?;
        let buy_fee = config.buy_fee_fraction();
        let sell_fee = config.sell_fee_fraction();
        tracing::info!(
            phase = "init",
            exchange = "itbit",
            base_url = %config.base_url,
            buy_fee = %buy_fee,
            sell_fee = %sell_fee,
            nonce_seed = transport.nonces().current(),
            "itBit adapter created"
        );
        Ok(Self {
            config,
            transport,
            wallet: RwLock::new(WalletState::Unresolved),
            buy_fee,
            sell_fee,
        })
    }

    pub fn config(&self) -> &ItBitConfig {
        &self.config
    }

    /// Resolved wallet ID, if any call has resolved it yet
    pub async fn wallet_id(&self) -> Option<String> {
        match &*self.wallet.read().await {
            WalletState::Resolved(reference) => Some(reference.wallet_id.clone()),
            WalletState::Unresolved => None,
        }
    }

    /// Wallet ID, fetching the wallet list first if still unresolved
    async fn ensure_wallet(&self) -> ExchangeResult<String> {
        if let Some(wallet_id) = self.wallet_id().await {
            return Ok(wallet_id);
        }
        let (wallet_id, _) = self.fetch_wallet_balances().await?;
        Ok(wallet_id)
    }

    /// List wallets, resolve the reference if unset, return the first wallet
    async fn fetch_wallet_balances(&self) -> ExchangeResult<(String, BalanceInfo)> {
        let params = RequestParams::new().with("userId", &self.config.user_id);
        let response = self
            .transport
            .send_authenticated(HttpMethod::Get, "wallets", &params)
            .await?;
        let response = expect_status(response, STATUS_OK, "Failed to get your wallet balance info from exchange")?;
        let (wallet_id, info) = parse_wallet_balances(&response.body)?;

        let mut state = self.wallet.write().await;
        if *state == WalletState::Unresolved {
            tracing::info!(exchange = "itbit", wallet_id = %wallet_id, "Wallet resolved");
            *state = WalletState::Resolved(WalletReference {
                wallet_id: wallet_id.clone(),
            });
        }
        Ok((wallet_id, info))
    }
}

#[async_trait]
impl TradingApi for ItBitAdapter {
    fn impl_name(&self) -> &'static str {
        IMPL_NAME
    }

    async fn create_order(
        &self,
        market_id: &str,
        side: OrderSide,
        quantity: Decimal,
        price: Decimal,
    ) -> ExchangeResult<String> {
        let currency = currency_of(market_id)?;
        let wallet_id = self.ensure_wallet().await?;

        let wire_side = match side {
            OrderSide::Buy => "buy",
            OrderSide::Sell => "sell",
        };
        let amount = format_quantity(quantity);
        let limit_price = format_price(price);
        let params = RequestParams::new()
            .with("side", wire_side)
            .with("type", "limit")
            .with("currency", currency)
            .with("amount", amount.as_str())
            .with("price", limit_price.as_str())
            .with("instrument", market_id);

        let response = self
            .transport
            .send_authenticated(HttpMethod::Post, &format!("wallets/{}/orders", wallet_id), &params)
            .await?;
        let response = expect_status(response, STATUS_CREATED, "Failed to create order on exchange")?;
        let order_id = parse_new_order_id(&response.body)?;

        tracing::info!(
            exchange = "itbit",
            market = %market_id,
            side = %side,
            amount = %amount,
            price = %limit_price,
            order_id = %order_id,
            "Order created"
        );
        Ok(order_id)
    }

    async fn cancel_order(&self, order_id: &str, market_id: &str) -> ExchangeResult<bool> {
        let wallet_id = self.ensure_wallet().await?;
        let response = self
            .transport
            .send_authenticated(
                HttpMethod::Delete,
                &format!("wallets/{}/orders/{}", wallet_id, order_id),
                &RequestParams::new(),
            )
            .await?;

        if response.status_code == STATUS_ACCEPTED {
            tracing::info!(exchange = "itbit", market = %market_id, order_id = %order_id, "Order cancelled");
            return Ok(true);
        }
        tracing::warn!(
            exchange = "itbit",
            market = %market_id,
            order_id = %order_id,
            status = response.status_code,
            body = %response.body,
            "Failed to cancel order on exchange"
        );
        Ok(false)
    }

    async fn get_your_open_orders(&self, market_id: &str) -> ExchangeResult<Vec<OpenOrder>> {
        let wallet_id = self.ensure_wallet().await?;
        let params = RequestParams::new().with("status", "open");
        let response = self
            .transport
            .send_authenticated(HttpMethod::Get, &format!("wallets/{}/orders", wallet_id), &params)
            .await?;
        let response = expect_status(response, STATUS_OK, "Failed to get your open orders from exchange")?;
        let orders = parse_open_orders(&response.body, market_id)?;
        tracing::debug!(exchange = "itbit", market = %market_id, count = orders.len(), "Open orders fetched");
        Ok(orders)
    }

    async fn get_market_orders(&self, market_id: &str) -> ExchangeResult<MarketOrderBook> {
        let response = self
            .transport
            .send_public(&format!("markets/{}/order_book", market_id))
            .await?;
        let response = expect_status(response, STATUS_OK, "Failed to get market order book from exchange")?;
        parse_order_book(&response.body, market_id)
    }

    async fn get_latest_market_price(&self, market_id: &str) -> ExchangeResult<Decimal> {
        let response = self
            .transport
            .send_public(&format!("markets/{}/ticker", market_id))
            .await?;
        let response = expect_status(response, STATUS_OK, "Failed to get market ticker from exchange")?;
        parse_last_price(&response.body)
    }

    async fn get_balance_info(&self) -> ExchangeResult<BalanceInfo> {
        let (_, info) = self.fetch_wallet_balances().await?;
        Ok(info)
    }

    fn get_fee_percentage(&self, side: OrderSide) -> Decimal {
        match side {
            OrderSide::Buy => self.buy_fee,
            OrderSide::Sell => self.sell_fee,
        }
    }
}
