//! itBit Types
//!
//! API response shapes and their conversion into the generic domain model.
//! Every `parse_*` function is pure: raw body in, domain value or
//! `InvalidResponse` (with the offending body attached) out.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::adapters::errors::{ExchangeError, ExchangeResult};
use crate::adapters::types::{BalanceInfo, MarketOrder, MarketOrderBook, OpenOrder, OrderSide};

// =============================================================================
// Wire Types
// =============================================================================

/// One of our orders, as returned by the wallet order endpoints
#[allow(dead_code)]
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItBitYourOrder {
    pub id: String,
    #[serde(default)]
    pub wallet_id: Option<String>,
    /// "buy" or "sell"
    pub side: String,
    /// Market ID, e.g. "XBTUSD"
    #[serde(default)]
    pub instrument: Option<String>,
    /// e.g. "limit"
    #[serde(default, rename = "type")]
    pub order_type: Option<String>,
    /// Original amount
    pub amount: Decimal,
    #[serde(default)]
    pub display_amount: Option<Decimal>,
    pub price: Decimal,
    #[serde(default)]
    pub volume_weighted_average_price: Option<Decimal>,
    pub amount_filled: Decimal,
    /// e.g. "2015-10-01T18:10:39.3930000Z"
    pub created_time: String,
    /// e.g. "open"
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub client_order_identifier: Option<String>,
}

/// Response to a new order; only the ID is used
#[derive(Debug, Clone, Deserialize)]
pub struct ItBitNewOrderResponse {
    pub id: String,
}

/// Public order book: `[price, amount]` pairs
#[derive(Debug, Clone, Deserialize)]
pub struct ItBitOrderBook {
    pub bids: Vec<[Decimal; 2]>,
    pub asks: Vec<[Decimal; 2]>,
}

/// Public ticker; only `last_price` is surfaced
#[allow(dead_code)]
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItBitTicker {
    #[serde(default)]
    pub pair: Option<String>,
    #[serde(default)]
    pub bid: Option<Decimal>,
    #[serde(default)]
    pub bid_amt: Option<Decimal>,
    #[serde(default)]
    pub ask: Option<Decimal>,
    #[serde(default)]
    pub ask_amt: Option<Decimal>,
    pub last_price: Decimal,
    #[serde(default)]
    pub last_amt: Option<Decimal>,
    #[serde(default)]
    pub volume24h: Option<Decimal>,
    #[serde(default)]
    pub volume_today: Option<Decimal>,
    #[serde(default)]
    pub high24h: Option<Decimal>,
    #[serde(default)]
    pub low24h: Option<Decimal>,
    #[serde(default)]
    pub open_today: Option<Decimal>,
    #[serde(default)]
    pub vwap_today: Option<Decimal>,
    #[serde(default)]
    pub vwap24h: Option<Decimal>,
    #[serde(default, rename = "serverTimeUTC")]
    pub server_time_utc: Option<String>,
}

/// A wallet and its per-currency balances
#[allow(dead_code)]
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItBitWallet {
    pub id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    pub balances: Vec<ItBitBalance>,
}

#[allow(dead_code)]
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItBitBalance {
    pub currency: String,
    pub available_balance: Decimal,
    #[serde(default)]
    pub total_balance: Option<Decimal>,
}

// =============================================================================
// Parsing
// =============================================================================

fn from_body<T: DeserializeOwned>(body: &str) -> ExchangeResult<T> {
    serde_json::from_str(body).map_err(|e| ExchangeError::InvalidResponse {
        reason: e.to_string(),
        body: body.to_string(),
    })
}

/// Map the wire side onto the domain side; anything unknown is fatal
pub fn parse_side(side: &str) -> ExchangeResult<OrderSide> {
    match side {
        "buy" => Ok(OrderSide::Buy),
        "sell" => Ok(OrderSide::Sell),
        other => Err(ExchangeError::UnknownOrderSide(other.to_string())),
    }
}

/// ID of a freshly created order
pub fn parse_new_order_id(body: &str) -> ExchangeResult<String> {
    let order: ItBitNewOrderResponse = from_body(body)?;
    Ok(order.id)
}

/// Open orders, with remaining quantity and total computed locally
pub fn parse_open_orders(body: &str, market_id: &str) -> ExchangeResult<Vec<OpenOrder>> {
    let orders: Vec<ItBitYourOrder> = from_body(body)?;
    orders
        .into_iter()
        .map(|order| {
            let side = parse_side(&order.side)?;
            let created_at = DateTime::parse_from_rfc3339(&order.created_time)
                .map_err(|e| ExchangeError::InvalidResponse {
                    reason: format!("Invalid createdTime '{}': {}", order.created_time, e),
                    body: body.to_string(),
                })?
                .with_timezone(&Utc);
            Ok(OpenOrder {
                id: order.id,
                created_at,
                market_id: market_id.to_string(),
                side,
                price: order.price,
                quantity: order.amount - order.amount_filled,
                original_quantity: order.amount,
                total: order.price * order.amount,
            })
        })
        .collect()
}

/// Order book levels in exchange order; totals computed, not trusted
pub fn parse_order_book(body: &str, market_id: &str) -> ExchangeResult<MarketOrderBook> {
    let book: ItBitOrderBook = from_body(body)?;
    let buy_orders = book
        .bids
        .iter()
        .map(|[price, amount]| MarketOrder::new(OrderSide::Buy, *price, *amount))
        .collect();
    let sell_orders = book
        .asks
        .iter()
        .map(|[price, amount]| MarketOrder::new(OrderSide::Sell, *price, *amount))
        .collect();
    Ok(MarketOrderBook {
        market_id: market_id.to_string(),
        sell_orders,
        buy_orders,
    })
}

/// Last traded price from the ticker
pub fn parse_last_price(body: &str) -> ExchangeResult<Decimal> {
    let ticker: ItBitTicker = from_body(body)?;
    Ok(ticker.last_price)
}

/// Balances of the first wallet, plus that wallet's ID
///
/// Only one wallet is supported; any further wallets are ignored.
pub fn parse_wallet_balances(body: &str) -> ExchangeResult<(String, BalanceInfo)> {
    let wallets: Vec<ItBitWallet> = from_body(body)?;
    let wallet = wallets
        .into_iter()
        .next()
        .ok_or_else(|| ExchangeError::InvalidResponse {
            reason: "No wallets returned".to_string(),
            body: body.to_string(),
        })?;

    let available = wallet
        .balances
        .into_iter()
        .map(|b| (b.currency, b.available_balance))
        .collect();
    Ok((
        wallet.id,
        BalanceInfo {
            available,
            on_hold: Default::default(),
        },
    ))
}
