//! itBit connectivity check
//!
//! 1. Loads configuration (YAML path as first argument, else environment)
//! 2. Creates the itBit adapter
//! 3. Fetches ticker and order book for each configured market
//! 4. Fetches wallet balances and open orders (authenticated)
//!
//! Read-only: never places or cancels orders.

use std::path::Path;

use anyhow::Context;
use tracing::{error, info, warn};

use itbit_adapter::adapters::{ItBitAdapter, TradingApi};
use itbit_adapter::config::{self, logging::init_logging, AppConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_logging();

    let config = match std::env::args().nth(1) {
        Some(path) => config::load_config(Path::new(&path)),
        None => AppConfig::from_env(),
    };
    let config = match config {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(phase = "init", error = %e, "Configuration failed");
            std::process::exit(1);
        }
    };

    let adapter = ItBitAdapter::new(config.itbit.clone()).context("Failed to create itBit adapter")?;
    info!(phase = "init", implementation = adapter.impl_name(), "Adapter ready");

    for market in &config.markets {
        let last_price = adapter
            .get_latest_market_price(market)
            .await
            .with_context(|| format!("Ticker request failed for {}", market))?;
        let book = adapter
            .get_market_orders(market)
            .await
            .with_context(|| format!("Order book request failed for {}", market))?;
        info!(
            market = %market,
            last_price = %last_price,
            best_bid = ?book.best_bid(),
            best_ask = ?book.best_ask(),
            bids = book.buy_orders.len(),
            asks = book.sell_orders.len(),
            buy_fee = %adapter.get_percentage_of_buy_order_taken_for_exchange_fee(market),
            sell_fee = %adapter.get_percentage_of_sell_order_taken_for_exchange_fee(market),
            "Market snapshot"
        );
    }

    let balances = adapter
        .get_balance_info()
        .await
        .context("Balance request failed")?;
    for (currency, amount) in &balances.available {
        info!(currency = %currency, available = %amount, "Balance");
    }

    for market in &config.markets {
        match adapter.get_your_open_orders(market).await {
            Ok(orders) => info!(market = %market, open_orders = orders.len(), "Open orders"),
            Err(e) if e.is_retryable() => warn!(market = %market, error = %e, "Open orders unavailable, try again later"),
            Err(e) => return Err(e).with_context(|| format!("Open orders request failed for {}", market)),
        }
    }

    info!("Check complete");
    Ok(())
}
