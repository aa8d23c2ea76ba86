//! Binance public REST market data adapter.
//!
//! Uses the unauthenticated spot endpoints:
//! - `GET /api/v3/ticker/price` for the symbol universe
//! - `GET /api/v3/klines?symbol=..&interval=..` for candles
//!
//! Any network failure, non-success status or malformed body is reported as
//! [`TraderError::Transport`].

use crate::domain::candle::Kline;
use crate::domain::error::TraderError;
use crate::ports::config_port::ConfigPort;
use crate::ports::market_data_port::MarketDataPort;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://api.binance.com";
pub const DEFAULT_QUOTE_ASSET: &str = "USDT";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct TickerPrice {
    symbol: String,
}

pub struct BinanceAdapter {
    base_url: String,
    quote_asset: String,
    /// Fixed universe; when empty the ticker endpoint is queried.
    symbols: Vec<String>,
    client: reqwest::blocking::Client,
}

fn transport(reason: impl std::fmt::Display) -> TraderError {
    TraderError::Transport {
        reason: reason.to_string(),
    }
}

impl BinanceAdapter {
    pub fn new(base_url: &str, quote_asset: &str) -> Result<Self, TraderError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(transport)?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            quote_asset: quote_asset.to_string(),
            symbols: Vec::new(),
            client,
        })
    }

    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, TraderError> {
        let base_url = config
            .get_string("market", "base_url")
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let quote_asset = config
            .get_string("market", "quote_asset")
            .unwrap_or_else(|| DEFAULT_QUOTE_ASSET.to_string());

        let mut adapter = Self::new(&base_url, &quote_asset)?;
        adapter.symbols = config.get_list("market", "symbols");
        Ok(adapter)
    }

    fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, TraderError> {
        debug!(url, "requesting");
        self.client
            .get(url)
            .send()
            .map_err(transport)?
            .error_for_status()
            .map_err(transport)?
            .json()
            .map_err(transport)
    }
}

fn number(fields: &[Value], index: usize, name: &str) -> Result<f64, TraderError> {
    match fields.get(index) {
        Some(Value::String(s)) => s
            .parse()
            .map_err(|e| transport(format!("invalid {}: {}", name, e))),
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| transport(format!("invalid {}", name))),
        _ => Err(transport(format!("missing {}", name))),
    }
}

fn integer(fields: &[Value], index: usize, name: &str) -> Result<i64, TraderError> {
    fields
        .get(index)
        .and_then(Value::as_i64)
        .ok_or_else(|| transport(format!("missing {}", name)))
}

/// Decode one kline array: open time, OHLCV, close time, quote volume,
/// trade count, taker buy base and quote volumes.
pub fn parse_kline(fields: &[Value]) -> Result<Kline, TraderError> {
    Ok(Kline {
        open_time: integer(fields, 0, "open_time")?,
        open: number(fields, 1, "open")?,
        high: number(fields, 2, "high")?,
        low: number(fields, 3, "low")?,
        close: number(fields, 4, "close")?,
        volume: number(fields, 5, "volume")?,
        quote_volume: number(fields, 7, "quote_volume")?,
        trade_count: integer(fields, 8, "trade_count")?,
        taker_buy_base: number(fields, 9, "taker_buy_base")?,
        taker_buy_quote: number(fields, 10, "taker_buy_quote")?,
    })
}

impl MarketDataPort for BinanceAdapter {
    fn list_symbols(&self) -> Result<Vec<String>, TraderError> {
        if !self.symbols.is_empty() {
            return Ok(self.symbols.clone());
        }

        let url = format!("{}/api/v3/ticker/price", self.base_url);
        let tickers: Vec<TickerPrice> = self.get_json(&url)?;
        Ok(tickers
            .into_iter()
            .map(|t| t.symbol)
            .filter(|s| s.ends_with(&self.quote_asset))
            .collect())
    }

    fn fetch_klines(&self, symbol: &str, interval: &str) -> Result<Vec<Kline>, TraderError> {
        let url = format!(
            "{}/api/v3/klines?symbol={}&interval={}",
            self.base_url, symbol, interval
        );
        let rows: Vec<Vec<Value>> = self.get_json(&url)?;
        rows.iter().map(|fields| parse_kline(fields)).collect()
    }
}
