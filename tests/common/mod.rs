#![allow(dead_code)]

use candletrader::domain::candle::{Candle, Kline};
use candletrader::domain::error::TraderError;
use candletrader::ports::market_data_port::MarketDataPort;
use std::cell::Cell;
use std::collections::BTreeMap;

/// 2024-01-01T00:00:00Z in epoch milliseconds.
pub const BASE_OPEN_TIME: i64 = 1_704_067_200_000;
pub const HOUR_MS: i64 = 3_600_000;

pub struct MockMarketData {
    pub klines: BTreeMap<String, Vec<Kline>>,
    pub errors: BTreeMap<String, String>,
    pub list_error: Option<String>,
    pub fetches: Cell<usize>,
}

impl MockMarketData {
    pub fn new() -> Self {
        Self {
            klines: BTreeMap::new(),
            errors: BTreeMap::new(),
            list_error: None,
            fetches: Cell::new(0),
        }
    }

    pub fn with_klines(mut self, symbol: &str, klines: Vec<Kline>) -> Self {
        self.klines.insert(symbol.to_string(), klines);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }

    pub fn with_list_error(mut self, reason: &str) -> Self {
        self.list_error = Some(reason.to_string());
        self
    }
}

impl MarketDataPort for MockMarketData {
    fn list_symbols(&self) -> Result<Vec<String>, TraderError> {
        if let Some(reason) = &self.list_error {
            return Err(TraderError::Transport {
                reason: reason.clone(),
            });
        }
        let mut symbols: Vec<String> = self.klines.keys().cloned().collect();
        symbols.extend(self.errors.keys().cloned());
        symbols.sort();
        symbols.dedup();
        Ok(symbols)
    }

    fn fetch_klines(&self, symbol: &str, _interval: &str) -> Result<Vec<Kline>, TraderError> {
        self.fetches.set(self.fetches.get() + 1);
        if let Some(reason) = self.errors.get(symbol) {
            return Err(TraderError::Transport {
                reason: reason.clone(),
            });
        }
        Ok(self.klines.get(symbol).cloned().unwrap_or_default())
    }
}

pub fn make_kline(i: usize, close: f64) -> Kline {
    Kline {
        open_time: BASE_OPEN_TIME + i as i64 * HOUR_MS,
        open: close - 0.5,
        high: close + 1.0,
        low: close - 1.5,
        close,
        volume: 100.0 + (i % 7) as f64 * 5.0,
        quote_volume: close * 100.0,
        trade_count: 50 + i as i64,
        taker_buy_base: 40.0,
        taker_buy_quote: close * 40.0,
    }
}

pub fn klines_from_closes(closes: &[f64]) -> Vec<Kline> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| make_kline(i, close))
        .collect()
}

/// Oscillating, gently rising closes: long enough series cross every
/// indicator's warm-up and produce both buy and sell signals.
pub fn wave_closes(count: usize) -> Vec<f64> {
    (0..count)
        .map(|i| 100.0 + (i as f64 * 0.15).sin() * 12.0 + i as f64 * 0.02)
        .collect()
}

pub fn make_candle(symbol: &str, i: usize, close: f64) -> Candle {
    make_kline(i, close).into_candle(symbol).unwrap()
}

/// Render klines as a CSV file body readable by the CSV market adapter.
pub fn klines_csv(klines: &[Kline]) -> String {
    let mut out = String::from(
        "open_time,open,high,low,close,volume,quote_volume,trade_count,taker_buy_base,taker_buy_quote\n",
    );
    for k in klines {
        out.push_str(&format!(
            "{},{},{},{},{},{},{},{},{},{}\n",
            k.open_time,
            k.open,
            k.high,
            k.low,
            k.close,
            k.volume,
            k.quote_volume,
            k.trade_count,
            k.taker_buy_base,
            k.taker_buy_quote
        ));
    }
    out
}
