//! Open positions, closed trades and per-strategy results.

use chrono::NaiveDateTime;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Buy,
}

impl Side {
    pub fn as_str(self) -> &'static str {
        match self {
            Side::Buy => "BUY",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub symbol: String,
    pub entry_timestamp: NaiveDateTime,
    pub entry_price: f64,
    pub quantity: f64,
    pub side: Side,
}

impl Position {
    /// Buy `stake` worth of `symbol` at `price`.
    pub fn open(symbol: &str, timestamp: NaiveDateTime, price: f64, stake: f64) -> Self {
        Position {
            symbol: symbol.to_string(),
            entry_timestamp: timestamp,
            entry_price: price,
            quantity: stake / price,
            side: Side::Buy,
        }
    }

    pub fn cost_basis(&self) -> f64 {
        self.entry_price * self.quantity
    }

    pub fn market_value(&self, price: f64) -> f64 {
        self.quantity * price
    }

    /// Close at `price`, producing the immutable trade record.
    pub fn close(&self, timestamp: NaiveDateTime, price: f64) -> Trade {
        let profit_loss = (price - self.entry_price) * self.quantity;
        let profit_percent = profit_loss / self.cost_basis() * 100.0;
        Trade {
            symbol: self.symbol.clone(),
            entry_timestamp: self.entry_timestamp,
            exit_timestamp: timestamp,
            entry_price: self.entry_price,
            exit_price: price,
            quantity: self.quantity,
            profit_loss,
            profit_percent,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub symbol: String,
    pub entry_timestamp: NaiveDateTime,
    pub exit_timestamp: NaiveDateTime,
    pub entry_price: f64,
    pub exit_price: f64,
    pub quantity: f64,
    pub profit_loss: f64,
    pub profit_percent: f64,
}

impl Trade {
    pub fn is_win(&self) -> bool {
        self.profit_loss > 0.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StrategyResult {
    pub strategy: String,
    pub trade: Trade,
}
