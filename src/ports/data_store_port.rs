//! Persistent store port trait: candles and the trade ledger.

use crate::domain::candle::Candle;
use crate::domain::error::TraderError;
use crate::domain::ledger::LedgerBatch;
use crate::domain::pipeline::EnrichedRow;
use crate::domain::position::{Position, StrategyResult, Trade};

pub trait DataStorePort {
    /// Insert raw candles in one transaction. Rows whose (symbol, timestamp)
    /// already exists are ignored. Returns the number of new rows.
    fn insert_candles(&self, candles: &[Candle]) -> Result<usize, TraderError>;

    /// Full history for `symbol`, ascending by timestamp.
    fn fetch_candles(&self, symbol: &str) -> Result<Vec<Candle>, TraderError>;

    /// Write indicator columns for the matching rows in one transaction.
    /// Rows that already carry indicators are left alone. Returns the number
    /// of rows updated.
    fn update_indicators(&self, symbol: &str, rows: &[EnrichedRow]) -> Result<usize, TraderError>;

    /// Append a ledger batch in one transaction.
    fn append_ledger(&self, batch: &LedgerBatch) -> Result<(), TraderError>;

    fn fetch_positions(&self, symbol: &str) -> Result<Vec<Position>, TraderError>;

    fn fetch_trades(&self, symbol: &str) -> Result<Vec<Trade>, TraderError>;

    /// All strategy results, optionally narrowed to one symbol.
    fn fetch_strategy_results(&self, symbol: Option<&str>)
    -> Result<Vec<StrategyResult>, TraderError>;
}
