//! Trade ledger write set for one symbol-cycle.
//!
//! The evaluator records into a [`LedgerBatch`]; the data store appends the
//! whole batch in one transaction. Nothing here updates or deletes.

use super::position::{Position, StrategyResult, Trade};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LedgerBatch {
    pub positions: Vec<Position>,
    pub trades: Vec<Trade>,
    pub strategy_results: Vec<StrategyResult>,
}

impl LedgerBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_open(&mut self, position: Position) {
        self.positions.push(position);
    }

    /// A closed trade is written twice: once to the trade log, once tagged
    /// with the strategy that produced it.
    pub fn record_close(&mut self, strategy: &str, trade: Trade) {
        self.strategy_results.push(StrategyResult {
            strategy: strategy.to_string(),
            trade: trade.clone(),
        });
        self.trades.push(trade);
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty() && self.trades.is_empty() && self.strategy_results.is_empty()
    }

    pub fn total_profit_loss(&self) -> f64 {
        self.trades.iter().map(|t| t.profit_loss).sum()
    }
}

/// Aggregate of recorded results for one strategy.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategySummary {
    pub strategy: String,
    pub trades: usize,
    pub wins: usize,
    pub total_profit_loss: f64,
}

impl StrategySummary {
    pub fn win_rate(&self) -> f64 {
        if self.trades == 0 {
            0.0
        } else {
            self.wins as f64 / self.trades as f64 * 100.0
        }
    }
}

/// Group results by strategy, in order of first appearance.
pub fn summarize(results: &[StrategyResult]) -> Vec<StrategySummary> {
    let mut summaries: Vec<StrategySummary> = Vec::new();
    for result in results {
        let idx = match summaries.iter().position(|s| s.strategy == result.strategy) {
            Some(idx) => idx,
            None => {
                summaries.push(StrategySummary {
                    strategy: result.strategy.clone(),
                    trades: 0,
                    wins: 0,
                    total_profit_loss: 0.0,
                });
                summaries.len() - 1
            }
        };
        let summary = &mut summaries[idx];
        summary.trades += 1;
        if result.trade.is_win() {
            summary.wins += 1;
        }
        summary.total_profit_loss += result.trade.profit_loss;
    }
    summaries
}
