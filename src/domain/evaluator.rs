//! Strategy evaluator: one engine shared by every strategy variant.
//!
//! The evaluator walks a symbol's enriched history once, holding at most one
//! open position, and records every open and close into a [`LedgerBatch`].
//! State lives in an [`EvaluatorState`] local to each call, so no balance or
//! position is shared across symbols or strategies.

use tracing::{debug, info};

use crate::domain::candle::Candle;
use crate::domain::ledger::LedgerBatch;
use crate::domain::position::Position;
use crate::domain::strategy::{Signals, StrategyConfig};

#[derive(Debug, Clone, PartialEq)]
pub struct EvaluatorState {
    pub balance: f64,
    pub open_position: Option<Position>,
}

impl EvaluatorState {
    pub fn new(initial_balance: f64) -> Self {
        EvaluatorState {
            balance: initial_balance,
            open_position: None,
        }
    }

    /// Apply one row's signals. Buy is checked before sell.
    pub fn step(
        &mut self,
        candle: &Candle,
        signals: Signals,
        stake: f64,
        strategy_name: &str,
        batch: &mut LedgerBatch,
    ) {
        if signals.buy
            && self.open_position.is_none()
            && self.balance >= stake
            && candle.close.is_finite()
            && candle.close > 0.0
        {
            let position = Position::open(&candle.symbol, candle.timestamp, candle.close, stake);
            self.balance -= stake;
            info!(
                strategy = strategy_name,
                symbol = %candle.symbol,
                timestamp = %candle.timestamp,
                price = candle.close,
                quantity = position.quantity,
                "buy"
            );
            batch.record_open(position.clone());
            self.open_position = Some(position);
        }

        if signals.sell {
            if let Some(position) = self.open_position.take() {
                let trade = position.close(candle.timestamp, candle.close);
                self.balance += position.market_value(candle.close);
                info!(
                    strategy = strategy_name,
                    symbol = %candle.symbol,
                    timestamp = %candle.timestamp,
                    price = candle.close,
                    profit_loss = trade.profit_loss,
                    profit_percent = trade.profit_percent,
                    "sell"
                );
                batch.record_close(strategy_name, trade);
            }
        }
    }
}

/// Replay `candles` (ascending, one symbol) under `config`.
///
/// The returned batch holds every ledger write in the order it happened.
/// An empty history yields an empty batch.
pub fn evaluate(candles: &[Candle], strategy_name: &str, config: &StrategyConfig) -> LedgerBatch {
    let mut batch = LedgerBatch::new();
    let mut state = EvaluatorState::new(config.initial_balance);
    let mut skipped = 0usize;

    for (candle, signals) in candles.iter().zip(config.signal_rows(candles)) {
        match signals {
            Some(signals) => state.step(candle, signals, config.stake, strategy_name, &mut batch),
            None => skipped += 1,
        }
    }

    debug!(
        strategy = strategy_name,
        rows = candles.len(),
        skipped,
        balance = state.balance,
        open = state.open_position.is_some(),
        "evaluation finished"
    );
    batch
}
