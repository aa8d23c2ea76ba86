//! Symbol-cycle driver: ingest, enrich, evaluate.
//!
//! [`run_cycle`] is the single entry point for one symbol under one strategy.
//! [`sweep`] runs it across the whole symbol universe for each configured
//! strategy. Neither loops or sleeps; cadence belongs to the caller.

use tracing::{error, info, warn};

use crate::domain::candle::Candle;
use crate::domain::error::TraderError;
use crate::domain::evaluator::evaluate;
use crate::domain::pipeline::enrich;
use crate::domain::strategy::StrategyConfig;
use crate::ports::data_store_port::DataStorePort;
use crate::ports::market_data_port::MarketDataPort;

pub const DEFAULT_INTERVAL: &str = "1h";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The market data source had nothing for this symbol this cycle.
    NoData,
    Completed {
        candles_ingested: usize,
        rows_enriched: usize,
        positions_opened: usize,
        trades_closed: usize,
    },
}

/// Ingest, enrich and evaluate `symbol` under one strategy.
///
/// Transient market data failures are not errors here: they are logged and
/// reported as [`CycleOutcome::NoData`]. Anything else, including every store
/// failure, propagates.
pub fn run_cycle(
    market: &dyn MarketDataPort,
    store: &dyn DataStorePort,
    symbol: &str,
    strategy_name: &str,
    config: &StrategyConfig,
    interval: &str,
) -> Result<CycleOutcome, TraderError> {
    let candles = match fetch_candles(market, symbol, interval) {
        Ok(candles) if !candles.is_empty() => candles,
        Ok(_) => {
            info!(symbol, "no market data this cycle");
            return Ok(CycleOutcome::NoData);
        }
        Err(e) if e.is_transient() => {
            warn!(symbol, error = %e, "market data fetch failed, skipping symbol");
            return Ok(CycleOutcome::NoData);
        }
        Err(e) => return Err(e),
    };

    let candles_ingested = store.insert_candles(&candles)?;

    let history = store.fetch_candles(symbol)?;
    let enriched = enrich(&history);
    let rows_enriched = store.update_indicators(symbol, &enriched)?;

    // Read back so the evaluator sees only committed indicator values.
    let history = store.fetch_candles(symbol)?;
    let batch = evaluate(&history, strategy_name, config);
    if !batch.is_empty() {
        store.append_ledger(&batch)?;
    }

    let outcome = CycleOutcome::Completed {
        candles_ingested,
        rows_enriched,
        positions_opened: batch.positions.len(),
        trades_closed: batch.trades.len(),
    };
    info!(
        symbol,
        strategy = strategy_name,
        candles_ingested,
        rows_enriched,
        positions_opened = batch.positions.len(),
        trades_closed = batch.trades.len(),
        "cycle complete"
    );
    Ok(outcome)
}

fn fetch_candles(
    market: &dyn MarketDataPort,
    symbol: &str,
    interval: &str,
) -> Result<Vec<Candle>, TraderError> {
    let klines = market.fetch_klines(symbol, interval)?;
    let mut candles = Vec::with_capacity(klines.len());
    for kline in klines {
        match kline.into_candle(symbol) {
            Ok(candle) => candles.push(candle),
            Err(e) => warn!(symbol, error = %e, "dropping kline"),
        }
    }
    Ok(candles)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepSummary {
    pub symbols: usize,
    pub completed: usize,
    pub no_data: usize,
    pub failed: usize,
}

/// One pass over the symbol universe for each strategy, strategy-major.
///
/// The universe is listed once. If listing fails the sweep is empty. Any
/// error from one symbol's cycle is logged and the sweep moves on.
pub fn sweep(
    market: &dyn MarketDataPort,
    store: &dyn DataStorePort,
    strategies: &[StrategyConfig],
    interval: &str,
) -> SweepSummary {
    let symbols = match market.list_symbols() {
        Ok(symbols) => symbols,
        Err(e) => {
            warn!(error = %e, "could not list symbols, nothing to sweep");
            Vec::new()
        }
    };

    let mut summary = SweepSummary {
        symbols: symbols.len(),
        ..SweepSummary::default()
    };

    for config in strategies {
        let name = config.kind.default_name();
        info!(strategy = name, symbols = symbols.len(), "running strategy");
        for symbol in &symbols {
            match run_cycle(market, store, symbol, name, config, interval) {
                Ok(CycleOutcome::Completed { .. }) => summary.completed += 1,
                Ok(CycleOutcome::NoData) => summary.no_data += 1,
                Err(e) => {
                    error!(symbol = %symbol, strategy = name, error = %e, "cycle failed");
                    summary.failed += 1;
                }
            }
        }
    }

    summary
}
