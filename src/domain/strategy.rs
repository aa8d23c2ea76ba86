//! Strategy variants: buy/sell predicates and the fields each one needs.

use std::fmt;
use std::str::FromStr;

use crate::domain::candle::{Candle, IndicatorField};
use crate::domain::error::TraderError;
use crate::domain::indicator::stochastic::{
    self, calculate_stochastic, calculate_stochastic_first_rows,
};

pub const DEFAULT_INITIAL_BALANCE: f64 = 1000.0;
pub const DEFAULT_STAKE: f64 = 10.0;

pub const RSI_OVERSOLD: f64 = 30.0;
pub const RSI_OVERBOUGHT: f64 = 70.0;
pub const ADX_TRENDING: f64 = 25.0;
pub const STOCHASTIC_OVERSOLD: f64 = 20.0;
pub const STOCHASTIC_OVERBOUGHT: f64 = 80.0;

/// Buy and sell conditions for a single row. Both may hold at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Signals {
    pub buy: bool,
    pub sell: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    Combined,
    EmaCrossover,
    RsiOverboughtOversold,
    SmaCrossover,
    Stochastic,
}

impl StrategyKind {
    /// Sweep order used when no strategies are configured.
    pub const ALL: [StrategyKind; 5] = [
        StrategyKind::Combined,
        StrategyKind::EmaCrossover,
        StrategyKind::RsiOverboughtOversold,
        StrategyKind::SmaCrossover,
        StrategyKind::Stochastic,
    ];

    pub fn key(self) -> &'static str {
        match self {
            StrategyKind::Combined => "combined",
            StrategyKind::EmaCrossover => "ema_crossover",
            StrategyKind::RsiOverboughtOversold => "rsi",
            StrategyKind::SmaCrossover => "sma_crossover",
            StrategyKind::Stochastic => "stochastic",
        }
    }

    /// Identifier written to the strategy results ledger.
    pub fn default_name(self) -> &'static str {
        match self {
            StrategyKind::Combined => "Simple Strategy",
            StrategyKind::EmaCrossover => "EMA Crossover Strategy",
            StrategyKind::RsiOverboughtOversold => "RSI Overbought/Oversold Strategy",
            StrategyKind::SmaCrossover => "Moving Average Crossover Strategy",
            StrategyKind::Stochastic => "Stochastic Oscillator Strategy",
        }
    }

    /// Pipeline columns that must be non-null for a row to be considered.
    /// The stochastic variant derives its own value and needs none.
    pub fn required_fields(self) -> &'static [IndicatorField] {
        match self {
            StrategyKind::Combined => &IndicatorField::ALL,
            StrategyKind::EmaCrossover => &[IndicatorField::EmaShort, IndicatorField::EmaLong],
            StrategyKind::RsiOverboughtOversold => &[IndicatorField::Rsi],
            StrategyKind::SmaCrossover => &[IndicatorField::Sma50, IndicatorField::Sma200],
            StrategyKind::Stochastic => &[],
        }
    }

    pub fn has_required_fields(self, candle: &Candle) -> bool {
        self.required_fields()
            .iter()
            .all(|&field| candle.indicator(field).is_some())
    }

    /// Signals for a row from its persisted indicator columns.
    ///
    /// Returns `None` when a required field is null, and always for
    /// [`StrategyKind::Stochastic`].
    pub fn indicator_signals(self, c: &Candle) -> Option<Signals> {
        if !self.has_required_fields(c) {
            return None;
        }

        match self {
            StrategyKind::Combined => {
                let (ema_short, ema_long) = (c.ema_short?, c.ema_long?);
                let (rsi, macd, adx) = (c.rsi?, c.macd?, c.adx?);
                let trending = adx > ADX_TRENDING;
                Some(Signals {
                    buy: ema_short > ema_long
                        && rsi < RSI_OVERSOLD
                        && macd > 0.0
                        && c.close > c.bb_low?
                        && trending,
                    sell: ema_short < ema_long
                        && rsi > RSI_OVERBOUGHT
                        && macd < 0.0
                        && c.close < c.bb_high?
                        && trending,
                })
            }
            StrategyKind::EmaCrossover => {
                let (short, long) = (c.ema_short?, c.ema_long?);
                Some(Signals {
                    buy: short > long,
                    sell: short < long,
                })
            }
            StrategyKind::RsiOverboughtOversold => {
                let rsi = c.rsi?;
                Some(Signals {
                    buy: rsi < RSI_OVERSOLD,
                    sell: rsi > RSI_OVERBOUGHT,
                })
            }
            StrategyKind::SmaCrossover => {
                let (short, long) = (c.sma_50?, c.sma_200?);
                Some(Signals {
                    buy: short > long,
                    sell: short < long,
                })
            }
            StrategyKind::Stochastic => None,
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for StrategyKind {
    type Err = TraderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "combined" | "simple" => Ok(StrategyKind::Combined),
            "ema_crossover" | "ema" => Ok(StrategyKind::EmaCrossover),
            "rsi" => Ok(StrategyKind::RsiOverboughtOversold),
            "sma_crossover" | "sma" => Ok(StrategyKind::SmaCrossover),
            "stochastic" => Ok(StrategyKind::Stochastic),
            _ => Err(TraderError::UnknownStrategy {
                name: s.to_string(),
            }),
        }
    }
}

/// Which closes the stochastic oscillator ranges over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StochasticWindow {
    /// The 14 closes ending at the current row.
    #[default]
    Trailing,
    /// The first 14 closes of the whole history, for every row.
    FirstRows,
}

impl FromStr for StochasticWindow {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trailing" => Ok(StochasticWindow::Trailing),
            "first_rows" => Ok(StochasticWindow::FirstRows),
            other => Err(format!(
                "unknown stochastic window '{}', expected trailing or first_rows",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrategyConfig {
    pub kind: StrategyKind,
    pub initial_balance: f64,
    pub stake: f64,
    pub stochastic_window: StochasticWindow,
}

impl StrategyConfig {
    pub fn new(kind: StrategyKind) -> Self {
        StrategyConfig {
            kind,
            initial_balance: DEFAULT_INITIAL_BALANCE,
            stake: DEFAULT_STAKE,
            stochastic_window: StochasticWindow::default(),
        }
    }

    /// Per-row signals over an ascending history; `None` rows are skipped by
    /// the evaluator.
    pub fn signal_rows(&self, candles: &[Candle]) -> Vec<Option<Signals>> {
        match self.kind {
            StrategyKind::Stochastic => {
                let series = match self.stochastic_window {
                    StochasticWindow::Trailing => {
                        calculate_stochastic(candles, stochastic::DEFAULT_PERIOD)
                    }
                    StochasticWindow::FirstRows => {
                        calculate_stochastic_first_rows(candles, stochastic::DEFAULT_PERIOD)
                    }
                };
                (0..candles.len())
                    .map(|i| {
                        series.value_at(i).map(|k| Signals {
                            buy: k < STOCHASTIC_OVERSOLD,
                            sell: k > STOCHASTIC_OVERBOUGHT,
                        })
                    })
                    .collect()
            }
            kind => candles.iter().map(|c| kind.indicator_signals(c)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::candle::IndicatorSet;
    use crate::domain::indicator::test_support::candles_from_closes;

    fn combined_candle(close: f64, set: IndicatorSet) -> Candle {
        let mut candle = Candle {
            close,
            ..Candle::default()
        };
        candle.apply(&set);
        candle
    }

    fn bullish_set() -> IndicatorSet {
        IndicatorSet {
            ema_short: 11.0,
            ema_long: 10.0,
            rsi: 25.0,
            macd: 0.5,
            bb_high: 120.0,
            bb_low: 90.0,
            sma_50: 100.0,
            sma_200: 100.0,
            obv: 5000.0,
            adx: 30.0,
        }
    }

    #[test]
    fn parse_keys_and_aliases() {
        assert_eq!("combined".parse::<StrategyKind>().unwrap(), StrategyKind::Combined);
        assert_eq!("Simple".parse::<StrategyKind>().unwrap(), StrategyKind::Combined);
        assert_eq!(
            " ema_crossover ".parse::<StrategyKind>().unwrap(),
            StrategyKind::EmaCrossover
        );
        assert_eq!(
            "rsi".parse::<StrategyKind>().unwrap(),
            StrategyKind::RsiOverboughtOversold
        );
        assert_eq!("sma".parse::<StrategyKind>().unwrap(), StrategyKind::SmaCrossover);
        assert_eq!(
            "stochastic".parse::<StrategyKind>().unwrap(),
            StrategyKind::Stochastic
        );
    }

    #[test]
    fn parse_unknown_strategy() {
        let err = "momentum".parse::<StrategyKind>().unwrap_err();
        assert!(matches!(err, TraderError::UnknownStrategy { ref name } if name == "momentum"));
    }

    #[test]
    fn keys_round_trip_through_from_str() {
        for kind in StrategyKind::ALL {
            assert_eq!(kind.key().parse::<StrategyKind>().unwrap(), kind);
        }
    }

    #[test]
    fn default_names() {
        assert_eq!(StrategyKind::Combined.default_name(), "Simple Strategy");
        assert_eq!(
            StrategyKind::SmaCrossover.default_name(),
            "Moving Average Crossover Strategy"
        );
    }

    #[test]
    fn required_fields_per_variant() {
        assert_eq!(StrategyKind::Combined.required_fields().len(), 10);
        assert_eq!(
            StrategyKind::EmaCrossover.required_fields(),
            &[IndicatorField::EmaShort, IndicatorField::EmaLong]
        );
        assert!(StrategyKind::Stochastic.required_fields().is_empty());
    }

    #[test]
    fn missing_required_field_yields_no_signal() {
        let candle = Candle {
            ema_short: Some(11.0),
            ..Candle::default()
        };
        assert_eq!(StrategyKind::EmaCrossover.indicator_signals(&candle), None);
        // unrelated fields do not matter
        let candle = Candle {
            rsi: Some(50.0),
            ..Candle::default()
        };
        assert_eq!(
            StrategyKind::RsiOverboughtOversold.indicator_signals(&candle),
            Some(Signals::default())
        );
    }

    #[test]
    fn combined_buys_when_all_five_hold() {
        let candle = combined_candle(100.0, bullish_set());
        let signals = StrategyKind::Combined.indicator_signals(&candle).unwrap();
        assert!(signals.buy);
        assert!(!signals.sell);
    }

    #[test]
    fn combined_four_of_five_never_buys() {
        let breakers: [fn(&mut IndicatorSet, &mut f64); 5] = [
            |s, _| s.ema_short = 9.0,
            |s, _| s.rsi = 35.0,
            |s, _| s.macd = -0.1,
            |_, close| *close = 80.0,
            |s, _| s.adx = 20.0,
        ];

        for (i, breaker) in breakers.iter().enumerate() {
            let mut set = bullish_set();
            let mut close = 100.0;
            breaker(&mut set, &mut close);
            let candle = combined_candle(close, set);
            let signals = StrategyKind::Combined.indicator_signals(&candle).unwrap();
            assert!(!signals.buy, "condition {} broken but still bought", i);
        }
    }

    #[test]
    fn combined_sell_requires_trend() {
        let set = IndicatorSet {
            ema_short: 9.0,
            ema_long: 10.0,
            rsi: 75.0,
            macd: -0.5,
            adx: 26.0,
            ..bullish_set()
        };
        assert!(StrategyKind::Combined
            .indicator_signals(&combined_candle(100.0, set))
            .unwrap()
            .sell);

        let weak = IndicatorSet { adx: 25.0, ..set };
        assert!(!StrategyKind::Combined
            .indicator_signals(&combined_candle(100.0, weak))
            .unwrap()
            .sell);
    }

    #[test]
    fn crossover_equal_values_neither_buy_nor_sell() {
        let candle = Candle {
            sma_50: Some(100.0),
            sma_200: Some(100.0),
            ..Candle::default()
        };
        assert_eq!(
            StrategyKind::SmaCrossover.indicator_signals(&candle),
            Some(Signals::default())
        );
    }

    #[test]
    fn stochastic_rows_skip_warmup() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 - i as f64).collect();
        let rows = StrategyConfig::new(StrategyKind::Stochastic)
            .signal_rows(&candles_from_closes(&closes));

        assert_eq!(rows.len(), 20);
        assert!(rows[..13].iter().all(Option::is_none));
        // falling series: close is the window low, %K = 0
        assert_eq!(rows[13], Some(Signals { buy: true, sell: false }));
    }

    #[test]
    fn stochastic_first_rows_window_needs_fourteen_rows() {
        let config = StrategyConfig {
            stochastic_window: StochasticWindow::FirstRows,
            ..StrategyConfig::new(StrategyKind::Stochastic)
        };
        let closes: Vec<f64> = (0..13).map(|i| 100.0 + i as f64).collect();
        assert!(config
            .signal_rows(&candles_from_closes(&closes))
            .iter()
            .all(Option::is_none));

        let closes: Vec<f64> = (0..14).map(|i| 100.0 + i as f64).collect();
        let rows = config.signal_rows(&candles_from_closes(&closes));
        assert_eq!(rows[0], Some(Signals { buy: true, sell: false }));
        assert_eq!(rows[13], Some(Signals { buy: false, sell: true }));
    }

    #[test]
    fn stochastic_window_parse() {
        assert_eq!(
            "first_rows".parse::<StochasticWindow>(),
            Ok(StochasticWindow::FirstRows)
        );
        assert_eq!("Trailing".parse::<StochasticWindow>(), Ok(StochasticWindow::Trailing));
        assert!("rolling".parse::<StochasticWindow>().is_err());
    }

    #[test]
    fn config_defaults() {
        let config = StrategyConfig::new(StrategyKind::RsiOverboughtOversold);
        assert_eq!(config.initial_balance, 1000.0);
        assert_eq!(config.stake, 10.0);
        assert_eq!(config.stochastic_window, StochasticWindow::Trailing);
    }
}
