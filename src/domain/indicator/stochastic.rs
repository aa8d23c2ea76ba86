//! Stochastic oscillator over closing prices.
//!
//! %K = 100 * (C - min(C, n)) / (max(C, n) - min(C, n))
//!
//! `calculate_stochastic` uses the trailing n closes ending at each bar.
//! `calculate_stochastic_first_rows` pins the window to the first n closes of
//! the whole slice for every bar, and is invalid everywhere when the slice is
//! shorter than n.
//!
//! A window with max == min has no defined value and is reported invalid.

use crate::domain::candle::Candle;
use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};

pub const DEFAULT_PERIOD: usize = 14;

pub fn calculate_stochastic(candles: &[Candle], period: usize) -> IndicatorSeries {
    if period == 0 {
        return IndicatorSeries::empty(IndicatorType::Stochastic(period));
    }

    let values = candles
        .iter()
        .enumerate()
        .map(|(i, candle)| {
            let range = (i + 1 >= period).then(|| close_range(&candles[i + 1 - period..=i]));
            point(candle, range)
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Stochastic(period),
        values,
    }
}

pub fn calculate_stochastic_first_rows(candles: &[Candle], period: usize) -> IndicatorSeries {
    if period == 0 {
        return IndicatorSeries::empty(IndicatorType::Stochastic(period));
    }

    let range = (candles.len() >= period).then(|| close_range(&candles[..period]));
    let values = candles.iter().map(|candle| point(candle, range)).collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Stochastic(period),
        values,
    }
}

fn close_range(window: &[Candle]) -> (f64, f64) {
    window.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), c| {
        (lo.min(c.close), hi.max(c.close))
    })
}

fn point(candle: &Candle, range: Option<(f64, f64)>) -> IndicatorPoint {
    let k = range
        .filter(|(lo, hi)| hi > lo)
        .map(|(lo, hi)| (candle.close - lo) / (hi - lo) * 100.0);

    IndicatorPoint {
        timestamp: candle.timestamp,
        valid: k.is_some(),
        value: IndicatorValue::Simple(k.unwrap_or(0.0)),
    }
}
