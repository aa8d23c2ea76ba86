//! Exponential Moving Average indicator.
//!
//! k = 2/(n+1). The recursion is seeded with the first observation,
//! EMA[0] = C[0], then EMA[i] = C[i]*k + EMA[i-1]*(1-k).
//! Warmup: first (n-1) bars are invalid even though the recursion runs.

use crate::domain::candle::Candle;
use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};

pub fn calculate_ema(candles: &[Candle], period: usize) -> IndicatorSeries {
    if period == 0 || candles.is_empty() {
        return IndicatorSeries::empty(IndicatorType::Ema(period));
    }

    let closes: Vec<Option<f64>> = candles.iter().map(|c| Some(c.close)).collect();
    let ema = smooth(&closes, period);

    let values = candles
        .iter()
        .zip(ema)
        .map(|(candle, value)| IndicatorPoint {
            timestamp: candle.timestamp,
            valid: value.is_some(),
            value: IndicatorValue::Simple(value.unwrap_or(0.0)),
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Ema(period),
        values,
    }
}

/// Exponential smoothing over a series that may start with gaps.
///
/// Leading `None`s are skipped; the first present value seeds the recursion
/// and a result is reported once `period` observations have been seen.
pub(crate) fn smooth(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    let k = 2.0 / (period as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len());
    let mut ema: Option<f64> = None;
    let mut seen = 0usize;

    for value in values {
        match (*value, ema) {
            (Some(x), None) => {
                ema = Some(x);
                seen = 1;
            }
            (Some(x), Some(prev)) => {
                ema = Some(x * k + prev * (1.0 - k));
                seen += 1;
            }
            (None, _) => {}
        }
        out.push(if seen >= period { ema } else { None });
    }

    out
}
