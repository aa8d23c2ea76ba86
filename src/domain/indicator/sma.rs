//! Simple Moving Average indicator.
//!
//! Trailing mean of the last n closes, maintained with a running sum.
//! Warmup: first (n-1) bars are invalid.

use crate::domain::candle::Candle;
use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};

pub fn calculate_sma(candles: &[Candle], period: usize) -> IndicatorSeries {
    if period == 0 || candles.is_empty() {
        return IndicatorSeries::empty(IndicatorType::Sma(period));
    }

    let mut values = Vec::with_capacity(candles.len());
    let mut window_sum = 0.0;

    for (i, candle) in candles.iter().enumerate() {
        window_sum += candle.close;
        if i >= period {
            window_sum -= candles[i - period].close;
        }

        let valid = i + 1 >= period;
        values.push(IndicatorPoint {
            timestamp: candle.timestamp,
            valid,
            value: IndicatorValue::Simple(if valid {
                window_sum / period as f64
            } else {
                0.0
            }),
        });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Sma(period),
        values,
    }
}
