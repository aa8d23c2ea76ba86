//! MACD (Moving Average Convergence Divergence) indicator.
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) of MACD Line, seeded at the first defined line value
//! Histogram = MACD Line - Signal Line
//!
//! Default parameters: fast=12, slow=26, signal=9
//! Warmup: (slow - 1) + (signal - 1) bars.

use crate::domain::candle::Candle;
use crate::domain::indicator::ema::smooth;
use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

pub fn calculate_macd(
    candles: &[Candle],
    fast: usize,
    slow: usize,
    signal_period: usize,
) -> IndicatorSeries {
    let indicator_type = IndicatorType::Macd {
        fast,
        slow,
        signal: signal_period,
    };
    if candles.is_empty() || fast == 0 || slow == 0 || signal_period == 0 {
        return IndicatorSeries::empty(indicator_type);
    }

    let closes: Vec<Option<f64>> = candles.iter().map(|c| Some(c.close)).collect();
    let ema_fast = smooth(&closes, fast);
    let ema_slow = smooth(&closes, slow);

    let line: Vec<Option<f64>> = ema_fast
        .iter()
        .zip(&ema_slow)
        .map(|(f, s)| Some((*f)? - (*s)?))
        .collect();
    let signal = smooth(&line, signal_period);

    let values = candles
        .iter()
        .enumerate()
        .map(|(i, candle)| match (line[i], signal[i]) {
            (Some(l), Some(s)) => IndicatorPoint {
                timestamp: candle.timestamp,
                valid: true,
                value: IndicatorValue::Macd {
                    line: l,
                    signal: s,
                    histogram: l - s,
                },
            },
            (l, _) => IndicatorPoint {
                timestamp: candle.timestamp,
                valid: false,
                value: IndicatorValue::Macd {
                    line: l.unwrap_or(0.0),
                    signal: 0.0,
                    histogram: 0.0,
                },
            },
        })
        .collect();

    IndicatorSeries {
        indicator_type,
        values,
    }
}

pub fn calculate_macd_default(candles: &[Candle]) -> IndicatorSeries {
    calculate_macd(candles, DEFAULT_FAST, DEFAULT_SLOW, DEFAULT_SIGNAL)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::calculate_ema;
    use crate::domain::indicator::test_support::candles_from_closes;

    fn rising(n: usize) -> Vec<Candle> {
        let closes: Vec<f64> = (0..n).map(|i| 100.0 + i as f64).collect();
        candles_from_closes(&closes)
    }

    #[test]
    fn macd_warmup_default() {
        let series = calculate_macd_default(&rising(40));

        let warmup = DEFAULT_SLOW - 1 + DEFAULT_SIGNAL - 1;
        for i in 0..warmup {
            assert!(!series.values[i].valid, "Index {} should not be valid", i);
        }
        assert!(series.values[warmup].valid, "Index {} should be valid", warmup);
    }

    #[test]
    fn macd_histogram_equals_line_minus_signal() {
        let series = calculate_macd_default(&rising(40));

        for point in series.values.iter().filter(|p| p.valid) {
            if let IndicatorValue::Macd {
                line,
                signal,
                histogram,
            } = point.value
            {
                assert!((histogram - (line - signal)).abs() < f64::EPSILON);
            }
        }
    }

    #[test]
    fn macd_line_is_ema_fast_minus_ema_slow() {
        let candles = rising(12);
        let series = calculate_macd(&candles, 3, 5, 2);
        let fast = calculate_ema(&candles, 3);
        let slow = calculate_ema(&candles, 5);

        for i in 4..12 {
            if let IndicatorValue::Macd { line, .. } = series.values[i].value {
                let expected = fast.value_at(i).unwrap() - slow.value_at(i).unwrap();
                assert!((line - expected).abs() < 1e-12, "MACD line mismatch at {}", i);
            }
        }
    }

    #[test]
    fn macd_signal_seeded_at_first_line_value() {
        let candles = rising(12);
        let series = calculate_macd(&candles, 3, 5, 2);

        // line defined from index 4, signal needs two line observations
        assert!(!series.values[4].valid);
        assert!(series.values[5].valid);
    }

    #[test]
    fn macd_empty_and_zero_period() {
        assert!(calculate_macd_default(&[]).values.is_empty());

        let candles = rising(3);
        assert!(calculate_macd(&candles, 0, 26, 9).values.is_empty());
        assert!(calculate_macd(&candles, 12, 0, 9).values.is_empty());
        assert!(calculate_macd(&candles, 12, 26, 0).values.is_empty());
    }

    #[test]
    fn macd_indicator_type() {
        let series = calculate_macd(&rising(3), 5, 10, 3);
        assert_eq!(
            series.indicator_type,
            IndicatorType::Macd {
                fast: 5,
                slow: 10,
                signal: 3
            }
        );
    }
}
