//! OBV (On-Balance Volume) indicator implementation.

use crate::domain::candle::Candle;
use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};

/// Calculate OBV (On-Balance Volume) indicator.
///
/// OBV[0] = volume[0]
/// If close[i] > close[i-1]: OBV[i] = OBV[i-1] + volume[i]
/// Otherwise (down or unchanged): OBV[i] = OBV[i-1] - volume[i]
///
/// No warmup period; all bars are valid.
pub fn calculate_obv(candles: &[Candle]) -> IndicatorSeries {
    let mut values = Vec::with_capacity(candles.len());
    let mut obv: f64 = 0.0;

    for (i, candle) in candles.iter().enumerate() {
        if i == 0 || candle.close > candles[i - 1].close {
            obv += candle.volume;
        } else {
            obv -= candle.volume;
        }

        values.push(IndicatorPoint {
            timestamp: candle.timestamp,
            valid: true,
            value: IndicatorValue::Simple(obv),
        });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Obv,
        values,
    }
}
