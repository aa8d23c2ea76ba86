//! ADX (Average Directional Index) indicator, Wilder smoothing.
//!
//! 1. +DM, -DM and true range from consecutive bars (from bar 1)
//! 2. Wilder-smoothed sums of +DM, -DM, TR, seeded by the first n values
//! 3. +DI = 100 * sDM+ / sTR, -DI = 100 * sDM- / sTR
//! 4. DX = 100 * |+DI - -DI| / (+DI + -DI)
//! 5. ADX = mean of the first n DX values, then Wilder-smoothed
//!
//! Warmup: first (2n - 1) bars are invalid.

use crate::domain::candle::Candle;
use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};

pub const DEFAULT_PERIOD: usize = 14;

pub fn calculate_adx(candles: &[Candle], period: usize) -> IndicatorSeries {
    if period == 0 || candles.is_empty() {
        return IndicatorSeries::empty(IndicatorType::Adx(period));
    }

    let n = period as f64;
    let mut values = Vec::with_capacity(candles.len());
    let mut s_plus = 0.0;
    let mut s_minus = 0.0;
    let mut s_tr = 0.0;
    let mut dx_sum = 0.0;
    let mut dx_count = 0usize;
    let mut adx = 0.0;

    for (i, candle) in candles.iter().enumerate() {
        if i == 0 {
            values.push(warming(candle));
            continue;
        }

        let (plus_dm, minus_dm, tr) = directional_movement(&candles[i - 1], candle);
        if i <= period {
            s_plus += plus_dm;
            s_minus += minus_dm;
            s_tr += tr;
            if i < period {
                values.push(warming(candle));
                continue;
            }
        } else {
            s_plus = s_plus - s_plus / n + plus_dm;
            s_minus = s_minus - s_minus / n + minus_dm;
            s_tr = s_tr - s_tr / n + tr;
        }

        let (plus_di, minus_di, dx) = di_dx(s_plus, s_minus, s_tr);

        if dx_count < period {
            dx_sum += dx;
            dx_count += 1;
            if dx_count < period {
                values.push(warming(candle));
                continue;
            }
            adx = dx_sum / n;
        } else {
            adx = (adx * (n - 1.0) + dx) / n;
        }

        values.push(IndicatorPoint {
            timestamp: candle.timestamp,
            valid: true,
            value: IndicatorValue::Adx {
                adx,
                plus_di,
                minus_di,
            },
        });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Adx(period),
        values,
    }
}

fn warming(candle: &Candle) -> IndicatorPoint {
    IndicatorPoint {
        timestamp: candle.timestamp,
        valid: false,
        value: IndicatorValue::Adx {
            adx: 0.0,
            plus_di: 0.0,
            minus_di: 0.0,
        },
    }
}

fn directional_movement(prev: &Candle, cur: &Candle) -> (f64, f64, f64) {
    let up_move = cur.high - prev.high;
    let down_move = prev.low - cur.low;

    let plus_dm = if up_move > down_move && up_move > 0.0 {
        up_move
    } else {
        0.0
    };
    let minus_dm = if down_move > up_move && down_move > 0.0 {
        down_move
    } else {
        0.0
    };

    (plus_dm, minus_dm, cur.true_range(prev.close))
}

fn di_dx(s_plus: f64, s_minus: f64, s_tr: f64) -> (f64, f64, f64) {
    if s_tr <= 0.0 {
        return (0.0, 0.0, 0.0);
    }
    let plus_di = s_plus / s_tr * 100.0;
    let minus_di = s_minus / s_tr * 100.0;
    let di_sum = plus_di + minus_di;
    let dx = if di_sum > 0.0 {
        (plus_di - minus_di).abs() / di_sum * 100.0
    } else {
        0.0
    };
    (plus_di, minus_di, dx)
}
