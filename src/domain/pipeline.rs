//! Indicator pipeline: derives the persisted indicator columns for one
//! symbol's candle history.
//!
//! A row is kept only when every indicator is past its warm-up window, so
//! the returned rows always carry a complete [`IndicatorSet`].

use chrono::NaiveDateTime;

use crate::domain::candle::{Candle, IndicatorSet};
use crate::domain::indicator::{
    adx, bollinger, calculate_adx, calculate_bollinger, calculate_ema, calculate_macd,
    calculate_obv, calculate_rsi, calculate_sma, macd,
};

pub const EMA_SHORT_PERIOD: usize = 12;
pub const EMA_LONG_PERIOD: usize = 26;
pub const RSI_PERIOD: usize = 14;
pub const SMA_SHORT_PERIOD: usize = 50;
pub const SMA_LONG_PERIOD: usize = 200;

/// Indicator values computed for the candle at `timestamp`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnrichedRow {
    pub timestamp: NaiveDateTime,
    pub indicators: IndicatorSet,
}

/// Compute all indicators over an ascending, de-duplicated history.
///
/// Rows still inside any indicator's warm-up are dropped. Empty input yields
/// an empty result.
pub fn enrich(candles: &[Candle]) -> Vec<EnrichedRow> {
    if candles.is_empty() {
        return Vec::new();
    }

    let ema_short = calculate_ema(candles, EMA_SHORT_PERIOD);
    let ema_long = calculate_ema(candles, EMA_LONG_PERIOD);
    let rsi = calculate_rsi(candles, RSI_PERIOD);
    let macd_series = calculate_macd(
        candles,
        macd::DEFAULT_FAST,
        macd::DEFAULT_SLOW,
        macd::DEFAULT_SIGNAL,
    );
    let bands = calculate_bollinger(
        candles,
        bollinger::DEFAULT_PERIOD,
        bollinger::DEFAULT_MULT_X100,
    );
    let sma_50 = calculate_sma(candles, SMA_SHORT_PERIOD);
    let sma_200 = calculate_sma(candles, SMA_LONG_PERIOD);
    let obv = calculate_obv(candles);
    let adx_series = calculate_adx(candles, adx::DEFAULT_PERIOD);

    candles
        .iter()
        .enumerate()
        .filter_map(|(i, candle)| {
            let (bb_high, bb_low) = bands.bands_at(i)?;
            let indicators = IndicatorSet {
                ema_short: ema_short.value_at(i)?,
                ema_long: ema_long.value_at(i)?,
                rsi: rsi.value_at(i)?,
                macd: macd_series.value_at(i)?,
                bb_high,
                bb_low,
                sma_50: sma_50.value_at(i)?,
                sma_200: sma_200.value_at(i)?,
                obv: obv.value_at(i)?,
                adx: adx_series.value_at(i)?,
            };
            Some(EnrichedRow {
                timestamp: candle.timestamp,
                indicators,
            })
        })
        .collect()
}

/// Index of the first row the pipeline can retain for a fresh series.
pub fn warmup_rows() -> usize {
    [
        EMA_LONG_PERIOD - 1,
        RSI_PERIOD,
        macd::DEFAULT_SLOW - 1 + macd::DEFAULT_SIGNAL - 1,
        bollinger::DEFAULT_PERIOD - 1,
        SMA_LONG_PERIOD - 1,
        2 * adx::DEFAULT_PERIOD - 1,
    ]
    .into_iter()
    .max()
    .unwrap_or(0)
}
