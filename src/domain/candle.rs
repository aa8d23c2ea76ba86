//! Candle representation: raw klines, stored candles and indicator fields.

use chrono::{DateTime, NaiveDateTime};
use std::fmt;

use crate::domain::error::TraderError;

/// Raw OHLCV record as delivered by a market data source.
#[derive(Debug, Clone, PartialEq)]
pub struct Kline {
    /// Interval open time in epoch milliseconds.
    pub open_time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub quote_volume: f64,
    pub trade_count: i64,
    pub taker_buy_base: f64,
    pub taker_buy_quote: f64,
}

impl Kline {
    /// Validate and convert to a raw [`Candle`].
    ///
    /// Rejects open times outside chrono's range and any OHLC price that is
    /// not a positive finite number.
    pub fn into_candle(self, symbol: &str) -> Result<Candle, TraderError> {
        for (name, price) in [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
        ] {
            if !price.is_finite() || price <= 0.0 {
                return Err(TraderError::InvalidKline {
                    symbol: symbol.to_string(),
                    reason: format!("{} price {} is not a positive finite number", name, price),
                });
            }
        }

        let timestamp = DateTime::from_timestamp_millis(self.open_time)
            .map(|dt| dt.naive_utc())
            .ok_or_else(|| TraderError::InvalidKline {
                symbol: symbol.to_string(),
                reason: format!("open_time {} out of range", self.open_time),
            })?;

        Ok(Candle {
            symbol: symbol.to_string(),
            timestamp,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume: self.volume,
            quote_volume: self.quote_volume,
            trade_count: self.trade_count,
            taker_buy_base: self.taker_buy_base,
            taker_buy_quote: self.taker_buy_quote,
            ..Candle::default()
        })
    }
}

/// One stored candle, keyed by (symbol, timestamp).
///
/// Raw fields never change once written. Indicator fields stay `None` until
/// the pipeline fills them, which it does for all ten at once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Candle {
    pub symbol: String,
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub quote_volume: f64,
    pub trade_count: i64,
    pub taker_buy_base: f64,
    pub taker_buy_quote: f64,
    pub ema_short: Option<f64>,
    pub ema_long: Option<f64>,
    pub rsi: Option<f64>,
    pub macd: Option<f64>,
    pub bb_high: Option<f64>,
    pub bb_low: Option<f64>,
    pub sma_50: Option<f64>,
    pub sma_200: Option<f64>,
    pub obv: Option<f64>,
    pub adx: Option<f64>,
}

impl Candle {
    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }

    pub fn indicator(&self, field: IndicatorField) -> Option<f64> {
        match field {
            IndicatorField::EmaShort => self.ema_short,
            IndicatorField::EmaLong => self.ema_long,
            IndicatorField::Rsi => self.rsi,
            IndicatorField::Macd => self.macd,
            IndicatorField::BbHigh => self.bb_high,
            IndicatorField::BbLow => self.bb_low,
            IndicatorField::Sma50 => self.sma_50,
            IndicatorField::Sma200 => self.sma_200,
            IndicatorField::Obv => self.obv,
            IndicatorField::Adx => self.adx,
        }
    }

    pub fn apply(&mut self, set: &IndicatorSet) {
        self.ema_short = Some(set.ema_short);
        self.ema_long = Some(set.ema_long);
        self.rsi = Some(set.rsi);
        self.macd = Some(set.macd);
        self.bb_high = Some(set.bb_high);
        self.bb_low = Some(set.bb_low);
        self.sma_50 = Some(set.sma_50);
        self.sma_200 = Some(set.sma_200);
        self.obv = Some(set.obv);
        self.adx = Some(set.adx);
    }

    pub fn is_enriched(&self) -> bool {
        IndicatorField::ALL
            .iter()
            .all(|&field| self.indicator(field).is_some())
    }
}

/// Indicator columns persisted on a candle row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorField {
    EmaShort,
    EmaLong,
    Rsi,
    Macd,
    BbHigh,
    BbLow,
    Sma50,
    Sma200,
    Obv,
    Adx,
}

impl IndicatorField {
    pub const ALL: [IndicatorField; 10] = [
        IndicatorField::EmaShort,
        IndicatorField::EmaLong,
        IndicatorField::Rsi,
        IndicatorField::Macd,
        IndicatorField::BbHigh,
        IndicatorField::BbLow,
        IndicatorField::Sma50,
        IndicatorField::Sma200,
        IndicatorField::Obv,
        IndicatorField::Adx,
    ];

    pub fn column(self) -> &'static str {
        match self {
            IndicatorField::EmaShort => "ema_short",
            IndicatorField::EmaLong => "ema_long",
            IndicatorField::Rsi => "rsi",
            IndicatorField::Macd => "macd",
            IndicatorField::BbHigh => "bb_high",
            IndicatorField::BbLow => "bb_low",
            IndicatorField::Sma50 => "sma_50",
            IndicatorField::Sma200 => "sma_200",
            IndicatorField::Obv => "obv",
            IndicatorField::Adx => "adx",
        }
    }
}

impl fmt::Display for IndicatorField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// Fully defined indicator values for one row, as produced by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorSet {
    pub ema_short: f64,
    pub ema_long: f64,
    pub rsi: f64,
    pub macd: f64,
    pub bb_high: f64,
    pub bb_low: f64,
    pub sma_50: f64,
    pub sma_200: f64,
    pub obv: f64,
    pub adx: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_candle() -> Candle {
        Candle {
            symbol: "BTCUSDT".into(),
            timestamp: NaiveDate::from_ymd_opt(2024, 1, 15)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap(),
            open: 100.0,
            high: 110.0,
            low: 90.0,
            close: 105.0,
            volume: 50_000.0,
            ..Candle::default()
        }
    }

    fn kline(close: f64) -> Kline {
        Kline {
            open_time: 1_704_067_200_000,
            open: 100.0,
            high: 110.0,
            low: 90.0,
            close,
            volume: 5.0,
            quote_volume: 500.0,
            trade_count: 3,
            taker_buy_base: 2.0,
            taker_buy_quote: 200.0,
        }
    }

    #[test]
    fn into_candle_rejects_unusable_prices() {
        for close in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let err = kline(close).into_candle("BTCUSDT").unwrap_err();
            assert!(
                matches!(&err, TraderError::InvalidKline { reason, .. } if reason.starts_with("close")),
                "close {} gave {:?}",
                close,
                err
            );
        }

        let mut bad_low = kline(105.0);
        bad_low.low = 0.0;
        assert!(bad_low.into_candle("BTCUSDT").is_err());
    }

    fn sample_set() -> IndicatorSet {
        IndicatorSet {
            ema_short: 1.0,
            ema_long: 2.0,
            rsi: 3.0,
            macd: 4.0,
            bb_high: 5.0,
            bb_low: 6.0,
            sma_50: 7.0,
            sma_200: 8.0,
            obv: 9.0,
            adx: 10.0,
        }
    }

    #[test]
    fn kline_into_candle_converts_open_time() {
        let kline = Kline {
            open_time: 1_704_067_200_000,
            open: 42_000.0,
            high: 42_500.0,
            low: 41_800.0,
            close: 42_300.0,
            volume: 12.5,
            quote_volume: 528_000.0,
            trade_count: 900,
            taker_buy_base: 6.0,
            taker_buy_quote: 253_000.0,
        };
        let candle = kline.into_candle("BTCUSDT").unwrap();

        assert_eq!(candle.symbol, "BTCUSDT");
        assert_eq!(
            candle.timestamp,
            NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        );
        assert_eq!(candle.trade_count, 900);
        assert!(!candle.is_enriched());
    }

    #[test]
    fn kline_out_of_range_is_rejected() {
        let kline = Kline {
            open_time: i64::MAX,
            open: 1.0,
            high: 1.0,
            low: 1.0,
            close: 1.0,
            volume: 1.0,
            quote_volume: 1.0,
            trade_count: 1,
            taker_buy_base: 1.0,
            taker_buy_quote: 1.0,
        };
        match kline.into_candle("BTCUSDT") {
            Err(TraderError::InvalidKline { symbol, .. }) => assert_eq!(symbol, "BTCUSDT"),
            other => panic!("expected InvalidKline, got {other:?}"),
        }
    }

    #[test]
    fn true_range_gap_up() {
        let candle = sample_candle();
        // high-low=20, |110-70|=40, |90-70|=20 → 40
        assert!((candle.true_range(70.0) - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn true_range_gap_down() {
        let candle = sample_candle();
        // high-low=20, |110-130|=20, |90-130|=40 → 40
        assert!((candle.true_range(130.0) - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn apply_sets_every_field() {
        let mut candle = sample_candle();
        candle.apply(&sample_set());

        assert!(candle.is_enriched());
        assert_eq!(candle.indicator(IndicatorField::EmaShort), Some(1.0));
        assert_eq!(candle.indicator(IndicatorField::Macd), Some(4.0));
        assert_eq!(candle.indicator(IndicatorField::Adx), Some(10.0));
    }

    #[test]
    fn partially_filled_row_is_not_enriched() {
        let mut candle = sample_candle();
        candle.rsi = Some(25.0);
        assert!(!candle.is_enriched());
        assert_eq!(candle.indicator(IndicatorField::Rsi), Some(25.0));
        assert_eq!(candle.indicator(IndicatorField::Obv), None);
    }

    #[test]
    fn field_display_matches_column() {
        assert_eq!(IndicatorField::Sma200.to_string(), "sma_200");
        assert_eq!(IndicatorField::BbLow.column(), "bb_low");
    }
}
