//! Technical indicator implementations.
//!
//! Every indicator is a pure function of a candle slice returning an
//! [`IndicatorSeries`] with one point per input candle:
//! - `IndicatorPoint`: a single point in an indicator time series
//! - `IndicatorValue`: enum for the different indicator output shapes
//! - `IndicatorType`: indicator identity + parameters
//! - `IndicatorSeries`: a time series of indicator values
//!
//! Points inside an indicator's warm-up window carry `valid: false`.

pub mod adx;
pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod obv;
pub mod rsi;
pub mod sma;
pub mod stochastic;

pub use adx::calculate_adx;
pub use bollinger::calculate_bollinger;
pub use ema::calculate_ema;
pub use macd::calculate_macd;
pub use obv::calculate_obv;
pub use rsi::calculate_rsi;
pub use sma::calculate_sma;
pub use stochastic::calculate_stochastic;

use chrono::NaiveDateTime;
use std::fmt;

#[derive(Debug, Clone)]
pub struct IndicatorPoint {
    pub timestamp: NaiveDateTime,
    pub valid: bool,
    pub value: IndicatorValue,
}

#[derive(Debug, Clone)]
pub enum IndicatorValue {
    Simple(f64),
    Macd {
        line: f64,
        signal: f64,
        histogram: f64,
    },
    Bollinger {
        upper: f64,
        middle: f64,
        lower: f64,
    },
    Adx {
        adx: f64,
        plus_di: f64,
        minus_di: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
    Ema(usize),
    Rsi(usize),
    Adx(usize),
    Stochastic(usize),
    Obv,
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    Bollinger {
        period: usize,
        stddev_mult_x100: u32,
    },
}

#[derive(Debug, Clone)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    pub fn empty(indicator_type: IndicatorType) -> Self {
        Self {
            indicator_type,
            values: Vec::new(),
        }
    }

    /// The headline value at `index`, or `None` while warming up.
    ///
    /// MACD reports its histogram, Bollinger its middle band and ADX the
    /// ADX line itself.
    pub fn value_at(&self, index: usize) -> Option<f64> {
        let point = self.values.get(index)?;
        if !point.valid {
            return None;
        }
        Some(match point.value {
            IndicatorValue::Simple(v) => v,
            IndicatorValue::Macd { histogram, .. } => histogram,
            IndicatorValue::Bollinger { middle, .. } => middle,
            IndicatorValue::Adx { adx, .. } => adx,
        })
    }

    /// Upper and lower band at `index` for a Bollinger series.
    pub fn bands_at(&self, index: usize) -> Option<(f64, f64)> {
        match self.values.get(index) {
            Some(IndicatorPoint {
                valid: true,
                value: IndicatorValue::Bollinger { upper, lower, .. },
                ..
            }) => Some((*upper, *lower)),
            _ => None,
        }
    }

    pub fn first_valid_index(&self) -> Option<usize> {
        self.values.iter().position(|p| p.valid)
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Ema(period) => write!(f, "EMA({})", period),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::Adx(period) => write!(f, "ADX({})", period),
            IndicatorType::Stochastic(period) => write!(f, "STOCHASTIC({})", period),
            IndicatorType::Obv => write!(f, "OBV"),
            IndicatorType::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
            IndicatorType::Bollinger {
                period,
                stddev_mult_x100,
            } => {
                let mult = *stddev_mult_x100 as f64 / 100.0;
                write!(f, "BOLLINGER({},{})", period, mult)
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use test_support::hour;

    #[test]
    fn indicator_type_display() {
        assert_eq!(IndicatorType::Sma(200).to_string(), "SMA(200)");
        assert_eq!(IndicatorType::Adx(14).to_string(), "ADX(14)");
        assert_eq!(
            IndicatorType::Macd {
                fast: 12,
                slow: 26,
                signal: 9
            }
            .to_string(),
            "MACD(12,26,9)"
        );
        assert_eq!(
            IndicatorType::Bollinger {
                period: 20,
                stddev_mult_x100: 200
            }
            .to_string(),
            "BOLLINGER(20,2)"
        );
    }

    #[test]
    fn value_at_hides_warmup_points() {
        let series = IndicatorSeries {
            indicator_type: IndicatorType::Sma(2),
            values: vec![
                IndicatorPoint {
                    timestamp: hour(0),
                    valid: false,
                    value: IndicatorValue::Simple(0.0),
                },
                IndicatorPoint {
                    timestamp: hour(1),
                    valid: true,
                    value: IndicatorValue::Simple(15.0),
                },
            ],
        };

        assert_eq!(series.value_at(0), None);
        assert_eq!(series.value_at(1), Some(15.0));
        assert_eq!(series.value_at(2), None);
        assert_eq!(series.first_valid_index(), Some(1));
    }

    #[test]
    fn macd_headline_is_histogram() {
        let series = IndicatorSeries {
            indicator_type: IndicatorType::Macd {
                fast: 12,
                slow: 26,
                signal: 9,
            },
            values: vec![IndicatorPoint {
                timestamp: hour(0),
                valid: true,
                value: IndicatorValue::Macd {
                    line: 3.0,
                    signal: 1.0,
                    histogram: 2.0,
                },
            }],
        };
        assert_eq!(series.value_at(0), Some(2.0));
        assert_eq!(series.bands_at(0), None);
    }
}
