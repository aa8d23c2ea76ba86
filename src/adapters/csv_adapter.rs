//! CSV directory market data adapter.
//!
//! One file per symbol, `<SYMBOL>.csv`, with the header
//! `open_time,open,high,low,close,volume,quote_volume,trade_count,taker_buy_base,taker_buy_quote`.
//! `open_time` is epoch milliseconds. The interval argument is not used:
//! each file holds a single series.

use crate::domain::candle::Kline;
use crate::domain::error::TraderError;
use crate::ports::market_data_port::MarketDataPort;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }
}

fn column<T>(record: &csv::StringRecord, index: usize, name: &str) -> Result<T, TraderError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    record
        .get(index)
        .ok_or_else(|| TraderError::Transport {
            reason: format!("missing {} column", name),
        })?
        .trim()
        .parse()
        .map_err(|e: T::Err| TraderError::Transport {
            reason: format!("invalid {} value: {}", name, e),
        })
}

impl MarketDataPort for CsvAdapter {
    fn list_symbols(&self) -> Result<Vec<String>, TraderError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| TraderError::Transport {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| TraderError::Transport {
                reason: format!("directory entry error: {}", e),
            })?;

            let name = entry.file_name();
            let name_str = name.to_string_lossy();
            if let Some(symbol) = name_str.strip_suffix(".csv") {
                symbols.push(symbol.to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }

    fn fetch_klines(&self, symbol: &str, _interval: &str) -> Result<Vec<Kline>, TraderError> {
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path).map_err(|e| TraderError::Transport {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut klines = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| TraderError::Transport {
                reason: format!("CSV parse error: {}", e),
            })?;

            klines.push(Kline {
                open_time: column(&record, 0, "open_time")?,
                open: column(&record, 1, "open")?,
                high: column(&record, 2, "high")?,
                low: column(&record, 3, "low")?,
                close: column(&record, 4, "close")?,
                volume: column(&record, 5, "volume")?,
                quote_volume: column(&record, 6, "quote_volume")?,
                trade_count: column(&record, 7, "trade_count")?,
                taker_buy_base: column(&record, 8, "taker_buy_base")?,
                taker_buy_quote: column(&record, 9, "taker_buy_quote")?,
            });
        }

        klines.sort_by_key(|k| k.open_time);
        Ok(klines)
    }
}
