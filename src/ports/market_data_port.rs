//! Market data source port trait.

use crate::domain::candle::Kline;
use crate::domain::error::TraderError;

pub trait MarketDataPort {
    /// Ticker identifiers currently tradeable on the source.
    fn list_symbols(&self) -> Result<Vec<String>, TraderError>;

    /// Raw klines for `symbol` at `interval` (for example `1h`), ascending by
    /// open time.
    fn fetch_klines(&self, symbol: &str, interval: &str) -> Result<Vec<Kline>, TraderError>;
}
