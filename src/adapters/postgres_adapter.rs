//! PostgreSQL data store adapter.

use crate::domain::candle::Candle;
use crate::domain::error::TraderError;
use crate::domain::ledger::LedgerBatch;
use crate::domain::pipeline::EnrichedRow;
use crate::domain::position::{Position, Side, StrategyResult, Trade};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_store_port::DataStorePort;
use postgres::{Client, NoTls, Row};
use std::cell::RefCell;
use tracing::debug;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS candles (
        symbol TEXT NOT NULL,
        timestamp TIMESTAMP NOT NULL,
        open DOUBLE PRECISION NOT NULL,
        high DOUBLE PRECISION NOT NULL,
        low DOUBLE PRECISION NOT NULL,
        close DOUBLE PRECISION NOT NULL,
        volume DOUBLE PRECISION NOT NULL,
        quote_volume DOUBLE PRECISION NOT NULL,
        trade_count BIGINT NOT NULL,
        taker_buy_base DOUBLE PRECISION NOT NULL,
        taker_buy_quote DOUBLE PRECISION NOT NULL,
        ema_short DOUBLE PRECISION,
        ema_long DOUBLE PRECISION,
        rsi DOUBLE PRECISION,
        macd DOUBLE PRECISION,
        bb_high DOUBLE PRECISION,
        bb_low DOUBLE PRECISION,
        sma_50 DOUBLE PRECISION,
        sma_200 DOUBLE PRECISION,
        obv DOUBLE PRECISION,
        adx DOUBLE PRECISION,
        PRIMARY KEY (symbol, timestamp)
    );
    CREATE TABLE IF NOT EXISTS positions (
        id BIGSERIAL PRIMARY KEY,
        symbol TEXT NOT NULL,
        entry_timestamp TIMESTAMP NOT NULL,
        entry_price DOUBLE PRECISION NOT NULL,
        quantity DOUBLE PRECISION NOT NULL,
        side TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS trades (
        id BIGSERIAL PRIMARY KEY,
        symbol TEXT NOT NULL,
        entry_timestamp TIMESTAMP NOT NULL,
        exit_timestamp TIMESTAMP NOT NULL,
        entry_price DOUBLE PRECISION NOT NULL,
        exit_price DOUBLE PRECISION NOT NULL,
        quantity DOUBLE PRECISION NOT NULL,
        profit_loss DOUBLE PRECISION NOT NULL,
        profit_percent DOUBLE PRECISION NOT NULL
    );
    CREATE TABLE IF NOT EXISTS strategy_results (
        id BIGSERIAL PRIMARY KEY,
        strategy TEXT NOT NULL,
        symbol TEXT NOT NULL,
        entry_timestamp TIMESTAMP NOT NULL,
        exit_timestamp TIMESTAMP NOT NULL,
        entry_price DOUBLE PRECISION NOT NULL,
        exit_price DOUBLE PRECISION NOT NULL,
        quantity DOUBLE PRECISION NOT NULL,
        profit_loss DOUBLE PRECISION NOT NULL,
        profit_percent DOUBLE PRECISION NOT NULL
    );";

const TRADE_COLUMNS: &str = "symbol, entry_timestamp, exit_timestamp, entry_price, exit_price, \
                             quantity, profit_loss, profit_percent";

pub struct PostgresAdapter {
    client: RefCell<Client>,
}

fn query_err(e: postgres::Error) -> TraderError {
    TraderError::DatabaseQuery {
        reason: e.to_string(),
    }
}

fn trade_from_row(row: &Row, offset: usize) -> Trade {
    Trade {
        symbol: row.get(offset),
        entry_timestamp: row.get(offset + 1),
        exit_timestamp: row.get(offset + 2),
        entry_price: row.get(offset + 3),
        exit_price: row.get(offset + 4),
        quantity: row.get(offset + 5),
        profit_loss: row.get(offset + 6),
        profit_percent: row.get(offset + 7),
    }
}

impl PostgresAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, TraderError> {
        let connection_string = config
            .get_string("postgres", "connection_string")
            .ok_or_else(|| TraderError::ConfigMissing {
                section: "postgres".into(),
                key: "connection_string".into(),
            })?;

        let mut client =
            Client::connect(&connection_string, NoTls).map_err(|e| TraderError::Database {
                reason: e.to_string(),
            })?;
        client.batch_execute(SCHEMA).map_err(query_err)?;

        Ok(Self {
            client: RefCell::new(client),
        })
    }
}

impl DataStorePort for PostgresAdapter {
    fn insert_candles(&self, candles: &[Candle]) -> Result<usize, TraderError> {
        let mut client = self.client.borrow_mut();
        let mut tx = client.transaction().map_err(query_err)?;
        let stmt = tx
            .prepare(
                "INSERT INTO candles (symbol, timestamp, open, high, low, close, volume,
                    quote_volume, trade_count, taker_buy_base, taker_buy_quote)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
                 ON CONFLICT (symbol, timestamp) DO NOTHING",
            )
            .map_err(query_err)?;

        let mut inserted = 0;
        for c in candles {
            inserted += tx
                .execute(
                    &stmt,
                    &[
                        &c.symbol,
                        &c.timestamp,
                        &c.open,
                        &c.high,
                        &c.low,
                        &c.close,
                        &c.volume,
                        &c.quote_volume,
                        &c.trade_count,
                        &c.taker_buy_base,
                        &c.taker_buy_quote,
                    ],
                )
                .map_err(query_err)? as usize;
        }

        tx.commit().map_err(query_err)?;
        debug!(received = candles.len(), inserted, "candles stored");
        Ok(inserted)
    }

    fn fetch_candles(&self, symbol: &str) -> Result<Vec<Candle>, TraderError> {
        let rows = self
            .client
            .borrow_mut()
            .query(
                "SELECT symbol, timestamp, open, high, low, close, volume, quote_volume,
                        trade_count, taker_buy_base, taker_buy_quote, ema_short, ema_long,
                        rsi, macd, bb_high, bb_low, sma_50, sma_200, obv, adx
                 FROM candles WHERE symbol = $1 ORDER BY timestamp ASC",
                &[&symbol],
            )
            .map_err(query_err)?;

        Ok(rows
            .iter()
            .map(|row| Candle {
                symbol: row.get(0),
                timestamp: row.get(1),
                open: row.get(2),
                high: row.get(3),
                low: row.get(4),
                close: row.get(5),
                volume: row.get(6),
                quote_volume: row.get(7),
                trade_count: row.get(8),
                taker_buy_base: row.get(9),
                taker_buy_quote: row.get(10),
                ema_short: row.get(11),
                ema_long: row.get(12),
                rsi: row.get(13),
                macd: row.get(14),
                bb_high: row.get(15),
                bb_low: row.get(16),
                sma_50: row.get(17),
                sma_200: row.get(18),
                obv: row.get(19),
                adx: row.get(20),
            })
            .collect())
    }

    fn update_indicators(&self, symbol: &str, rows: &[EnrichedRow]) -> Result<usize, TraderError> {
        let mut client = self.client.borrow_mut();
        let mut tx = client.transaction().map_err(query_err)?;
        let stmt = tx
            .prepare(
                "UPDATE candles SET ema_short = $3, ema_long = $4, rsi = $5, macd = $6,
                    bb_high = $7, bb_low = $8, sma_50 = $9, sma_200 = $10, obv = $11, adx = $12
                 WHERE symbol = $1 AND timestamp = $2
                   AND ema_short IS NULL AND ema_long IS NULL AND rsi IS NULL
                   AND macd IS NULL AND bb_high IS NULL AND bb_low IS NULL
                   AND sma_50 IS NULL AND sma_200 IS NULL AND obv IS NULL AND adx IS NULL",
            )
            .map_err(query_err)?;

        let mut updated = 0;
        for row in rows {
            let set = &row.indicators;
            updated += tx
                .execute(
                    &stmt,
                    &[
                        &symbol,
                        &row.timestamp,
                        &set.ema_short,
                        &set.ema_long,
                        &set.rsi,
                        &set.macd,
                        &set.bb_high,
                        &set.bb_low,
                        &set.sma_50,
                        &set.sma_200,
                        &set.obv,
                        &set.adx,
                    ],
                )
                .map_err(query_err)? as usize;
        }

        tx.commit().map_err(query_err)?;
        debug!(symbol, updated, "indicators stored");
        Ok(updated)
    }

    fn append_ledger(&self, batch: &LedgerBatch) -> Result<(), TraderError> {
        let mut client = self.client.borrow_mut();
        let mut tx = client.transaction().map_err(query_err)?;

        for p in &batch.positions {
            tx.execute(
                "INSERT INTO positions (symbol, entry_timestamp, entry_price, quantity, side)
                 VALUES ($1, $2, $3, $4, $5)",
                &[
                    &p.symbol,
                    &p.entry_timestamp,
                    &p.entry_price,
                    &p.quantity,
                    &p.side.as_str(),
                ],
            )
            .map_err(query_err)?;
        }

        for t in &batch.trades {
            tx.execute(
                format!("INSERT INTO trades ({TRADE_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)")
                    .as_str(),
                &[
                    &t.symbol,
                    &t.entry_timestamp,
                    &t.exit_timestamp,
                    &t.entry_price,
                    &t.exit_price,
                    &t.quantity,
                    &t.profit_loss,
                    &t.profit_percent,
                ],
            )
            .map_err(query_err)?;
        }

        for r in &batch.strategy_results {
            let t = &r.trade;
            tx.execute(
                format!(
                    "INSERT INTO strategy_results (strategy, {TRADE_COLUMNS})
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)"
                )
                .as_str(),
                &[
                    &r.strategy,
                    &t.symbol,
                    &t.entry_timestamp,
                    &t.exit_timestamp,
                    &t.entry_price,
                    &t.exit_price,
                    &t.quantity,
                    &t.profit_loss,
                    &t.profit_percent,
                ],
            )
            .map_err(query_err)?;
        }

        tx.commit().map_err(query_err)
    }

    fn fetch_positions(&self, symbol: &str) -> Result<Vec<Position>, TraderError> {
        let rows = self
            .client
            .borrow_mut()
            .query(
                "SELECT symbol, entry_timestamp, entry_price, quantity
                 FROM positions WHERE symbol = $1 ORDER BY id ASC",
                &[&symbol],
            )
            .map_err(query_err)?;

        Ok(rows
            .iter()
            .map(|row| Position {
                symbol: row.get(0),
                entry_timestamp: row.get(1),
                entry_price: row.get(2),
                quantity: row.get(3),
                side: Side::Buy,
            })
            .collect())
    }

    fn fetch_trades(&self, symbol: &str) -> Result<Vec<Trade>, TraderError> {
        let rows = self
            .client
            .borrow_mut()
            .query(
                format!("SELECT {TRADE_COLUMNS} FROM trades WHERE symbol = $1 ORDER BY id ASC")
                    .as_str(),
                &[&symbol],
            )
            .map_err(query_err)?;

        Ok(rows.iter().map(|row| trade_from_row(row, 0)).collect())
    }

    fn fetch_strategy_results(
        &self,
        symbol: Option<&str>,
    ) -> Result<Vec<StrategyResult>, TraderError> {
        let rows = self
            .client
            .borrow_mut()
            .query(
                format!(
                    "SELECT strategy, {TRADE_COLUMNS} FROM strategy_results
                     WHERE $1::TEXT IS NULL OR symbol = $1 ORDER BY id ASC"
                )
                .as_str(),
                &[&symbol],
            )
            .map_err(query_err)?;

        Ok(rows
            .iter()
            .map(|row| StrategyResult {
                strategy: row.get(0),
                trade: trade_from_row(row, 1),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EmptyConfig;

    impl ConfigPort for EmptyConfig {
        fn get_string(&self, _section: &str, _key: &str) -> Option<String> {
            None
        }
        fn get_int(&self, _section: &str, _key: &str, default: i64) -> i64 {
            default
        }
        fn get_double(&self, _section: &str, _key: &str, default: f64) -> f64 {
            default
        }
        fn get_bool(&self, _section: &str, _key: &str, default: bool) -> bool {
            default
        }
    }

    #[test]
    fn from_config_missing_connection_string() {
        let config = EmptyConfig;
        let result = PostgresAdapter::from_config(&config);
        match result {
            Err(TraderError::ConfigMissing { section, key }) => {
                assert_eq!(section, "postgres");
                assert_eq!(key, "connection_string");
            }
            Err(other) => panic!("expected ConfigMissing, got: {other}"),
            Ok(_) => panic!("expected error, got Ok"),
        }
    }
}
