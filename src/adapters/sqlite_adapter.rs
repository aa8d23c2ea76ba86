//! SQLite data store adapter.
//!
//! Timestamps are stored as `YYYY-MM-DD HH:MM:SS` text so that lexical order
//! is time order.

use crate::domain::candle::Candle;
use crate::domain::error::TraderError;
use crate::domain::ledger::LedgerBatch;
use crate::domain::pipeline::EnrichedRow;
use crate::domain::position::{Position, Side, StrategyResult, Trade};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_store_port::DataStorePort;
use chrono::NaiveDateTime;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Row};
use tracing::debug;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS candles (
        symbol TEXT NOT NULL,
        timestamp TEXT NOT NULL,
        open REAL NOT NULL,
        high REAL NOT NULL,
        low REAL NOT NULL,
        close REAL NOT NULL,
        volume REAL NOT NULL,
        quote_volume REAL NOT NULL,
        trade_count INTEGER NOT NULL,
        taker_buy_base REAL NOT NULL,
        taker_buy_quote REAL NOT NULL,
        ema_short REAL,
        ema_long REAL,
        rsi REAL,
        macd REAL,
        bb_high REAL,
        bb_low REAL,
        sma_50 REAL,
        sma_200 REAL,
        obv REAL,
        adx REAL,
        PRIMARY KEY (symbol, timestamp)
    );
    CREATE TABLE IF NOT EXISTS positions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        symbol TEXT NOT NULL,
        entry_timestamp TEXT NOT NULL,
        entry_price REAL NOT NULL,
        quantity REAL NOT NULL,
        side TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS trades (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        symbol TEXT NOT NULL,
        entry_timestamp TEXT NOT NULL,
        exit_timestamp TEXT NOT NULL,
        entry_price REAL NOT NULL,
        exit_price REAL NOT NULL,
        quantity REAL NOT NULL,
        profit_loss REAL NOT NULL,
        profit_percent REAL NOT NULL
    );
    CREATE TABLE IF NOT EXISTS strategy_results (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        strategy TEXT NOT NULL,
        symbol TEXT NOT NULL,
        entry_timestamp TEXT NOT NULL,
        exit_timestamp TEXT NOT NULL,
        entry_price REAL NOT NULL,
        exit_price REAL NOT NULL,
        quantity REAL NOT NULL,
        profit_loss REAL NOT NULL,
        profit_percent REAL NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_positions_symbol ON positions(symbol);
    CREATE INDEX IF NOT EXISTS idx_trades_symbol ON trades(symbol);
    CREATE INDEX IF NOT EXISTS idx_strategy_results_symbol ON strategy_results(symbol);";

const CANDLE_COLUMNS: &str = "symbol, timestamp, open, high, low, close, volume, quote_volume,
    trade_count, taker_buy_base, taker_buy_quote, ema_short, ema_long, rsi, macd, bb_high,
    bb_low, sma_50, sma_200, obv, adx";

const TRADE_COLUMNS: &str = "symbol, entry_timestamp, exit_timestamp, entry_price, exit_price,
    quantity, profit_loss, profit_percent";

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

fn pool_err(e: r2d2::Error) -> TraderError {
    TraderError::Database {
        reason: e.to_string(),
    }
}

fn query_err(e: rusqlite::Error) -> TraderError {
    TraderError::DatabaseQuery {
        reason: e.to_string(),
    }
}

fn format_ts(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

fn timestamp_at(row: &Row, index: usize) -> rusqlite::Result<NaiveDateTime> {
    let text: String = row.get(index)?;
    NaiveDateTime::parse_from_str(&text, TIMESTAMP_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            index,
            rusqlite::types::Type::Text,
            Box::new(e),
        )
    })
}

fn candle_from_row(row: &Row) -> rusqlite::Result<Candle> {
    Ok(Candle {
        symbol: row.get(0)?,
        timestamp: timestamp_at(row, 1)?,
        open: row.get(2)?,
        high: row.get(3)?,
        low: row.get(4)?,
        close: row.get(5)?,
        volume: row.get(6)?,
        quote_volume: row.get(7)?,
        trade_count: row.get(8)?,
        taker_buy_base: row.get(9)?,
        taker_buy_quote: row.get(10)?,
        ema_short: row.get(11)?,
        ema_long: row.get(12)?,
        rsi: row.get(13)?,
        macd: row.get(14)?,
        bb_high: row.get(15)?,
        bb_low: row.get(16)?,
        sma_50: row.get(17)?,
        sma_200: row.get(18)?,
        obv: row.get(19)?,
        adx: row.get(20)?,
    })
}

/// Trade columns starting at `offset`.
fn trade_from_row(row: &Row, offset: usize) -> rusqlite::Result<Trade> {
    Ok(Trade {
        symbol: row.get(offset)?,
        entry_timestamp: timestamp_at(row, offset + 1)?,
        exit_timestamp: timestamp_at(row, offset + 2)?,
        entry_price: row.get(offset + 3)?,
        exit_price: row.get(offset + 4)?,
        quantity: row.get(offset + 5)?,
        profit_loss: row.get(offset + 6)?,
        profit_percent: row.get(offset + 7)?,
    })
}

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, TraderError> {
        let db_path =
            config
                .get_string("sqlite", "path")
                .ok_or_else(|| TraderError::ConfigMissing {
                    section: "sqlite".into(),
                    key: "path".into(),
                })?;

        let pool_size = config.get_int("sqlite", "pool_size", 4) as u32;

        let manager = SqliteConnectionManager::file(&db_path);
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(pool_err)?;

        let adapter = Self { pool };
        adapter.initialize_schema()?;
        Ok(adapter)
    }

    pub fn in_memory() -> Result<Self, TraderError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(pool_err)?;

        let adapter = Self { pool };
        adapter.initialize_schema()?;
        Ok(adapter)
    }

    pub fn initialize_schema(&self) -> Result<(), TraderError> {
        self.conn()?.execute_batch(SCHEMA).map_err(query_err)
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, TraderError> {
        self.pool.get().map_err(pool_err)
    }

    fn query_trades(&self, sql: &str, symbol: &str) -> Result<Vec<Trade>, TraderError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(sql).map_err(query_err)?;
        let rows = stmt
            .query_map(params![symbol], |row| trade_from_row(row, 0))
            .map_err(query_err)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(query_err)
    }
}

impl DataStorePort for SqliteAdapter {
    fn insert_candles(&self, candles: &[Candle]) -> Result<usize, TraderError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_err)?;

        let mut inserted = 0;
        {
            let mut stmt = tx
                .prepare(
                    "INSERT OR IGNORE INTO candles (symbol, timestamp, open, high, low, close,
                        volume, quote_volume, trade_count, taker_buy_base, taker_buy_quote)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                )
                .map_err(query_err)?;

            for c in candles {
                inserted += stmt
                    .execute(params![
                        c.symbol,
                        format_ts(&c.timestamp),
                        c.open,
                        c.high,
                        c.low,
                        c.close,
                        c.volume,
                        c.quote_volume,
                        c.trade_count,
                        c.taker_buy_base,
                        c.taker_buy_quote
                    ])
                    .map_err(query_err)?;
            }
        }

        tx.commit().map_err(query_err)?;
        debug!(received = candles.len(), inserted, "candles stored");
        Ok(inserted)
    }

    fn fetch_candles(&self, symbol: &str) -> Result<Vec<Candle>, TraderError> {
        let conn = self.conn()?;
        let query = format!(
            "SELECT {CANDLE_COLUMNS} FROM candles WHERE symbol = ?1 ORDER BY timestamp ASC"
        );
        let mut stmt = conn.prepare(&query).map_err(query_err)?;
        let rows = stmt
            .query_map(params![symbol], candle_from_row)
            .map_err(query_err)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(query_err)
    }

    fn update_indicators(&self, symbol: &str, rows: &[EnrichedRow]) -> Result<usize, TraderError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_err)?;

        let mut updated = 0;
        {
            let mut stmt = tx
                .prepare(
                    "UPDATE candles SET ema_short = ?3, ema_long = ?4, rsi = ?5, macd = ?6,
                        bb_high = ?7, bb_low = ?8, sma_50 = ?9, sma_200 = ?10, obv = ?11, adx = ?12
                     WHERE symbol = ?1 AND timestamp = ?2
                       AND ema_short IS NULL AND ema_long IS NULL AND rsi IS NULL
                       AND macd IS NULL AND bb_high IS NULL AND bb_low IS NULL
                       AND sma_50 IS NULL AND sma_200 IS NULL AND obv IS NULL AND adx IS NULL",
                )
                .map_err(query_err)?;

            for row in rows {
                let set = &row.indicators;
                updated += stmt
                    .execute(params![
                        symbol,
                        format_ts(&row.timestamp),
                        set.ema_short,
                        set.ema_long,
                        set.rsi,
                        set.macd,
                        set.bb_high,
                        set.bb_low,
                        set.sma_50,
                        set.sma_200,
                        set.obv,
                        set.adx
                    ])
                    .map_err(query_err)?;
            }
        }

        tx.commit().map_err(query_err)?;
        debug!(symbol, updated, "indicators stored");
        Ok(updated)
    }

    fn append_ledger(&self, batch: &LedgerBatch) -> Result<(), TraderError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_err)?;

        for p in &batch.positions {
            tx.execute(
                "INSERT INTO positions (symbol, entry_timestamp, entry_price, quantity, side)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    p.symbol,
                    format_ts(&p.entry_timestamp),
                    p.entry_price,
                    p.quantity,
                    p.side.as_str()
                ],
            )
            .map_err(query_err)?;
        }

        for t in &batch.trades {
            tx.execute(
                &format!("INSERT INTO trades ({TRADE_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"),
                params![
                    t.symbol,
                    format_ts(&t.entry_timestamp),
                    format_ts(&t.exit_timestamp),
                    t.entry_price,
                    t.exit_price,
                    t.quantity,
                    t.profit_loss,
                    t.profit_percent
                ],
            )
            .map_err(query_err)?;
        }

        for r in &batch.strategy_results {
            let t = &r.trade;
            tx.execute(
                &format!(
                    "INSERT INTO strategy_results (strategy, {TRADE_COLUMNS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"
                ),
                params![
                    r.strategy,
                    t.symbol,
                    format_ts(&t.entry_timestamp),
                    format_ts(&t.exit_timestamp),
                    t.entry_price,
                    t.exit_price,
                    t.quantity,
                    t.profit_loss,
                    t.profit_percent
                ],
            )
            .map_err(query_err)?;
        }

        tx.commit().map_err(query_err)
    }

    fn fetch_positions(&self, symbol: &str) -> Result<Vec<Position>, TraderError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT symbol, entry_timestamp, entry_price, quantity
                 FROM positions WHERE symbol = ?1 ORDER BY id ASC",
            )
            .map_err(query_err)?;
        let rows = stmt
            .query_map(params![symbol], |row| {
                Ok(Position {
                    symbol: row.get(0)?,
                    entry_timestamp: timestamp_at(row, 1)?,
                    entry_price: row.get(2)?,
                    quantity: row.get(3)?,
                    side: Side::Buy,
                })
            })
            .map_err(query_err)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(query_err)
    }

    fn fetch_trades(&self, symbol: &str) -> Result<Vec<Trade>, TraderError> {
        self.query_trades(
            &format!("SELECT {TRADE_COLUMNS} FROM trades WHERE symbol = ?1 ORDER BY id ASC"),
            symbol,
        )
    }

    fn fetch_strategy_results(
        &self,
        symbol: Option<&str>,
    ) -> Result<Vec<StrategyResult>, TraderError> {
        let conn = self.conn()?;
        let query = format!(
            "SELECT strategy, {TRADE_COLUMNS} FROM strategy_results
             WHERE ?1 IS NULL OR symbol = ?1 ORDER BY id ASC"
        );
        let mut stmt = conn.prepare(&query).map_err(query_err)?;
        let rows = stmt
            .query_map(params![symbol], |row| {
                Ok(StrategyResult {
                    strategy: row.get(0)?,
                    trade: trade_from_row(row, 1)?,
                })
            })
            .map_err(query_err)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(query_err)
    }
}
