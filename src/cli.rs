//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::thread;
use std::time::Duration;
use tracing::{error, info};

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::config_validation::validate_config;
use crate::domain::cycle::{run_cycle, sweep, CycleOutcome, SweepSummary, DEFAULT_INTERVAL};
use crate::domain::error::TraderError;
use crate::domain::ledger::summarize;
use crate::domain::strategy::{StochasticWindow, StrategyConfig, StrategyKind};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_store_port::DataStorePort;
use crate::ports::market_data_port::MarketDataPort;

pub const DEFAULT_SWEEP_INTERVAL_SECS: i64 = 60;

#[derive(Parser, Debug)]
#[command(
    name = "candletrader",
    about = "Candle indicator pipeline and strategy evaluator"
)]
pub struct Cli {
    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run every configured strategy over every symbol once
    Sweep {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Run a single symbol under a single strategy
    Cycle {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: String,
        #[arg(long)]
        strategy: String,
    },
    /// Sweep repeatedly, idling between sweeps
    Watch {
        #[arg(short, long)]
        config: PathBuf,
        /// Override [sweep] interval_secs
        #[arg(long)]
        interval_secs: Option<u64>,
        /// Stop after this many sweeps
        #[arg(long)]
        max_sweeps: Option<u64>,
    },
    /// Summarise recorded strategy results
    Results {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Sweep { config } => run_sweep(&config),
        Command::Cycle {
            config,
            symbol,
            strategy,
        } => run_single_cycle(&config, &symbol, &strategy),
        Command::Watch {
            config,
            interval_secs,
            max_sweeps,
        } => run_watch(&config, interval_secs, max_sweeps),
        Command::Results { config, symbol } => run_results(&config, symbol.as_deref()),
        Command::Validate { config } => run_validate(&config),
    }
}

fn fail(err: TraderError) -> ExitCode {
    error!("{err}");
    (&err).into()
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    let adapter = FileConfigAdapter::from_file(path).map_err(fail)?;
    validate_config(&adapter).map_err(fail)?;
    Ok(adapter)
}

/// Strategies named in `[sweep] strategies`, or all five when unset.
pub fn build_strategy_configs(config: &dyn ConfigPort) -> Result<Vec<StrategyConfig>, TraderError> {
    let names = config.get_list("sweep", "strategies");
    let kinds = if names.is_empty() {
        StrategyKind::ALL.to_vec()
    } else {
        names
            .iter()
            .map(|name| name.parse::<StrategyKind>())
            .collect::<Result<Vec<_>, _>>()?
    };

    kinds
        .into_iter()
        .map(|kind| build_strategy_config(config, kind))
        .collect()
}

pub fn build_strategy_config(
    config: &dyn ConfigPort,
    kind: StrategyKind,
) -> Result<StrategyConfig, TraderError> {
    let defaults = StrategyConfig::new(kind);
    let stochastic_window = match config.get_string("evaluator", "stochastic_window") {
        Some(raw) => raw
            .parse::<StochasticWindow>()
            .map_err(|reason| TraderError::ConfigInvalid {
                section: "evaluator".into(),
                key: "stochastic_window".into(),
                reason,
            })?,
        None => defaults.stochastic_window,
    };

    Ok(StrategyConfig {
        kind,
        initial_balance: config.get_double("evaluator", "initial_balance", defaults.initial_balance),
        stake: config.get_double("evaluator", "stake", defaults.stake),
        stochastic_window,
    })
}

pub fn market_interval(config: &dyn ConfigPort) -> String {
    config
        .get_string("market", "interval")
        .unwrap_or_else(|| DEFAULT_INTERVAL.to_string())
}

pub fn open_store(config: &dyn ConfigPort) -> Result<Box<dyn DataStorePort>, TraderError> {
    let backend = config
        .get_string("store", "backend")
        .unwrap_or_else(|| "sqlite".to_string());

    match backend.as_str() {
        #[cfg(feature = "sqlite")]
        "sqlite" => {
            use crate::adapters::sqlite_adapter::SqliteAdapter;
            Ok(Box::new(SqliteAdapter::from_config(config)?))
        }
        #[cfg(feature = "postgres")]
        "postgres" => {
            use crate::adapters::postgres_adapter::PostgresAdapter;
            Ok(Box::new(PostgresAdapter::from_config(config)?))
        }
        other => Err(TraderError::ConfigInvalid {
            section: "store".into(),
            key: "backend".into(),
            reason: format!("backend '{}' is not available in this build", other),
        }),
    }
}

pub fn open_market(config: &dyn ConfigPort) -> Result<Box<dyn MarketDataPort>, TraderError> {
    let source = config
        .get_string("market", "source")
        .unwrap_or_else(|| "csv".to_string());

    match source.as_str() {
        "csv" => {
            let dir = config
                .get_string("market", "csv_dir")
                .ok_or_else(|| TraderError::ConfigMissing {
                    section: "market".into(),
                    key: "csv_dir".into(),
                })?;
            Ok(Box::new(CsvAdapter::new(PathBuf::from(dir))))
        }
        #[cfg(feature = "binance")]
        "binance" => {
            use crate::adapters::binance_adapter::BinanceAdapter;
            Ok(Box::new(BinanceAdapter::from_config(config)?))
        }
        other => Err(TraderError::ConfigInvalid {
            section: "market".into(),
            key: "source".into(),
            reason: format!("source '{}' is not available in this build", other),
        }),
    }
}

struct Session {
    store: Box<dyn DataStorePort>,
    market: Box<dyn MarketDataPort>,
    strategies: Vec<StrategyConfig>,
    interval: String,
    idle_secs: u64,
}

fn open_session(config_path: &PathBuf) -> Result<Session, ExitCode> {
    info!(path = %config_path.display(), "loading config");
    let config = load_config(config_path)?;

    Ok(Session {
        store: open_store(&config).map_err(fail)?,
        market: open_market(&config).map_err(fail)?,
        strategies: build_strategy_configs(&config).map_err(fail)?,
        interval: market_interval(&config),
        idle_secs: config
            .get_int("sweep", "interval_secs", DEFAULT_SWEEP_INTERVAL_SECS)
            .max(1) as u64,
    })
}

fn sweep_session(session: &Session) -> SweepSummary {
    let summary = sweep(
        session.market.as_ref(),
        session.store.as_ref(),
        &session.strategies,
        &session.interval,
    );
    info!(
        symbols = summary.symbols,
        completed = summary.completed,
        no_data = summary.no_data,
        failed = summary.failed,
        "sweep finished"
    );
    summary
}

fn run_sweep(config_path: &PathBuf) -> ExitCode {
    let session = match open_session(config_path) {
        Ok(s) => s,
        Err(code) => return code,
    };
    sweep_session(&session);
    ExitCode::SUCCESS
}

fn run_single_cycle(config_path: &PathBuf, symbol: &str, strategy: &str) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let kind = match strategy.parse::<StrategyKind>() {
        Ok(k) => k,
        Err(e) => return fail(e),
    };

    let prepared = open_store(&config).and_then(|store| {
        let market = open_market(&config)?;
        let strategy_config = build_strategy_config(&config, kind)?;
        Ok((store, market, strategy_config))
    });
    let (store, market, strategy_config) = match prepared {
        Ok(p) => p,
        Err(e) => return fail(e),
    };

    match run_cycle(
        market.as_ref(),
        store.as_ref(),
        symbol,
        kind.default_name(),
        &strategy_config,
        &market_interval(&config),
    ) {
        Ok(CycleOutcome::NoData) => {
            println!("{symbol}: no data");
            ExitCode::SUCCESS
        }
        Ok(CycleOutcome::Completed {
            candles_ingested,
            rows_enriched,
            positions_opened,
            trades_closed,
        }) => {
            println!(
                "{symbol}: {candles_ingested} candles ingested, {rows_enriched} rows enriched, \
                 {positions_opened} positions opened, {trades_closed} trades closed"
            );
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}

fn run_watch(config_path: &PathBuf, interval_secs: Option<u64>, max_sweeps: Option<u64>) -> ExitCode {
    let session = match open_session(config_path) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let idle = interval_secs.unwrap_or(session.idle_secs);

    let mut sweeps = 0u64;
    loop {
        sweep_session(&session);
        sweeps += 1;
        if max_sweeps.is_some_and(|max| sweeps >= max) {
            break;
        }
        info!(seconds = idle, "idling until next sweep");
        thread::sleep(Duration::from_secs(idle));
    }
    ExitCode::SUCCESS
}

fn run_results(config_path: &PathBuf, symbol: Option<&str>) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let store = match open_store(&config) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };
    let results = match store.fetch_strategy_results(symbol) {
        Ok(r) => r,
        Err(e) => return fail(e),
    };

    let summaries = summarize(&results);
    if summaries.is_empty() {
        println!("No strategy results recorded");
        return ExitCode::SUCCESS;
    }

    println!(
        "{:<36} {:>8} {:>8} {:>10} {:>14}",
        "Strategy", "Trades", "Wins", "Win %", "Total P&L"
    );
    for s in &summaries {
        println!(
            "{:<36} {:>8} {:>8} {:>10.2} {:>14.4}",
            s.strategy,
            s.trades,
            s.wins,
            s.win_rate(),
            s.total_profit_loss
        );
    }
    ExitCode::SUCCESS
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    match build_strategy_configs(&config) {
        Ok(strategies) => {
            println!("Config is valid");
            for s in &strategies {
                println!("  {} ({})", s.kind.default_name(), s.kind);
            }
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}
