//! Configuration validation.
//!
//! Checks every section the driver reads before any store or market source
//! is opened.

use crate::domain::error::TraderError;
use crate::domain::strategy::{StochasticWindow, StrategyKind};
use crate::ports::config_port::ConfigPort;

pub const STORE_BACKENDS: [&str; 2] = ["sqlite", "postgres"];
pub const MARKET_SOURCES: [&str; 2] = ["csv", "binance"];

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), TraderError> {
    validate_store(config)?;
    validate_market(config)?;
    validate_evaluator(config)?;
    validate_sweep(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> TraderError {
    TraderError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn missing(section: &str, key: &str) -> TraderError {
    TraderError::ConfigMissing {
        section: section.to_string(),
        key: key.to_string(),
    }
}

fn validate_store(config: &dyn ConfigPort) -> Result<(), TraderError> {
    let backend = config
        .get_string("store", "backend")
        .unwrap_or_else(|| "sqlite".to_string());

    match backend.as_str() {
        "sqlite" => {
            if config.get_string("sqlite", "path").is_none() {
                return Err(missing("sqlite", "path"));
            }
            if config.get_int("sqlite", "pool_size", 4) < 1 {
                return Err(invalid("sqlite", "pool_size", "pool_size must be at least 1"));
            }
        }
        "postgres" => {
            if config.get_string("postgres", "connection_string").is_none() {
                return Err(missing("postgres", "connection_string"));
            }
        }
        other => {
            return Err(invalid(
                "store",
                "backend",
                format!("unknown backend '{}', expected one of {:?}", other, STORE_BACKENDS),
            ));
        }
    }
    Ok(())
}

fn validate_market(config: &dyn ConfigPort) -> Result<(), TraderError> {
    let source = config
        .get_string("market", "source")
        .unwrap_or_else(|| "csv".to_string());

    match source.as_str() {
        "csv" => {
            if config.get_string("market", "csv_dir").is_none() {
                return Err(missing("market", "csv_dir"));
            }
        }
        "binance" => {}
        other => {
            return Err(invalid(
                "market",
                "source",
                format!("unknown source '{}', expected one of {:?}", other, MARKET_SOURCES),
            ));
        }
    }

    if let Some(interval) = config.get_string("market", "interval") {
        if interval.trim().is_empty() {
            return Err(invalid("market", "interval", "interval must not be empty"));
        }
    }
    Ok(())
}

fn validate_evaluator(config: &dyn ConfigPort) -> Result<(), TraderError> {
    let balance = config.get_double("evaluator", "initial_balance", 1000.0);
    if !balance.is_finite() || balance <= 0.0 {
        return Err(invalid(
            "evaluator",
            "initial_balance",
            "initial_balance must be a positive finite number",
        ));
    }

    let stake = config.get_double("evaluator", "stake", 10.0);
    if !stake.is_finite() || stake <= 0.0 {
        return Err(invalid(
            "evaluator",
            "stake",
            "stake must be a positive finite number",
        ));
    }

    if let Some(window) = config.get_string("evaluator", "stochastic_window") {
        window
            .parse::<StochasticWindow>()
            .map_err(|reason| invalid("evaluator", "stochastic_window", reason))?;
    }
    Ok(())
}

fn validate_sweep(config: &dyn ConfigPort) -> Result<(), TraderError> {
    for name in config.get_list("sweep", "strategies") {
        name.parse::<StrategyKind>()?;
    }

    if config.get_int("sweep", "interval_secs", 60) <= 0 {
        return Err(invalid("sweep", "interval_secs", "interval_secs must be positive"));
    }
    Ok(())
}
