//! Core domain types and logic: candles, indicators, the enrichment
//! pipeline, strategy evaluation and the trade ledger.

pub mod candle;
pub mod config_validation;
pub mod cycle;
pub mod error;
pub mod evaluator;
pub mod indicator;
pub mod ledger;
pub mod pipeline;
pub mod position;
pub mod strategy;
