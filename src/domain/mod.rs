//! Core domain types and logic: indicators, scoring, ranking, target
//! selection, exit/entry evaluation and the daily run that drives them.

pub mod account;
pub mod config_validation;
pub mod cooldown;
pub mod daily_close;
pub mod daily_run;
pub mod entries;
pub mod error;
pub mod execution;
pub mod exits;
pub mod indicator;
pub mod params;
pub mod portfolio;
pub mod position;
pub mod price_series;
pub mod ranking;
pub mod risk;
pub mod score;
pub mod strategy;
pub mod symbol_record;
pub mod targets;
pub mod watchlist;
