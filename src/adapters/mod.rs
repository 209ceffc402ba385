//! Concrete adapter implementations for ports.

#[cfg(feature = "alpaca")]
pub mod alpaca_adapter;
pub mod csv_adapter;
pub mod file_config_adapter;
pub mod json_store_adapter;
pub mod paper_broker_adapter;
