//! Port traits (interfaces) for hexagonal architecture.

pub mod broker_port;
pub mod config_port;
pub mod market_data_port;
pub mod store_port;
