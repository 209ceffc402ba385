//! Broker account snapshot.

#[derive(Debug, Clone, PartialEq)]
pub struct AccountSummary {
    pub status: String,
    pub cash: f64,
    pub buying_power: f64,
    pub portfolio_value: f64,
}
