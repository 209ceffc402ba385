//! Broker positions as seen by the strategy.

use serde::{Deserialize, Serialize};

use crate::domain::targets::Side;

/// Relative slack on take-profit thresholds. `100.0 * (1.0 + 0.10)` is
/// 110.00000000000001 in binary floating point, so an exact comparison would
/// miss a close at precisely the configured gain.
const THRESHOLD_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub side: Side,
    pub shares: u64,
    pub entry_price: f64,
}

impl Position {
    pub fn long(shares: u64, entry_price: f64) -> Self {
        Position {
            side: Side::Long,
            shares,
            entry_price,
        }
    }

    pub fn short(shares: u64, entry_price: f64) -> Self {
        Position {
            side: Side::Short,
            shares,
            entry_price,
        }
    }

    pub fn is_long(&self) -> bool {
        self.side == Side::Long
    }

    pub fn is_short(&self) -> bool {
        self.side == Side::Short
    }

    /// Absolute notional at `price`, regardless of side.
    pub fn market_value(&self, price: f64) -> f64 {
        self.shares as f64 * price.abs()
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        let diff = price - self.entry_price;
        match self.side {
            Side::Long => self.shares as f64 * diff,
            Side::Short => -(self.shares as f64) * diff,
        }
    }

    /// LONG: price >= entry * (1 + pct). SHORT: price <= entry * (1 - pct).
    pub fn should_take_profit(&self, price: f64, take_profit_pct: f64) -> bool {
        match self.side {
            Side::Long => {
                let threshold = self.entry_price * (1.0 + take_profit_pct);
                price >= threshold * (1.0 - THRESHOLD_TOLERANCE)
            }
            Side::Short => {
                let threshold = self.entry_price * (1.0 - take_profit_pct);
                price <= threshold * (1.0 + THRESHOLD_TOLERANCE)
            }
        }
    }
}
