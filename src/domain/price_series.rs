//! Bounded chronological close history.

use serde::{Deserialize, Serialize};

/// Number of closes retained per symbol.
pub const HISTORY_WINDOW: usize = 120;

/// Chronological closes, most recent last, capped at [`HISTORY_WINDOW`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriceSeries {
    prices: Vec<f64>,
}

impl PriceSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from an existing history, keeping only the newest entries.
    pub fn from_prices(prices: Vec<f64>) -> Self {
        let mut series = PriceSeries { prices };
        series.trim();
        series
    }

    pub fn push(&mut self, price: f64) {
        self.prices.push(price);
        self.trim();
    }

    /// Overwrite the most recent close, or push when empty.
    pub fn replace_last(&mut self, price: f64) {
        match self.prices.last_mut() {
            Some(last) => *last = price,
            None => self.prices.push(price),
        }
    }

    pub fn latest(&self) -> Option<f64> {
        self.prices.last().copied()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.prices
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    fn trim(&mut self) {
        if self.prices.len() > HISTORY_WINDOW {
            let excess = self.prices.len() - HISTORY_WINDOW;
            self.prices.drain(..excess);
        }
    }
}
