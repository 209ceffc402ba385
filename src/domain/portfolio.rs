//! Position snapshot and exposure accounting.

use std::collections::BTreeMap;

use super::position::Position;

/// Symbol -> position, captured once per run. Ordered so that every walk
/// over the holdings is deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Portfolio {
    pub positions: BTreeMap<String, Position>,
}

impl Portfolio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_position(mut self, symbol: &str, position: Position) -> Self {
        self.add_position(symbol, position);
        self
    }

    pub fn add_position(&mut self, symbol: &str, position: Position) {
        self.positions.insert(symbol.to_string(), position);
    }

    pub fn get_position(&self, symbol: &str) -> Option<&Position> {
        self.positions.get(symbol)
    }

    pub fn has_position(&self, symbol: &str) -> bool {
        self.positions.contains_key(symbol)
    }

    pub fn remove_position(&mut self, symbol: &str) -> Option<Position> {
        self.positions.remove(symbol)
    }

    pub fn position_count(&self) -> usize {
        self.positions.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Position)> {
        self.positions.iter().map(|(s, p)| (s.as_str(), p))
    }

    /// Sum of |shares * price| over all positions. `price_of` supplies the
    /// mark; positions without one are marked at their entry price.
    pub fn gross_notional<F>(&self, price_of: F) -> f64
    where
        F: Fn(&str) -> Option<f64>,
    {
        self.positions
            .iter()
            .map(|(symbol, pos)| {
                let price = price_of(symbol).unwrap_or(pos.entry_price);
                pos.market_value(price)
            })
            .sum()
    }
}
