//! Entry eligibility.
//!
//! Trade-count and exposure caps are not applied here; they depend on the
//! order of execution and running totals, so the execution layer owns them.

use chrono::NaiveDate;

use crate::domain::cooldown::in_cooldown;
use crate::domain::params::Params;
use crate::domain::portfolio::Portfolio;
use crate::domain::symbol_record::Store;
use crate::domain::targets::{Side, Targets};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenCandidate {
    pub symbol: String,
    pub side: Side,
}

/// Targets that are neither already held nor in cooldown, in target order.
pub fn evaluate_entries(
    portfolio: &Portfolio,
    targets: &Targets,
    store: &Store,
    today: NaiveDate,
    params: &Params,
) -> Vec<OpenCandidate> {
    targets
        .iter()
        .filter(|(symbol, _)| !portfolio.has_position(symbol))
        .filter(|(symbol, _)| !in_cooldown(store.last_trade_date(symbol), today, params.cooldown_days))
        .map(|(symbol, side)| OpenCandidate {
            symbol: symbol.to_string(),
            side,
        })
        .collect()
}
