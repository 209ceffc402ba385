//! Strategy evaluation: rank, select targets, decide exits and entries.
//!
//! [`evaluate`] is the single entry point. It reads one consistent snapshot
//! of the store and the portfolio, performs no I/O, and returns the same
//! [`Decision`] for the same inputs.

use chrono::NaiveDate;
use std::collections::BTreeSet;

use crate::domain::entries::{evaluate_entries, OpenCandidate};
use crate::domain::error::RotatraderError;
use crate::domain::exits::evaluate_exits;
use crate::domain::params::Params;
use crate::domain::portfolio::Portfolio;
use crate::domain::ranking::{rank, RankedSymbol};
use crate::domain::symbol_record::Store;
use crate::domain::targets::{select_targets, Targets};
use crate::domain::watchlist::Watchlist;

#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub ranked: Vec<RankedSymbol>,
    pub targets: Targets,
    pub close: BTreeSet<String>,
    pub open: Vec<OpenCandidate>,
}

impl Decision {
    pub fn is_empty(&self) -> bool {
        self.close.is_empty() && self.open.is_empty()
    }
}

pub fn evaluate(
    watchlist: &Watchlist,
    store: &Store,
    portfolio: &Portfolio,
    params: &Params,
    today: NaiveDate,
) -> Result<Decision, RotatraderError> {
    validate_inputs(store, portfolio, today)?;

    let ranked = rank(watchlist.iter().filter_map(|symbol| {
        store
            .get(symbol)
            .and_then(|record| record.valid_score())
            .map(|score| (symbol.as_str(), score))
    }));

    let targets = select_targets(&ranked, params.top_longs, params.bottom_shorts);
    let close = evaluate_exits(portfolio, &targets, store, today, params);
    let open = evaluate_entries(portfolio, &targets, store, today, params);

    Ok(Decision {
        ranked,
        targets,
        close,
        open,
    })
}

/// Reject inputs that no amount of branching can make sense of: prices that
/// are not positive finite numbers, dates after `today`, empty or mispriced
/// positions.
pub fn validate_inputs(
    store: &Store,
    portfolio: &Portfolio,
    today: NaiveDate,
) -> Result<(), RotatraderError> {
    for (symbol, record) in &store.records {
        if let Some(bad) = record
            .prices
            .as_slice()
            .iter()
            .find(|p| !p.is_finite() || **p <= 0.0)
        {
            return Err(RotatraderError::invalid(format!(
                "{symbol}: price history contains {bad}"
            )));
        }
        if let Some(last) = record.last_trade_date.filter(|d| *d > today) {
            return Err(RotatraderError::invalid(format!(
                "{symbol}: last trade date {last} is after {today}"
            )));
        }
        if let Some(last) = record.last_close_date.filter(|d| *d > today) {
            return Err(RotatraderError::invalid(format!(
                "{symbol}: last close date {last} is after {today}"
            )));
        }
    }

    for (symbol, pos) in portfolio.iter() {
        if pos.shares == 0 {
            return Err(RotatraderError::invalid(format!(
                "{symbol}: position has zero shares"
            )));
        }
        if !pos.entry_price.is_finite() || pos.entry_price <= 0.0 {
            return Err(RotatraderError::invalid(format!(
                "{symbol}: entry price {} is not positive",
                pos.entry_price
            )));
        }
    }

    Ok(())
}
