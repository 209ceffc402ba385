//! Exit evaluation: take-profit and rotation triggers.

use chrono::NaiveDate;
use std::collections::BTreeSet;

use crate::domain::cooldown::in_cooldown;
use crate::domain::params::Params;
use crate::domain::portfolio::Portfolio;
use crate::domain::symbol_record::Store;
use crate::domain::targets::Targets;

/// Held positions whose latest stored price has crossed the take-profit
/// threshold. Positions with no stored price are left alone.
pub fn take_profit_exits(portfolio: &Portfolio, store: &Store, params: &Params) -> Vec<String> {
    portfolio
        .iter()
        .filter(|(symbol, pos)| {
            store
                .latest_price(symbol)
                .is_some_and(|price| pos.should_take_profit(price, params.take_profit_pct))
        })
        .map(|(symbol, _)| symbol.to_string())
        .collect()
}

/// Held positions that are no longer targeted. A position still in cooldown
/// is kept even though it is not a target.
pub fn rotation_exits(
    portfolio: &Portfolio,
    targets: &Targets,
    store: &Store,
    today: NaiveDate,
    params: &Params,
) -> Vec<String> {
    portfolio
        .iter()
        .filter(|(symbol, _)| !targets.contains(symbol))
        .filter(|(symbol, _)| {
            !in_cooldown(store.last_trade_date(symbol), today, params.cooldown_days)
        })
        .map(|(symbol, _)| symbol.to_string())
        .collect()
}

/// Union of both triggers; a symbol hit by both closes once.
pub fn evaluate_exits(
    portfolio: &Portfolio,
    targets: &Targets,
    store: &Store,
    today: NaiveDate,
    params: &Params,
) -> BTreeSet<String> {
    let mut closes: BTreeSet<String> = take_profit_exits(portfolio, store, params)
        .into_iter()
        .collect();
    closes.extend(rotation_exits(portfolio, targets, store, today, params));
    closes
}
