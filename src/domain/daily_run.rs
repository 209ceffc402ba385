//! One daily run: refresh prices, score, decide, execute, persist.
//!
//! Collaborator failures while fetching prices are downgraded to "absent"
//! for that symbol. Failures loading the store or reading the broker's
//! positions abort the run; the refreshed store is still saved.

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::domain::daily_close::DailyClose;
use crate::domain::error::RotatraderError;
use crate::domain::execution::{execute_decision, ExecutionReport};
use crate::domain::params::Params;
use crate::domain::price_series::HISTORY_WINDOW;
use crate::domain::strategy::{evaluate, Decision};
use crate::domain::symbol_record::{Store, SymbolRecord};
use crate::domain::watchlist::Watchlist;
use crate::ports::broker_port::BrokerPort;
use crate::ports::market_data_port::MarketDataPort;
use crate::ports::store_port::StorePort;

pub struct RunContext<'a> {
    pub watchlist: &'a Watchlist,
    pub params: &'a Params,
    pub market_data: &'a dyn MarketDataPort,
    pub broker: &'a dyn BrokerPort,
    pub store: &'a dyn StorePort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// New record created from `bars` historical closes plus the quote.
    Backfilled { bars: usize },
    Appended,
    /// Quote for the day already stored; the last close was overwritten.
    Replaced,
    /// Quote older than the stored history; nothing changed.
    Stale,
    MissingQuote,
    BackfillFailed,
}

impl RefreshOutcome {
    pub fn updated(&self) -> bool {
        matches!(
            self,
            RefreshOutcome::Backfilled { .. } | RefreshOutcome::Appended | RefreshOutcome::Replaced
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub date: NaiveDate,
    pub refreshed: Vec<(String, RefreshOutcome)>,
    pub portfolio_value: f64,
    pub decision: Decision,
    /// `None` on a dry run.
    pub execution: Option<ExecutionReport>,
}

impl RunSummary {
    pub fn trades(&self) -> usize {
        self.execution.as_ref().map_or(0, |e| e.trades)
    }
}

pub fn run_daily(
    ctx: &RunContext<'_>,
    today: NaiveDate,
    dry_run: bool,
) -> Result<RunSummary, RotatraderError> {
    info!(date = %today, dry_run, "run start");

    let mut store = ctx.store.load()?;
    info!(records = store.len(), "store loaded");

    let refreshed = refresh_prices(&mut store, ctx.watchlist, ctx.market_data, today);
    score_watchlist(&mut store, ctx.watchlist, ctx.params);

    let outcome = decide_and_execute(ctx, &mut store, today, dry_run);
    ctx.store.save(&store)?;

    let (portfolio_value, decision, execution) = outcome?;
    let summary = RunSummary {
        date: today,
        refreshed,
        portfolio_value,
        decision,
        execution,
    };
    info!(
        trades = summary.trades(),
        portfolio_value = summary.portfolio_value,
        "run end"
    );
    Ok(summary)
}

type Outcome = (f64, Decision, Option<ExecutionReport>);

fn decide_and_execute(
    ctx: &RunContext<'_>,
    store: &mut Store,
    today: NaiveDate,
    dry_run: bool,
) -> Result<Outcome, RotatraderError> {
    let portfolio = ctx.broker.current_positions()?;
    let portfolio_value = ctx.broker.portfolio_value()?;
    info!(
        positions = ?portfolio.positions.keys().collect::<Vec<_>>(),
        portfolio_value, "portfolio snapshot"
    );

    let decision = evaluate(ctx.watchlist, store, &portfolio, ctx.params, today)?;
    info!(
        ranking = %decision
            .ranked
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", "),
        longs = ?decision.targets.longs(),
        shorts = ?decision.targets.shorts(),
        "targets selected"
    );
    info!(close = ?decision.close, open = decision.open.len(), "decision");

    if dry_run {
        info!("dry run, no orders submitted");
        return Ok((portfolio_value, decision, None));
    }

    let report = execute_decision(
        &decision,
        &portfolio,
        store,
        ctx.params,
        portfolio_value,
        ctx.broker,
        today,
    );
    Ok((portfolio_value, decision, Some(report)))
}

/// Refresh every watchlist symbol from the market data source.
pub fn refresh_prices(
    store: &mut Store,
    watchlist: &Watchlist,
    market_data: &dyn MarketDataPort,
    today: NaiveDate,
) -> Vec<(String, RefreshOutcome)> {
    watchlist
        .iter()
        .map(|symbol| {
            let outcome = refresh_symbol(store, symbol, market_data, today);
            (symbol.clone(), outcome)
        })
        .collect()
}

pub fn refresh_symbol(
    store: &mut Store,
    symbol: &str,
    market_data: &dyn MarketDataPort,
    today: NaiveDate,
) -> RefreshOutcome {
    let quote = match market_data.latest_close(symbol) {
        Ok(Some(q)) if q.is_usable() && q.date <= today => q,
        Ok(Some(q)) => {
            warn!(symbol, close = q.close, date = %q.date, "unusable quote, skipping");
            return RefreshOutcome::MissingQuote;
        }
        Ok(None) => {
            warn!(symbol, "missing data, skipping");
            return RefreshOutcome::MissingQuote;
        }
        Err(e) => {
            warn!(symbol, error = %e, "quote fetch failed, skipping");
            return RefreshOutcome::MissingQuote;
        }
    };

    let outcome = match store.get_mut(symbol) {
        Some(record) => apply_quote(record, quote),
        None => match backfill(symbol, market_data, quote) {
            Some(record) => {
                let bars = record.prices.len() - 1;
                store.insert(symbol, record);
                RefreshOutcome::Backfilled { bars }
            }
            None => RefreshOutcome::BackfillFailed,
        },
    };

    if outcome.updated() {
        info!(symbol, close = quote.close, date = %quote.date, "price updated");
    }
    outcome
}

fn apply_quote(record: &mut SymbolRecord, quote: DailyClose) -> RefreshOutcome {
    let outcome = match record.last_close_date {
        Some(last) if quote.date < last => return RefreshOutcome::Stale,
        Some(last) if quote.date == last => {
            record.prices.replace_last(quote.close);
            RefreshOutcome::Replaced
        }
        _ => {
            record.prices.push(quote.close);
            RefreshOutcome::Appended
        }
    };
    record.last_close_date = Some(quote.date);
    outcome
}

fn backfill(
    symbol: &str,
    market_data: &dyn MarketDataPort,
    quote: DailyClose,
) -> Option<SymbolRecord> {
    let history = match market_data.historical_closes(symbol, HISTORY_WINDOW) {
        Ok(h) => h,
        Err(e) => {
            warn!(symbol, error = %e, "historical backfill failed");
            return None;
        }
    };
    if history.is_empty() {
        warn!(symbol, "historical backfill returned nothing");
        return None;
    }

    let prices: Vec<f64> = history
        .iter()
        .filter(|bar| bar.date < quote.date && bar.is_usable())
        .map(|bar| bar.close)
        .collect();

    let mut record = SymbolRecord::with_prices(prices);
    record.prices.push(quote.close);
    record.last_close_date = Some(quote.date);
    Some(record)
}

/// Recompute indicators and score for every stored watchlist symbol.
pub fn score_watchlist(store: &mut Store, watchlist: &Watchlist, params: &Params) {
    for symbol in watchlist {
        let Some(record) = store.get_mut(symbol) else {
            continue;
        };
        match (record.rescore(params), record.indicators) {
            (Some(score), Some(ind)) => {
                info!(
                    symbol = %symbol,
                    score,
                    roc = format_args!("{:.2}%", ind.roc * 100.0).to_string(),
                    "scored"
                );
            }
            _ => {
                info!(symbol = %symbol, bars = record.prices.len(), "not enough data, score invalid");
            }
        }
    }
}
