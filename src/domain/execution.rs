//! Decision execution against a broker.
//!
//! Closes are submitted first, then opens in decision order through the
//! [`RiskGate`]. Every submission counts toward the daily trade cap. Closes
//! are never capped: exits only ever reduce risk. `last_trade_date` is
//! written only after the broker accepted the order.

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::domain::params::Params;
use crate::domain::portfolio::Portfolio;
use crate::domain::risk::{OpenVerdict, RiskGate};
use crate::domain::strategy::Decision;
use crate::domain::symbol_record::Store;
use crate::domain::targets::Side;
use crate::ports::broker_port::BrokerPort;

#[derive(Debug, Clone, PartialEq)]
pub struct OpenedPosition {
    pub symbol: String,
    pub side: Side,
    pub shares: u64,
    pub price: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoPrice,
    TooSmall,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedOpen {
    pub symbol: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FailedOrder {
    pub symbol: String,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HaltReason {
    TradeCap,
    Exposure,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionReport {
    pub closed: Vec<String>,
    pub opened: Vec<OpenedPosition>,
    pub skipped: Vec<SkippedOpen>,
    pub failed: Vec<FailedOrder>,
    /// Why opening stopped early, if it did.
    pub halt: Option<HaltReason>,
    pub trades: usize,
}

pub fn execute_decision(
    decision: &Decision,
    portfolio: &Portfolio,
    store: &mut Store,
    params: &Params,
    portfolio_value: f64,
    broker: &dyn BrokerPort,
    today: NaiveDate,
) -> ExecutionReport {
    let gross = portfolio.gross_notional(|s| store.latest_price(s));
    let mut gate = RiskGate::new(params, portfolio_value, gross);
    let mut report = ExecutionReport::default();

    debug!(
        gross_exposure = gate.gross_exposure(),
        portfolio_value, "starting execution"
    );

    for symbol in &decision.close {
        match broker.close_position(symbol) {
            Ok(()) => {
                let notional = portfolio
                    .get_position(symbol)
                    .map(|pos| pos.market_value(store.latest_price(symbol).unwrap_or(pos.entry_price)))
                    .unwrap_or(0.0);
                gate.record_close(notional);
                mark_traded(store, symbol, today);
                info!(symbol = %symbol, "closed position");
                report.closed.push(symbol.clone());
            }
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "close failed");
                report.failed.push(FailedOrder {
                    symbol: symbol.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    for candidate in &decision.open {
        let symbol = candidate.symbol.as_str();

        if gate.trade_cap_reached() {
            info!("max trades per day reached, stopping");
            report.halt = Some(HaltReason::TradeCap);
            break;
        }

        let Some(price) = store.latest_price(symbol) else {
            warn!(symbol, "no stored price, cannot size");
            report.skipped.push(SkippedOpen {
                symbol: symbol.to_string(),
                reason: SkipReason::NoPrice,
            });
            continue;
        };

        let shares = match gate.check_open(price) {
            OpenVerdict::Open { shares } => shares,
            OpenVerdict::TooSmall => {
                info!(symbol, price, "size too small, skipping");
                report.skipped.push(SkippedOpen {
                    symbol: symbol.to_string(),
                    reason: SkipReason::TooSmall,
                });
                continue;
            }
            OpenVerdict::TradeCapReached => {
                info!("max trades per day reached, stopping");
                report.halt = Some(HaltReason::TradeCap);
                break;
            }
            OpenVerdict::ExposureLimit => {
                info!(
                    gross_exposure = gate.gross_exposure(),
                    limit = params.max_gross_exposure,
                    "exposure limit hit, stopping opens"
                );
                report.halt = Some(HaltReason::Exposure);
                break;
            }
        };

        let submitted = match candidate.side {
            Side::Long => broker.open_long(symbol, shares),
            Side::Short => broker.open_short(symbol, shares),
        };

        match submitted {
            Ok(()) => {
                gate.record_open(shares as f64 * price);
                mark_traded(store, symbol, today);
                info!(symbol, side = %candidate.side, shares, "opened position");
                report.opened.push(OpenedPosition {
                    symbol: symbol.to_string(),
                    side: candidate.side,
                    shares,
                    price,
                });
            }
            Err(e) => {
                warn!(symbol, side = %candidate.side, error = %e, "open failed");
                report.failed.push(FailedOrder {
                    symbol: symbol.to_string(),
                    reason: e.to_string(),
                });
            }
        }
    }

    report.trades = gate.trades();
    report
}

fn mark_traded(store: &mut Store, symbol: &str, today: NaiveDate) {
    if let Some(record) = store.get_mut(symbol) {
        record.last_trade_date = Some(today);
    }
}
