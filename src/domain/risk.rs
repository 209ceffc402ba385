//! Sequential risk gates applied while executing a decision.
//!
//! Per symbol to open, in order:
//! 1. trade cap: stop once `max_trades_per_day` trades were submitted
//! 2. exposure: gross exposure must be below `max_gross_exposure` before the
//!    open; the size of the new position is not part of the check
//! 3. sizing: floor(portfolio_value * max_position_pct / price) shares, skip at 0
//!
//! The gate keeps running totals, so callers record every submitted trade.

use crate::domain::params::Params;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OpenVerdict {
    Open { shares: u64 },
    /// Sizing rounds to zero shares; skip this symbol only.
    TooSmall,
    /// Daily trade cap reached; no further opens this run.
    TradeCapReached,
    /// Exposure limit reached or would be breached; no further opens this run.
    ExposureLimit,
}

impl OpenVerdict {
    pub fn halts_run(&self) -> bool {
        matches!(self, OpenVerdict::TradeCapReached | OpenVerdict::ExposureLimit)
    }
}

#[derive(Debug, Clone)]
pub struct RiskGate<'a> {
    params: &'a Params,
    portfolio_value: f64,
    gross_notional: f64,
    trades: usize,
}

impl<'a> RiskGate<'a> {
    pub fn new(params: &'a Params, portfolio_value: f64, gross_notional: f64) -> Self {
        RiskGate {
            params,
            portfolio_value,
            gross_notional,
            trades: 0,
        }
    }

    pub fn trades(&self) -> usize {
        self.trades
    }

    pub fn gross_notional(&self) -> f64 {
        self.gross_notional
    }

    /// Gross notional over portfolio value. A non-positive portfolio value
    /// has unbounded exposure.
    pub fn gross_exposure(&self) -> f64 {
        if self.portfolio_value > 0.0 {
            self.gross_notional / self.portfolio_value
        } else {
            f64::INFINITY
        }
    }

    pub fn trade_cap_reached(&self) -> bool {
        self.trades >= self.params.max_trades_per_day
    }

    pub fn position_size(&self, price: f64) -> u64 {
        if !(price > 0.0) || !(self.portfolio_value > 0.0) {
            return 0;
        }
        let shares = (self.portfolio_value * self.params.max_position_pct / price).floor();
        if shares >= 1.0 { shares as u64 } else { 0 }
    }

    pub fn check_open(&self, price: f64) -> OpenVerdict {
        if self.trade_cap_reached() {
            return OpenVerdict::TradeCapReached;
        }
        if !(self.gross_exposure() < self.params.max_gross_exposure) {
            return OpenVerdict::ExposureLimit;
        }

        let shares = self.position_size(price);
        if shares == 0 {
            return OpenVerdict::TooSmall;
        }
        OpenVerdict::Open { shares }
    }

    /// A close was submitted; its notional no longer counts.
    pub fn record_close(&mut self, notional: f64) {
        self.trades += 1;
        self.gross_notional = (self.gross_notional - notional).max(0.0);
    }

    /// An open was submitted for `notional` (shares * price).
    pub fn record_open(&mut self, notional: f64) {
        self.trades += 1;
        self.gross_notional += notional;
    }
}
