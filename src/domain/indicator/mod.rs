//! Momentum indicators computed from a symbol's close history.
//!
//! - `sma`: simple moving average of the trailing window
//! - `roc`: fractional rate of change over a fixed lookback
//! - [`Indicators`]: the snapshot stored per symbol and fed to the scorer

pub mod roc;
pub mod sma;

use serde::{Deserialize, Serialize};

use crate::domain::params::Params;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Indicators {
    pub sma_fast: f64,
    pub sma_slow: f64,
    pub roc: f64,
}

/// Compute the indicator snapshot for a chronological close series.
///
/// Returns `None` when the series is shorter than `params.sma_slow`; callers
/// treat that as "score invalid", not as an error.
pub fn compute_indicators(prices: &[f64], params: &Params) -> Option<Indicators> {
    if prices.len() < params.sma_slow {
        return None;
    }

    let sma_fast = sma::latest_sma(prices, params.sma_fast)?;
    let sma_slow = sma::latest_sma(prices, params.sma_slow)?;
    let roc = roc::latest_roc(prices, params.roc_period);

    Some(Indicators {
        sma_fast,
        sma_slow,
        roc,
    })
}
