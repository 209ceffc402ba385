//! Momentum scoring.
//!
//! score = 2 * [close > SMA slow] + [SMA fast > SMA slow] + [ROC > 0]

use crate::domain::indicator::Indicators;

/// Stored in place of a score when a symbol lacks enough history.
pub const SCORE_INVALID: i32 = -999;

pub const MAX_SCORE: u8 = 4;

pub fn score(latest: f64, indicators: &Indicators) -> u8 {
    let mut score = 0;
    if latest > indicators.sma_slow {
        score += 2;
    }
    if indicators.sma_fast > indicators.sma_slow {
        score += 1;
    }
    if indicators.roc > 0.0 {
        score += 1;
    }
    score
}
