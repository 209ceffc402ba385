//! Strategy and risk parameters for one run.

/// Immutable run configuration, built once at startup and passed by reference.
#[derive(Debug, Clone, PartialEq)]
pub struct Params {
    pub sma_fast: usize,
    pub sma_slow: usize,
    pub roc_period: usize,
    pub top_longs: usize,
    pub bottom_shorts: usize,
    /// Fractional gain that triggers a take-profit exit (0.10 = 10%).
    pub take_profit_pct: f64,
    pub cooldown_days: i64,
    pub max_trades_per_day: usize,
    /// Fraction of portfolio value allocated to each new position.
    pub max_position_pct: f64,
    /// Ceiling on gross exposure as a multiple of portfolio value.
    pub max_gross_exposure: f64,
}

impl Default for Params {
    fn default() -> Self {
        Params {
            sma_fast: 20,
            sma_slow: 50,
            roc_period: 10,
            top_longs: 2,
            bottom_shorts: 1,
            take_profit_pct: 0.10,
            cooldown_days: 2,
            max_trades_per_day: 10,
            max_position_pct: 0.30,
            max_gross_exposure: 1.5,
        }
    }
}
