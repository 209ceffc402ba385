//! ROC (Rate of Change) at the end of a close series.
//!
//! ROC(n) = (C[last] - C[last-n]) / C[last-n], as a fraction.
//! The base is exactly n elapsed bars back (index len-1-n).
//! If that index is before the start of the series: ROC = 0
//! If C[last-n] == 0: ROC = 0

pub fn latest_roc(prices: &[f64], period: usize) -> f64 {
    let Some(&current) = prices.last() else {
        return 0.0;
    };
    if period >= prices.len() {
        return 0.0;
    }

    let base = prices[prices.len() - 1 - period];
    if base == 0.0 {
        0.0
    } else {
        (current - base) / base
    }
}
