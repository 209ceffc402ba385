//! SMA (Simple Moving Average) over the tail of a close series.
//!
//! SMA(n) = mean of the last n closes.
//! Fewer than n closes (or n == 0): no value.

pub fn latest_sma(prices: &[f64], period: usize) -> Option<f64> {
    if period == 0 || prices.len() < period {
        return None;
    }
    let window = &prices[prices.len() - period..];
    Some(window.iter().sum::<f64>() / period as f64)
}
