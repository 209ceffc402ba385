//! Market data port trait.

use crate::domain::daily_close::DailyClose;
use crate::domain::error::RotatraderError;

pub trait MarketDataPort {
    /// Most recent daily close, `Ok(None)` when the source has nothing.
    fn latest_close(&self, symbol: &str) -> Result<Option<DailyClose>, RotatraderError>;

    /// Up to `lookback_days` most recent daily closes, oldest first.
    fn historical_closes(
        &self,
        symbol: &str,
        lookback_days: usize,
    ) -> Result<Vec<DailyClose>, RotatraderError>;
}
