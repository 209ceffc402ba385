//! Broker port trait: position ledger, account and order submission.

use crate::domain::account::AccountSummary;
use crate::domain::error::RotatraderError;
use crate::domain::portfolio::Portfolio;

pub trait BrokerPort {
    fn current_positions(&self) -> Result<Portfolio, RotatraderError>;

    fn account(&self) -> Result<AccountSummary, RotatraderError>;

    fn portfolio_value(&self) -> Result<f64, RotatraderError> {
        Ok(self.account()?.portfolio_value)
    }

    /// Submit a full close of the position. `Ok` means submitted, not filled.
    fn close_position(&self, symbol: &str) -> Result<(), RotatraderError>;

    fn open_long(&self, symbol: &str, shares: u64) -> Result<(), RotatraderError>;

    fn open_short(&self, symbol: &str, shares: u64) -> Result<(), RotatraderError>;
}
