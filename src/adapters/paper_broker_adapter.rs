//! Local paper broker: a JSON ledger of cash and positions.
//!
//! Orders fill immediately at the market data source's latest close. Longs
//! debit cash, shorts credit it; equity is cash plus long value minus short
//! value. The ledger is rewritten after every fill.

use crate::domain::account::AccountSummary;
use crate::domain::error::RotatraderError;
use crate::domain::portfolio::Portfolio;
use crate::domain::position::Position;
use crate::ports::broker_port::BrokerPort;
use crate::ports::market_data_port::MarketDataPort;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ledger {
    pub cash: f64,
    #[serde(default)]
    pub positions: BTreeMap<String, Position>,
}

impl Ledger {
    pub fn new(cash: f64) -> Self {
        Ledger {
            cash,
            positions: BTreeMap::new(),
        }
    }
}

pub struct PaperBrokerAdapter<'a> {
    path: PathBuf,
    ledger: RefCell<Ledger>,
    market_data: &'a dyn MarketDataPort,
}

fn broker_error(reason: impl Into<String>) -> RotatraderError {
    RotatraderError::Broker {
        reason: reason.into(),
    }
}

impl<'a> PaperBrokerAdapter<'a> {
    /// Open the ledger at `path`, starting a fresh one funded with
    /// `initial_cash` if none exists.
    pub fn open(
        path: impl Into<PathBuf>,
        initial_cash: f64,
        market_data: &'a dyn MarketDataPort,
    ) -> Result<Self, RotatraderError> {
        let path = path.into();
        let ledger = match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).map_err(|e| {
                broker_error(format!("malformed ledger {}: {e}", path.display()))
            })?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(path = %path.display(), initial_cash, "starting new paper ledger");
                Ledger::new(initial_cash)
            }
            Err(e) => {
                return Err(broker_error(format!(
                    "failed to read ledger {}: {e}",
                    path.display()
                )));
            }
        };
        Ok(Self {
            path,
            ledger: RefCell::new(ledger),
            market_data,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn ledger(&self) -> Ledger {
        self.ledger.borrow().clone()
    }

    fn fill_price(&self, symbol: &str) -> Result<f64, RotatraderError> {
        match self.market_data.latest_close(symbol)? {
            Some(quote) if quote.is_usable() => Ok(quote.close),
            _ => Err(broker_error(format!("no price to fill {symbol}"))),
        }
    }

    /// Write `ledger` to disk, then make it the in-memory ledger. A failed
    /// write leaves the previous ledger in place.
    fn commit(&self, ledger: Ledger) -> Result<(), RotatraderError> {
        let json = serde_json::to_string_pretty(&ledger)
            .map_err(|e| broker_error(format!("failed to serialise ledger: {e}")))?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)
            .and_then(|()| fs::rename(&tmp, &self.path))
            .map_err(|e| broker_error(format!("failed to write {}: {e}", self.path.display())))?;
        *self.ledger.borrow_mut() = ledger;
        Ok(())
    }

    fn open_position(&self, symbol: &str, position: Position) -> Result<(), RotatraderError> {
        if position.shares == 0 {
            return Err(broker_error(format!("{symbol}: order for zero shares")));
        }
        if self.ledger.borrow().positions.contains_key(symbol) {
            return Err(broker_error(format!("{symbol}: position already open")));
        }

        let notional = position.shares as f64 * position.entry_price;
        let mut ledger = self.ledger();
        if position.is_long() {
            ledger.cash -= notional;
        } else {
            ledger.cash += notional;
        }
        ledger.positions.insert(symbol.to_string(), position);
        self.commit(ledger)?;
        info!(
            symbol,
            side = %position.side,
            shares = position.shares,
            price = position.entry_price,
            "paper fill"
        );
        Ok(())
    }

    fn mark(&self, symbol: &str, pos: &Position) -> f64 {
        self.market_data
            .latest_close(symbol)
            .ok()
            .flatten()
            .filter(|q| q.is_usable())
            .map_or(pos.entry_price, |q| q.close)
    }
}

impl BrokerPort for PaperBrokerAdapter<'_> {
    fn current_positions(&self) -> Result<Portfolio, RotatraderError> {
        Ok(Portfolio {
            positions: self.ledger.borrow().positions.clone(),
        })
    }

    fn account(&self) -> Result<AccountSummary, RotatraderError> {
        let ledger = self.ledger.borrow();
        let equity = ledger.positions.iter().fold(ledger.cash, |acc, (symbol, pos)| {
            let value = pos.market_value(self.mark(symbol, pos));
            if pos.is_long() { acc + value } else { acc - value }
        });
        Ok(AccountSummary {
            status: "ACTIVE".to_string(),
            cash: ledger.cash,
            buying_power: ledger.cash.max(0.0),
            portfolio_value: equity,
        })
    }

    fn close_position(&self, symbol: &str) -> Result<(), RotatraderError> {
        let price = self.fill_price(symbol)?;
        let mut ledger = self.ledger();
        let pos = ledger
            .positions
            .remove(symbol)
            .ok_or_else(|| broker_error(format!("{symbol}: no open position")))?;
        let value = pos.market_value(price);
        if pos.is_long() {
            ledger.cash += value;
        } else {
            ledger.cash -= value;
        }
        self.commit(ledger)?;
        info!(symbol, price, "paper close");
        Ok(())
    }

    fn open_long(&self, symbol: &str, shares: u64) -> Result<(), RotatraderError> {
        let price = self.fill_price(symbol)?;
        self.open_position(symbol, Position::long(shares, price))
    }

    fn open_short(&self, symbol: &str, shares: u64) -> Result<(), RotatraderError> {
        let price = self.fill_price(symbol)?;
        self.open_position(symbol, Position::short(shares, price))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::daily_close::DailyClose;
    use chrono::NaiveDate;
    use std::collections::HashMap;
    use tempfile::TempDir;

    struct Quotes(RefCell<HashMap<String, f64>>);

    impl Quotes {
        fn new(prices: &[(&str, f64)]) -> Self {
            Quotes(RefCell::new(
                prices.iter().map(|&(s, p)| (s.to_string(), p)).collect(),
            ))
        }

        fn set(&self, symbol: &str, price: f64) {
            self.0.borrow_mut().insert(symbol.to_string(), price);
        }
    }

    impl MarketDataPort for Quotes {
        fn latest_close(&self, symbol: &str) -> Result<Option<DailyClose>, RotatraderError> {
            let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
            Ok(self.0.borrow().get(symbol).map(|&p| DailyClose::new(date, p)))
        }

        fn historical_closes(
            &self,
            _symbol: &str,
            _lookback_days: usize,
        ) -> Result<Vec<DailyClose>, RotatraderError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn new_ledger_starts_with_cash() {
        let dir = TempDir::new().unwrap();
        let quotes = Quotes::new(&[]);
        let broker =
            PaperBrokerAdapter::open(dir.path().join("ledger.json"), 10_000.0, &quotes).unwrap();

        let account = broker.account().unwrap();
        assert_eq!(account.cash, 10_000.0);
        assert_eq!(account.portfolio_value, 10_000.0);
        assert_eq!(broker.current_positions().unwrap().position_count(), 0);
    }

    #[test]
    fn long_and_short_accounting() {
        let dir = TempDir::new().unwrap();
        let quotes = Quotes::new(&[("TQQQ", 50.0), ("SOXL", 20.0)]);
        let broker =
            PaperBrokerAdapter::open(dir.path().join("ledger.json"), 10_000.0, &quotes).unwrap();

        broker.open_long("TQQQ", 60).unwrap();
        broker.open_short("SOXL", 100).unwrap();
        // 10000 - 3000 + 2000
        assert_eq!(broker.account().unwrap().cash, 9_000.0);
        assert_eq!(broker.account().unwrap().portfolio_value, 10_000.0);

        quotes.set("TQQQ", 55.0);
        quotes.set("SOXL", 18.0);
        // 9000 + 60*55 - 100*18
        assert_eq!(broker.account().unwrap().portfolio_value, 10_500.0);

        broker.close_position("SOXL").unwrap();
        assert_eq!(broker.account().unwrap().cash, 7_200.0);
        let positions = broker.current_positions().unwrap();
        assert!(positions.has_position("TQQQ"));
        assert!(!positions.has_position("SOXL"));
    }

    #[test]
    fn ledger_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.json");
        let quotes = Quotes::new(&[("UPRO", 100.0)]);

        {
            let broker = PaperBrokerAdapter::open(&path, 10_000.0, &quotes).unwrap();
            broker.open_short("UPRO", 30).unwrap();
        }

        let reopened = PaperBrokerAdapter::open(&path, 1.0, &quotes).unwrap();
        let ledger = reopened.ledger();
        assert_eq!(ledger.cash, 13_000.0);
        assert_eq!(ledger.positions["UPRO"], Position::short(30, 100.0));
    }

    #[test]
    fn rejects_unfillable_orders() {
        let dir = TempDir::new().unwrap();
        let quotes = Quotes::new(&[("TQQQ", 50.0)]);
        let broker =
            PaperBrokerAdapter::open(dir.path().join("ledger.json"), 10_000.0, &quotes).unwrap();

        assert!(broker.open_long("NOPE", 1).is_err());
        assert!(broker.close_position("TQQQ").is_err());
        broker.open_long("TQQQ", 1).unwrap();
        assert!(broker.open_short("TQQQ", 1).is_err());
        assert!(broker.open_long("TQQQ", 0).is_err());
    }

    #[test]
    fn failed_write_leaves_ledger_untouched() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("ledger.json");
        let quotes = Quotes::new(&[("TQQQ", 50.0)]);
        let broker = PaperBrokerAdapter::open(&path, 10_000.0, &quotes).unwrap();

        assert!(broker.open_long("TQQQ", 10).is_err());
        assert_eq!(broker.ledger(), Ledger::new(10_000.0));
        assert!(!broker.current_positions().unwrap().has_position("TQQQ"));
    }

    #[test]
    fn failed_close_keeps_position() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("books");
        fs::create_dir(&sub).unwrap();
        let quotes = Quotes::new(&[("TQQQ", 50.0)]);
        let broker = PaperBrokerAdapter::open(sub.join("ledger.json"), 10_000.0, &quotes).unwrap();
        broker.open_long("TQQQ", 10).unwrap();
        let before = broker.ledger();

        fs::remove_dir_all(&sub).unwrap();
        assert!(broker.close_position("TQQQ").is_err());
        assert_eq!(broker.ledger(), before);
    }

    #[test]
    fn malformed_ledger_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.json");
        fs::write(&path, "[]").unwrap();
        let quotes = Quotes::new(&[]);
        assert!(PaperBrokerAdapter::open(&path, 1.0, &quotes).is_err());
    }
}
