#![allow(dead_code)]

use chrono::NaiveDate;
use rotatrader::domain::account::AccountSummary;
use rotatrader::domain::daily_close::DailyClose;
use rotatrader::domain::error::RotatraderError;
use rotatrader::domain::portfolio::Portfolio;
use rotatrader::domain::position::Position;
use rotatrader::domain::symbol_record::{Store, SymbolRecord};
use rotatrader::ports::broker_port::BrokerPort;
use rotatrader::ports::market_data_port::MarketDataPort;
use rotatrader::ports::store_port::StorePort;
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn today() -> NaiveDate {
    date(2024, 3, 15)
}

/// Closes dated on consecutive days, the last one on `end`.
pub fn dated(closes: &[f64], end: NaiveDate) -> Vec<DailyClose> {
    let n = closes.len() as i64;
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| DailyClose::new(end - chrono::Duration::days(n - 1 - i as i64), c))
        .collect()
}

/// 110 closes rising from 10 to 119. Scores 4.
pub fn rising() -> Vec<f64> {
    (0..110).map(|i| 10.0 + i as f64).collect()
}

/// 1..=100 then ten days sliding back to 90: above both averages, negative
/// rate of change. Scores 3.
pub fn pulled_back() -> Vec<f64> {
    let mut closes: Vec<f64> = (1..=100).map(f64::from).collect();
    closes.extend((90..=99).rev().map(f64::from));
    closes
}

/// 200 down to 101, then ten days up to 111: below both averages, positive
/// rate of change. Scores 1.
pub fn rebounding() -> Vec<f64> {
    let mut closes: Vec<f64> = (0..100).map(|i| 200.0 - i as f64).collect();
    closes.extend((102..=111).map(f64::from));
    closes
}

/// 110 closes falling from 200 to 91. Scores 0.
pub fn falling() -> Vec<f64> {
    (0..110).map(|i| 200.0 - i as f64).collect()
}

/// A record as it looks after today's refresh.
pub fn record_for(closes: &[f64], last_trade: Option<NaiveDate>) -> SymbolRecord {
    SymbolRecord {
        last_close_date: Some(today()),
        last_trade_date: last_trade,
        ..SymbolRecord::with_prices(closes.to_vec())
    }
}

pub struct MockMarketData {
    pub bars: HashMap<String, Vec<DailyClose>>,
    pub errors: HashMap<String, String>,
    pub history_errors: HashSet<String>,
}

impl MockMarketData {
    pub fn new() -> Self {
        Self {
            bars: HashMap::new(),
            errors: HashMap::new(),
            history_errors: HashSet::new(),
        }
    }

    pub fn with_closes(mut self, symbol: &str, closes: &[f64], end: NaiveDate) -> Self {
        self.bars.insert(symbol.to_string(), dated(closes, end));
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }

    /// Latest quote works, history fetch fails.
    pub fn with_history_error(mut self, symbol: &str) -> Self {
        self.history_errors.insert(symbol.to_string());
        self
    }

    /// The standard four-symbol universe ending today.
    pub fn abcd() -> Self {
        Self::new()
            .with_closes("A", &rising(), today())
            .with_closes("B", &pulled_back(), today())
            .with_closes("C", &falling(), today())
            .with_closes("D", &rebounding(), today())
    }

    fn check(&self, symbol: &str) -> Result<(), RotatraderError> {
        match self.errors.get(symbol) {
            Some(reason) => Err(RotatraderError::MarketData {
                symbol: symbol.to_string(),
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl MarketDataPort for MockMarketData {
    fn latest_close(&self, symbol: &str) -> Result<Option<DailyClose>, RotatraderError> {
        self.check(symbol)?;
        Ok(self.bars.get(symbol).and_then(|b| b.last().copied()))
    }

    fn historical_closes(
        &self,
        symbol: &str,
        lookback_days: usize,
    ) -> Result<Vec<DailyClose>, RotatraderError> {
        self.check(symbol)?;
        if self.history_errors.contains(symbol) {
            return Err(RotatraderError::MarketData {
                symbol: symbol.to_string(),
                reason: "history unavailable".into(),
            });
        }
        let bars = self.bars.get(symbol).cloned().unwrap_or_default();
        let skip = bars.len().saturating_sub(lookback_days);
        Ok(bars[skip..].to_vec())
    }
}

/// Records every submitted order as `"close X"`, `"long X n"`, `"short X n"`
/// and applies accepted orders to its own positions.
pub struct MockBroker {
    pub positions: RefCell<Portfolio>,
    pub orders: RefCell<Vec<String>>,
    pub portfolio_value: f64,
    pub fill_prices: HashMap<String, f64>,
    pub rejects: HashSet<String>,
    pub positions_error: bool,
    pub calls: Cell<usize>,
}

impl MockBroker {
    pub fn new(portfolio_value: f64) -> Self {
        Self {
            positions: RefCell::new(Portfolio::new()),
            orders: RefCell::new(Vec::new()),
            portfolio_value,
            fill_prices: HashMap::new(),
            rejects: HashSet::new(),
            positions_error: false,
            calls: Cell::new(0),
        }
    }

    pub fn with_position(self, symbol: &str, position: Position) -> Self {
        self.positions.borrow_mut().add_position(symbol, position);
        self
    }

    pub fn with_fill_price(mut self, symbol: &str, price: f64) -> Self {
        self.fill_prices.insert(symbol.to_string(), price);
        self
    }

    pub fn rejecting(mut self, symbol: &str) -> Self {
        self.rejects.insert(symbol.to_string());
        self
    }

    pub fn failing_positions(mut self) -> Self {
        self.positions_error = true;
        self
    }

    pub fn orders(&self) -> Vec<String> {
        self.orders.borrow().clone()
    }

    fn submit(&self, symbol: &str, order: String) -> Result<(), RotatraderError> {
        self.calls.set(self.calls.get() + 1);
        if self.rejects.contains(symbol) {
            return Err(RotatraderError::Broker {
                reason: format!("{symbol} rejected"),
            });
        }
        self.orders.borrow_mut().push(order);
        Ok(())
    }

    fn fill(&self, symbol: &str) -> f64 {
        self.fill_prices.get(symbol).copied().unwrap_or(1.0)
    }
}

impl BrokerPort for MockBroker {
    fn current_positions(&self) -> Result<Portfolio, RotatraderError> {
        if self.positions_error {
            return Err(RotatraderError::Broker {
                reason: "positions unavailable".into(),
            });
        }
        Ok(self.positions.borrow().clone())
    }

    fn account(&self) -> Result<AccountSummary, RotatraderError> {
        Ok(AccountSummary {
            status: "ACTIVE".into(),
            cash: self.portfolio_value,
            buying_power: self.portfolio_value,
            portfolio_value: self.portfolio_value,
        })
    }

    fn close_position(&self, symbol: &str) -> Result<(), RotatraderError> {
        self.submit(symbol, format!("close {symbol}"))?;
        self.positions.borrow_mut().remove_position(symbol);
        Ok(())
    }

    fn open_long(&self, symbol: &str, shares: u64) -> Result<(), RotatraderError> {
        self.submit(symbol, format!("long {symbol} {shares}"))?;
        let pos = Position::long(shares, self.fill(symbol));
        self.positions.borrow_mut().add_position(symbol, pos);
        Ok(())
    }

    fn open_short(&self, symbol: &str, shares: u64) -> Result<(), RotatraderError> {
        self.submit(symbol, format!("short {symbol} {shares}"))?;
        let pos = Position::short(shares, self.fill(symbol));
        self.positions.borrow_mut().add_position(symbol, pos);
        Ok(())
    }
}

pub struct MemoryStore {
    pub store: RefCell<Store>,
    pub saves: Cell<usize>,
    pub load_error: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            store: RefCell::new(Store::new()),
            saves: Cell::new(0),
            load_error: false,
        }
    }

    pub fn with_record(self, symbol: &str, record: SymbolRecord) -> Self {
        self.store.borrow_mut().insert(symbol, record);
        self
    }

    pub fn failing_load(mut self) -> Self {
        self.load_error = true;
        self
    }

    pub fn snapshot(&self) -> Store {
        self.store.borrow().clone()
    }
}

impl StorePort for MemoryStore {
    fn load(&self) -> Result<Store, RotatraderError> {
        if self.load_error {
            return Err(RotatraderError::Store {
                reason: "malformed store".into(),
            });
        }
        Ok(self.store.borrow().clone())
    }

    fn save(&self, store: &Store) -> Result<(), RotatraderError> {
        self.saves.set(self.saves.get() + 1);
        *self.store.borrow_mut() = store.clone();
        Ok(())
    }
}
