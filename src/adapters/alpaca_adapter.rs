//! Alpaca REST adapter: trading API for the broker port, market data API
//! for daily bars.
//!
//! Watchlist crypto pairs are written `BTC-USD`; Alpaca's data and order
//! endpoints want `BTC/USD` and its positions report `BTCUSD`. Symbols are
//! translated at this boundary so the rest of the crate only sees the
//! watchlist spelling.

use crate::domain::account::AccountSummary;
use crate::domain::daily_close::DailyClose;
use crate::domain::error::RotatraderError;
use crate::domain::portfolio::Portfolio;
use crate::domain::position::Position;
use crate::ports::broker_port::BrokerPort;
use crate::ports::market_data_port::MarketDataPort;
use chrono::{DateTime, Duration as DateDuration, Local, NaiveDate};
use reqwest::blocking::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

pub const PAPER_BASE_URL: &str = "https://paper-api.alpaca.markets";
pub const LIVE_BASE_URL: &str = "https://api.alpaca.markets";
pub const DATA_BASE_URL: &str = "https://data.alpaca.markets";

/// Calendar days fetched per trading day requested; covers weekends and
/// holidays.
const CALENDAR_FACTOR: i64 = 2;
const LATEST_LOOKBACK: usize = 10;
const MAX_LOOKBACK: usize = 5_000;

pub struct AlpacaAdapter {
    client: Client,
    key_id: String,
    secret_key: String,
    base_url: String,
    data_url: String,
}

#[derive(Debug, Deserialize)]
struct AccountResponse {
    status: String,
    #[serde(deserialize_with = "number_string")]
    cash: f64,
    #[serde(deserialize_with = "number_string")]
    buying_power: f64,
    #[serde(deserialize_with = "number_string")]
    portfolio_value: f64,
}

#[derive(Debug, Deserialize)]
struct PositionResponse {
    symbol: String,
    #[serde(deserialize_with = "number_string")]
    qty: f64,
    #[serde(deserialize_with = "number_string")]
    avg_entry_price: f64,
    #[serde(default)]
    asset_class: String,
}

#[derive(Debug, Deserialize)]
struct Bar {
    t: String,
    c: f64,
}

#[derive(Debug, Deserialize)]
struct StockBarsResponse {
    #[serde(default)]
    bars: Option<Vec<Bar>>,
}

#[derive(Debug, Deserialize)]
struct CryptoBarsResponse {
    #[serde(default)]
    bars: HashMap<String, Vec<Bar>>,
}

#[derive(Debug, Serialize)]
struct OrderRequest<'a> {
    symbol: &'a str,
    qty: String,
    side: &'a str,
    #[serde(rename = "type")]
    order_type: &'a str,
    time_in_force: &'a str,
}

/// Alpaca sends most numbers as JSON strings.
fn number_string<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(f64),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

pub fn is_crypto(symbol: &str) -> bool {
    symbol.contains('-') || symbol.contains('/')
}

/// `BTC-USD` -> `BTC/USD`; stock tickers unchanged.
pub fn api_symbol(symbol: &str) -> String {
    symbol.replace('-', "/")
}

/// Position symbols back to watchlist spelling: `BTCUSD` -> `BTC-USD`.
fn watchlist_symbol(symbol: &str, asset_class: &str) -> String {
    if let Some((base, quote)) = symbol.split_once('/') {
        return format!("{base}-{quote}");
    }
    if asset_class == "crypto" {
        for quote in ["USDT", "USDC", "USD"] {
            if let Some(base) = symbol.strip_suffix(quote).filter(|b| !b.is_empty()) {
                return format!("{base}-{quote}");
            }
        }
    }
    symbol.to_string()
}

fn bar_date(bar: &Bar) -> Option<NaiveDate> {
    DateTime::parse_from_rfc3339(&bar.t)
        .ok()
        .map(|dt| dt.date_naive())
}

fn to_closes(symbol: &str, bars: Vec<Bar>) -> Vec<DailyClose> {
    let mut closes: Vec<DailyClose> = bars
        .into_iter()
        .filter_map(|bar| match bar_date(&bar) {
            Some(date) => Some(DailyClose::new(date, bar.c)),
            None => {
                warn!(symbol, timestamp = %bar.t, "unparseable bar timestamp");
                None
            }
        })
        .collect();
    closes.sort_by_key(|c| c.date);
    closes
}

fn to_position(resp: &PositionResponse) -> Option<(String, Position)> {
    // Fractional holdings (crypto) count as at least one unit so the
    // strategy still sees the symbol as held.
    let shares = resp.qty.abs().ceil() as u64;
    if shares == 0 {
        return None;
    }
    let position = if resp.qty > 0.0 {
        Position::long(shares, resp.avg_entry_price)
    } else {
        Position::short(shares, resp.avg_entry_price)
    };
    Some((watchlist_symbol(&resp.symbol, &resp.asset_class), position))
}

fn broker_error(reason: impl Into<String>) -> RotatraderError {
    RotatraderError::Broker {
        reason: reason.into(),
    }
}

fn market_error(symbol: &str, reason: impl Into<String>) -> RotatraderError {
    RotatraderError::MarketData {
        symbol: symbol.to_string(),
        reason: reason.into(),
    }
}

impl AlpacaAdapter {
    pub fn new(
        key_id: &str,
        secret_key: &str,
        base_url: &str,
        data_url: &str,
    ) -> Result<Self, RotatraderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| broker_error(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            key_id: key_id.to_string(),
            secret_key: secret_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            data_url: data_url.trim_end_matches('/').to_string(),
        })
    }

    fn authed(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("APCA-API-KEY-ID", &self.key_id)
            .header("APCA-API-SECRET-KEY", &self.secret_key)
    }

    fn send(&self, request: RequestBuilder) -> Result<reqwest::blocking::Response, String> {
        let resp = self.authed(request).send().map_err(|e| e.to_string())?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().unwrap_or_default();
        Err(format!("HTTP {status}: {}", body.trim()))
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, String> {
        debug!(url, "GET");
        self.send(self.client.get(url))?
            .json()
            .map_err(|e| format!("unexpected response: {e}"))
    }

    fn submit_order(&self, symbol: &str, shares: u64, side: &str) -> Result<(), RotatraderError> {
        let crypto = is_crypto(symbol);
        let pair = api_symbol(symbol);
        let order = OrderRequest {
            symbol: &pair,
            qty: shares.to_string(),
            side,
            order_type: "market",
            time_in_force: if crypto { "gtc" } else { "day" },
        };
        let url = format!("{}/v2/orders", self.base_url);
        debug!(url = %url, symbol, shares, side, "POST order");
        self.send(self.client.post(&url).json(&order))
            .map(|_| ())
            .map_err(|e| broker_error(format!("{side} {symbol} x {shares}: {e}")))
    }

    fn daily_bars(&self, symbol: &str, start: NaiveDate) -> Result<Vec<DailyClose>, RotatraderError> {
        let start = start.format("%Y-%m-%d");
        if is_crypto(symbol) {
            let pair = api_symbol(symbol);
            let url = format!(
                "{}/v1beta3/crypto/us/bars?symbols={pair}&timeframe=1Day&start={start}&limit=10000&sort=asc",
                self.data_url
            );
            let mut resp: CryptoBarsResponse =
                self.get_json(&url).map_err(|e| market_error(symbol, e))?;
            Ok(to_closes(symbol, resp.bars.remove(&pair).unwrap_or_default()))
        } else {
            let url = format!(
                "{}/v2/stocks/{symbol}/bars?timeframe=1Day&start={start}&limit=10000&adjustment=raw&feed=iex&sort=asc",
                self.data_url
            );
            let resp: StockBarsResponse =
                self.get_json(&url).map_err(|e| market_error(symbol, e))?;
            Ok(to_closes(symbol, resp.bars.unwrap_or_default()))
        }
    }
}

impl BrokerPort for AlpacaAdapter {
    fn current_positions(&self) -> Result<Portfolio, RotatraderError> {
        let url = format!("{}/v2/positions", self.base_url);
        let positions: Vec<PositionResponse> = self.get_json(&url).map_err(broker_error)?;
        let mut portfolio = Portfolio::new();
        for (symbol, position) in positions.iter().filter_map(to_position) {
            portfolio.add_position(&symbol, position);
        }
        Ok(portfolio)
    }

    fn account(&self) -> Result<AccountSummary, RotatraderError> {
        let url = format!("{}/v2/account", self.base_url);
        let account: AccountResponse = self.get_json(&url).map_err(broker_error)?;
        Ok(AccountSummary {
            status: account.status,
            cash: account.cash,
            buying_power: account.buying_power,
            portfolio_value: account.portfolio_value,
        })
    }

    fn close_position(&self, symbol: &str) -> Result<(), RotatraderError> {
        let url = format!(
            "{}/v2/positions/{}",
            self.base_url,
            api_symbol(symbol).replace('/', "")
        );
        debug!(url = %url, symbol, "DELETE position");
        self.send(self.client.delete(&url))
            .map(|_| ())
            .map_err(|e| broker_error(format!("close {symbol}: {e}")))
    }

    fn open_long(&self, symbol: &str, shares: u64) -> Result<(), RotatraderError> {
        self.submit_order(symbol, shares, "buy")
    }

    fn open_short(&self, symbol: &str, shares: u64) -> Result<(), RotatraderError> {
        self.submit_order(symbol, shares, "sell")
    }
}

impl MarketDataPort for AlpacaAdapter {
    fn latest_close(&self, symbol: &str) -> Result<Option<DailyClose>, RotatraderError> {
        Ok(self.historical_closes(symbol, LATEST_LOOKBACK)?.pop())
    }

    fn historical_closes(
        &self,
        symbol: &str,
        lookback_days: usize,
    ) -> Result<Vec<DailyClose>, RotatraderError> {
        let span = lookback_days.clamp(1, MAX_LOOKBACK) as i64 * CALENDAR_FACTOR;
        let start = Local::now().date_naive() - DateDuration::days(span);
        let mut closes = self.daily_bars(symbol, start)?;
        let skip = closes.len().saturating_sub(lookback_days);
        closes.drain(..skip);
        Ok(closes)
    }
}
