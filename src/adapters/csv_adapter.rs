//! CSV daily close adapter.
//!
//! One file per symbol, `<dir>/<SYMBOL>.csv`, with a header row naming at
//! least `date` and `close` columns (any order, extra columns ignored).
//! Crypto pairs use a dash in the file name: `BTC/USD` reads `BTC-USD.csv`.

use crate::domain::daily_close::DailyClose;
use crate::domain::error::RotatraderError;
use crate::ports::market_data_port::MarketDataPort;
use chrono::NaiveDate;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::debug;

pub struct CsvMarketDataAdapter {
    base_path: PathBuf,
    /// Rows after this date are invisible, for replaying a past day.
    as_of: Option<NaiveDate>,
}

impl CsvMarketDataAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self {
            base_path,
            as_of: None,
        }
    }

    pub fn with_as_of(mut self, as_of: NaiveDate) -> Self {
        self.as_of = Some(as_of);
        self
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path
            .join(format!("{}.csv", symbol.replace('/', "-")))
    }

    /// All rows for `symbol`, oldest first. A missing file has no rows.
    fn read_closes(&self, symbol: &str) -> Result<Vec<DailyClose>, RotatraderError> {
        let path = self.csv_path(symbol);
        let content = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(symbol, path = %path.display(), "no csv file");
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(market_error(
                    symbol,
                    format!("failed to read {}: {}", path.display(), e),
                ));
            }
        };

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr
            .headers()
            .map_err(|e| market_error(symbol, format!("CSV header error: {e}")))?
            .clone();
        let column = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
                .ok_or_else(|| market_error(symbol, format!("missing {name} column")))
        };
        let date_col = column("date")?;
        let close_col = column("close")?;

        let mut closes = Vec::new();
        for result in rdr.records() {
            let record =
                result.map_err(|e| market_error(symbol, format!("CSV parse error: {e}")))?;

            let date_str = record.get(date_col).unwrap_or_default().trim();
            let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|e| {
                market_error(symbol, format!("invalid date '{date_str}': {e}"))
            })?;
            if self.as_of.is_some_and(|cutoff| date > cutoff) {
                continue;
            }

            let close_str = record.get(close_col).unwrap_or_default().trim();
            let close: f64 = close_str.parse().map_err(|e| {
                market_error(symbol, format!("invalid close '{close_str}': {e}"))
            })?;

            closes.push(DailyClose::new(date, close));
        }

        closes.sort_by_key(|c| c.date);
        Ok(closes)
    }
}

fn market_error(symbol: &str, reason: String) -> RotatraderError {
    RotatraderError::MarketData {
        symbol: symbol.to_string(),
        reason,
    }
}

impl MarketDataPort for CsvMarketDataAdapter {
    fn latest_close(&self, symbol: &str) -> Result<Option<DailyClose>, RotatraderError> {
        Ok(self.read_closes(symbol)?.last().copied())
    }

    fn historical_closes(
        &self,
        symbol: &str,
        lookback_days: usize,
    ) -> Result<Vec<DailyClose>, RotatraderError> {
        let mut closes = self.read_closes(symbol)?;
        let skip = closes.len().saturating_sub(lookback_days);
        closes.drain(..skip);
        Ok(closes)
    }
}
