//! Per-symbol persisted state and the keyed store that holds it.
//!
//! JSON shape of one record:
//! `{"prices": [..], "indicators": {..}, "score": 3,
//!   "last_close_date": "2024-03-15", "last_trade_date": null}`

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

use crate::domain::indicator::{compute_indicators, Indicators};
use crate::domain::params::Params;
use crate::domain::price_series::PriceSeries;
use crate::domain::score::{score, SCORE_INVALID};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolRecord {
    #[serde(default)]
    pub prices: PriceSeries,
    #[serde(default, deserialize_with = "empty_object_as_none")]
    pub indicators: Option<Indicators>,
    #[serde(default = "invalid_score")]
    pub score: i32,
    #[serde(default)]
    pub last_close_date: Option<NaiveDate>,
    #[serde(default)]
    pub last_trade_date: Option<NaiveDate>,
}

impl Default for SymbolRecord {
    fn default() -> Self {
        SymbolRecord {
            prices: PriceSeries::new(),
            indicators: None,
            score: SCORE_INVALID,
            last_close_date: None,
            last_trade_date: None,
        }
    }
}

impl SymbolRecord {
    pub fn with_prices(prices: Vec<f64>) -> Self {
        SymbolRecord {
            prices: PriceSeries::from_prices(prices),
            ..Self::default()
        }
    }

    pub fn latest_price(&self) -> Option<f64> {
        self.prices.latest()
    }

    /// The score as a rankable value, `None` for the sentinel.
    pub fn valid_score(&self) -> Option<u8> {
        u8::try_from(self.score).ok()
    }

    /// Recompute indicators and score from the stored history. Too little
    /// history clears the indicators and stores the sentinel score.
    pub fn rescore(&mut self, params: &Params) -> Option<u8> {
        let computed = self.latest_price().and_then(|latest| {
            compute_indicators(self.prices.as_slice(), params).map(|ind| (latest, ind))
        });

        match computed {
            Some((latest, indicators)) => {
                let s = score(latest, &indicators);
                self.indicators = Some(indicators);
                self.score = i32::from(s);
                Some(s)
            }
            None => {
                self.indicators = None;
                self.score = SCORE_INVALID;
                None
            }
        }
    }
}

fn invalid_score() -> i32 {
    SCORE_INVALID
}

/// Older stores write `"indicators": {}` before the first successful
/// computation; read that (and null) as "no indicators".
fn empty_object_as_none<'de, D>(deserializer: D) -> Result<Option<Indicators>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Stored {
        Full(Indicators),
        Empty {},
    }

    Ok(match Option::<Stored>::deserialize(deserializer)? {
        Some(Stored::Full(ind)) => Some(ind),
        Some(Stored::Empty {}) | None => None,
    })
}

/// All persisted symbol records, keyed by symbol.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Store {
    pub records: BTreeMap<String, SymbolRecord>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, symbol: &str) -> Option<&SymbolRecord> {
        self.records.get(symbol)
    }

    pub fn get_mut(&mut self, symbol: &str) -> Option<&mut SymbolRecord> {
        self.records.get_mut(symbol)
    }

    pub fn insert(&mut self, symbol: &str, record: SymbolRecord) {
        self.records.insert(symbol.to_string(), record);
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.records.contains_key(symbol)
    }

    pub fn latest_price(&self, symbol: &str) -> Option<f64> {
        self.get(symbol).and_then(SymbolRecord::latest_price)
    }

    pub fn last_trade_date(&self, symbol: &str) -> Option<NaiveDate> {
        self.get(symbol).and_then(|r| r.last_trade_date)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
