//! Watchlist parsing.
//!
//! The watchlist order is the tie-break order for ranking, so parsing keeps
//! the configured order exactly and rejects duplicates instead of silently
//! collapsing them.

use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Watchlist {
    symbols: Vec<String>,
}

impl Watchlist {
    pub fn new(symbols: Vec<String>) -> Result<Self, WatchlistError> {
        let mut seen = HashSet::new();
        for symbol in &symbols {
            if symbol.is_empty() {
                return Err(WatchlistError::EmptyToken);
            }
            if !seen.insert(symbol.as_str()) {
                return Err(WatchlistError::DuplicateSymbol(symbol.clone()));
            }
        }
        if symbols.is_empty() {
            return Err(WatchlistError::Empty);
        }
        Ok(Self { symbols })
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.symbols.iter()
    }
}

impl<'a> IntoIterator for &'a Watchlist {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.symbols.iter()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WatchlistError {
    #[error("empty token in watchlist")]
    EmptyToken,

    #[error("duplicate symbol in watchlist: {0}")]
    DuplicateSymbol(String),

    #[error("watchlist is empty")]
    Empty,
}

/// Parse a comma separated symbol list, uppercasing each entry.
pub fn parse_watchlist(input: &str) -> Result<Watchlist, WatchlistError> {
    if input.trim().is_empty() {
        return Err(WatchlistError::Empty);
    }
    let symbols = input
        .split(',')
        .map(|token| token.trim().to_uppercase())
        .collect();
    Watchlist::new(symbols)
}
