//! Target portfolio selection (long head, short tail of the ranking).

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::ranking::RankedSymbol;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Long,
    Short,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Long => write!(f, "LONG"),
            Side::Short => write!(f, "SHORT"),
        }
    }
}

/// Symbol -> side, kept in ranked order so downstream iteration is stable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Targets {
    entries: Vec<(String, Side)>,
}

impl Targets {
    pub fn get(&self, symbol: &str) -> Option<Side> {
        self.entries
            .iter()
            .find(|(s, _)| s == symbol)
            .map(|&(_, side)| side)
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.get(symbol).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Side)> {
        self.entries.iter().map(|(s, side)| (s.as_str(), *side))
    }

    pub fn longs(&self) -> Vec<&str> {
        self.with_side(Side::Long)
    }

    pub fn shorts(&self) -> Vec<&str> {
        self.with_side(Side::Short)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn with_side(&self, side: Side) -> Vec<&str> {
        self.iter()
            .filter(|&(_, s)| s == side)
            .map(|(symbol, _)| symbol)
            .collect()
    }
}

/// The first `top_longs` ranked symbols go LONG, the last `bottom_shorts` go
/// SHORT. When the ranking is too short for both slices to be disjoint, LONG
/// wins: a symbol in the long head is never reassigned by the short tail.
pub fn select_targets(ranked: &[RankedSymbol], top_longs: usize, bottom_shorts: usize) -> Targets {
    let long_cut = top_longs.min(ranked.len());
    let short_start = ranked.len().saturating_sub(bottom_shorts);

    let entries = ranked
        .iter()
        .enumerate()
        .filter_map(|(i, r)| {
            if i < long_cut {
                Some((r.symbol.clone(), Side::Long))
            } else if i >= short_start {
                Some((r.symbol.clone(), Side::Short))
            } else {
                None
            }
        })
        .collect();

    Targets { entries }
}
