//! Score ranking.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedSymbol {
    pub score: u8,
    pub symbol: String,
}

impl fmt::Display for RankedSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.symbol, self.score)
    }
}

/// Order symbols by score, highest first.
///
/// Input order must be watchlist order: the sort is stable, so equally scored
/// symbols keep their watchlist order and that decides which of them lands in
/// the long or short cut. Symbols without a valid score are not passed in.
pub fn rank<'a, I>(scores: I) -> Vec<RankedSymbol>
where
    I: IntoIterator<Item = (&'a str, u8)>,
{
    let mut ranked: Vec<RankedSymbol> = scores
        .into_iter()
        .map(|(symbol, score)| RankedSymbol {
            score,
            symbol: symbol.to_string(),
        })
        .collect();
    ranked.sort_by(|a, b| b.score.cmp(&a.score));
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symbols(ranked: &[RankedSymbol]) -> Vec<&str> {
        ranked.iter().map(|r| r.symbol.as_str()).collect()
    }

    #[test]
    fn sorts_descending() {
        let ranked = rank([("A", 1), ("B", 4), ("C", 2)]);
        assert_eq!(symbols(&ranked), vec!["B", "C", "A"]);
        assert_eq!(ranked[0].score, 4);
    }

    #[test]
    fn ties_keep_input_order() {
        let ranked = rank([("TQQQ", 3), ("SOXL", 4), ("UPRO", 3), ("BTC-USD", 3)]);
        assert_eq!(symbols(&ranked), vec!["SOXL", "TQQQ", "UPRO", "BTC-USD"]);
    }

    #[test]
    fn empty_input() {
        assert!(rank(std::iter::empty::<(&str, u8)>()).is_empty());
    }

    #[test]
    fn display_format() {
        let r = RankedSymbol {
            score: 3,
            symbol: "UPRO".into(),
        };
        assert_eq!(r.to_string(), "UPRO=3");
    }
}
