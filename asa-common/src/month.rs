//! Month tokens and the chronological month ordering
//!
//! A month token is the `Mmm-YY` label (e.g. `Jan-19`) recorded in the
//! completion ledger. Tokens carry no intrinsic order; chronology comes from
//! the externally supplied month order list, oldest first.

use crate::{Error, Result};
use chrono::NaiveDate;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

const MONTH_ABBREVIATIONS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Canonical `Mmm-YY` month label
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MonthToken(String);

impl MonthToken {
    /// Parse and validate a month token
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        let valid = match text.split_once('-') {
            Some((month, year)) => {
                MONTH_ABBREVIATIONS.contains(&month)
                    && year.len() == 2
                    && year.chars().all(|c| c.is_ascii_digit())
            }
            None => false,
        };

        if valid {
            Ok(Self(text.to_string()))
        } else {
            Err(Error::InvalidMonthToken(text.to_string()))
        }
    }

    /// Month token for the month containing `date`
    pub fn from_date(date: NaiveDate) -> Self {
        Self(date.format("%b-%y").to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MonthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for MonthToken {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Which end of the ordering `MonthOrder::resolve` picks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolve {
    /// Newest month (maximum rank)
    Latest,
    /// Oldest month (minimum rank)
    Earliest,
}

/// Bidirectional month token <-> chronological rank index
///
/// Built once from the ordered month list. Ranks are a bijection onto
/// `0..len`, so resolution over a set of distinct tokens never ties.
#[derive(Debug, Clone)]
pub struct MonthOrder {
    tokens: Vec<MonthToken>,
    ranks: HashMap<MonthToken, usize>,
}

impl MonthOrder {
    /// Build the index from tokens ordered oldest first
    ///
    /// Fails on malformed or repeated tokens.
    pub fn new<I, S>(ordered: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut tokens = Vec::new();
        let mut ranks = HashMap::new();

        for text in ordered {
            let token = MonthToken::parse(text.as_ref())?;
            if ranks.insert(token.clone(), tokens.len()).is_some() {
                return Err(Error::Catalog(format!(
                    "month '{}' appears more than once in the month order",
                    token
                )));
            }
            tokens.push(token);
        }

        Ok(Self { tokens, ranks })
    }

    /// Chronological position of `token` (0 = oldest)
    pub fn rank(&self, token: &MonthToken) -> Result<usize> {
        self.ranks
            .get(token)
            .copied()
            .ok_or_else(|| Error::UnknownMonth(token.to_string()))
    }

    /// Token registered at `rank`
    pub fn token_at(&self, rank: usize) -> Option<&MonthToken> {
        self.tokens.get(rank)
    }

    /// Pick the latest or earliest of a non-empty set of tokens
    ///
    /// Every token must be registered; an unknown token is fatal for the
    /// caller. Passing an empty set is a caller error and is reported as
    /// `InvalidInput`.
    pub fn resolve<'a, I>(&self, tokens: I, direction: Resolve) -> Result<MonthToken>
    where
        I: IntoIterator<Item = &'a MonthToken>,
    {
        let mut best: Option<(usize, &MonthToken)> = None;

        for token in tokens {
            let rank = self.rank(token)?;
            best = match best {
                None => Some((rank, token)),
                Some((best_rank, _)) => {
                    let better = match direction {
                        Resolve::Latest => rank > best_rank,
                        Resolve::Earliest => rank < best_rank,
                    };
                    if better {
                        Some((rank, token))
                    } else {
                        best
                    }
                }
            };
        }

        best.map(|(_, token)| token.clone())
            .ok_or_else(|| Error::InvalidInput("cannot resolve an empty set of months".to_string()))
    }

    /// Tokens in chronological order
    pub fn iter(&self) -> impl Iterator<Item = &MonthToken> {
        self.tokens.iter()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(s: &str) -> MonthToken {
        MonthToken::parse(s).unwrap()
    }

    fn order() -> MonthOrder {
        MonthOrder::new(["Dec-18", "Jan-19", "Feb-19", "Mar-19"]).unwrap()
    }

    #[test]
    fn test_parse_valid_token() {
        assert_eq!(token("Jan-19").as_str(), "Jan-19");
        assert_eq!(token(" Nov-18 ").as_str(), "Nov-18");
    }

    #[test]
    fn test_parse_rejects_malformed_tokens() {
        for bad in ["", "Transferred", "January-19", "Jan-2019", "jan-19", "Jan19", "Jan-1x"] {
            assert!(
                matches!(MonthToken::parse(bad), Err(Error::InvalidMonthToken(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_from_date() {
        let date = NaiveDate::from_ymd_opt(2018, 11, 1).unwrap();
        assert_eq!(MonthToken::from_date(date).as_str(), "Nov-18");
    }

    #[test]
    fn test_rank_follows_list_order() {
        let order = order();
        assert_eq!(order.rank(&token("Dec-18")).unwrap(), 0);
        assert_eq!(order.rank(&token("Mar-19")).unwrap(), 3);
        assert_eq!(order.token_at(1), Some(&token("Jan-19")));
    }

    #[test]
    fn test_rank_unknown_token_fails() {
        let order = order();
        assert!(matches!(
            order.rank(&token("Apr-19")),
            Err(Error::UnknownMonth(m)) if m == "Apr-19"
        ));
    }

    #[test]
    fn test_resolve_latest() {
        let order = order();
        let months = [token("Jan-19"), token("Mar-19"), token("Feb-19")];
        assert_eq!(order.resolve(&months, Resolve::Latest).unwrap(), token("Mar-19"));
    }

    #[test]
    fn test_resolve_single_token() {
        let order = order();
        let months = [token("Jan-19")];
        assert_eq!(order.resolve(&months, Resolve::Latest).unwrap(), token("Jan-19"));
        assert_eq!(order.resolve(&months, Resolve::Earliest).unwrap(), token("Jan-19"));
    }

    #[test]
    fn test_resolve_earliest() {
        let order = order();
        let months = [token("Feb-19"), token("Dec-18"), token("Mar-19")];
        assert_eq!(order.resolve(&months, Resolve::Earliest).unwrap(), token("Dec-18"));
    }

    #[test]
    fn test_resolve_across_year_boundary_uses_rank_not_text() {
        // "Dec-18" sorts after "Jan-19" as text but is older by rank
        let order = order();
        let months = [token("Dec-18"), token("Jan-19")];
        assert_eq!(order.resolve(&months, Resolve::Latest).unwrap(), token("Jan-19"));
    }

    #[test]
    fn test_resolve_unknown_month_is_fatal() {
        let order = order();
        let months = [token("Jan-19"), token("Jul-20")];
        assert!(matches!(
            order.resolve(&months, Resolve::Latest),
            Err(Error::UnknownMonth(_))
        ));
    }

    #[test]
    fn test_resolve_empty_set_is_rejected() {
        let order = order();
        let months: [MonthToken; 0] = [];
        assert!(matches!(
            order.resolve(&months, Resolve::Latest),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_duplicate_month_rejected() {
        assert!(matches!(
            MonthOrder::new(["Jan-19", "Jan-19"]),
            Err(Error::Catalog(_))
        ));
    }
}
