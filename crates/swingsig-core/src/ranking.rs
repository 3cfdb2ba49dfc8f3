//! Tier filtering and top-N truncation over a candidate universe.
//!
//! Ranking is a pure function of its inputs: universe order is the ranking
//! order, nothing is re-sorted, and the inputs are never mutated.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::data_source::QuoteBatch;
use crate::{Symbol, TierFilter};

/// What to do when the tier admits fewer than `top_n` candidates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backfill {
    /// Return whatever passed, possibly nothing.
    #[default]
    None,
    /// Fill remaining slots with priced universe members that failed the tier,
    /// in universe order.
    Universe,
}

/// Result of ranking with an explicit backfill policy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ranking {
    pub symbols: Vec<Symbol>,
    /// How many trailing entries of `symbols` came from backfill.
    pub backfilled: usize,
}

impl Ranking {
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// Keep universe members whose quote passes `filter`, in universe order, up to
/// `top_n`. Members without a quote or a usable price never pass.
pub fn rank(
    universe: &[Symbol],
    quotes: &QuoteBatch,
    filter: &TierFilter,
    top_n: usize,
) -> Vec<Symbol> {
    let index = quotes.by_symbol();
    let mut seen = HashSet::with_capacity(universe.len());

    universe
        .iter()
        .filter(|symbol| seen.insert(*symbol))
        .filter(|symbol| {
            index
                .get(symbol)
                .is_some_and(|quote| quote.usable_price().is_some() && filter.admits(quote))
        })
        .take(top_n)
        .cloned()
        .collect()
}

/// [`rank`] followed by the requested backfill.
pub fn rank_with_backfill(
    universe: &[Symbol],
    quotes: &QuoteBatch,
    filter: &TierFilter,
    top_n: usize,
    backfill: Backfill,
) -> Ranking {
    let mut symbols = rank(universe, quotes, filter, top_n);
    if backfill == Backfill::None || symbols.len() >= top_n {
        return Ranking {
            symbols,
            backfilled: 0,
        };
    }

    let index = quotes.by_symbol();
    let mut taken = symbols.iter().cloned().collect::<HashSet<_>>();
    let before = symbols.len();

    for symbol in universe {
        if symbols.len() >= top_n {
            break;
        }
        let priced = index
            .get(symbol)
            .is_some_and(|quote| quote.usable_price().is_some());
        if priced && taken.insert(symbol.clone()) {
            symbols.push(symbol.clone());
        }
    }

    let backfilled = symbols.len() - before;
    Ranking {
        symbols,
        backfilled,
    }
}
