//! Candidate universe selection for ranking.

use std::collections::HashSet;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use fastrand::Rng;
use serde::{Deserialize, Serialize};

use crate::data_source::{millis, ActiveFeed, SourceError};
use crate::{SignalError, Symbol, TierFilter, ValidationError};

const UNIVERSE_NAMES: &str = "fixed, random, screened";

/// Universe mode names accepted from callers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UniverseKind {
    #[default]
    Fixed,
    Random,
    Screened,
}

impl UniverseKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fixed => "fixed",
            Self::Random => "random",
            Self::Screened => "screened",
        }
    }
}

impl Display for UniverseKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UniverseKind {
    type Err = SignalError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "fixed" | "fixed-list" => Ok(Self::Fixed),
            "random" | "random-subset" => Ok(Self::Random),
            "screened" | "active" => Ok(Self::Screened),
            _ => Err(SignalError::InvalidSelector {
                kind: "universe",
                value: value.trim().to_owned(),
                expected: UNIVERSE_NAMES,
            }),
        }
    }
}

/// How the candidate universe is produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum UniverseMode {
    /// The configured list, in configured order.
    Fixed,
    /// `size` distinct symbols sampled uniformly from the configured list.
    RandomSubset { size: usize },
    /// Most-active feed members passing `filter`, in feed order, up to `limit`.
    Screened { filter: TierFilter, limit: usize },
}

impl UniverseMode {
    pub fn random_subset(size: usize) -> Result<Self, ValidationError> {
        if size == 0 {
            return Err(ValidationError::ZeroCount {
                field: "sample_size",
            });
        }
        Ok(Self::RandomSubset { size })
    }

    pub fn screened(filter: TierFilter, limit: usize) -> Result<Self, ValidationError> {
        if limit == 0 {
            return Err(ValidationError::ZeroCount {
                field: "screen_limit",
            });
        }
        Ok(Self::Screened { filter, limit })
    }

    pub const fn kind(&self) -> UniverseKind {
        match self {
            Self::Fixed => UniverseKind::Fixed,
            Self::RandomSubset { .. } => UniverseKind::Random,
            Self::Screened { .. } => UniverseKind::Screened,
        }
    }
}

/// Supplies candidate symbols from a fixed list or an active-securities feed.
#[derive(Clone)]
pub struct UniverseProvider {
    fixed: Vec<Symbol>,
    feed: Option<Arc<dyn ActiveFeed>>,
    timeout: Duration,
}

impl UniverseProvider {
    pub fn new(fixed: Vec<Symbol>, timeout: Duration) -> Self {
        Self {
            fixed: dedupe(fixed),
            feed: None,
            timeout,
        }
    }

    pub fn with_feed(mut self, feed: Arc<dyn ActiveFeed>) -> Self {
        self.feed = Some(feed);
        self
    }

    /// Produce the universe for `mode`.
    ///
    /// # Errors
    ///
    /// Screened mode returns [`SignalError::SourceUnavailable`] when the feed
    /// is missing, fails or times out. It never falls back to the fixed list.
    pub async fn universe(
        &self,
        mode: &UniverseMode,
        rng: &mut Rng,
    ) -> Result<Vec<Symbol>, SignalError> {
        match mode {
            UniverseMode::Fixed => Ok(self.fixed.clone()),
            UniverseMode::RandomSubset { size } => Ok(sample(&self.fixed, *size, rng)),
            UniverseMode::Screened { filter, limit } => self.screened(filter, *limit).await,
        }
    }

    async fn screened(
        &self,
        filter: &TierFilter,
        limit: usize,
    ) -> Result<Vec<Symbol>, SignalError> {
        let feed = self
            .feed
            .as_ref()
            .ok_or_else(|| SourceError::unavailable("no active-securities feed is configured"))?;

        tracing::debug!(feed = feed.name(), limit, "fetching most-active feed");
        let batch = tokio::time::timeout(self.timeout, feed.most_active())
            .await
            .map_err(|_| SourceError::timeout(feed.name(), millis(self.timeout)))??;

        let mut seen = HashSet::new();
        let symbols = batch
            .quotes
            .iter()
            .filter(|quote| filter.admits(quote))
            .filter(|quote| seen.insert(quote.symbol.clone()))
            .take(limit)
            .map(|quote| quote.symbol.clone())
            .collect::<Vec<_>>();

        tracing::debug!(
            feed = feed.name(),
            received = batch.quotes.len(),
            kept = symbols.len(),
            "screened most-active feed"
        );
        Ok(symbols)
    }
}

/// Uniform sample of up to `size` distinct members, without replacement.
fn sample(pool: &[Symbol], size: usize, rng: &mut Rng) -> Vec<Symbol> {
    let mut drawn = pool.to_vec();
    let size = size.min(drawn.len());
    for index in 0..size {
        let pick = rng.usize(index..drawn.len());
        drawn.swap(index, pick);
    }
    drawn.truncate(size);
    drawn
}

fn dedupe(symbols: Vec<Symbol>) -> Vec<Symbol> {
    let mut seen = HashSet::with_capacity(symbols.len());
    symbols
        .into_iter()
        .filter(|symbol| seen.insert(symbol.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symbols(raw: &[&str]) -> Vec<Symbol> {
        raw.iter()
            .map(|value| Symbol::parse(value).expect("valid symbol"))
            .collect()
    }

    #[test]
    fn sample_is_distinct_and_bounded() {
        let pool = symbols(&["A", "B", "C", "D", "E", "F", "G", "H"]);
        let mut rng = Rng::with_seed(17);

        for _ in 0..200 {
            let drawn = sample(&pool, 3, &mut rng);
            assert_eq!(drawn.len(), 3);
            let unique = drawn.iter().collect::<HashSet<_>>();
            assert_eq!(unique.len(), 3);
            assert!(drawn.iter().all(|symbol| pool.contains(symbol)));
        }
    }

    #[test]
    fn oversized_sample_returns_whole_pool() {
        let pool = symbols(&["A", "B", "C"]);
        let drawn = sample(&pool, 10, &mut Rng::with_seed(1));
        assert_eq!(drawn.len(), 3);
    }

    #[test]
    fn sample_is_reproducible_from_seed() {
        let pool = symbols(&["A", "B", "C", "D", "E", "F"]);
        assert_eq!(
            sample(&pool, 4, &mut Rng::with_seed(8)),
            sample(&pool, 4, &mut Rng::with_seed(8))
        );
    }

    #[test]
    fn zero_sized_modes_are_rejected() {
        assert!(matches!(
            UniverseMode::random_subset(0),
            Err(ValidationError::ZeroCount { .. })
        ));
        assert!(matches!(
            UniverseMode::screened(TierFilter::any(), 0),
            Err(ValidationError::ZeroCount { .. })
        ));
    }

    #[test]
    fn parses_universe_kind() {
        assert_eq!(
            "Random".parse::<UniverseKind>().expect("kind"),
            UniverseKind::Random
        );
        assert!(matches!(
            "everything".parse::<UniverseKind>(),
            Err(SignalError::InvalidSelector {
                kind: "universe",
                ..
            })
        ));
    }

    #[tokio::test]
    async fn screened_mode_without_feed_is_unavailable() {
        let provider = UniverseProvider::new(symbols(&["AAA"]), Duration::from_millis(50));
        let mode = UniverseMode::screened(TierFilter::any(), 5).expect("valid mode");

        let err = provider
            .universe(&mode, &mut Rng::with_seed(1))
            .await
            .expect_err("must fail");
        assert!(matches!(err, SignalError::SourceUnavailable(_)));
    }
}
