//! Fan-out orchestration: universe, ranking, concurrent fetches, composition.
//!
//! Every upstream call runs under the configured timeout. Enrichment failures
//! (indicators) degrade to absent data; a failure of mandatory data drops
//! the affected symbol in the ranking path and fails the single-symbol path.
//! Only a total inability to produce output propagates from [`SignalPipeline::picks`].

use std::sync::Arc;
use std::time::Duration;

use fastrand::Rng;
use futures::future::join_all;
use serde::{Deserialize, Serialize};

use crate::config::{IndicatorPeriods, SignalConfig};
use crate::data_source::{
    millis, IndicatorKind, IndicatorRequest, IndicatorSource, QuoteBatch, QuoteRequest,
    QuoteSource, SourceError,
};
use crate::ranking::{rank_with_backfill, Backfill};
use crate::universe::{UniverseMode, UniverseProvider};
use crate::{
    compose, CompositeSignal, DerivationPolicy, IndicatorSet, Quote, SignalError, Symbol, Tier,
    TierFilter, ValidationError,
};

/// Parameters of one ranking run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PicksRequest {
    pub tier: Option<Tier>,
    pub mode: UniverseMode,
    pub top_n: usize,
    pub policy: DerivationPolicy,
    /// Fetch indicators for every ranked symbol.
    pub with_indicators: bool,
    pub backfill: Backfill,
}

impl PicksRequest {
    pub fn new(policy: DerivationPolicy, top_n: usize) -> Result<Self, ValidationError> {
        if top_n == 0 {
            return Err(ValidationError::ZeroCount { field: "top_n" });
        }
        Ok(Self {
            tier: None,
            mode: UniverseMode::Fixed,
            top_n,
            policy,
            with_indicators: false,
            backfill: Backfill::None,
        })
    }

    pub fn with_tier(mut self, tier: Option<Tier>) -> Self {
        self.tier = tier;
        self
    }

    pub fn with_mode(mut self, mode: UniverseMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_indicators(mut self, enabled: bool) -> Self {
        self.with_indicators = enabled;
        self
    }

    pub fn with_backfill(mut self, backfill: Backfill) -> Self {
        self.backfill = backfill;
        self
    }

    fn filter(&self) -> TierFilter {
        self.tier.map(Tier::filter).unwrap_or_else(TierFilter::any)
    }
}

/// A symbol lost at the fan-out boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DroppedSymbol {
    pub symbol: Symbol,
    pub reason: String,
}

/// Result of a ranking run. An empty signal list is a valid outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PicksOutcome {
    pub tier: Option<Tier>,
    pub requested: usize,
    pub universe_size: usize,
    pub signals: Vec<CompositeSignal>,
    pub dropped: Vec<DroppedSymbol>,
    pub warnings: Vec<String>,
}

impl PicksOutcome {
    fn new(tier: Option<Tier>, requested: usize) -> Self {
        Self {
            tier,
            requested,
            universe_size: 0,
            signals: Vec::new(),
            dropped: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    fn drop_symbol(&mut self, symbol: &Symbol, reason: impl Into<String>) {
        self.dropped.push(DroppedSymbol {
            symbol: symbol.clone(),
            reason: reason.into(),
        });
    }
}

/// One parameterized pipeline serving both the single-symbol and ranking paths.
#[derive(Clone)]
pub struct SignalPipeline {
    quote_source: Arc<dyn QuoteSource>,
    indicator_source: Arc<dyn IndicatorSource>,
    universe: UniverseProvider,
    periods: IndicatorPeriods,
    timeout: Duration,
}

impl SignalPipeline {
    pub fn new(
        quote_source: Arc<dyn QuoteSource>,
        indicator_source: Arc<dyn IndicatorSource>,
        universe: UniverseProvider,
        config: &SignalConfig,
    ) -> Self {
        Self {
            quote_source,
            indicator_source,
            universe,
            periods: config.periods,
            timeout: config.timeout,
        }
    }

    /// Latest quote for one symbol.
    ///
    /// # Errors
    ///
    /// [`SignalError::SourceUnavailable`] when the call fails or times out,
    /// [`SignalError::InsufficientData`] naming `quote` when the source does
    /// not know the symbol.
    pub async fn quote(&self, symbol: &Symbol) -> Result<Quote, SignalError> {
        let batch = self.quotes(QuoteRequest::single(symbol.clone())).await?;
        batch
            .quotes
            .into_iter()
            .find(|quote| &quote.symbol == symbol)
            .ok_or_else(|| SignalError::insufficient(symbol, "quote"))
    }

    /// RSI, MACD signal and both moving averages, fetched concurrently.
    ///
    /// A failed or timed-out call leaves its field absent; `None` means every
    /// call failed.
    pub async fn indicators(&self, symbol: &Symbol) -> Option<IndicatorSet> {
        let (rsi, macd_signal, short_ma, long_ma) = tokio::join!(
            self.indicator(symbol, IndicatorKind::Rsi, Some(self.periods.rsi)),
            self.indicator(symbol, IndicatorKind::MacdSignal, None),
            self.indicator(
                symbol,
                IndicatorKind::MovingAverage,
                Some(self.periods.short_moving_average)
            ),
            self.indicator(
                symbol,
                IndicatorKind::MovingAverage,
                Some(self.periods.long_moving_average)
            ),
        );

        if rsi.is_err() && macd_signal.is_err() && short_ma.is_err() && long_ma.is_err() {
            tracing::warn!(%symbol, "all indicator calls failed; continuing without indicators");
            return None;
        }

        Some(IndicatorSet {
            rsi: rsi.ok().flatten(),
            macd_signal: macd_signal.ok().flatten(),
            moving_average_50: short_ma.ok().flatten(),
            moving_average_200: long_ma.ok().flatten(),
        })
    }

    /// Single-symbol path: one quote call and four indicator calls, all
    /// concurrent, then composition.
    pub async fn signal(
        &self,
        symbol: &Symbol,
        policy: &DerivationPolicy,
        rng: &mut Rng,
    ) -> Result<CompositeSignal, SignalError> {
        let (quote, indicators) = tokio::join!(self.quote(symbol), self.indicators(symbol));
        compose(quote?, indicators, policy, rng)
    }

    /// Ranking path: universe, one batched quote call, tier ranking, optional
    /// concurrent indicator enrichment, composition.
    ///
    /// # Errors
    ///
    /// Fails only when the universe or the batched quote call is unavailable.
    /// Per-symbol failures are reported in [`PicksOutcome::dropped`].
    pub async fn picks(
        &self,
        request: &PicksRequest,
        rng: &mut Rng,
    ) -> Result<PicksOutcome, SignalError> {
        let mut outcome = PicksOutcome::new(request.tier, request.top_n);

        let universe = self.universe.universe(&request.mode, rng).await?;
        outcome.universe_size = universe.len();
        if universe.is_empty() {
            tracing::warn!(mode = %request.mode.kind(), "universe is empty");
            outcome
                .warnings
                .push(format!("{} universe returned no symbols", request.mode.kind()));
            return Ok(outcome);
        }

        let request_quotes = QuoteRequest::new(universe.clone())?;
        let batch = self.quotes(request_quotes).await?;
        let index = batch.by_symbol();
        for symbol in &universe {
            match index.get(symbol) {
                None => {
                    tracing::warn!(%symbol, "no quote returned; dropping symbol");
                    outcome.drop_symbol(symbol, "no quote returned");
                }
                Some(quote) if quote.usable_price().is_none() => {
                    let error = SignalError::insufficient(symbol, "price");
                    tracing::warn!(%symbol, %error, "dropping symbol");
                    outcome.drop_symbol(symbol, error.to_string());
                }
                Some(_) => {}
            }
        }

        let ranking = rank_with_backfill(
            &universe,
            &batch,
            &request.filter(),
            request.top_n,
            request.backfill,
        );
        if ranking.backfilled > 0 {
            let tier = request.tier.map_or("selected", Tier::as_str);
            outcome.warnings.push(format!(
                "{} of {} slots backfilled with symbols outside the {tier} tier",
                ranking.backfilled,
                ranking.symbols.len()
            ));
        }

        let enrichments = if request.with_indicators {
            join_all(ranking.symbols.iter().map(|symbol| self.indicators(symbol))).await
        } else {
            vec![None; ranking.symbols.len()]
        };

        for (symbol, indicators) in ranking.symbols.iter().zip(enrichments) {
            let Some(quote) = index.get(symbol) else {
                continue;
            };
            match compose((*quote).clone(), indicators, &request.policy, rng) {
                Ok(signal) => outcome.signals.push(signal),
                Err(error) => {
                    tracing::warn!(%symbol, %error, "dropping symbol");
                    outcome.drop_symbol(symbol, error.to_string());
                }
            }
        }

        tracing::info!(
            tier = request.tier.map_or("none", Tier::as_str),
            universe = outcome.universe_size,
            ranked = ranking.symbols.len(),
            composed = outcome.signals.len(),
            dropped = outcome.dropped.len(),
            "picks run complete"
        );
        Ok(outcome)
    }

    async fn quotes(&self, request: QuoteRequest) -> Result<QuoteBatch, SourceError> {
        let source = self.quote_source.name();
        tracing::debug!(source, symbols = request.symbols.len(), "quote request");
        tokio::time::timeout(self.timeout, self.quote_source.quote(request))
            .await
            .map_err(|_| {
                tracing::warn!(source, timeout_ms = millis(self.timeout), "quote call timed out");
                SourceError::timeout(source, millis(self.timeout))
            })?
    }

    async fn indicator(
        &self,
        symbol: &Symbol,
        kind: IndicatorKind,
        period: Option<u32>,
    ) -> Result<Option<f64>, SourceError> {
        let source = self.indicator_source.name();
        let request = IndicatorRequest::new(symbol.clone(), kind, period);
        tracing::debug!(source, %symbol, indicator = %kind, ?period, "indicator request");

        let result = tokio::time::timeout(self.timeout, self.indicator_source.indicator(request))
            .await
            .map_err(|_| SourceError::timeout(source, millis(self.timeout)))
            .and_then(|inner| inner);

        match result {
            Ok(series) => Ok(series.latest()),
            Err(error) => {
                tracing::warn!(%symbol, indicator = %kind, %error, "indicator unavailable");
                Err(error)
            }
        }
    }
}
