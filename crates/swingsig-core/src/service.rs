//! Inbound request shapes and user-facing outcomes.
//!
//! Every selector is parsed and validated before any upstream call is made.

use std::sync::Arc;
use std::time::Duration;

use fastrand::Rng;
use serde::{Deserialize, Serialize};

use crate::data_source::{millis, SourceError};
use crate::formatter::format_signals;
use crate::pipeline::{PicksOutcome, PicksRequest, SignalPipeline};
use crate::prompt::{options_prompt, picks_prompt, signal_prompt, TextGenerator};
use crate::ranking::Backfill;
use crate::universe::{UniverseKind, UniverseMode};
use crate::{CompositeSignal, DerivationPolicy, SignalError, Symbol, Tier, TierFilter};

/// `{ symbol }` request for single-symbol operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolRequest {
    pub symbol: String,
}

impl SymbolRequest {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
        }
    }
}

/// Options for the single-symbol signal operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalOptions {
    pub policy: Option<String>,
    pub narrate: bool,
}

/// Ranking request as received from a caller; every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PicksQuery {
    pub tier: Option<String>,
    pub universe: Option<String>,
    pub sample: Option<usize>,
    pub top: Option<usize>,
    pub policy: Option<String>,
    pub indicators: bool,
    pub backfill: bool,
    pub narrate: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalReport {
    pub signal: CompositeSignal,
    pub formatted: String,
    pub narrative: Option<String>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PicksReport {
    pub outcome: PicksOutcome,
    pub formatted: String,
    pub narrative: Option<String>,
}

impl PicksReport {
    /// Outcome warnings plus one line per dropped symbol.
    pub fn warnings(&self) -> Vec<String> {
        self.outcome
            .warnings
            .iter()
            .cloned()
            .chain(
                self.outcome
                    .dropped
                    .iter()
                    .map(|dropped| format!("{} dropped: {}", dropped.symbol, dropped.reason)),
            )
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionsInsight {
    pub symbol: Symbol,
    pub price: f64,
    pub message: String,
}

/// Parses inbound requests, runs the pipeline and optionally narrates.
#[derive(Clone)]
pub struct SignalService {
    pipeline: SignalPipeline,
    narrator: Option<Arc<dyn TextGenerator>>,
    default_policy: DerivationPolicy,
    default_top_n: usize,
    default_sample: usize,
    narration_timeout: Duration,
}

impl SignalService {
    pub fn new(pipeline: SignalPipeline) -> Self {
        Self {
            pipeline,
            narrator: None,
            default_policy: DerivationPolicy::swing(),
            default_top_n: 5,
            default_sample: 10,
            narration_timeout: Duration::from_secs(60),
        }
    }

    pub fn with_narrator(mut self, narrator: Arc<dyn TextGenerator>) -> Self {
        self.narrator = Some(narrator);
        self
    }

    pub fn with_default_policy(mut self, policy: DerivationPolicy) -> Self {
        self.default_policy = policy;
        self
    }

    pub fn with_defaults(mut self, top_n: usize, sample: usize) -> Self {
        self.default_top_n = top_n;
        self.default_sample = sample;
        self
    }

    pub fn with_narration_timeout(mut self, timeout: Duration) -> Self {
        self.narration_timeout = timeout;
        self
    }

    pub fn pipeline(&self) -> &SignalPipeline {
        &self.pipeline
    }

    /// Compose and format the signal for one symbol.
    pub async fn signal(
        &self,
        request: &SymbolRequest,
        options: &SignalOptions,
        rng: &mut Rng,
    ) -> Result<SignalReport, SignalError> {
        let symbol = Symbol::parse(&request.symbol)?;
        let policy = self.resolve_policy(options.policy.as_deref())?;

        let signal = self.pipeline.signal(&symbol, &policy, rng).await?;
        let formatted = format_signals(std::slice::from_ref(&signal));

        let mut warnings = Vec::new();
        if signal.indicators.is_none() {
            warnings.push(format!("indicators unavailable for {symbol}"));
        }

        let narrative = if options.narrate {
            self.narrate(signal_prompt(&signal), &mut warnings).await
        } else {
            None
        };

        Ok(SignalReport {
            signal,
            formatted,
            narrative,
            warnings,
        })
    }

    /// Rank a universe and format the surviving signals.
    pub async fn picks(&self, query: &PicksQuery, rng: &mut Rng) -> Result<PicksReport, SignalError> {
        let request = self.resolve_picks(query)?;
        let mut outcome = self.pipeline.picks(&request, rng).await?;
        let formatted = format_signals(&outcome.signals);

        let narrative = if query.narrate && !outcome.is_empty() {
            self.narrate(picks_prompt(&outcome.signals), &mut outcome.warnings)
                .await
        } else {
            None
        };

        Ok(PicksReport {
            outcome,
            formatted,
            narrative,
        })
    }

    /// Short-term options idea for one symbol, passed through verbatim.
    ///
    /// # Errors
    ///
    /// [`SignalError::InsufficientData`] when the symbol has no quote or no
    /// usable price; [`SignalError::SourceUnavailable`] when the quote or the
    /// text generator fails.
    pub async fn options_insight(
        &self,
        request: &SymbolRequest,
    ) -> Result<OptionsInsight, SignalError> {
        let symbol = Symbol::parse(&request.symbol)?;
        let narrator = self
            .narrator
            .as_ref()
            .ok_or_else(|| SourceError::unavailable("no text generator is configured"))?;

        let quote = self.pipeline.quote(&symbol).await?;
        let price = quote
            .usable_price()
            .ok_or_else(|| SignalError::insufficient(&symbol, "price"))?;

        let message = self.generate(narrator.as_ref(), options_prompt(&symbol, price)).await?;
        Ok(OptionsInsight {
            symbol,
            price,
            message,
        })
    }

    fn resolve_policy(&self, raw: Option<&str>) -> Result<DerivationPolicy, SignalError> {
        match raw.map(str::trim).filter(|value| !value.is_empty()) {
            Some(value) => value.parse(),
            None => Ok(self.default_policy),
        }
    }

    fn resolve_picks(&self, query: &PicksQuery) -> Result<PicksRequest, SignalError> {
        let tier = Tier::parse_selector(query.tier.as_deref())?;
        let kind = match query.universe.as_deref().map(str::trim) {
            None | Some("") => UniverseKind::Fixed,
            Some(raw) => raw.parse()?,
        };
        let policy = self.resolve_policy(query.policy.as_deref())?;
        let top_n = query.top.unwrap_or(self.default_top_n);

        let mode = match kind {
            UniverseKind::Fixed => UniverseMode::Fixed,
            UniverseKind::Random => {
                UniverseMode::random_subset(query.sample.unwrap_or(self.default_sample))?
            }
            UniverseKind::Screened => {
                let filter = tier.map(Tier::filter).unwrap_or_else(TierFilter::any);
                // Screen wider than top-N so ranking has room after enrichment drops.
                let limit = query.sample.unwrap_or(top_n.saturating_mul(4));
                UniverseMode::screened(filter, limit)?
            }
        };

        let backfill = if query.backfill {
            Backfill::Universe
        } else {
            Backfill::None
        };

        Ok(PicksRequest::new(policy, top_n)?
            .with_tier(tier)
            .with_mode(mode)
            .with_indicators(query.indicators)
            .with_backfill(backfill))
    }

    async fn narrate(&self, prompt: String, warnings: &mut Vec<String>) -> Option<String> {
        let Some(narrator) = self.narrator.as_ref() else {
            warnings.push(String::from(
                "narration requested but no text generator is configured",
            ));
            return None;
        };

        match self.generate(narrator.as_ref(), prompt).await {
            Ok(text) => Some(text),
            Err(error) => {
                tracing::warn!(%error, "narration failed; returning formatted result only");
                warnings.push(format!("narration unavailable: {error}"));
                None
            }
        }
    }

    async fn generate(
        &self,
        narrator: &dyn TextGenerator,
        prompt: String,
    ) -> Result<String, SourceError> {
        tracing::debug!(generator = narrator.name(), chars = prompt.len(), "text generation");
        tokio::time::timeout(self.narration_timeout, narrator.generate(prompt))
            .await
            .map_err(|_| SourceError::timeout(narrator.name(), millis(self.narration_timeout)))?
    }
}
