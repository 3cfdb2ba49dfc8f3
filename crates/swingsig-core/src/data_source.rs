//! Upstream source contracts and request/response types.
//!
//! Three independent collaborators feed the pipeline:
//!
//! | Trait | Request | Response | Description |
//! |-------|---------|----------|-------------|
//! | [`QuoteSource`] | [`QuoteRequest`] | [`QuoteBatch`] | Latest quotes for one or many symbols |
//! | [`IndicatorSource`] | [`IndicatorRequest`] | [`IndicatorSeries`] | One technical indicator for one symbol |
//! | [`ActiveFeed`] | none | [`QuoteBatch`] | Most-active securities, feed order |
//!
//! Quote batches are keyed by symbol, never by position: sources may reorder
//! or omit symbols, and a missing symbol is simply absent from the batch.

use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Quote, Symbol};

/// Boxed future returned by every source method.
pub type SourceFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, SourceError>> + Send + 'a>>;

/// Adapter-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    Unavailable,
    Timeout,
    RateLimited,
    InvalidRequest,
    Internal,
}

/// Structured upstream error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
    retryable: bool,
}

impl SourceError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Unavailable,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn timeout(source: &str, timeout_ms: u64) -> Self {
        Self {
            kind: SourceErrorKind::Timeout,
            message: format!("{source} did not respond within {timeout_ms}ms"),
            retryable: true,
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::RateLimited,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::InvalidRequest,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Internal,
            message: message.into(),
            retryable: false,
        }
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::Unavailable => "source.unavailable",
            SourceErrorKind::Timeout => "source.timeout",
            SourceErrorKind::RateLimited => "source.rate_limited",
            SourceErrorKind::InvalidRequest => "source.invalid_request",
            SourceErrorKind::Internal => "source.internal",
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

/// Whole milliseconds of `duration`, saturating.
pub(crate) fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Request payload for quote sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteRequest {
    pub symbols: Vec<Symbol>,
}

impl QuoteRequest {
    pub fn new(symbols: Vec<Symbol>) -> Result<Self, SourceError> {
        if symbols.is_empty() {
            return Err(SourceError::invalid_request(
                "quote request must include at least one symbol",
            ));
        }
        Ok(Self { symbols })
    }

    pub fn single(symbol: Symbol) -> Self {
        Self {
            symbols: vec![symbol],
        }
    }
}

/// Normalized quote batch. Order carries no meaning.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuoteBatch {
    pub quotes: Vec<Quote>,
}

impl QuoteBatch {
    /// Index quotes by symbol; the first quote wins when a source repeats one.
    pub fn by_symbol(&self) -> HashMap<&Symbol, &Quote> {
        let mut index = HashMap::with_capacity(self.quotes.len());
        for quote in &self.quotes {
            index.entry(&quote.symbol).or_insert(quote);
        }
        index
    }

    pub fn find(&self, symbol: &Symbol) -> Option<&Quote> {
        self.quotes.iter().find(|quote| &quote.symbol == symbol)
    }
}

/// Indicator families the pipeline knows how to request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorKind {
    Rsi,
    MacdSignal,
    MovingAverage,
}

impl IndicatorKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Rsi => "rsi",
            Self::MacdSignal => "macd_signal",
            Self::MovingAverage => "moving_average",
        }
    }
}

impl Display for IndicatorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request payload for indicator sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndicatorRequest {
    pub symbol: Symbol,
    pub kind: IndicatorKind,
    pub period: Option<u32>,
}

impl IndicatorRequest {
    pub fn new(symbol: Symbol, kind: IndicatorKind, period: Option<u32>) -> Self {
        Self {
            symbol,
            kind,
            period,
        }
    }
}

/// Indicator values, most recent first. Only index 0 is consumed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSeries {
    pub values: Vec<f64>,
}

impl IndicatorSeries {
    pub fn latest(&self) -> Option<f64> {
        self.values.first().copied().filter(|value| value.is_finite())
    }
}

/// Source of latest quotes.
pub trait QuoteSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// Fetches quotes for every requested symbol the source knows about.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] when the upstream call itself fails. Unknown
    /// symbols are not an error; they are absent from the batch.
    fn quote<'a>(&'a self, req: QuoteRequest) -> SourceFuture<'a, QuoteBatch>;
}

/// Source of technical indicators.
pub trait IndicatorSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// Fetches one indicator for one symbol. An empty series is valid.
    fn indicator<'a>(&'a self, req: IndicatorRequest) -> SourceFuture<'a, IndicatorSeries>;
}

/// Feed of the currently most active securities.
pub trait ActiveFeed: Send + Sync {
    fn name(&self) -> &'static str;

    /// Returns active securities in feed order.
    fn most_active<'a>(&'a self) -> SourceFuture<'a, QuoteBatch>;
}
