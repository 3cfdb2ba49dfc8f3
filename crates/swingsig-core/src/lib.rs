//! Core of swingsig.
//!
//! This crate contains:
//! - Canonical domain models and validation
//! - Upstream source contracts, HTTP transport and adapters
//! - Derivation policies, tiers, ranking and universe selection
//! - Signal composition, formatting and prompts
//! - The fan-out pipeline and the request-facing service

pub mod adapters;
pub mod composer;
pub mod config;
pub mod data_source;
pub mod domain;
pub mod error;
pub mod formatter;
pub mod http_client;
pub mod pipeline;
pub mod policy;
pub mod prompt;
pub mod ranking;
pub mod render;
pub mod service;
pub mod throttling;
pub mod tier;
pub mod universe;

pub use adapters::{FixtureMarket, FixtureNarrator, FmpClient, OpenAiChatClient};
pub use composer::{compose, CompositeSignal};
pub use config::{ConfigError, IndicatorPeriods, SignalConfig};
pub use data_source::{
    ActiveFeed, IndicatorKind, IndicatorRequest, IndicatorSeries, IndicatorSource, QuoteBatch,
    QuoteRequest, QuoteSource, SourceError, SourceErrorKind, SourceFuture,
};
pub use domain::{IndicatorSet, Quote, Symbol};
pub use error::{SignalError, ValidationError};
pub use formatter::{format_signals, NO_CANDIDATES_MESSAGE};
pub use http_client::{
    HttpClient, HttpError, HttpMethod, HttpRequest, HttpResponse, ReqwestHttpClient,
};
pub use pipeline::{DroppedSymbol, PicksOutcome, PicksRequest, SignalPipeline};
pub use policy::{DerivationPolicy, PercentBand, PriceTargets};
pub use prompt::{options_prompt, picks_prompt, signal_prompt, TextGenerator};
pub use ranking::{rank, rank_with_backfill, Backfill, Ranking};
pub use render::{render_optional, round2, NOT_AVAILABLE};
pub use service::{
    OptionsInsight, PicksQuery, PicksReport, SignalOptions, SignalReport, SignalService,
    SymbolRequest,
};
pub use throttling::RequestBudget;
pub use tier::{Tier, TierFilter};
pub use universe::{UniverseKind, UniverseMode, UniverseProvider};
