use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::data_source::{
    ActiveFeed, IndicatorKind, IndicatorRequest, IndicatorSeries, IndicatorSource, QuoteBatch,
    QuoteRequest, QuoteSource, SourceError, SourceFuture,
};
use crate::prompt::TextGenerator;
use crate::{IndicatorSet, Quote, Symbol};

const PROVIDER: &str = "fixture";

#[derive(Debug, Default)]
struct CallCounters {
    quote: AtomicUsize,
    indicator: AtomicUsize,
    active: AtomicUsize,
}

/// Deterministic in-memory market with failure and latency injection.
///
/// Serves quotes, indicators and the most-active feed from fixed tables.
/// Symbols marked failing are omitted from quote batches or fail their
/// indicator calls; delays are applied before answering.
#[derive(Debug, Clone, Default)]
pub struct FixtureMarket {
    quotes: HashMap<Symbol, Quote>,
    indicators: HashMap<Symbol, IndicatorSet>,
    active: Vec<Symbol>,
    missing_quotes: HashSet<Symbol>,
    failing_indicators: HashSet<Symbol>,
    indicator_delays: HashMap<Symbol, Duration>,
    quote_delay: Option<Duration>,
    quotes_down: bool,
    feed_down: bool,
    calls: Arc<CallCounters>,
}

impl FixtureMarket {
    pub fn new() -> Self {
        Self::default()
    }

    /// Market pre-populated with a stable snapshot of large US names.
    pub fn demo() -> Self {
        const ROWS: [(&str, &str, f64, u64, f64, [f64; 4]); 20] = [
            ("AAPL", "Apple Inc.", 187.42, 54_210_000, 2.91e12, [58.4, 1.12, 182.1, 176.3]),
            ("MSFT", "Microsoft Corporation", 411.65, 21_870_000, 3.06e12, [61.2, 2.41, 402.7, 381.9]),
            ("NVDA", "NVIDIA Corporation", 122.44, 310_500_000, 3.01e12, [66.8, 1.87, 116.2, 98.4]),
            ("AMZN", "Amazon.com, Inc.", 178.25, 38_940_000, 1.86e12, [54.9, 0.73, 181.6, 172.0]),
            ("GOOGL", "Alphabet Inc.", 164.31, 24_300_000, 2.03e12, [49.7, -0.35, 168.9, 158.2]),
            ("META", "Meta Platforms, Inc.", 497.82, 14_250_000, 1.26e12, [57.3, 3.05, 489.1, 451.6]),
            ("TSLA", "Tesla, Inc.", 251.52, 96_180_000, 8.02e11, [71.6, 4.62, 229.8, 211.4]),
            ("AMD", "Advanced Micro Devices, Inc.", 158.03, 42_610_000, 2.55e11, [44.2, -1.48, 163.5, 160.7]),
            ("NFLX", "Netflix, Inc.", 686.12, 3_420_000, 2.95e11, [62.9, 5.81, 671.4, 612.8]),
            ("JPM", "JPMorgan Chase & Co.", 211.37, 8_910_000, 6.04e11, [55.1, 0.92, 207.3, 196.5]),
            ("V", "Visa Inc.", 278.64, 6_120_000, 5.45e11, [52.6, 0.44, 276.2, 270.9]),
            ("DIS", "The Walt Disney Company", 92.18, 9_870_000, 1.68e11, [38.5, -0.81, 95.4, 101.2]),
            ("BA", "The Boeing Company", 171.05, 7_640_000, 1.05e11, [33.9, -1.96, 178.8, 190.3]),
            ("INTC", "Intel Corporation", 21.47, 61_300_000, 9.22e10, [28.7, -0.52, 23.9, 31.6]),
            ("PLTR", "Palantir Technologies Inc.", 37.81, 58_770_000, 8.51e10, [69.4, 0.88, 33.2, 26.1]),
            ("SOFI", "SoFi Technologies, Inc.", 9.62, 44_180_000, 1.03e10, [60.1, 0.21, 8.9, 7.8]),
            ("UBER", "Uber Technologies, Inc.", 71.94, 17_560_000, 1.51e11, [47.8, -0.12, 72.6, 68.3]),
            ("CRM", "Salesforce, Inc.", 289.11, 5_330_000, 2.77e11, [56.4, 1.34, 281.7, 266.2]),
            ("COIN", "Coinbase Global, Inc.", 216.73, 8_840_000, 5.41e10, [51.2, 0.67, 210.5, 221.9]),
            ("SHOP", "Shopify Inc.", 78.36, 11_250_000, 1.01e11, [64.5, 1.02, 74.1, 69.8]),
        ];
        const ACTIVE: [&str; 8] = ["NVDA", "TSLA", "INTC", "PLTR", "AAPL", "SOFI", "AMD", "AMZN"];

        let mut market = Self::new();
        for (raw, name, price, volume, cap, [rsi, macd, ma50, ma200]) in ROWS {
            let Ok(symbol) = Symbol::parse(raw) else {
                continue;
            };
            let Ok(quote) = Quote::new(
                symbol,
                Some(name.to_owned()),
                Some(price),
                Some(volume),
                Some(cap),
            ) else {
                continue;
            };
            market = market.with_quote(quote).with_indicators(
                raw,
                IndicatorSet {
                    rsi: Some(rsi),
                    macd_signal: Some(macd),
                    moving_average_50: Some(ma50),
                    moving_average_200: Some(ma200),
                },
            );
        }
        market.active = ACTIVE
            .iter()
            .filter_map(|raw| Symbol::parse(raw).ok())
            .collect();
        market
    }

    pub fn with_quote(mut self, quote: Quote) -> Self {
        self.quotes.insert(quote.symbol.clone(), quote);
        self
    }

    pub fn with_indicators(mut self, symbol: &str, indicators: IndicatorSet) -> Self {
        if let Ok(symbol) = Symbol::parse(symbol) {
            self.indicators.insert(symbol, indicators);
        }
        self
    }

    /// Feed order for [`ActiveFeed::most_active`]; every symbol needs a quote.
    pub fn with_active(mut self, symbols: &[&str]) -> Self {
        self.active = symbols
            .iter()
            .filter_map(|raw| Symbol::parse(raw).ok())
            .collect();
        self
    }

    /// Omit `symbol` from every quote batch.
    pub fn without_quote_for(mut self, symbol: &str) -> Self {
        if let Ok(symbol) = Symbol::parse(symbol) {
            self.missing_quotes.insert(symbol);
        }
        self
    }

    /// Fail every indicator call for `symbol`.
    pub fn failing_indicators_for(mut self, symbol: &str) -> Self {
        if let Ok(symbol) = Symbol::parse(symbol) {
            self.failing_indicators.insert(symbol);
        }
        self
    }

    /// Delay every indicator call for `symbol`.
    pub fn with_indicator_delay(mut self, symbol: &str, delay: Duration) -> Self {
        if let Ok(symbol) = Symbol::parse(symbol) {
            self.indicator_delays.insert(symbol, delay);
        }
        self
    }

    pub fn with_quote_delay(mut self, delay: Duration) -> Self {
        self.quote_delay = Some(delay);
        self
    }

    /// Fail every quote call.
    pub fn with_quotes_down(mut self) -> Self {
        self.quotes_down = true;
        self
    }

    /// Fail every most-active feed call.
    pub fn with_feed_down(mut self) -> Self {
        self.feed_down = true;
        self
    }

    pub fn quote_calls(&self) -> usize {
        self.calls.quote.load(Ordering::SeqCst)
    }

    pub fn indicator_calls(&self) -> usize {
        self.calls.indicator.load(Ordering::SeqCst)
    }

    pub fn active_calls(&self) -> usize {
        self.calls.active.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.quote_calls() + self.indicator_calls() + self.active_calls()
    }

    fn indicator_value(&self, req: &IndicatorRequest) -> Option<f64> {
        let set = self.indicators.get(&req.symbol)?;
        match (req.kind, req.period) {
            (IndicatorKind::Rsi, _) => set.rsi,
            (IndicatorKind::MacdSignal, _) => set.macd_signal,
            (IndicatorKind::MovingAverage, Some(50)) => set.moving_average_50,
            (IndicatorKind::MovingAverage, Some(200)) => set.moving_average_200,
            (IndicatorKind::MovingAverage, _) => None,
        }
    }
}

impl QuoteSource for FixtureMarket {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    fn quote<'a>(&'a self, req: QuoteRequest) -> SourceFuture<'a, QuoteBatch> {
        Box::pin(async move {
            self.calls.quote.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.quote_delay {
                tokio::time::sleep(delay).await;
            }
            if self.quotes_down {
                return Err(SourceError::unavailable("fixture quote source is down"));
            }

            let quotes = req
                .symbols
                .iter()
                .filter(|symbol| !self.missing_quotes.contains(*symbol))
                .filter_map(|symbol| self.quotes.get(symbol).cloned())
                .rev()
                .collect();
            Ok(QuoteBatch { quotes })
        })
    }
}

impl IndicatorSource for FixtureMarket {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    fn indicator<'a>(&'a self, req: IndicatorRequest) -> SourceFuture<'a, IndicatorSeries> {
        Box::pin(async move {
            self.calls.indicator.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.indicator_delays.get(&req.symbol) {
                tokio::time::sleep(*delay).await;
            }
            if self.failing_indicators.contains(&req.symbol) {
                return Err(SourceError::unavailable(format!(
                    "fixture indicator {} failed for {}",
                    req.kind, req.symbol
                )));
            }

            Ok(IndicatorSeries {
                values: self.indicator_value(&req).into_iter().collect(),
            })
        })
    }
}

impl ActiveFeed for FixtureMarket {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    fn most_active<'a>(&'a self) -> SourceFuture<'a, QuoteBatch> {
        Box::pin(async move {
            self.calls.active.fetch_add(1, Ordering::SeqCst);
            if self.feed_down {
                return Err(SourceError::unavailable("fixture active feed is down"));
            }

            let quotes = self
                .active
                .iter()
                .filter_map(|symbol| self.quotes.get(symbol).cloned())
                .collect();
            Ok(QuoteBatch { quotes })
        })
    }
}

/// Text generator that echoes a digest of the prompt, or fails on demand.
#[derive(Debug, Clone, Default)]
pub struct FixtureNarrator {
    failing: bool,
    calls: Arc<AtomicUsize>,
}

impl FixtureNarrator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TextGenerator for FixtureNarrator {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    fn generate<'a>(&'a self, prompt: String) -> SourceFuture<'a, String> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failing {
                return Err(SourceError::unavailable("fixture narrator is down"));
            }
            let first_line = prompt.lines().find(|line| !line.trim().is_empty());
            Ok(format!(
                "[fixture narration] {}",
                first_line.unwrap_or_default().trim()
            ))
        })
    }
}
