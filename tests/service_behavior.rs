//! Behavior-driven tests for the request-facing service.
//!
//! These tests verify HOW inbound requests are validated, how outcomes are
//! reported to users, and how narration and options insight behave.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use fastrand::Rng;
use swingsig_core::{
    DerivationPolicy, FixtureMarket, FixtureNarrator, PicksQuery, Quote, SignalConfig, SignalError, SignalOptions,
    SignalPipeline, SignalService, SourceFuture, Symbol, SymbolRequest, TextGenerator,
    UniverseProvider, NO_CANDIDATES_MESSAGE,
};

// =============================================================================
// Fixtures
// =============================================================================

/// Generator returning a fixed reply and counting its calls.
struct CannedText {
    reply: String,
    calls: AtomicUsize,
}

impl CannedText {
    fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_owned(),
            calls: AtomicUsize::new(0),
        }
    }
}

impl TextGenerator for CannedText {
    fn name(&self) -> &'static str {
        "canned"
    }

    fn generate<'a>(&'a self, _prompt: String) -> SourceFuture<'a, String> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.reply.clone())
        })
    }
}

/// Generator that answers only after `delay`.
struct SlowText {
    delay: Duration,
}

impl TextGenerator for SlowText {
    fn name(&self) -> &'static str {
        "slow"
    }

    fn generate<'a>(&'a self, _prompt: String) -> SourceFuture<'a, String> {
        Box::pin(async move {
            tokio::time::sleep(self.delay).await;
            Ok(String::from("late reply"))
        })
    }
}

fn quote(raw: &str, price: f64, market_cap: f64) -> Quote {
    Quote::new(
        Symbol::parse(raw).expect("valid symbol"),
        None,
        Some(price),
        Some(25_000_000),
        Some(market_cap),
    )
    .expect("valid quote")
}

fn market() -> FixtureMarket {
    FixtureMarket::new()
        .with_quote(quote("AAA", 150.0, 2e11))
        .with_quote(quote("BBB", 7.5, 4e9))
        .with_quote(quote("CCC", 42.0, 6e10))
        .with_active(&["CCC", "AAA"])
}

fn service(market: &Arc<FixtureMarket>) -> SignalService {
    let config = SignalConfig::default().with_timeout(Duration::from_millis(500));
    let universe = UniverseProvider::new(
        ["AAA", "BBB", "CCC"]
            .iter()
            .map(|raw| Symbol::parse(raw).expect("valid symbol"))
            .collect(),
        config.timeout,
    )
    .with_feed(market.clone());
    SignalService::new(SignalPipeline::new(
        market.clone(),
        market.clone(),
        universe,
        &config,
    ))
}

// =============================================================================
// Inbound validation: rejected before any network call
// =============================================================================

#[tokio::test]
async fn when_tier_is_unknown_then_invalid_selector_is_returned_before_any_call() {
    // Given: A service over a call-counting market
    let market = Arc::new(market());
    let service = service(&market);

    // When: Picks are requested with an unknown tier
    let query = PicksQuery {
        tier: Some(String::from("penny")),
        ..PicksQuery::default()
    };
    let err = service
        .picks(&query, &mut Rng::with_seed(1))
        .await
        .expect_err("must fail");

    // Then: A typed invalid-tier rejection, and no upstream call was made
    assert!(matches!(
        err,
        SignalError::InvalidSelector { kind: "tier", .. }
    ));
    assert_eq!(
        err.to_string(),
        "invalid tier 'penny', expected one of high-volume, large-cap, mid-cap"
    );
    assert_eq!(market.total_calls(), 0);
}

#[tokio::test]
async fn when_policy_or_universe_is_unknown_then_invalid_selector_is_returned() {
    let market = Arc::new(market());
    let service = service(&market);

    let bad_policy = PicksQuery {
        policy: Some(String::from("yolo")),
        ..PicksQuery::default()
    };
    let bad_universe = PicksQuery {
        universe: Some(String::from("everything")),
        ..PicksQuery::default()
    };

    assert!(matches!(
        service.picks(&bad_policy, &mut Rng::with_seed(1)).await,
        Err(SignalError::InvalidSelector { kind: "policy", .. })
    ));
    assert!(matches!(
        service.picks(&bad_universe, &mut Rng::with_seed(1)).await,
        Err(SignalError::InvalidSelector { kind: "universe", .. })
    ));
    assert_eq!(market.total_calls(), 0);
}

#[tokio::test]
async fn when_symbol_is_malformed_then_validation_error_is_returned_before_any_call() {
    let market = Arc::new(market());
    let service = service(&market);

    let err = service
        .signal(
            &SymbolRequest::new("1BAD"),
            &SignalOptions::default(),
            &mut Rng::with_seed(1),
        )
        .await
        .expect_err("must fail");

    assert!(matches!(err, SignalError::Validation(_)));
    assert_eq!(market.total_calls(), 0);
}

#[tokio::test]
async fn when_top_is_zero_then_request_is_rejected() {
    let market = Arc::new(market());
    let service = service(&market);

    let query = PicksQuery {
        top: Some(0),
        ..PicksQuery::default()
    };
    let err = service
        .picks(&query, &mut Rng::with_seed(1))
        .await
        .expect_err("must fail");

    assert!(matches!(err, SignalError::Validation(_)));
    assert_eq!(market.total_calls(), 0);
}

#[test]
fn when_picks_query_arrives_as_json_then_missing_fields_take_defaults() {
    let query: PicksQuery =
        serde_json::from_str(r#"{"tier":"mid-cap","top":2}"#).expect("deserializes");

    assert_eq!(query.tier.as_deref(), Some("mid-cap"));
    assert_eq!(query.top, Some(2));
    assert!(!query.indicators);
    assert!(query.universe.is_none());
}

// =============================================================================
// Outcomes
// =============================================================================

#[tokio::test]
async fn when_lowercase_symbol_is_requested_then_signal_is_returned_for_uppercase() {
    let market = Arc::new(market());
    let service = service(&market);

    let report = service
        .signal(
            &SymbolRequest::new(" aaa "),
            &SignalOptions {
                policy: Some(String::from("conservative")),
                narrate: false,
            },
            &mut Rng::with_seed(1),
        )
        .await
        .expect("signal report");

    assert_eq!(report.signal.symbol.as_str(), "AAA");
    assert!(report.formatted.contains("Target: $157.50 (+5.00%)"));
    assert!(report.formatted.contains("Stop loss: $147.00 (-2.00%)"));
    assert!(report.narrative.is_none());
}

#[tokio::test]
async fn when_request_names_no_policy_then_service_default_policy_applies() {
    // Given: A service whose default policy is conservative
    let market = Arc::new(market());
    let service = service(&market).with_default_policy(DerivationPolicy::conservative());

    // When: A signal is requested without a policy
    let report = service
        .signal(
            &SymbolRequest::new("AAA"),
            &SignalOptions::default(),
            &mut Rng::with_seed(1),
        )
        .await
        .expect("signal report");

    // Then: Conservative offsets are used instead of swing
    assert!(report.formatted.contains("Target: $157.50 (+5.00%)"));
    assert!(report.formatted.contains("Stop loss: $147.00 (-2.00%)"));
}

#[tokio::test]
async fn when_no_candidate_passes_tier_then_explicit_message_is_returned() {
    // Given: A universe whose only quoted member is a large cap
    let market = Arc::new(FixtureMarket::new().with_quote(quote("AAA", 150.0, 2e11)));
    let service = service(&market);

    // When: Mid caps are requested
    let query = PicksQuery {
        tier: Some(String::from("mid-cap")),
        ..PicksQuery::default()
    };
    let report = service
        .picks(&query, &mut Rng::with_seed(1))
        .await
        .expect("empty result is not an error");

    // Then: The formatted output is the fixed no-candidates message
    assert!(report.outcome.is_empty());
    assert_eq!(report.formatted, NO_CANDIDATES_MESSAGE);
}

#[tokio::test]
async fn when_no_tier_is_selected_and_nothing_is_quoted_then_message_does_not_name_a_tier() {
    // Given: A market that quotes none of the universe
    let market = Arc::new(FixtureMarket::new());
    let service = service(&market);

    // When: Picks are requested without a tier
    let report = service
        .picks(&PicksQuery::default(), &mut Rng::with_seed(1))
        .await
        .expect("empty result is not an error");

    // Then: The empty outcome renders the tier-neutral message
    assert!(report.outcome.is_empty());
    assert_eq!(report.outcome.tier, None);
    assert_eq!(report.formatted, NO_CANDIDATES_MESSAGE);
    assert_eq!(report.formatted, "No candidates matched the request.");
}

#[tokio::test]
async fn when_dropped_symbols_exist_then_they_surface_as_warnings() {
    let market = Arc::new(market().without_quote_for("BBB"));
    let service = service(&market);

    let report = service
        .picks(&PicksQuery::default(), &mut Rng::with_seed(1))
        .await
        .expect("picks report");

    assert_eq!(report.outcome.signals.len(), 2);
    assert_eq!(
        report.warnings(),
        vec![String::from("BBB dropped: no quote returned")]
    );
}

#[tokio::test]
async fn when_screened_universe_is_requested_then_feed_order_drives_ranking() {
    let market = Arc::new(market());
    let service = service(&market);

    let query = PicksQuery {
        universe: Some(String::from("screened")),
        tier: Some(String::from("large-cap")),
        ..PicksQuery::default()
    };
    let report = service
        .picks(&query, &mut Rng::with_seed(1))
        .await
        .expect("picks report");

    let first = report.formatted.find("1. CCC").expect("CCC first");
    let second = report.formatted.find("2. AAA").expect("AAA second");
    assert!(first < second);
    assert_eq!(market.active_calls(), 1);
}

// =============================================================================
// Narration
// =============================================================================

#[tokio::test]
async fn when_narration_is_requested_then_generator_text_is_returned_verbatim() {
    let market = Arc::new(market());
    let reply = "  Bullish setup.\n🎯 Target holds while RSI < 70.  ";
    let narrator = Arc::new(CannedText::new(reply));
    let service = service(&market).with_narrator(narrator.clone());

    let report = service
        .signal(
            &SymbolRequest::new("CCC"),
            &SignalOptions {
                policy: None,
                narrate: true,
            },
            &mut Rng::with_seed(1),
        )
        .await
        .expect("signal report");

    assert_eq!(report.narrative.as_deref(), Some(reply));
    assert_eq!(narrator.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn when_narration_fails_then_formatted_result_is_kept_with_warning() {
    let market = Arc::new(market());
    let service = service(&market).with_narrator(Arc::new(FixtureNarrator::failing()));

    let query = PicksQuery {
        narrate: true,
        ..PicksQuery::default()
    };
    let report = service
        .picks(&query, &mut Rng::with_seed(1))
        .await
        .expect("narration failure must not fail picks");

    assert!(report.narrative.is_none());
    assert!(report.formatted.starts_with("1. AAA"));
    assert!(report
        .outcome
        .warnings
        .iter()
        .any(|warning| warning.starts_with("narration unavailable:")));
}

#[tokio::test]
async fn when_narration_exceeds_its_timeout_then_signal_is_kept_with_warning() {
    // Given: A narrator slower than the narration timeout
    let market = Arc::new(market());
    let service = service(&market)
        .with_narrator(Arc::new(SlowText {
            delay: Duration::from_millis(500),
        }))
        .with_narration_timeout(Duration::from_millis(20));

    // When: A narrated signal is requested
    let report = service
        .signal(
            &SymbolRequest::new("AAA"),
            &SignalOptions {
                policy: None,
                narrate: true,
            },
            &mut Rng::with_seed(1),
        )
        .await
        .expect("narration timeout must not fail the signal");

    // Then: No narrative, the formatted block survives, a warning explains why
    assert!(report.narrative.is_none());
    assert!(report.formatted.contains("Target: $162.00 (+8.00%)"));
    assert!(report
        .warnings
        .iter()
        .any(|warning| warning.starts_with("narration unavailable:")));
}

#[tokio::test]
async fn when_outcome_is_empty_then_narrator_is_not_called() {
    let market = Arc::new(FixtureMarket::new().with_quote(quote("AAA", 150.0, 2e11)));
    let narrator = Arc::new(FixtureNarrator::new());
    let service = service(&market).with_narrator(narrator.clone());

    let query = PicksQuery {
        tier: Some(String::from("mid-cap")),
        narrate: true,
        ..PicksQuery::default()
    };
    let report = service
        .picks(&query, &mut Rng::with_seed(1))
        .await
        .expect("picks report");

    assert!(report.outcome.is_empty());
    assert_eq!(narrator.calls(), 0);
}

// =============================================================================
// Options insight
// =============================================================================

#[tokio::test]
async fn when_options_insight_is_requested_then_reply_is_passed_through_verbatim() {
    let market = Arc::new(market());
    let reply = "💹 Option Trade: Buy CALL @ $45 Strike, 2026-11-20 Expiration";
    let service = service(&market).with_narrator(Arc::new(CannedText::new(reply)));

    let insight = service
        .options_insight(&SymbolRequest::new("ccc"))
        .await
        .expect("insight");

    assert_eq!(insight.symbol.as_str(), "CCC");
    assert_eq!(insight.price, 42.0);
    assert_eq!(insight.message, reply);
}

#[tokio::test]
async fn when_options_symbol_has_no_quote_then_no_valid_data_is_reported() {
    let market = Arc::new(market());
    let service = service(&market).with_narrator(Arc::new(FixtureNarrator::new()));

    let err = service
        .options_insight(&SymbolRequest::new("ZZZ"))
        .await
        .expect_err("must fail");

    assert_eq!(err.to_string(), "no valid quote data for symbol ZZZ");
}

#[tokio::test]
async fn when_options_quote_has_no_price_then_insufficient_data_names_price() {
    let priceless = Quote::new(
        Symbol::parse("PXL").expect("valid symbol"),
        None,
        None,
        None,
        None,
    )
    .expect("valid quote");
    let market = Arc::new(FixtureMarket::new().with_quote(priceless));
    let narrator = Arc::new(FixtureNarrator::new());
    let service = service(&market).with_narrator(narrator.clone());

    let err = service
        .options_insight(&SymbolRequest::new("PXL"))
        .await
        .expect_err("must fail");

    assert!(matches!(
        err,
        SignalError::InsufficientData { field: "price", .. }
    ));
    assert_eq!(narrator.calls(), 0);
}

#[tokio::test]
async fn when_no_text_generator_is_configured_then_options_insight_is_unavailable() {
    let market = Arc::new(market());
    let service = service(&market);

    let err = service
        .options_insight(&SymbolRequest::new("AAA"))
        .await
        .expect_err("must fail");

    assert!(matches!(err, SignalError::SourceUnavailable(_)));
    assert_eq!(market.total_calls(), 0);
}
