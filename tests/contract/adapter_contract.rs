//! Contract tests for the HTTP-backed adapters.
//!
//! A scripted transport stands in for the network: it answers by URL
//! substring and records every request so tests can assert on the wire shape.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use fastrand::Rng;
use serde_json::Value;
use swingsig_core::{
    ActiveFeed, DerivationPolicy, FmpClient, HttpClient, HttpError, HttpMethod, HttpRequest,
    HttpResponse, IndicatorKind, IndicatorRequest, IndicatorSource, OpenAiChatClient,
    QuoteRequest, QuoteSource, RequestBudget, SignalConfig, SignalPipeline, SourceErrorKind,
    Symbol, TextGenerator, UniverseProvider,
};

// =============================================================================
// Scripted transport
// =============================================================================

type Reply = Result<HttpResponse, HttpError>;

#[derive(Default)]
struct ScriptedHttp {
    routes: Vec<(&'static str, Reply)>,
    seen: Mutex<Vec<HttpRequest>>,
}

impl ScriptedHttp {
    fn new() -> Self {
        Self::default()
    }

    fn route(mut self, url_fragment: &'static str, reply: Reply) -> Self {
        self.routes.push((url_fragment, reply));
        self
    }

    fn json(self, url_fragment: &'static str, body: &str) -> Self {
        self.route(url_fragment, Ok(HttpResponse::ok_json(body)))
    }

    fn status(self, url_fragment: &'static str, status: u16) -> Self {
        self.route(
            url_fragment,
            Ok(HttpResponse {
                status,
                body: String::new(),
            }),
        )
    }

    fn requests(&self) -> Vec<HttpRequest> {
        self.seen.lock().expect("request log").clone()
    }
}

impl HttpClient for ScriptedHttp {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        Box::pin(async move {
            let reply = self
                .routes
                .iter()
                .find(|(fragment, _)| request.url.contains(fragment))
                .map(|(_, reply)| reply.clone())
                .unwrap_or_else(|| {
                    Ok(HttpResponse {
                        status: 404,
                        body: String::new(),
                    })
                });
            self.seen.lock().expect("request log").push(request);
            reply
        })
    }
}

fn config() -> SignalConfig {
    let mut config = SignalConfig::default().with_timeout(Duration::from_millis(500));
    config.fmp_base_url = String::from("https://fmp.test/");
    config.fmp_api_key = Some(String::from("test-key"));
    config.openai_base_url = String::from("https://llm.test/v1");
    config.openai_api_key = Some(String::from("sk-test"));
    config
}

fn symbol(raw: &str) -> Symbol {
    Symbol::parse(raw).expect("valid symbol")
}

fn fmp(http: &Arc<ScriptedHttp>) -> FmpClient {
    FmpClient::new(http.clone(), &config())
}

// =============================================================================
// FMP: quotes
// =============================================================================

#[tokio::test]
async fn when_quotes_are_requested_then_one_comma_joined_call_is_made() {
    // Given: Two quote rows, one with a lowercase symbol and a string volume
    let http = Arc::new(ScriptedHttp::new().json(
        "/api/v3/quote/",
        r#"[
            {"symbol": "MSFT", "name": "Microsoft Corporation", "price": 411.65, "volume": 21870000, "marketCap": 3.06e12},
            {"symbol": "aapl", "companyName": "Apple Inc.", "price": "187.42", "volume": "n/a"}
        ]"#,
    ));
    let client = fmp(&http);

    // When: A batch of two symbols is requested
    let batch = client
        .quote(QuoteRequest::new(vec![symbol("AAPL"), symbol("MSFT")]).expect("valid request"))
        .await
        .expect("quote batch");

    // Then: A single GET with both symbols and the api key
    let requests = http.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, HttpMethod::Get);
    assert_eq!(
        requests[0].url,
        "https://fmp.test/api/v3/quote/AAPL,MSFT?apikey=test-key"
    );

    // And: Rows are matched by symbol, with malformed fields absent
    let apple = batch.find(&symbol("AAPL")).expect("AAPL present");
    assert_eq!(apple.name.as_deref(), Some("Apple Inc."));
    assert_eq!(apple.price, Some(187.42));
    assert_eq!(apple.volume, None);
    let microsoft = batch.find(&symbol("MSFT")).expect("MSFT present");
    assert_eq!(microsoft.volume, Some(21_870_000));
    assert_eq!(microsoft.market_cap, Some(3.06e12));
}

#[tokio::test]
async fn when_quote_row_is_missing_then_batch_omits_that_symbol() {
    let http = Arc::new(ScriptedHttp::new().json(
        "/api/v3/quote/",
        r#"[{"symbol": "MSFT", "price": 411.65}]"#,
    ));

    let batch = fmp(&http)
        .quote(QuoteRequest::new(vec![symbol("AAPL"), symbol("MSFT")]).expect("valid request"))
        .await
        .expect("quote batch");

    assert_eq!(batch.quotes.len(), 1);
    assert!(batch.find(&symbol("AAPL")).is_none());
}

// =============================================================================
// FMP: indicators
// =============================================================================

#[tokio::test]
async fn when_indicator_is_requested_then_type_and_period_are_in_the_url() {
    // Given: A daily RSI series, most recent first
    let http = Arc::new(ScriptedHttp::new().json(
        "type=rsi",
        r#"[{"date": "2026-10-16", "rsi": 61.25}, {"date": "2026-10-15", "rsi": 58.0}]"#,
    ));

    // When: RSI(14) is requested
    let series = fmp(&http)
        .indicator(IndicatorRequest::new(
            symbol("NVDA"),
            IndicatorKind::Rsi,
            Some(14),
        ))
        .await
        .expect("series");

    // Then: Only index 0 is consumed downstream
    assert_eq!(series.latest(), Some(61.25));
    assert_eq!(
        http.requests()[0].url,
        "https://fmp.test/api/v3/technical_indicator/1day/NVDA?type=rsi&period=14&apikey=test-key"
    );
}

#[tokio::test]
async fn when_macd_signal_line_is_missing_then_raw_macd_is_used() {
    let http = Arc::new(ScriptedHttp::new().json(
        "type=macd",
        r#"[{"date": "2026-10-16", "macd": 1.5}]"#,
    ));

    let series = fmp(&http)
        .indicator(IndicatorRequest::new(
            symbol("NVDA"),
            IndicatorKind::MacdSignal,
            None,
        ))
        .await
        .expect("series");

    assert_eq!(series.latest(), Some(1.5));
    assert!(!http.requests()[0].url.contains("period="));
}

#[tokio::test]
async fn when_indicator_series_is_empty_then_latest_is_absent() {
    let http = Arc::new(ScriptedHttp::new().json("type=sma", "[]"));

    let series = fmp(&http)
        .indicator(IndicatorRequest::new(
            symbol("NVDA"),
            IndicatorKind::MovingAverage,
            Some(50),
        ))
        .await
        .expect("empty series is not an error");

    assert_eq!(series.latest(), None);
}

// =============================================================================
// FMP: most-active feed
// =============================================================================

#[tokio::test]
async fn when_active_feed_is_read_then_feed_order_is_preserved() {
    let http = Arc::new(ScriptedHttp::new().json(
        "/api/v3/stock_market/actives",
        r#"[
            {"symbol": "TSLA", "name": "Tesla, Inc.", "price": 251.52},
            {"symbol": "$BAD", "price": 1.0},
            {"symbol": "INTC", "name": "Intel Corporation", "price": 21.47}
        ]"#,
    ));

    let batch = fmp(&http).most_active().await.expect("feed");

    let order = batch
        .quotes
        .iter()
        .map(|quote| quote.symbol.as_str())
        .collect::<Vec<_>>();
    assert_eq!(order, vec!["TSLA", "INTC"]);
}

// =============================================================================
// FMP: failure mapping
// =============================================================================

#[tokio::test]
async fn when_upstream_fails_then_errors_are_classified() {
    let cases: Vec<(ScriptedHttp, SourceErrorKind)> = vec![
        (
            ScriptedHttp::new().status("/api/v3/quote/", 500),
            SourceErrorKind::Unavailable,
        ),
        (
            ScriptedHttp::new().status("/api/v3/quote/", 429),
            SourceErrorKind::RateLimited,
        ),
        (
            ScriptedHttp::new().json(
                "/api/v3/quote/",
                r#"{"Error Message": "Invalid API KEY."}"#,
            ),
            SourceErrorKind::Unavailable,
        ),
        (
            ScriptedHttp::new().json("/api/v3/quote/", "<html>oops</html>"),
            SourceErrorKind::Unavailable,
        ),
        (
            ScriptedHttp::new().route(
                "/api/v3/quote/",
                Err(HttpError::timed_out("operation timed out")),
            ),
            SourceErrorKind::Timeout,
        ),
    ];

    for (http, expected) in cases {
        let http = Arc::new(http);
        let error = fmp(&http)
            .quote(QuoteRequest::single(symbol("AAPL")))
            .await
            .expect_err("must fail");

        assert_eq!(error.kind(), expected, "error: {error}");
    }
}

#[tokio::test]
async fn when_upstream_reports_an_error_object_then_its_message_is_kept() {
    let http = Arc::new(ScriptedHttp::new().json(
        "/api/v3/quote/",
        r#"{"Error Message": "Invalid API KEY."}"#,
    ));

    let error = fmp(&http)
        .quote(QuoteRequest::single(symbol("AAPL")))
        .await
        .expect_err("must fail");

    assert_eq!(error.message(), "fmp error: Invalid API KEY.");
}

#[tokio::test]
async fn when_request_budget_is_exhausted_then_call_fails_without_reaching_the_network() {
    // Given: A budget of one call per minute
    let http = Arc::new(ScriptedHttp::new().json("/api/v3/quote/", "[]"));
    let client = fmp(&http).with_budget(RequestBudget::new("fmp", Duration::from_secs(60), 1));

    // When: Two calls are made back to back
    client
        .quote(QuoteRequest::single(symbol("AAPL")))
        .await
        .expect("first call fits the budget");
    let error = client
        .quote(QuoteRequest::single(symbol("AAPL")))
        .await
        .expect_err("second call exceeds the budget");

    // Then: Rate limited, and only one request hit the transport
    assert_eq!(error.kind(), SourceErrorKind::RateLimited);
    assert_eq!(http.requests().len(), 1);
}

// =============================================================================
// OpenAI chat completions
// =============================================================================

#[tokio::test]
async fn when_completion_is_requested_then_bearer_and_body_are_sent() {
    // Given: A completion with surrounding whitespace in its content
    let http = Arc::new(ScriptedHttp::new().json(
        "/chat/completions",
        r#"{"choices": [{"message": {"role": "assistant", "content": "  Hold above $180.\n"}}]}"#,
    ));
    let client = OpenAiChatClient::new(http.clone(), &config());

    // When: Text is generated
    let text = client
        .generate(String::from("Stock: AAPL"))
        .await
        .expect("completion");

    // Then: Content is returned verbatim
    assert_eq!(text, "  Hold above $180.\n");

    // And: The request carries the token, model and single user message
    let request = &http.requests()[0];
    assert_eq!(request.method, HttpMethod::Post);
    assert_eq!(request.url, "https://llm.test/v1/chat/completions");
    assert_eq!(
        request.headers.get("authorization").map(String::as_str),
        Some("Bearer sk-test")
    );
    let body: Value =
        serde_json::from_str(request.body.as_deref().expect("body")).expect("json body");
    assert_eq!(body["model"], "gpt-4");
    assert_eq!(body["messages"][0]["role"], "user");
    assert_eq!(body["messages"][0]["content"], "Stock: AAPL");
}

#[tokio::test]
async fn when_completion_has_no_choices_then_source_is_unavailable() {
    let http = Arc::new(ScriptedHttp::new().json("/chat/completions", r#"{"choices": []}"#));

    let error = OpenAiChatClient::new(http, &config())
        .generate(String::from("Stock: AAPL"))
        .await
        .expect_err("must fail");

    assert_eq!(error.kind(), SourceErrorKind::Unavailable);
    assert_eq!(error.message(), "openai returned no completion choices");
}

#[tokio::test]
async fn when_api_key_is_missing_then_no_request_is_sent() {
    let http = Arc::new(ScriptedHttp::new());
    let mut config = config();
    config.openai_api_key = None;

    let error = OpenAiChatClient::new(http.clone(), &config)
        .generate(String::from("Stock: AAPL"))
        .await
        .expect_err("must fail");

    assert_eq!(error.kind(), SourceErrorKind::InvalidRequest);
    assert!(http.requests().is_empty());
}

// =============================================================================
// End to end over the FMP adapter
// =============================================================================

#[tokio::test]
async fn when_signal_runs_over_fmp_then_quote_and_four_indicators_are_fetched() {
    // Given: Scripted quote and indicator endpoints for one symbol
    let http = Arc::new(
        ScriptedHttp::new()
            .json(
                "/api/v3/quote/",
                r#"[{"symbol": "AAA", "name": "Alpha Corp", "price": 100.0, "volume": 12000000, "marketCap": 5.0e10}]"#,
            )
            .json("type=rsi", r#"[{"rsi": 72.4}]"#)
            .json("type=macd", r#"[{"signal": -0.35}]"#)
            .json("type=sma&period=50&", r#"[{"sma": 101.0}]"#)
            .json("type=sma&period=200&", r#"[{"sma": 97.5}]"#),
    );
    let config = config();
    let client = Arc::new(FmpClient::new(http.clone(), &config));
    let universe = UniverseProvider::new(vec![symbol("AAA")], config.timeout);
    let pipeline = SignalPipeline::new(client.clone(), client, universe, &config);

    // When: The signal is composed with the swing policy
    let signal = pipeline
        .signal(&symbol("AAA"), &DerivationPolicy::swing(), &mut Rng::with_seed(3))
        .await
        .expect("signal");

    // Then: Prices and every indicator come from the scripted payloads
    assert!((signal.target_price - 108.0).abs() < 1e-9);
    assert!((signal.stop_loss_price - 95.0).abs() < 1e-9);
    let indicators = signal.indicators.expect("indicators present");
    assert_eq!(indicators.rsi, Some(72.4));
    assert_eq!(indicators.macd_signal, Some(-0.35));
    assert_eq!(indicators.moving_average_50, Some(101.0));
    assert_eq!(indicators.moving_average_200, Some(97.5));
    assert_eq!(http.requests().len(), 5);
}
