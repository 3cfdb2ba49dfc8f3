use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::config::SignalConfig;
use crate::data_source::{
    ActiveFeed, IndicatorKind, IndicatorRequest, IndicatorSeries, IndicatorSource,
    QuoteBatch, QuoteRequest, QuoteSource, SourceError, SourceFuture,
};
use crate::http_client::{HttpClient, HttpRequest};
use crate::throttling::RequestBudget;
use crate::{Quote, Symbol};

use super::{check_status, transport_error};

const PROVIDER: &str = "fmp";

const RSI_FIELDS: &[&str] = &["rsi"];
const SMA_FIELDS: &[&str] = &["sma"];
// Signal line first, raw MACD when the signal line is missing.
const MACD_FIELDS: &[&str] = &["signal", "macd"];

/// Financial Modeling Prep adapter serving quotes, indicators and the
/// most-active feed over one shared request budget.
#[derive(Clone)]
pub struct FmpClient {
    http_client: Arc<dyn HttpClient>,
    base_url: String,
    api_key: String,
    timeout: Duration,
    budget: RequestBudget,
}

impl FmpClient {
    pub fn new(http_client: Arc<dyn HttpClient>, config: &SignalConfig) -> Self {
        Self {
            http_client,
            base_url: config.fmp_base_url.trim_end_matches('/').to_owned(),
            api_key: config
                .fmp_api_key
                .clone()
                .unwrap_or_else(|| String::from("demo")),
            timeout: config.timeout,
            budget: RequestBudget::new(PROVIDER, config.request_window, config.request_limit),
        }
    }

    pub fn with_budget(mut self, budget: RequestBudget) -> Self {
        self.budget = budget;
        self
    }

    fn url(&self, path: &str) -> String {
        let separator = if path.contains('?') { '&' } else { '?' };
        format!(
            "{}{path}{separator}apikey={}",
            self.base_url,
            urlencoding::encode(&self.api_key)
        )
    }

    /// Fetch `path` and return its top-level JSON array.
    async fn get_rows(&self, path: &str) -> Result<Vec<Value>, SourceError> {
        self.budget.acquire()?;

        tracing::debug!(provider = PROVIDER, path, "upstream request");
        let request = HttpRequest::get(self.url(path)).with_timeout(self.timeout);
        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|error| transport_error(PROVIDER, &error, self.timeout))?;
        check_status(PROVIDER, &response)?;

        let payload = serde_json::from_str::<Value>(&response.body).map_err(|error| {
            SourceError::unavailable(format!("fmp returned malformed JSON: {error}"))
        })?;

        match payload {
            Value::Array(rows) => Ok(rows),
            Value::Object(object) => {
                let message = object
                    .get("Error Message")
                    .or_else(|| object.get("error"))
                    .and_then(Value::as_str)
                    .unwrap_or("unexpected object payload");
                Err(SourceError::unavailable(format!("fmp error: {message}")))
            }
            _ => Err(SourceError::unavailable("fmp returned a non-array payload")),
        }
    }
}

impl QuoteSource for FmpClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    fn quote<'a>(&'a self, req: QuoteRequest) -> SourceFuture<'a, QuoteBatch> {
        Box::pin(async move {
            if req.symbols.is_empty() {
                return Err(SourceError::invalid_request(
                    "fmp quote request requires at least one symbol",
                ));
            }

            let joined = req
                .symbols
                .iter()
                .map(|symbol| urlencoding::encode(symbol.as_str()).into_owned())
                .collect::<Vec<_>>()
                .join(",");
            let rows = self.get_rows(&format!("/api/v3/quote/{joined}")).await?;

            Ok(QuoteBatch {
                quotes: rows.iter().filter_map(normalize_quote).collect(),
            })
        })
    }
}

impl IndicatorSource for FmpClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    fn indicator<'a>(&'a self, req: IndicatorRequest) -> SourceFuture<'a, IndicatorSeries> {
        Box::pin(async move {
            let (indicator_type, fields) = match req.kind {
                IndicatorKind::Rsi => ("rsi", RSI_FIELDS),
                IndicatorKind::MovingAverage => ("sma", SMA_FIELDS),
                IndicatorKind::MacdSignal => ("macd", MACD_FIELDS),
            };

            let mut path = format!(
                "/api/v3/technical_indicator/1day/{}?type={indicator_type}",
                urlencoding::encode(req.symbol.as_str())
            );
            if let Some(period) = req.period {
                path.push_str(&format!("&period={period}"));
            }

            let rows = self.get_rows(&path).await?;
            let values = rows
                .iter()
                .map_while(|row| fields.iter().find_map(|field| number(row, field)))
                .collect();

            Ok(IndicatorSeries { values })
        })
    }
}

impl ActiveFeed for FmpClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    fn most_active<'a>(&'a self) -> SourceFuture<'a, QuoteBatch> {
        Box::pin(async move {
            let rows = self.get_rows("/api/v3/stock_market/actives").await?;
            Ok(QuoteBatch {
                quotes: rows.iter().filter_map(normalize_quote).collect(),
            })
        })
    }
}

/// Map one quote-shaped row; rows without a usable symbol are skipped and
/// malformed numeric fields become absent.
fn normalize_quote(row: &Value) -> Option<Quote> {
    let raw_symbol = row.get("symbol").and_then(Value::as_str)?;
    let symbol = match Symbol::parse(raw_symbol) {
        Ok(symbol) => symbol,
        Err(error) => {
            tracing::debug!(provider = PROVIDER, raw_symbol, %error, "skipping row");
            return None;
        }
    };

    let name = row
        .get("name")
        .or_else(|| row.get("companyName"))
        .and_then(Value::as_str)
        .map(str::to_owned);
    let price = number(row, "price").filter(|value| *value >= 0.0);
    let market_cap = number(row, "marketCap").filter(|value| *value >= 0.0);
    let volume = row.get("volume").and_then(|value| {
        value.as_u64().or_else(|| {
            value
                .as_f64()
                .filter(|volume| volume.is_finite() && *volume >= 0.0)
                .map(|volume| volume.trunc() as u64)
        })
    });

    Quote::new(symbol, name, price, volume, market_cap).ok()
}

fn number(row: &Value, field: &str) -> Option<f64> {
    let value = row.get(field)?;
    value
        .as_f64()
        .or_else(|| value.as_str().and_then(|raw| raw.trim().parse().ok()))
        .filter(|value| value.is_finite())
}
