mod options;
mod picks;
mod signal;
mod tiers;

use std::sync::Arc;
use std::time::{Duration, Instant};

use fastrand::Rng;
use serde_json::Value;
use swingsig_core::{
    FixtureMarket, FixtureNarrator, FmpClient, HttpClient, OpenAiChatClient, ReqwestHttpClient,
    SignalConfig, SignalPipeline, SignalService, UniverseProvider,
};

use crate::cli::{Cli, Command};
use crate::error::CliError;

/// Rendered result of one command, before envelope wrapping.
pub struct CommandResult {
    pub data: Value,
    pub text: String,
    pub warnings: Vec<String>,
    pub latency_ms: u64,
}

impl CommandResult {
    pub fn new(data: Value, text: impl Into<String>) -> Self {
        Self {
            data,
            text: text.into(),
            warnings: Vec::new(),
            latency_ms: 0,
        }
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings.extend(warnings);
        self
    }

    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }
}

pub async fn run(cli: &Cli) -> Result<CommandResult, CliError> {
    let mut config = SignalConfig::from_env()?;
    if let Some(timeout_ms) = cli.timeout_ms {
        config = config.with_timeout(Duration::from_millis(timeout_ms.max(1)));
    }

    let service = build_service(&config, cli.mock);
    let started = Instant::now();

    let result = match &cli.command {
        Command::Signal(args) => signal::run(args, &service).await?,
        Command::Picks(args) => picks::run(args, &service).await?,
        Command::Options(args) => options::run(args, &service).await?,
        Command::Tiers => tiers::run()?,
    };

    let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    Ok(result.with_latency(latency_ms))
}

fn build_service(config: &SignalConfig, mock: bool) -> SignalService {
    let service = if mock {
        tracing::debug!("using fixture market");
        let market = Arc::new(FixtureMarket::demo());
        let universe =
            UniverseProvider::new(config.universe.clone(), config.timeout).with_feed(market.clone());
        SignalService::new(SignalPipeline::new(
            market.clone(),
            market,
            universe,
            config,
        ))
        .with_narrator(Arc::new(FixtureNarrator::new()))
    } else {
        if config.fmp_api_key.is_none() {
            tracing::warn!("SWINGSIG_FMP_API_KEY is not set; using the provider demo key");
        }
        let http_client: Arc<dyn HttpClient> = Arc::new(ReqwestHttpClient::new());
        let fmp = Arc::new(FmpClient::new(http_client.clone(), config));
        let universe =
            UniverseProvider::new(config.universe.clone(), config.timeout).with_feed(fmp.clone());
        SignalService::new(SignalPipeline::new(fmp.clone(), fmp, universe, config))
            .with_narrator(Arc::new(OpenAiChatClient::new(http_client, config)))
    };

    service
        .with_defaults(config.top_n, config.sample_size)
        .with_default_policy(config.policy)
        .with_narration_timeout(config.narration_timeout)
}

pub(crate) fn seeded_rng(seed: Option<u64>) -> Rng {
    seed.map_or_else(Rng::new, Rng::with_seed)
}

/// Formatted block followed by the narrative, when one was produced.
pub(crate) fn with_narrative(formatted: &str, narrative: Option<&str>) -> String {
    match narrative {
        Some(narrative) => format!("{formatted}\nNarrative:\n{narrative}\n"),
        None => formatted.to_owned(),
    }
}
