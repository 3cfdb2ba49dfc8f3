//! Merges one symbol's quote and indicators into a [`CompositeSignal`].

use fastrand::Rng;
use serde::{Deserialize, Serialize};

use crate::render::{render_optional, signed_percent};
use crate::{DerivationPolicy, IndicatorSet, Quote, SignalError, Symbol};

/// Derived trade parameters for one symbol, at full precision.
///
/// Built once per symbol per request and never mutated afterwards; the
/// fields are public for reading and serialization only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeSignal {
    pub symbol: Symbol,
    pub quote: Quote,
    pub indicators: Option<IndicatorSet>,
    /// Price the policy was applied to.
    pub price: f64,
    pub target_price: f64,
    pub stop_loss_price: f64,
    pub gain_percent: f64,
    pub loss_percent: f64,
    pub policy: DerivationPolicy,
    pub rationale: String,
}

impl CompositeSignal {
    /// Indicators to render; an absent set renders like a set of absent fields.
    pub fn indicator_view(&self) -> IndicatorSet {
        self.indicators.unwrap_or_default()
    }
}

/// Compose a signal from a quote, optional indicators and a policy.
///
/// # Errors
///
/// Returns [`SignalError::InsufficientData`] naming `price` when the quote has
/// no strictly positive price.
pub fn compose(
    quote: Quote,
    indicators: Option<IndicatorSet>,
    policy: &DerivationPolicy,
    rng: &mut Rng,
) -> Result<CompositeSignal, SignalError> {
    let price = quote
        .usable_price()
        .ok_or_else(|| SignalError::insufficient(&quote.symbol, "price"))?;

    let targets = policy.derive(price, rng);
    let gain_percent = percent_change(price, targets.target);
    let loss_percent = percent_change(price, targets.stop_loss);
    let rationale = rationale(
        &indicators.unwrap_or_default(),
        gain_percent,
        loss_percent,
        policy,
    );

    Ok(CompositeSignal {
        symbol: quote.symbol.clone(),
        quote,
        indicators,
        price,
        target_price: targets.target,
        stop_loss_price: targets.stop_loss,
        gain_percent,
        loss_percent,
        policy: *policy,
        rationale,
    })
}

fn percent_change(price: f64, derived: f64) -> f64 {
    (derived - price) / price * 100.0
}

fn rationale(
    indicators: &IndicatorSet,
    gain_percent: f64,
    loss_percent: f64,
    policy: &DerivationPolicy,
) -> String {
    let momentum = match indicators.rsi {
        Some(rsi) if rsi >= 70.0 => "overbought",
        Some(rsi) if rsi <= 30.0 => "oversold",
        Some(_) => "neutral",
        None => "unknown",
    };
    let trend = match (indicators.moving_average_50, indicators.moving_average_200) {
        (Some(short), Some(long)) if short > long => "uptrend",
        (Some(short), Some(long)) if short < long => "downtrend",
        (Some(_), Some(_)) => "flat",
        _ => "unknown",
    };

    format!(
        "RSI {} ({momentum}), MACD signal {}, MA50 {} vs MA200 {} ({trend}); \
         target {} / stop {} under {policy}",
        render_optional(indicators.rsi),
        render_optional(indicators.macd_signal),
        render_optional(indicators.moving_average_50),
        render_optional(indicators.moving_average_200),
        signed_percent(gain_percent),
        signed_percent(loss_percent),
    )
}
