//! Prompts handed to the external text generator.
//!
//! The generator's reply is opaque and passed through verbatim; nothing here
//! parses it.

use std::fmt::Write as _;

use crate::data_source::SourceFuture;
use crate::render::{money, render_optional, signed_percent};
use crate::{CompositeSignal, Symbol};

/// External text-completion service.
pub trait TextGenerator: Send + Sync {
    fn name(&self) -> &'static str;

    /// Completes `prompt` and returns the reply text unchanged.
    fn generate<'a>(&'a self, prompt: String) -> SourceFuture<'a, String>;
}

/// Prompt asking for a short narrative over one composed signal.
pub fn signal_prompt(signal: &CompositeSignal) -> String {
    let mut prompt = String::from(
        "You are a swing-trading assistant. Explain the following setup in a few \
         sentences. Do not change any of the numbers.\n\n",
    );
    write_signal(&mut prompt, signal);
    prompt.push_str(
        "\nRespond with:\nOutlook: one line\nEntry: price\nTarget: price and percent\n\
         Stop loss: price and percent\nReasoning: based on RSI, MACD and moving averages\n",
    );
    prompt
}

/// Prompt asking for a short narrative over a ranked list.
pub fn picks_prompt(signals: &[CompositeSignal]) -> String {
    let mut prompt = String::from(
        "You are a swing-trading assistant. Summarize these ranked swing-trade picks, \
         one short paragraph each, in the given order. Do not change any of the numbers.\n",
    );
    for (index, signal) in signals.iter().enumerate() {
        let _ = writeln!(prompt, "\n#{}", index + 1);
        write_signal(&mut prompt, signal);
    }
    prompt
}

/// Prompt asking for a short-term swing options trade on `symbol`.
pub fn options_prompt(symbol: &Symbol, price: f64) -> String {
    format!(
        "Stock: {symbol}\n\
         Current Price: ${}\n\
         Based on technical indicators and market conditions, suggest a short-term swing options trade.\n\
         \n\
         Respond with:\n\
         Option Type (CALL or PUT) with strike and expiration\n\
         Profit Target %\n\
         Stop Loss %\n\
         Reasoning based on technicals (RSI, MACD, trends, momentum)\n\
         \n\
         Format like:\n\
         Option Trade: Buy CALL @ $XXX Strike, [date] Expiration\n\
         Profit Target: +50%\n\
         Stop Loss: -30%\n\
         Reasoning: [explanation here]\n",
        money(price)
    )
}

fn write_signal(prompt: &mut String, signal: &CompositeSignal) {
    let indicators = signal.indicator_view();
    let _ = writeln!(prompt, "Stock: {} ({})", signal.symbol, signal.quote.display_name());
    let _ = writeln!(prompt, "Current Price: ${}", money(signal.price));
    let _ = writeln!(
        prompt,
        "Target Price: ${} ({})",
        money(signal.target_price),
        signed_percent(signal.gain_percent)
    );
    let _ = writeln!(
        prompt,
        "Stop Loss: ${} ({})",
        money(signal.stop_loss_price),
        signed_percent(signal.loss_percent)
    );
    let _ = writeln!(prompt, "RSI: {}", render_optional(indicators.rsi));
    let _ = writeln!(prompt, "MACD Signal: {}", render_optional(indicators.macd_signal));
    let _ = writeln!(
        prompt,
        "50-day MA: {}",
        render_optional(indicators.moving_average_50)
    );
    let _ = writeln!(
        prompt,
        "200-day MA: {}",
        render_optional(indicators.moving_average_200)
    );
}

#[cfg(test)]
mod tests {
    use fastrand::Rng;

    use super::*;
    use crate::{compose, DerivationPolicy, Quote};

    fn symbol(raw: &str) -> Symbol {
        Symbol::parse(raw).expect("valid symbol")
    }

    #[test]
    fn options_prompt_renders_two_decimal_price() {
        let prompt = options_prompt(&symbol("TSLA"), 251.5);
        assert!(prompt.starts_with("Stock: TSLA\nCurrent Price: $251.50\n"));
        assert!(prompt.contains("Option Type (CALL or PUT)"));
    }

    #[test]
    fn signal_prompt_uses_markers_for_missing_indicators() {
        let quote = Quote::priced(symbol("XYZ"), 100.0).expect("valid quote");
        let signal = compose(
            quote,
            None,
            &DerivationPolicy::swing(),
            &mut Rng::with_seed(1),
        )
        .expect("composes");

        let prompt = signal_prompt(&signal);
        assert!(prompt.contains("Target Price: $108.00 (+8.00%)"));
        assert!(prompt.contains("Stop Loss: $95.00 (-5.00%)"));
        assert!(prompt.contains("RSI: N/A"));
    }

    #[test]
    fn picks_prompt_numbers_entries_in_order() {
        let signals = ["BBB", "AAA"]
            .iter()
            .map(|raw| {
                compose(
                    Quote::priced(symbol(raw), 10.0).expect("valid quote"),
                    None,
                    &DerivationPolicy::conservative(),
                    &mut Rng::with_seed(1),
                )
                .expect("composes")
            })
            .collect::<Vec<_>>();

        let prompt = picks_prompt(&signals);
        let first = prompt.find("#1\nStock: BBB").expect("first");
        let second = prompt.find("#2\nStock: AAA").expect("second");
        assert!(first < second);
    }
}
