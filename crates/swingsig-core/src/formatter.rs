//! Deterministic, transport-independent text rendering of composed signals.

use std::fmt::Write as _;

use crate::render::{money, render_count, render_market_cap, render_optional, signed_percent};
use crate::CompositeSignal;

/// Output for an empty signal list.
pub const NO_CANDIDATES_MESSAGE: &str = "No candidates matched the request.";

/// Render signals as a numbered block, in input order.
pub fn format_signals(signals: &[CompositeSignal]) -> String {
    if signals.is_empty() {
        return String::from(NO_CANDIDATES_MESSAGE);
    }

    let mut output = String::new();
    for (index, signal) in signals.iter().enumerate() {
        if index > 0 {
            output.push('\n');
        }
        write_entry(&mut output, index + 1, signal);
    }
    output
}

fn write_entry(output: &mut String, position: usize, signal: &CompositeSignal) {
    let indicators = signal.indicator_view();
    let quote = &signal.quote;

    // Writing into a String cannot fail.
    let _ = writeln!(
        output,
        "{position}. {} ({})",
        signal.symbol,
        quote.display_name()
    );
    let _ = writeln!(
        output,
        "   Price: ${}  Volume: {}  Market cap: {}",
        money(signal.price),
        render_count(quote.volume),
        render_market_cap(quote.market_cap)
    );
    let _ = writeln!(
        output,
        "   Target: ${} ({})  Stop loss: ${} ({})",
        money(signal.target_price),
        signed_percent(signal.gain_percent),
        money(signal.stop_loss_price),
        signed_percent(signal.loss_percent)
    );
    let _ = writeln!(
        output,
        "   RSI: {}  MACD signal: {}  MA50: {}  MA200: {}",
        render_optional(indicators.rsi),
        render_optional(indicators.macd_signal),
        render_optional(indicators.moving_average_50),
        render_optional(indicators.moving_average_200)
    );
    let _ = writeln!(output, "   Rationale: {}", signal.rationale);
}
