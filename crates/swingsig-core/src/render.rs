//! Numeric rendering shared by the formatter, rationale text and prompts.
//!
//! Derived values are kept at full precision everywhere else; rounding to two
//! decimals happens only here.

/// Marker rendered for any absent numeric field.
pub const NOT_AVAILABLE: &str = "N/A";

/// Round half away from zero to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Two-decimal rendering of a value.
pub fn money(value: f64) -> String {
    format!("{:.2}", round2(value))
}

/// Two-decimal rendering, or [`NOT_AVAILABLE`] when absent or non-finite.
pub fn render_optional(value: Option<f64>) -> String {
    match value {
        Some(value) if value.is_finite() => money(value),
        _ => String::from(NOT_AVAILABLE),
    }
}

/// Signed percentage with two decimals, e.g. `+8.00%` or `-5.00%`.
pub fn signed_percent(value: f64) -> String {
    let rounded = round2(value);
    if rounded > 0.0 {
        format!("+{rounded:.2}%")
    } else if rounded == 0.0 {
        String::from("0.00%")
    } else {
        format!("{rounded:.2}%")
    }
}

/// Integer rendering with thousands separators, or [`NOT_AVAILABLE`].
pub fn render_count(value: Option<u64>) -> String {
    let Some(value) = value else {
        return String::from(NOT_AVAILABLE);
    };

    let digits = value.to_string();
    let mut output = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            output.push(',');
        }
        output.push(ch);
    }
    output
}

/// Compact market-cap rendering (`2.85T`, `410.20B`, `950.00M`), or [`NOT_AVAILABLE`].
pub fn render_market_cap(value: Option<f64>) -> String {
    match value {
        Some(value) if value.is_finite() => {
            const TRILLION: f64 = 1e12;
            const BILLION: f64 = 1e9;
            const MILLION: f64 = 1e6;
            if value >= TRILLION {
                format!("{:.2}T", value / TRILLION)
            } else if value >= BILLION {
                format!("{:.2}B", value / BILLION)
            } else if value >= MILLION {
                format!("{:.2}M", value / MILLION)
            } else {
                money(value)
            }
        }
        _ => String::from(NOT_AVAILABLE),
    }
}
