use serde::{Deserialize, Serialize};

use crate::{Symbol, ValidationError};

/// Latest snapshot for one symbol as reported by a quote source.
///
/// Every field except the symbol is optional because upstream payloads are
/// routinely partial; callers decide which fields are mandatory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: Symbol,
    pub name: Option<String>,
    pub price: Option<f64>,
    pub volume: Option<u64>,
    pub market_cap: Option<f64>,
}

impl Quote {
    pub fn new(
        symbol: Symbol,
        name: Option<String>,
        price: Option<f64>,
        volume: Option<u64>,
        market_cap: Option<f64>,
    ) -> Result<Self, ValidationError> {
        validate_optional_non_negative("price", price)?;
        validate_optional_non_negative("market_cap", market_cap)?;

        Ok(Self {
            symbol,
            name: name.filter(|value| !value.trim().is_empty()),
            price,
            volume,
            market_cap,
        })
    }

    /// Quote carrying only a symbol and a price.
    pub fn priced(symbol: Symbol, price: f64) -> Result<Self, ValidationError> {
        Self::new(symbol, None, Some(price), None, None)
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or_else(|| self.symbol.as_str())
    }

    /// Price if present and strictly positive.
    pub fn usable_price(&self) -> Option<f64> {
        self.price.filter(|price| *price > 0.0)
    }
}

/// Technical indicators for one symbol. Absent fields are a valid state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSet {
    pub rsi: Option<f64>,
    pub macd_signal: Option<f64>,
    pub moving_average_50: Option<f64>,
    pub moving_average_200: Option<f64>,
}

fn validate_optional_non_negative(
    field: &'static str,
    value: Option<f64>,
) -> Result<(), ValidationError> {
    if let Some(value) = value {
        if !value.is_finite() {
            return Err(ValidationError::NonFiniteValue { field });
        }
        if value < 0.0 {
            return Err(ValidationError::NegativeValue { field });
        }
    }
    Ok(())
}
