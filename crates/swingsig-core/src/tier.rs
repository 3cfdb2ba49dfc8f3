use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Quote, SignalError};

const TIER_NAMES: &str = "high-volume, large-cap, mid-cap";

/// Named ranking tiers accepted from callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tier {
    HighVolume,
    LargeCap,
    MidCap,
}

impl Tier {
    pub const ALL: [Self; 3] = [Self::HighVolume, Self::LargeCap, Self::MidCap];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::HighVolume => "high-volume",
            Self::LargeCap => "large-cap",
            Self::MidCap => "mid-cap",
        }
    }

    pub const fn filter(self) -> TierFilter {
        match self {
            Self::HighVolume => TierFilter {
                min_price: Some(5.0),
                min_market_cap: None,
                max_market_cap: None,
                min_volume: Some(10_000_000),
            },
            Self::LargeCap => TierFilter {
                min_price: Some(10.0),
                min_market_cap: Some(10e9),
                max_market_cap: None,
                min_volume: None,
            },
            Self::MidCap => TierFilter {
                min_price: Some(5.0),
                min_market_cap: Some(2e9),
                max_market_cap: Some(10e9),
                min_volume: None,
            },
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            Self::HighVolume => "price >= $5 and volume >= 10,000,000 shares",
            Self::LargeCap => "price >= $10 and market cap >= $10B",
            Self::MidCap => "price >= $5 and market cap in [$2B, $10B)",
        }
    }

    /// Parse an optional selector; `None` means "no tier".
    pub fn parse_selector(value: Option<&str>) -> Result<Option<Self>, SignalError> {
        match value.map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => raw.parse().map(Some),
        }
    }
}

impl Display for Tier {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = SignalError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "high-volume" => Ok(Self::HighVolume),
            "large-cap" => Ok(Self::LargeCap),
            "mid-cap" => Ok(Self::MidCap),
            _ => Err(SignalError::InvalidSelector {
                kind: "tier",
                value: value.trim().to_owned(),
                expected: TIER_NAMES,
            }),
        }
    }
}

/// Predicate over a quote. Unset bounds always pass; a set bound fails when
/// the quote lacks the field it constrains.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TierFilter {
    pub min_price: Option<f64>,
    pub min_market_cap: Option<f64>,
    /// Exclusive upper bound.
    pub max_market_cap: Option<f64>,
    pub min_volume: Option<u64>,
}

impl TierFilter {
    pub const fn any() -> Self {
        Self {
            min_price: None,
            min_market_cap: None,
            max_market_cap: None,
            min_volume: None,
        }
    }

    pub fn admits(&self, quote: &Quote) -> bool {
        if let Some(floor) = self.min_price {
            match quote.usable_price() {
                Some(price) if price >= floor => {}
                _ => return false,
            }
        }

        if self.min_market_cap.is_some() || self.max_market_cap.is_some() {
            let Some(cap) = quote.market_cap else {
                return false;
            };
            if self.min_market_cap.is_some_and(|floor| cap < floor) {
                return false;
            }
            if self.max_market_cap.is_some_and(|ceiling| cap >= ceiling) {
                return false;
            }
        }

        if let Some(floor) = self.min_volume {
            match quote.volume {
                Some(volume) if volume >= floor => {}
                _ => return false,
            }
        }

        true
    }
}

impl From<Tier> for TierFilter {
    fn from(value: Tier) -> Self {
        value.filter()
    }
}
