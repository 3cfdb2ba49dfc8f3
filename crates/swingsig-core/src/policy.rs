//! Derivation policies mapping a price to a target and a stop-loss.
//!
//! Gain/loss magnitudes are always supplied by the caller. The named presets
//! are conveniences, none of them is privileged as a default inside the
//! pipeline.
//!
//! | Name | Kind | Gain | Loss |
//! |------|------|------|------|
//! | `swing` | fixed | 8% | 5% |
//! | `conservative` | fixed | 5% | 2% |
//! | `momentum` | fixed | 10% | 3.5% |
//! | `band` | randomized | 6–12% | 3–6% |
//! | `fixed:G/L` | fixed | G% | L% |
//! | `band:G1-G2/L1-L2` | randomized | G1–G2% | L1–L2% |

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use fastrand::Rng;
use serde::{Deserialize, Serialize};

use crate::{SignalError, ValidationError};

const POLICY_NAMES: &str = "swing, conservative, momentum, band, fixed:G/L, band:G1-G2/L1-L2";

/// Inclusive percentage range used by the randomized policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PercentBand {
    pub min: f64,
    pub max: f64,
}

impl PercentBand {
    pub fn new(field: &'static str, min: f64, max: f64) -> Result<Self, ValidationError> {
        validate_offset(field, min)?;
        validate_offset(field, max)?;
        if min > max {
            return Err(ValidationError::InvertedBand { field, min, max });
        }
        Ok(Self { min, max })
    }
}

/// Rule producing target and stop-loss prices from a current price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DerivationPolicy {
    FixedOffset { gain_pct: f64, loss_pct: f64 },
    RandomizedBand { gain: PercentBand, loss: PercentBand },
}

/// Prices produced by a policy, at full precision.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceTargets {
    pub target: f64,
    pub stop_loss: f64,
}

impl DerivationPolicy {
    pub fn fixed(gain_pct: f64, loss_pct: f64) -> Result<Self, ValidationError> {
        validate_offset("gain_pct", gain_pct)?;
        validate_offset("loss_pct", loss_pct)?;
        Ok(Self::FixedOffset { gain_pct, loss_pct })
    }

    pub fn randomized(gain: PercentBand, loss: PercentBand) -> Self {
        Self::RandomizedBand { gain, loss }
    }

    pub const fn swing() -> Self {
        Self::FixedOffset {
            gain_pct: 8.0,
            loss_pct: 5.0,
        }
    }

    pub const fn conservative() -> Self {
        Self::FixedOffset {
            gain_pct: 5.0,
            loss_pct: 2.0,
        }
    }

    pub const fn momentum() -> Self {
        Self::FixedOffset {
            gain_pct: 10.0,
            loss_pct: 3.5,
        }
    }

    pub const fn band() -> Self {
        Self::RandomizedBand {
            gain: PercentBand {
                min: 6.0,
                max: 12.0,
            },
            loss: PercentBand { min: 3.0, max: 6.0 },
        }
    }

    /// Lowest and highest target this policy can produce for `price`.
    pub fn target_bounds(&self, price: f64) -> (f64, f64) {
        match *self {
            Self::FixedOffset { gain_pct, .. } => {
                let target = above(price, gain_pct);
                (target, target)
            }
            Self::RandomizedBand { gain, .. } => (above(price, gain.min), above(price, gain.max)),
        }
    }

    /// Lowest and highest stop-loss this policy can produce for `price`.
    pub fn stop_bounds(&self, price: f64) -> (f64, f64) {
        match *self {
            Self::FixedOffset { loss_pct, .. } => {
                let stop = below(price, loss_pct);
                (stop, stop)
            }
            Self::RandomizedBand { loss, .. } => (below(price, loss.max), below(price, loss.min)),
        }
    }

    /// Apply the policy. Fixed offsets never touch `rng`; randomized bands draw
    /// target and stop independently, uniformly within their bounds.
    pub fn derive(&self, price: f64, rng: &mut Rng) -> PriceTargets {
        match self {
            Self::FixedOffset { .. } => PriceTargets {
                target: self.target_bounds(price).0,
                stop_loss: self.stop_bounds(price).0,
            },
            Self::RandomizedBand { .. } => {
                let (target_low, target_high) = self.target_bounds(price);
                let (stop_low, stop_high) = self.stop_bounds(price);
                PriceTargets {
                    target: draw(rng, target_low, target_high),
                    stop_loss: draw(rng, stop_low, stop_high),
                }
            }
        }
    }
}

impl Display for DerivationPolicy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FixedOffset { gain_pct, loss_pct } => {
                write!(f, "fixed +{gain_pct}%/-{loss_pct}%")
            }
            Self::RandomizedBand { gain, loss } => write!(
                f,
                "band +{}..{}%/-{}..{}%",
                gain.min, gain.max, loss.min, loss.max
            ),
        }
    }
}

impl FromStr for DerivationPolicy {
    type Err = SignalError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "swing" => Ok(Self::swing()),
            "conservative" => Ok(Self::conservative()),
            "momentum" => Ok(Self::momentum()),
            "band" | "randomized" => Ok(Self::band()),
            other => {
                let invalid = || SignalError::InvalidSelector {
                    kind: "policy",
                    value: value.trim().to_owned(),
                    expected: POLICY_NAMES,
                };
                if let Some(ranges) = other.strip_prefix("band:") {
                    let (gain, loss) = ranges.split_once('/').ok_or_else(invalid)?;
                    let (gain_min, gain_max) = parse_range(gain).ok_or_else(invalid)?;
                    let (loss_min, loss_max) = parse_range(loss).ok_or_else(invalid)?;
                    return Ok(Self::randomized(
                        PercentBand::new("gain", gain_min, gain_max)?,
                        PercentBand::new("loss", loss_min, loss_max)?,
                    ));
                }
                let offsets = other.strip_prefix("fixed:").ok_or_else(invalid)?;
                let (gain, loss) = offsets.split_once('/').ok_or_else(invalid)?;
                let gain = gain.trim().parse::<f64>().map_err(|_| invalid())?;
                let loss = loss.trim().parse::<f64>().map_err(|_| invalid())?;
                Ok(Self::fixed(gain, loss)?)
            }
        }
    }
}

/// `"6-12"` to `(6.0, 12.0)`.
fn parse_range(value: &str) -> Option<(f64, f64)> {
    let (min, max) = value.split_once('-')?;
    Some((min.trim().parse().ok()?, max.trim().parse().ok()?))
}

fn above(price: f64, pct: f64) -> f64 {
    price * (1.0 + pct / 100.0)
}

fn below(price: f64, pct: f64) -> f64 {
    price * (1.0 - pct / 100.0)
}

fn draw(rng: &mut Rng, low: f64, high: f64) -> f64 {
    (low + (high - low) * rng.f64()).clamp(low, high)
}

fn validate_offset(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteValue { field });
    }
    if !(0.0..100.0).contains(&value) {
        return Err(ValidationError::OffsetOutOfRange { field, value });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::round2;

    #[test]
    fn swing_policy_on_round_price() {
        let targets = DerivationPolicy::swing().derive(100.0, &mut Rng::with_seed(1));
        assert_eq!(round2(targets.target), 108.0);
        assert_eq!(round2(targets.stop_loss), 95.0);
    }

    #[test]
    fn fixed_policy_matches_rounded_multipliers_across_prices() {
        let policy = DerivationPolicy::swing();
        let mut rng = Rng::with_seed(7);
        for price in [0.37, 1.0, 12.345, 99.99, 187.42, 3_021.64] {
            let targets = policy.derive(price, &mut rng);
            assert_eq!(round2(targets.target), round2(price * 1.08), "price={price}");
            assert_eq!(round2(targets.stop_loss), round2(price * 0.95), "price={price}");
        }
    }

    #[test]
    fn band_policy_stays_within_bounds() {
        let policy = DerivationPolicy::band();
        let mut rng = Rng::with_seed(42);
        for trial in 0..2_000 {
            let price = 5.0 + f64::from(trial) * 0.731;
            let targets = policy.derive(price, &mut rng);
            assert!(targets.target >= price * 1.06 - 1e-9, "trial={trial}");
            assert!(targets.target <= price * 1.12 + 1e-9, "trial={trial}");
            assert!(targets.stop_loss >= price * 0.94 - 1e-9, "trial={trial}");
            assert!(targets.stop_loss <= price * 0.97 + 1e-9, "trial={trial}");
        }
    }

    #[test]
    fn band_policy_is_reproducible_from_seed() {
        let policy = DerivationPolicy::band();
        let first = policy.derive(50.0, &mut Rng::with_seed(99));
        let second = policy.derive(50.0, &mut Rng::with_seed(99));
        assert_eq!(first, second);
    }

    #[test]
    fn parses_presets_and_custom_offsets() {
        assert_eq!(
            "Momentum".parse::<DerivationPolicy>().expect("preset"),
            DerivationPolicy::momentum()
        );
        assert_eq!(
            "fixed:10/3.5".parse::<DerivationPolicy>().expect("custom"),
            DerivationPolicy::FixedOffset {
                gain_pct: 10.0,
                loss_pct: 3.5
            }
        );
    }

    #[test]
    fn parses_custom_band() {
        let policy = "band:4-9/1.5-3"
            .parse::<DerivationPolicy>()
            .expect("custom band");
        assert_eq!(
            policy,
            DerivationPolicy::RandomizedBand {
                gain: PercentBand { min: 4.0, max: 9.0 },
                loss: PercentBand { min: 1.5, max: 3.0 },
            }
        );
        let (low, high) = policy.target_bounds(100.0);
        assert_eq!((round2(low), round2(high)), (104.0, 109.0));
    }

    #[test]
    fn rejects_inverted_or_malformed_custom_band() {
        let err = "band:12-6/3-6"
            .parse::<DerivationPolicy>()
            .expect_err("must fail");
        assert!(matches!(
            err,
            SignalError::Validation(ValidationError::InvertedBand { field: "gain", .. })
        ));
        let err = "band:6-12".parse::<DerivationPolicy>().expect_err("must fail");
        assert!(matches!(
            err,
            SignalError::InvalidSelector { kind: "policy", .. }
        ));
    }

    #[test]
    fn rejects_unknown_policy_name() {
        let err = "yolo".parse::<DerivationPolicy>().expect_err("must fail");
        assert!(matches!(
            err,
            SignalError::InvalidSelector { kind: "policy", .. }
        ));
    }

    #[test]
    fn rejects_out_of_range_offsets() {
        let err = DerivationPolicy::fixed(8.0, 120.0).expect_err("must fail");
        assert!(matches!(
            err,
            ValidationError::OffsetOutOfRange {
                field: "loss_pct",
                ..
            }
        ));
        let err = PercentBand::new("gain", 12.0, 6.0).expect_err("must fail");
        assert!(matches!(err, ValidationError::InvertedBand { .. }));
    }
}
