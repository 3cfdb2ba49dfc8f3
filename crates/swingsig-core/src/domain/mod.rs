//! # Domain Models
//!
//! Canonical domain types shared by every pipeline stage.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Symbol`] | Validated uppercase ticker |
//! | [`Quote`] | Latest price/volume/market-cap snapshot, all fields optional |
//! | [`IndicatorSet`] | RSI, MACD signal and moving averages, all fields optional |
//!
//! Optional fields are never defaulted to zero: a missing price and a price of
//! zero are both treated as "no usable price" by the composer, and missing
//! indicators render as `N/A`.

mod models;
mod symbol;

pub use models::{IndicatorSet, Quote};
pub use symbol::Symbol;
