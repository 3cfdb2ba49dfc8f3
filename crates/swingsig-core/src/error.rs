use thiserror::Error;

use crate::data_source::SourceError;
use crate::Symbol;

/// Validation and contract errors exposed by `swingsig-core`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("symbol cannot be empty")]
    EmptySymbol,
    #[error("symbol length {len} exceeds max {max}")]
    SymbolTooLong { len: usize, max: usize },
    #[error("symbol must start with an ASCII letter: '{ch}'")]
    SymbolInvalidStart { ch: char },
    #[error("symbol contains invalid character '{ch}' at index {index}")]
    SymbolInvalidChar { ch: char, index: usize },

    #[error("field '{field}' must be finite")]
    NonFiniteValue { field: &'static str },
    #[error("field '{field}' must be non-negative")]
    NegativeValue { field: &'static str },

    #[error("policy offset '{field}' must be within 0..100 percent, got {value}")]
    OffsetOutOfRange { field: &'static str, value: f64 },
    #[error("policy band '{field}' must have min <= max, got {min}..{max}")]
    InvertedBand {
        field: &'static str,
        min: f64,
        max: f64,
    },

    #[error("'{field}' must be greater than zero")]
    ZeroCount { field: &'static str },
}

/// Request-level failures of the signal pipeline.
///
/// An empty ranking is not represented here: it is a valid outcome and is
/// reported through `PicksOutcome::is_empty`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SignalError {
    /// An upstream call for mandatory data failed (transport, status, timeout).
    #[error("source unavailable: {0}")]
    SourceUnavailable(#[from] SourceError),

    /// A call succeeded but a required field was missing from its payload.
    #[error("no valid {field} data for symbol {symbol}")]
    InsufficientData {
        symbol: Symbol,
        field: &'static str,
    },

    /// An unrecognized tier, universe mode or policy name.
    #[error("invalid {kind} '{value}', expected one of {expected}")]
    InvalidSelector {
        kind: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl SignalError {
    pub fn insufficient(symbol: &Symbol, field: &'static str) -> Self {
        Self::InsufficientData {
            symbol: symbol.clone(),
            field,
        }
    }

    pub const fn code(&self) -> &'static str {
        match self {
            Self::SourceUnavailable(_) => "signal.source_unavailable",
            Self::InsufficientData { .. } => "signal.insufficient_data",
            Self::InvalidSelector { .. } => "signal.invalid_selector",
            Self::Validation(_) => "signal.validation",
        }
    }
}
