use swingsig_core::{ConfigError, SignalError};
use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Signal(#[from] SignalError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error("timestamp formatting failed: {0}")]
    Timestamp(#[from] time::error::Format),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => 2,
            Self::Signal(error) => match error {
                SignalError::InvalidSelector { .. } | SignalError::Validation(_) => 2,
                SignalError::SourceUnavailable(_) | SignalError::InsufficientData { .. } => 3,
            },
            Self::Serialization(_) | Self::Timestamp(_) => 4,
            Self::Io(_) => 10,
        }
    }
}
