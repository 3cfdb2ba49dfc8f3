mod fixture;
mod fmp;
mod openai;

use std::time::Duration;

use crate::data_source::{millis, SourceError};
use crate::http_client::{HttpError, HttpResponse};

pub use fixture::{FixtureMarket, FixtureNarrator};
pub use fmp::FmpClient;
pub use openai::OpenAiChatClient;

/// Map a transport failure; transport timeouts keep their kind.
fn transport_error(provider: &'static str, error: &HttpError, timeout: Duration) -> SourceError {
    if error.is_timeout() {
        SourceError::timeout(provider, millis(timeout))
    } else {
        SourceError::unavailable(format!("{provider} transport error: {}", error.message()))
    }
}

fn check_status(provider: &'static str, response: &HttpResponse) -> Result<(), SourceError> {
    if response.is_rate_limited() {
        return Err(SourceError::rate_limited(format!(
            "{provider} upstream returned status 429"
        )));
    }
    if !response.is_success() {
        return Err(SourceError::unavailable(format!(
            "{provider} upstream returned status {}",
            response.status
        )));
    }
    Ok(())
}
