use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::SignalConfig;
use crate::data_source::{SourceError, SourceFuture};
use crate::http_client::{HttpClient, HttpRequest};
use crate::prompt::TextGenerator;

use super::{check_status, transport_error};

const PROVIDER: &str = "openai";

/// Chat-completions client; the first choice's content is returned verbatim.
#[derive(Clone)]
pub struct OpenAiChatClient {
    http_client: Arc<dyn HttpClient>,
    base_url: String,
    api_key: Option<String>,
    model: String,
    timeout: Duration,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatReply>,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

impl OpenAiChatClient {
    pub fn new(http_client: Arc<dyn HttpClient>, config: &SignalConfig) -> Self {
        Self {
            http_client,
            base_url: config.openai_base_url.trim_end_matches('/').to_owned(),
            api_key: config.openai_api_key.clone(),
            model: config.openai_model.clone(),
            // Completions are slower than market data.
            timeout: config.timeout.max(Duration::from_secs(30)),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl TextGenerator for OpenAiChatClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    fn generate<'a>(&'a self, prompt: String) -> SourceFuture<'a, String> {
        Box::pin(async move {
            let api_key = self.api_key.as_deref().ok_or_else(|| {
                SourceError::invalid_request(
                    "openai api key is not configured; set SWINGSIG_OPENAI_API_KEY",
                )
            })?;

            let body = serde_json::to_string(&ChatRequest {
                model: &self.model,
                messages: [ChatMessage {
                    role: "user",
                    content: &prompt,
                }],
            })
            .map_err(|error| SourceError::internal(format!("openai request encoding: {error}")))?;

            tracing::debug!(provider = PROVIDER, model = %self.model, "completion request");
            let request = HttpRequest::post_json(format!("{}/chat/completions", self.base_url), body)
                .with_bearer_token(api_key)
                .with_timeout(self.timeout);

            let response = self
                .http_client
                .execute(request)
                .await
                .map_err(|error| transport_error(PROVIDER, &error, self.timeout))?;
            check_status(PROVIDER, &response)?;

            let parsed = serde_json::from_str::<ChatResponse>(&response.body).map_err(|error| {
                SourceError::unavailable(format!("openai returned malformed JSON: {error}"))
            })?;

            parsed
                .choices
                .into_iter()
                .next()
                .and_then(|choice| choice.message)
                .and_then(|message| message.content)
                .ok_or_else(|| SourceError::unavailable("openai returned no completion choices"))
        })
    }
}
