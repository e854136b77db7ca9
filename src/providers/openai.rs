use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::conversation::Turn;
use crate::error::ArchpromptError;

use super::{Completion, CompletionRequest, Provider, Usage};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const BASE_URL_ENV: &str = "OPENAI_BASE_URL";
const COMPLETIONS_PATH: &str = "/chat/completions";

// --- Wire types (chat completions format) ---

#[derive(Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    messages: &'a [Turn],
    max_tokens: u32,
    temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ApiResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<ApiUsage>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ApiMessage>,
}

#[derive(Deserialize)]
struct ApiMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ApiUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
    #[serde(default)]
    total_tokens: u64,
}

impl From<ApiUsage> for Usage {
    fn from(usage: ApiUsage) -> Self {
        Self {
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            total_tokens: usage.total_tokens,
        }
    }
}

/// OpenAI chat-completions client. Also works against any endpoint that
/// speaks the same format (set `OPENAI_BASE_URL`).
pub struct OpenAiProvider {
    client: reqwest::Client,
    api_key: SecretString,
    /// Full endpoint URL (base + COMPLETIONS_PATH).
    url: String,
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

impl OpenAiProvider {
    pub fn new(
        api_key: SecretString,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, ArchpromptError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                ArchpromptError::RemoteCallFailed(format!("cannot build HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            api_key,
            url: format!("{}{COMPLETIONS_PATH}", base_url.trim_end_matches('/')),
        })
    }

    /// Construct from `OPENAI_API_KEY` (required) and `OPENAI_BASE_URL`
    /// (optional, defaults to the public API).
    pub fn from_env(timeout: Duration) -> Result<Self, ArchpromptError> {
        let api_key = std::env::var(API_KEY_ENV)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                ArchpromptError::MissingCredential(format!("{API_KEY_ENV} is not set"))
            })?;
        let base_url =
            std::env::var(BASE_URL_ENV).unwrap_or_else(|_| DEFAULT_BASE_URL.to_owned());

        Self::new(SecretString::from(api_key), &base_url, timeout)
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(
        &self,
        request: CompletionRequest<'_>,
    ) -> Result<Completion, ArchpromptError> {
        let body = ApiRequest {
            model: request.model,
            messages: request.turns,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            response_format: request.json_object.then_some(ResponseFormat {
                kind: "json_object",
            }),
        };

        debug!(
            url = %self.url,
            model = request.model,
            messages = request.turns.len(),
            "sending chat completion request"
        );

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| ArchpromptError::RemoteCallFailed(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, body = %body, "chat completion API returned an error");
            return Err(ArchpromptError::RemoteCallFailed(format!(
                "API returned {status}: {body}"
            )));
        }

        let api_response: ApiResponse = response.json().await.map_err(|e| {
            ArchpromptError::RemoteCallFailed(format!("failed to parse response: {e}"))
        })?;

        let content = api_response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .ok_or_else(|| {
                ArchpromptError::RemoteCallFailed(
                    "response contained no message content".to_owned(),
                )
            })?;

        Ok(Completion {
            turn: Turn::assistant(content),
            usage: api_response.usage.map(Usage::from),
        })
    }
}
