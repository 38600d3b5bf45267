//! OpenAI-compatible chat completions oracle
//!
//! Works with the OpenAI API and with gateways that expose the same
//! `/chat/completions` endpoint.

use crate::ollama::{build_client, map_reqwest_error};
use crate::{looks_like_html, truncate_chars};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use texkg_domain::{ExtractionOracle, OracleError, SamplingParams};
use tracing::debug;

/// Default API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default timeout for a single extraction request
pub const DEFAULT_TIMEOUT_SECS: u64 = 180;

/// Chat-completions oracle
pub struct OpenAiOracle {
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
    timeout_secs: u64,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    top_p: f32,
    max_tokens: u32,
    response_format: ResponseFormat,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiOracle {
    /// Create a new oracle
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            client: build_client(DEFAULT_TIMEOUT_SECS),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Set the per-request timeout
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self.client = build_client(timeout_secs);
        self
    }

    fn extract_text(raw: &str) -> Result<String, OracleError> {
        if looks_like_html(raw) {
            return Err(OracleError::InvalidResponse(format!(
                "Endpoint returned HTML instead of JSON (check the base URL): {}",
                truncate_chars(raw, 120)
            )));
        }
        let parsed: ChatResponse = serde_json::from_str(raw).map_err(|e| {
            OracleError::InvalidResponse(format!("{}; body starts with: {}", e, truncate_chars(raw, 120)))
        })?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| OracleError::InvalidResponse("Response has no message content".to_string()))
    }
}

#[async_trait]
impl ExtractionOracle for OpenAiOracle {
    async fn invoke(&self, prompt: &str, params: &SamplingParams) -> Result<String, OracleError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: params.temperature,
            top_p: params.top_p,
            max_tokens: params.max_tokens,
            response_format: ResponseFormat { kind: "json_object" },
        };

        debug!(model = %self.model, prompt_len = prompt.len(), "Invoking chat completions");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| map_reqwest_error(e, self.timeout_secs))?;

        let status = response.status();
        let raw = response
            .text()
            .await
            .map_err(|e| map_reqwest_error(e, self.timeout_secs))?;

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(OracleError::RateLimited(truncate_chars(&raw, 200).to_string()));
        }
        if !status.is_success() {
            return Err(OracleError::Communication(format!(
                "HTTP {}: {}",
                status,
                truncate_chars(&raw, 500)
            )));
        }

        Self::extract_text(&raw)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
