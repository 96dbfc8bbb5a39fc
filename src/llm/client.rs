//! Core `LanguageModel` trait and `ApiLanguageModel` implementation.
//!
//! `ApiLanguageModel` calls an OpenAI-compatible `/v1/chat/completions`
//! endpoint (LM Studio by default).  The vision requests attach the image as
//! a base64 `data:` URL content part.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use thiserror::Error;

use crate::config::LlmConfig;
use crate::llm::prompt::PromptBuilder;

// ---------------------------------------------------------------------------
// LlmError
// ---------------------------------------------------------------------------

/// Errors that can occur during a language-model request.
#[derive(Debug, Error)]
pub enum LlmError {
    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("LLM request timed out")]
    Timeout,

    /// The server answered with a non-success status.
    #[error("LLM endpoint returned status {0}")]
    Status(u16),

    /// The HTTP response could not be parsed as expected JSON.
    #[error("failed to parse LLM response: {0}")]
    Parse(String),

    /// The model returned a response with no usable text content.
    #[error("LLM returned an empty response")]
    EmptyResponse,
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// LanguageModel trait
// ---------------------------------------------------------------------------

/// The four tutoring requests.
///
/// Every method returns the model's trimmed, non-empty text; an empty answer
/// is [`LlmError::EmptyResponse`].
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Structure the problems in a homework artifact (vision when `image` is
    /// present).  The answer is expected to hold a `{"problems": [...]}` JSON
    /// object, see [`ProblemSet`](crate::llm::ProblemSet).
    async fn structure_problems(&self, text: &str, image: Option<&[u8]>) -> Result<String, LlmError>;

    /// Step-by-step explanation of structured problems.
    async fn explain(&self, problems: &str) -> Result<String, LlmError>;

    /// Identify the problem next to a handwritten "Pkaisetu" in a snapshot.
    async fn analyze_snapshot(&self, image: &[u8]) -> Result<String, LlmError>;

    /// Detailed explanation for a snapshot analysis.
    async fn explain_in_detail(&self, analysis: &str) -> Result<String, LlmError>;
}

// ---------------------------------------------------------------------------
// ApiLanguageModel
// ---------------------------------------------------------------------------

/// Calls an OpenAI-compatible `/v1/chat/completions` endpoint.
///
/// Vision requests use `config.vision_model`, text requests
/// `config.text_model`.  All connection details come from [`LlmConfig`].
pub struct ApiLanguageModel {
    client: reqwest::Client,
    config: LlmConfig,
    prompts: PromptBuilder,
}

impl ApiLanguageModel {
    /// Build an `ApiLanguageModel` from application config.
    ///
    /// The HTTP client carries the per-request timeout from
    /// `config.timeout_secs`; a default client is used if the builder fails.
    pub fn from_config(config: &LlmConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            config: config.clone(),
            prompts: PromptBuilder::new(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    async fn chat(
        &self,
        model: &str,
        (system_msg, user_msg): (String, String),
        image: Option<&[u8]>,
    ) -> Result<String, LlmError> {
        let user_content = match image {
            Some(bytes) => serde_json::json!([
                { "type": "text", "text": user_msg },
                { "type": "image_url", "image_url": { "url": data_url(bytes) } }
            ]),
            None => serde_json::Value::String(user_msg),
        };

        let body = serde_json::json!({
            "model":       model,
            "messages": [
                { "role": "system", "content": system_msg },
                { "role": "user",   "content": user_content }
            ],
            "stream":      false,
            "temperature": self.config.temperature,
            "max_tokens":  self.config.max_tokens
        });

        let mut req = self.client.post(self.endpoint()).json(&body);

        // Attach Authorization header only when api_key is a non-empty string.
        let key = self.config.api_key.as_deref().unwrap_or("");
        if !key.is_empty() {
            req = req.bearer_auth(key);
        }

        let response = req.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(LlmError::Status(status.as_u16()));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;

        extract_content(&json)
    }
}

#[async_trait]
impl LanguageModel for ApiLanguageModel {
    async fn structure_problems(&self, text: &str, image: Option<&[u8]>) -> Result<String, LlmError> {
        let model = if image.is_some() {
            &self.config.vision_model
        } else {
            &self.config.text_model
        };
        self.chat(model, self.prompts.structure(text), image).await
    }

    async fn explain(&self, problems: &str) -> Result<String, LlmError> {
        self.chat(&self.config.text_model, self.prompts.explain(problems), None)
            .await
    }

    async fn analyze_snapshot(&self, image: &[u8]) -> Result<String, LlmError> {
        self.chat(&self.config.vision_model, self.prompts.snapshot(), Some(image))
            .await
    }

    async fn explain_in_detail(&self, analysis: &str) -> Result<String, LlmError> {
        self.chat(&self.config.text_model, self.prompts.detail(analysis), None)
            .await
    }
}

/// `choices[0].message.content`, trimmed; empty is an error.
fn extract_content(json: &serde_json::Value) -> Result<String, LlmError> {
    let content = json["choices"][0]["message"]["content"]
        .as_str()
        .ok_or(LlmError::EmptyResponse)?
        .trim()
        .to_string();

    if content.is_empty() {
        return Err(LlmError::EmptyResponse);
    }
    Ok(content)
}

/// `data:` URL for an encoded image; PNG is sniffed, everything else is
/// labelled JPEG.
fn data_url(bytes: &[u8]) -> String {
    let mime = if bytes.starts_with(b"\x89PNG") {
        "image/png"
    } else {
        "image/jpeg"
    };
    format!("data:{mime};base64,{}", BASE64.encode(bytes))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
