//! OpenAI-compatible chat-completions backend for
//! [`vera_core::generate::TextGenerator`].
//!
//! Transport, auth, HTTP status, and body-shape failures map onto the
//! enumerated [`GenerateError`] variants; the caller decides what a failure
//! means for its pipeline stage.

use std::{future::Future, time::Duration};

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;
use vera_core::generate::{GenerateError, GenerationRequest, TextGenerator};

// ─── Configuration ───────────────────────────────────────────────────────────

fn default_timeout_secs() -> u64 { 30 }

/// Connection settings for the generation backend.
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
  /// API root, e.g. `https://api.openai.com/v1`.
  pub base_url:     String,
  pub api_key:      String,
  pub model:        String,
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

// ─── Wire shapes ─────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ChatRequest<'a> {
  model:       &'a str,
  messages:    [ChatMessage<'a>; 2],
  temperature: f32,
  max_tokens:  u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
  role:    &'a str,
  content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
  choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
  message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
  content: String,
}

// ─── Client ──────────────────────────────────────────────────────────────────

/// Async client for an OpenAI-compatible `/chat/completions` endpoint.
///
/// Cheap to clone — the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct LlmClient {
  client: Client,
  config: LlmConfig,
}

impl LlmClient {
  pub fn new(config: LlmConfig) -> Result<Self, GenerateError> {
    let client = Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()
      .map_err(|e| GenerateError::Transport(e.to_string()))?;
    Ok(Self { client, config })
  }

  pub fn model(&self) -> &str { &self.config.model }

  fn url(&self) -> String {
    format!(
      "{}/chat/completions",
      self.config.base_url.trim_end_matches('/')
    )
  }
}

impl TextGenerator for LlmClient {
  fn generate<'a>(
    &'a self,
    req: &'a GenerationRequest,
  ) -> impl Future<Output = Result<String, GenerateError>> + Send + 'a {
    async move {
      let body = ChatRequest {
        model:       &self.config.model,
        messages:    [
          ChatMessage {
            role:    "system",
            content: &req.system,
          },
          ChatMessage {
            role:    "user",
            content: &req.user,
          },
        ],
        temperature: req.temperature,
        max_tokens:  req.max_tokens,
      };

      debug!(model = %self.config.model, "requesting completion");
      let response = self
        .client
        .post(self.url())
        .bearer_auth(&self.config.api_key)
        .json(&body)
        .send()
        .await
        .map_err(|e| {
          if e.is_timeout() {
            GenerateError::Timeout
          } else {
            GenerateError::Transport(e.to_string())
          }
        })?;

      match response.status() {
        s if s.is_success() => {}
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
          return Err(GenerateError::Auth);
        }
        s => return Err(GenerateError::Http(s.as_u16())),
      }

      let parsed: ChatResponse = response
        .json()
        .await
        .map_err(|e| GenerateError::Parse(e.to_string()))?;
      parsed
        .choices
        .into_iter()
        .next()
        .map(|c| c.message.content)
        .ok_or_else(|| {
          GenerateError::Parse("reply carried no choices".to_string())
        })
    }
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
