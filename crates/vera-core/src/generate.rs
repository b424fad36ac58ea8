//! The external text-generation seam.
//!
//! Backends (e.g. `vera-llm`) implement [`TextGenerator`]. Callers decide per
//! component what a failure means: the insight generator falls back to its
//! offline rules silently, the narrative summarizer surfaces a visible
//! unavailable message. See `vera-insight`.

use std::future::Future;

use thiserror::Error;

/// A bounded text-generation request.
///
/// `max_tokens` caps the reply so an external call can never hold a render
/// pass open indefinitely.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
  pub system:      String,
  pub user:        String,
  pub max_tokens:  u32,
  pub temperature: f32,
}

/// Why a generation call failed. A single failure is terminal for the calling
/// pipeline stage; no retries are performed.
#[derive(Debug, Error)]
pub enum GenerateError {
  #[error("request timed out")]
  Timeout,

  #[error("authorization rejected")]
  Auth,

  #[error("backend returned HTTP {0}")]
  Http(u16),

  #[error("unparseable reply: {0}")]
  Parse(String),

  #[error("transport error: {0}")]
  Transport(String),
}

/// Abstraction over a hosted text-generation backend.
///
/// All methods return `Send` futures so the trait can be used from
/// multi-threaded async runtimes.
pub trait TextGenerator: Send + Sync {
  /// Produce a completion for `req`. Implementations enforce their own
  /// request timeout and map it to [`GenerateError::Timeout`].
  fn generate<'a>(
    &'a self,
    req: &'a GenerationRequest,
  ) -> impl Future<Output = Result<String, GenerateError>> + Send + 'a;
}
