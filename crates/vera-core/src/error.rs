//! Error types for `vera-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// An externally produced claim failed schema validation at the boundary.
  #[error("malformed claim: {0}")]
  MalformedClaim(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
