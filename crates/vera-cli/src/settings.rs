//! Backend and logging settings, layered from a TOML file and `VERA_*`
//! environment variables. Flags on the command line stay orthogonal: they
//! describe the query, the settings describe the environment.

use std::path::Path;

use anyhow::Context as _;
use serde::Deserialize;

fn default_base_url() -> String { "https://api.openai.com/v1".to_string() }
fn default_model() -> String { "gpt-4o-mini".to_string() }
fn default_temperature() -> f32 { 0.2 }
fn default_max_tokens() -> u32 { 300 }
fn default_timeout_secs() -> u64 { 30 }

/// Generation-backend settings. With `use_backend` unset every pass runs
/// fully offline.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
  #[serde(default)]
  pub use_backend:  bool,
  #[serde(default = "default_base_url")]
  pub base_url:     String,
  #[serde(default)]
  pub api_key:      String,
  #[serde(default = "default_model")]
  pub model:        String,
  #[serde(default = "default_temperature")]
  pub temperature:  f32,
  #[serde(default = "default_max_tokens")]
  pub max_tokens:   u32,
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

/// Load settings from `path` (optional) overlaid with `VERA_*` environment
/// variables.
pub fn load(path: &Path) -> anyhow::Result<Settings> {
  let settings = config::Config::builder()
    .add_source(config::File::from(path.to_path_buf()).required(false))
    .add_source(config::Environment::with_prefix("VERA").try_parsing(true))
    .build()
    .context("failed to read settings")?;

  settings
    .try_deserialize()
    .context("failed to deserialize settings")
}
