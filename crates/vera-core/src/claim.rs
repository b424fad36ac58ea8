//! Claim types — the unit of generated and verified content.
//!
//! A claim is one explicit tagged structure with required fields. Output from
//! any external producer is parsed into it at the boundary; a value that does
//! not fit the schema is rejected whole rather than patched field by field.

use serde::{Deserialize, Serialize};
use strum::Display;
use uuid::Uuid;

use crate::{
  Result,
  dataset::{FilterCtx, Period},
};

// ─── Enumerations ────────────────────────────────────────────────────────────

/// The metric a claim asserts a value for.
///
/// Together with the claim's period and filter, this fully determines how the
/// fact checker recomputes the true value — the claim carries no other
/// computation logic.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MetricKind {
  Revenue,
  Orders,
  Aov,
  ReturnRate,
  Other,
}

/// Reporting granularity tag carried by a claim.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Granularity {
  Day,
  Week,
  Month,
  Quarter,
}

/// What a claim is measured against.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Vs {
  #[default]
  None,
  PreviousPeriod,
  PreviousYear,
}

// ─── Comparison ──────────────────────────────────────────────────────────────

/// The comparison payload attached to a claim: the claimed delta and percent
/// delta against the chosen basis.
#[derive(
  Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize,
)]
#[serde(default)]
pub struct Comparison {
  pub vs:        Vs,
  pub delta:     f64,
  pub delta_pct: f64,
}

// ─── Claim ───────────────────────────────────────────────────────────────────

fn fresh_claim_id() -> String { Uuid::new_v4().to_string() }

/// A schema-conforming assertion about a metric, to be verified.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claim {
  #[serde(default = "fresh_claim_id")]
  pub claim_id:         String,
  pub metric:           MetricKind,
  pub time_granularity: Granularity,
  pub period:           Period,
  #[serde(default)]
  pub filter:           FilterCtx,
  pub statement:        String,
  pub value_reported:   f64,
  #[serde(default)]
  pub comparison:       Comparison,
}

impl Claim {
  /// Parse an externally produced claim at the boundary. A value that fails
  /// schema validation is rejected as a whole.
  pub fn from_value(value: serde_json::Value) -> Result<Self> {
    Ok(serde_json::from_value(value)?)
  }
}

// ─── Checked claim ───────────────────────────────────────────────────────────

/// Terminal verification status, exactly one per claim.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CheckStatus {
  /// Stated value matches the recomputed value within tolerance.
  Verified,
  /// Metric correct, but the stated trend math is slightly off.
  Approximate,
  /// Stated value wrong beyond tolerance.
  Mismatch,
  /// The claim could not be evaluated.
  Error,
}

/// The outcome of fact-checking a single claim. Created once per check pass
/// and never mutated; each render derives a fresh set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckedClaim {
  pub claim_id:       String,
  pub statement:      String,
  pub status:         CheckStatus,
  pub reason:         String,
  pub value_reported: f64,
  pub value_computed: f64,
  pub comparison:     Comparison,
  pub metric:         MetricKind,
}

// ─── Tests ───────────────────────────────────────────────────────────────────
