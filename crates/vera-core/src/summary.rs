//! The KPI summary payload handed to the insight generator.
//!
//! This is also the persisted run payload, so the serialized form is part of
//! the audit surface and stays stable.

use serde::{Deserialize, Serialize};

use crate::dataset::{FilterCtx, Period};

/// Headline metrics for one window.
///
/// `orders` is carried as a float so the summary serializes the way the
/// generator consumes it. `aov` is `None` when the window has no orders.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KpiValues {
  pub revenue: f64,
  pub orders:  f64,
  pub aov:     Option<f64>,
}

/// The single top segment by revenue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopProduct {
  pub product: String,
  pub revenue: f64,
}

/// Everything the insight generator sees about one dashboard render.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KpiSummary {
  pub period:      Period,
  #[serde(default)]
  pub filter:      FilterCtx,
  pub current:     KpiValues,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub previous:    Option<KpiValues>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub top_product: Option<TopProduct>,
}
