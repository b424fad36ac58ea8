//! Insight pipeline for Vera: generate claims, fact-check them against the
//! dataset, and summarize the outcome.
//!
//! One dashboard render is one synchronous pass — generate, check, narrate —
//! with no overlapping passes and no shared mutable state between them. The
//! dataset is read-only throughout, so concurrent sessions may share it.

pub mod check;
pub mod generate;
pub mod narrate;

use vera_core::{
  claim::{CheckedClaim, Claim},
  dataset::{Dataset, FilterCtx, OrderRecord, Period},
  generate::TextGenerator,
  summary::{KpiSummary, KpiValues, TopProduct},
};
use vera_metrics as metrics;

// ─── Pass configuration ──────────────────────────────────────────────────────

/// Knobs for one pipeline pass.
#[derive(Debug, Clone)]
pub struct PassOptions {
  /// Maximum percent error for a claim to be classified verified.
  pub tolerance_pct:    f64,
  /// Include the previous contiguous period in the KPI summary.
  pub compare_previous: bool,
  /// Token budget for each external generation call.
  pub max_tokens:       u32,
  pub temperature:      f32,
}

impl Default for PassOptions {
  fn default() -> Self {
    Self {
      tolerance_pct:    check::DEFAULT_TOLERANCE_PCT,
      compare_previous: true,
      max_tokens:       300,
      temperature:      0.2,
    }
  }
}

/// Everything one render pass produces.
#[derive(Debug, Clone)]
pub struct PassOutcome {
  pub summary:   KpiSummary,
  pub claims:    Vec<Claim>,
  pub checked:   Vec<CheckedClaim>,
  pub narrative: String,
}

// ─── KPI summary ─────────────────────────────────────────────────────────────

/// Headline metrics for one window; AOV is undefined without orders.
pub fn kpi_values(
  records: &[OrderRecord],
  period: Period,
  filter: &FilterCtx,
) -> KpiValues {
  let revenue = metrics::revenue(records, &period, filter);
  let orders = metrics::order_count(records, &period, filter);
  KpiValues {
    revenue,
    orders: orders as f64,
    aov: (orders > 0).then(|| revenue / orders as f64),
  }
}

/// Build the generator's input payload for one window.
pub fn build_summary(
  dataset: &Dataset,
  period: Period,
  filter: &FilterCtx,
  compare_previous: bool,
) -> KpiSummary {
  let records = dataset.records();
  let current = kpi_values(records, period, filter);
  let previous = compare_previous
    .then(|| kpi_values(records, period.previous_contiguous(), filter));
  let top_product = metrics::top_segments(
    records,
    &period,
    filter,
    metrics::Dimension::Product,
    1,
  )
  .into_iter()
  .next()
  .map(|s| TopProduct {
    product: s.segment,
    revenue: s.revenue,
  });

  KpiSummary {
    period,
    filter: filter.clone(),
    current,
    previous,
    top_product,
  }
}

// ─── Pipeline passes ─────────────────────────────────────────────────────────

fn window_slices(
  dataset: &Dataset,
  period: Period,
  filter: &FilterCtx,
  compare_previous: bool,
) -> (Vec<OrderRecord>, Option<Vec<OrderRecord>>) {
  let current = metrics::window(dataset.records(), period, filter);
  let previous = compare_previous.then(|| {
    metrics::window(dataset.records(), period.previous_contiguous(), filter)
  });
  (current, previous)
}

/// Run one fully-offline pass: deterministic generation and the offline
/// narrative.
pub fn run_pass(
  dataset: &Dataset,
  period: Period,
  filter: &FilterCtx,
  options: &PassOptions,
) -> PassOutcome {
  let summary =
    build_summary(dataset, period, filter, options.compare_previous);
  let claims = generate::generate(&summary);
  let checked =
    check::check(&claims, dataset.records(), options.tolerance_pct);
  let (current, previous) =
    window_slices(dataset, period, filter, options.compare_previous);
  let narrative =
    narrate::summarize(&checked, &summary, &current, previous.as_deref());

  PassOutcome {
    summary,
    claims,
    checked,
    narrative,
  }
}

/// Run one pass against a generation backend.
///
/// Claim generation falls back silently to the offline rules on failure; a
/// narrative failure surfaces as a visible unavailable message. Checked
/// claims and KPIs are unaffected either way.
pub async fn run_pass_with_backend<G: TextGenerator>(
  dataset: &Dataset,
  period: Period,
  filter: &FilterCtx,
  options: &PassOptions,
  backend: &G,
) -> PassOutcome {
  let summary =
    build_summary(dataset, period, filter, options.compare_previous);
  let claims = generate::generate_with_backend(
    &summary,
    backend,
    options.max_tokens,
    options.temperature,
  )
  .await;
  let checked =
    check::check(&claims, dataset.records(), options.tolerance_pct);
  let (current, previous) =
    window_slices(dataset, period, filter, options.compare_previous);
  let narrative = narrate::summarize_with_backend(
    backend,
    &checked,
    &summary,
    &current,
    previous.as_deref(),
    options.max_tokens,
    options.temperature,
  )
  .await;

  PassOutcome {
    summary,
    claims,
    checked,
    narrative,
  }
}

// ─── Shared test helpers ─────────────────────────────────────────────────────


// ─── Tests ───────────────────────────────────────────────────────────────────
