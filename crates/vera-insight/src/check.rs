//! Fact checking: independently recompute every claim's metric and classify
//! how well its stated numbers match reality.
//!
//! Output is strictly 1:1 with input, in order. A claim that cannot be
//! evaluated becomes an `Error` row in its position; it never aborts the
//! remaining claims.

use serde_json::Value;
use vera_core::{
  claim::{CheckStatus, CheckedClaim, Claim, MetricKind, Vs},
  dataset::{FilterCtx, OrderRecord, Period},
};
use vera_metrics as metrics;

/// Claims within this percent of the recomputed value are verified.
pub const DEFAULT_TOLERANCE_PCT: f64 = 0.5;

// ─── Ground truth ────────────────────────────────────────────────────────────

/// Recompute `metric` over the claim's own window and filter.
///
/// `ReturnRate` and `Other` have no engine and recompute as 0.0, which makes
/// step 2's percent error vacuously zero for them.
fn compute_metric(
  records: &[OrderRecord],
  metric: MetricKind,
  period: &Period,
  filter: &FilterCtx,
) -> f64 {
  match metric {
    MetricKind::Revenue => metrics::revenue(records, period, filter),
    MetricKind::Orders => {
      metrics::order_count(records, period, filter) as f64
    }
    MetricKind::Aov => metrics::average_order_value(records, period, filter),
    MetricKind::ReturnRate | MetricKind::Other => 0.0,
  }
}

// ─── Checking ────────────────────────────────────────────────────────────────

/// Fact-check `claims` against `records`: one [`CheckedClaim`] per input
/// claim, same order. Pure and deterministic — re-running on the same inputs
/// yields identical statuses and reasons.
pub fn check(
  claims: &[Claim],
  records: &[OrderRecord],
  tolerance_pct: f64,
) -> Vec<CheckedClaim> {
  claims
    .iter()
    .map(|claim| check_one(claim, records, tolerance_pct))
    .collect()
}

fn check_one(
  claim: &Claim,
  records: &[OrderRecord],
  tolerance_pct: f64,
) -> CheckedClaim {
  let computed =
    compute_metric(records, claim.metric, &claim.period, &claim.filter);
  let reported = claim.value_reported;
  let err_pct = if computed == 0.0 {
    0.0
  } else {
    ((reported - computed) / computed).abs() * 100.0
  };

  let mut status = if err_pct <= tolerance_pct {
    CheckStatus::Verified
  } else {
    CheckStatus::Mismatch
  };
  let mut reason =
    format!("abs error {err_pct:.2}% (tolerance {tolerance_pct}%)");

  // A verified headline value can still carry stale trend math; recompute the
  // previous contiguous window and compare the stated deltas.
  if claim.comparison.vs == Vs::PreviousPeriod {
    let previous = claim.period.previous_contiguous();
    let prev_val =
      compute_metric(records, claim.metric, &previous, &claim.filter);
    let delta = computed - prev_val;
    let delta_pct = if prev_val != 0.0 {
      delta / prev_val * 100.0
    } else {
      0.0
    };

    if status == CheckStatus::Verified {
      let delta_err = (delta - claim.comparison.delta).abs();
      let pct_err = (delta_pct - claim.comparison.delta_pct).abs();
      if delta_err > f64::max(0.01, 0.005 * computed.abs()) || pct_err > 0.5
      {
        status = CheckStatus::Approximate;
        reason = format!(
          "delta/percent slightly off (Δ={delta_err:.2}, Δ%={pct_err:.2})"
        );
      }
    }
  }

  CheckedClaim {
    claim_id: claim.claim_id.clone(),
    statement: claim.statement.clone(),
    status,
    reason,
    value_reported: reported,
    value_computed: computed,
    comparison: claim.comparison,
    metric: claim.metric,
  }
}

// ─── Boundary entry ──────────────────────────────────────────────────────────

/// Fact-check externally produced claims in wire form.
///
/// Each JSON value is parsed into a [`Claim`] at this boundary; a value that
/// does not fit the schema yields an `Error` row in its position, with
/// identifying fields salvaged from the raw object where present.
pub fn check_raw(
  values: &[Value],
  records: &[OrderRecord],
  tolerance_pct: f64,
) -> Vec<CheckedClaim> {
  values
    .iter()
    .map(|value| match Claim::from_value(value.clone()) {
      Ok(claim) => check_one(&claim, records, tolerance_pct),
      Err(e) => error_row(value, &e.to_string()),
    })
    .collect()
}

fn error_row(value: &Value, reason: &str) -> CheckedClaim {
  let text = |key: &str| {
    value
      .get(key)
      .and_then(Value::as_str)
      .unwrap_or_default()
      .to_string()
  };
  let claim_id = {
    let id = text("claim_id");
    if id.is_empty() { "unknown".to_string() } else { id }
  };

  CheckedClaim {
    claim_id,
    statement: text("statement"),
    status: CheckStatus::Error,
    reason: reason.to_string(),
    value_reported: value
      .get("value_reported")
      .and_then(Value::as_f64)
      .unwrap_or(0.0),
    value_computed: 0.0,
    comparison: value
      .get("comparison")
      .and_then(|v| serde_json::from_value(v.clone()).ok())
      .unwrap_or_default(),
    metric: value
      .get("metric")
      .and_then(|v| serde_json::from_value(v.clone()).ok())
      .unwrap_or(MetricKind::Other),
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
