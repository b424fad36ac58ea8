//! Claim generation: deterministic offline rules plus the optional external
//! backend path.
//!
//! Whatever the path, the contract is the same: a list of schema-valid
//! [`Claim`]s, possibly empty. A backend failure here falls back to the
//! offline rules without surfacing an error; the narrative path in
//! [`crate::narrate`] does the opposite.

use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;
use vera_core::{
  claim::{Claim, Comparison, Granularity, MetricKind, Vs},
  generate::{GenerationRequest, TextGenerator},
  summary::KpiSummary,
};

const CLAIMS_SYSTEM_PROMPT: &str = "You are a retail analytics assistant. \
  Given a JSON KPI summary, reply with ONLY a JSON array of insight claims. \
  Each claim object has: metric (revenue|orders|aov|return_rate|other), \
  time_granularity (day|week|month|quarter), period {start, end} as \
  YYYY-MM-DD strings, filter {category, store}, statement (one sentence), \
  value_reported (number), and comparison {vs \
  (none|previous_period|previous_year), delta, delta_pct}. Use the period \
  and filter from the summary verbatim. No prose outside the array.";

// ─── Offline rules ───────────────────────────────────────────────────────────

fn base_claim(summary: &KpiSummary, metric: MetricKind) -> Claim {
  Claim {
    claim_id: Uuid::new_v4().to_string(),
    metric,
    time_granularity: Granularity::Month,
    period: summary.period,
    filter: summary.filter.clone(),
    statement: String::new(),
    value_reported: 0.0,
    comparison: Comparison::default(),
  }
}

/// The deterministic baseline generator.
///
/// Emits up to three claims: a revenue change vs the previous contiguous
/// period, the current average order value, and the top product by revenue.
pub fn offline_insights(summary: &KpiSummary) -> Vec<Claim> {
  let mut claims = Vec::new();

  if let Some(previous) = &summary.previous
    && previous.revenue != 0.0
  {
    let delta = summary.current.revenue - previous.revenue;
    let delta_pct = delta / previous.revenue * 100.0;
    let direction = if delta >= 0.0 { "increased" } else { "decreased" };
    let mut claim = base_claim(summary, MetricKind::Revenue);
    claim.statement = format!(
      "Revenue {direction} by {:.1}% compared with the previous period.",
      delta_pct.abs()
    );
    claim.value_reported = summary.current.revenue;
    claim.comparison = Comparison {
      vs: Vs::PreviousPeriod,
      delta,
      delta_pct,
    };
    claims.push(claim);
  }

  if let Some(aov) = summary.current.aov {
    let mut claim = base_claim(summary, MetricKind::Aov);
    claim.statement = format!("Average order value is {aov:.2}.");
    claim.value_reported = aov;
    claims.push(claim);
  }

  if let Some(top) = &summary.top_product {
    let mut claim = base_claim(summary, MetricKind::Other);
    claim.statement = format!(
      "Top product by revenue is {} at {:.2}.",
      top.product, top.revenue
    );
    claim.value_reported = top.revenue;
    claims.push(claim);
  }

  claims
}

// ─── Schema validation ───────────────────────────────────────────────────────

fn claims_from_items(items: Vec<Value>) -> Vec<Claim> {
  items
    .into_iter()
    .filter_map(|item| match Claim::from_value(item) {
      Ok(claim) => Some(claim),
      Err(e) => {
        debug!(error = %e, "dropping claim that failed schema validation");
        None
      }
    })
    .collect()
}

/// Parse a backend reply into schema-valid claims.
///
/// Items failing validation are dropped silently; a reply that is not a JSON
/// array yields no claims. Never errors to the caller.
pub fn parse_claims(raw: &str) -> Vec<Claim> {
  match serde_json::from_str::<Vec<Value>>(raw) {
    Ok(items) => claims_from_items(items),
    Err(_) => {
      debug!("backend reply is not a JSON array");
      Vec::new()
    }
  }
}

// ─── Entry points ────────────────────────────────────────────────────────────

/// Generate claims without a backend: the offline rules.
pub fn generate(summary: &KpiSummary) -> Vec<Claim> {
  offline_insights(summary)
}

/// Generate claims via `backend`, falling back silently to
/// [`offline_insights`] on any call failure or unparseable reply.
pub async fn generate_with_backend<G: TextGenerator>(
  summary: &KpiSummary,
  backend: &G,
  max_tokens: u32,
  temperature: f32,
) -> Vec<Claim> {
  let user = match serde_json::to_string(summary) {
    Ok(s) => s,
    Err(e) => {
      warn!(error = %e, "could not serialize KPI summary; using offline insights");
      return offline_insights(summary);
    }
  };
  let request = GenerationRequest {
    system: CLAIMS_SYSTEM_PROMPT.to_string(),
    user,
    max_tokens,
    temperature,
  };

  match backend.generate(&request).await {
    Ok(reply) => match serde_json::from_str::<Vec<Value>>(&reply) {
      Ok(items) => claims_from_items(items),
      Err(e) => {
        warn!(error = %e, "backend reply unparseable; using offline insights");
        offline_insights(summary)
      }
    },
    Err(e) => {
      warn!(error = %e, "generation backend failed; using offline insights");
      offline_insights(summary)
    }
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use vera_core::{
    dataset::{FilterCtx, Period},
    generate::GenerateError,
    summary::{KpiValues, TopProduct},
  };

  use super::*;
  use crate::test_support::FixedBackend;

  fn summary(previous: Option<KpiValues>) -> KpiSummary {
    KpiSummary {
      period: Period::new(
        "2024-02-01".parse().unwrap(),
        "2024-02-29".parse().unwrap(),
      ),
      filter: FilterCtx::all(),
      current: KpiValues {
        revenue: 1100.0,
        orders:  50.0,
        aov:     Some(22.0),
      },
      previous,
      top_product: Some(TopProduct {
        product: "Monitor".into(),
        revenue: 400.0,
      }),
    }
  }

  #[test]
  fn offline_emits_revenue_aov_and_top_product() {
    let claims = offline_insights(&summary(Some(KpiValues {
      revenue: 1000.0,
      orders:  45.0,
      aov:     Some(22.2),
    })));
    assert_eq!(claims.len(), 3);

    let revenue = &claims[0];
    assert_eq!(revenue.metric, MetricKind::Revenue);
    assert_eq!(revenue.comparison.vs, Vs::PreviousPeriod);
    assert_eq!(revenue.comparison.delta, 100.0);
    assert!((revenue.comparison.delta_pct - 10.0).abs() < 1e-9);
    assert_eq!(
      revenue.statement,
      "Revenue increased by 10.0% compared with the previous period."
    );
    assert_eq!(revenue.value_reported, 1100.0);

    let aov = &claims[1];
    assert_eq!(aov.metric, MetricKind::Aov);
    assert_eq!(aov.statement, "Average order value is 22.00.");
    assert_eq!(aov.comparison.vs, Vs::None);

    let top = &claims[2];
    assert_eq!(top.metric, MetricKind::Other);
    assert_eq!(top.statement, "Top product by revenue is Monitor at 400.00.");
    assert_eq!(top.value_reported, 400.0);
  }

  #[test]
  fn offline_reports_decreases() {
    let claims = offline_insights(&summary(Some(KpiValues {
      revenue: 2200.0,
      orders:  90.0,
      aov:     Some(24.4),
    })));
    assert_eq!(
      claims[0].statement,
      "Revenue decreased by 50.0% compared with the previous period."
    );
    assert!(claims[0].comparison.delta < 0.0);
  }

  #[test]
  fn offline_skips_revenue_claim_when_previous_revenue_is_zero() {
    let claims = offline_insights(&summary(Some(KpiValues {
      revenue: 0.0,
      orders:  0.0,
      aov:     None,
    })));
    assert_eq!(claims.len(), 2);
    assert_eq!(claims[0].metric, MetricKind::Aov);
  }

  #[test]
  fn offline_without_previous_or_aov_or_top_is_empty() {
    let mut s = summary(None);
    s.current.aov = None;
    s.top_product = None;
    assert!(offline_insights(&s).is_empty());
  }

  #[test]
  fn parse_claims_drops_invalid_items_silently() {
    let raw = r#"[
      {
        "metric": "revenue",
        "time_granularity": "month",
        "period": { "start": "2024-01-01", "end": "2024-01-31" },
        "statement": "Revenue held steady.",
        "value_reported": 10.0
      },
      { "metric": "margin", "statement": "not a valid claim" },
      42
    ]"#;
    let claims = parse_claims(raw);
    assert_eq!(claims.len(), 1);
    assert_eq!(claims[0].metric, MetricKind::Revenue);
  }

  #[test]
  fn parse_claims_tolerates_non_array_input() {
    assert!(parse_claims("no json here").is_empty());
    assert!(parse_claims("{\"metric\": \"revenue\"}").is_empty());
    assert!(parse_claims("[]").is_empty());
  }

  #[tokio::test]
  async fn backend_reply_is_schema_validated() {
    let backend = FixedBackend::replies(
      r#"[{
        "metric": "orders",
        "time_granularity": "week",
        "period": { "start": "2024-02-01", "end": "2024-02-07" },
        "statement": "Orders held steady.",
        "value_reported": 50
      }]"#,
    );
    let claims =
      generate_with_backend(&summary(None), &backend, 400, 0.2).await;
    assert_eq!(claims.len(), 1);
    assert_eq!(claims[0].metric, MetricKind::Orders);
  }

  #[tokio::test]
  async fn backend_failure_falls_back_to_offline_rules() {
    let backend = FixedBackend::failing(|| GenerateError::Timeout);
    let claims =
      generate_with_backend(&summary(None), &backend, 400, 0.2).await;
    // Offline rules for a summary without previous: AOV + top product.
    assert_eq!(claims.len(), 2);
    assert_eq!(claims[0].metric, MetricKind::Aov);
  }

  #[tokio::test]
  async fn unparseable_backend_reply_falls_back_to_offline_rules() {
    let backend = FixedBackend::replies("Revenue went up a lot!");
    let claims =
      generate_with_backend(&summary(None), &backend, 400, 0.2).await;
    assert_eq!(claims.len(), 2);
  }

  #[tokio::test]
  async fn valid_but_empty_backend_reply_yields_no_claims() {
    let backend = FixedBackend::replies("[]");
    let claims =
      generate_with_backend(&summary(None), &backend, 400, 0.2).await;
    assert!(claims.is_empty());
  }
}
