//! Executive-summary rendering from fact-checked claims and driver tables.
//!
//! The offline renderer is the always-available baseline. The backend path
//! surfaces its own failure as a visible "Explanation unavailable" string —
//! unlike claim generation, it never silently substitutes the offline text,
//! so a reader can always tell which path produced what they see.

use serde::Serialize;
use vera_core::{
  claim::{CheckStatus, CheckedClaim},
  dataset::OrderRecord,
  generate::{GenerationRequest, TextGenerator},
  summary::KpiSummary,
};
use vera_metrics::{Dimension, DriverBreakdown, drivers};

const SUMMARY_SYSTEM_PROMPT: &str = "You are a senior data analyst. Explain \
  KPI changes to a busy manager in clear, direct English. Structure the \
  reply in four short parts: movements, drivers, risks, actions. Cite \
  concrete numbers from the provided data. Avoid jargon.";

const DRIVER_DIMENSIONS: [Dimension; 3] =
  [Dimension::Category, Dimension::Store, Dimension::Product];

// ─── Offline renderer ────────────────────────────────────────────────────────

fn status_phrase(status: CheckStatus) -> &'static str {
  match status {
    CheckStatus::Verified => "verified",
    CheckStatus::Approximate => "approximate",
    CheckStatus::Mismatch => "mismatched",
    CheckStatus::Error => "in error",
  }
}

fn kpi_digest(summary: &KpiSummary) -> String {
  let current = &summary.current;
  match current.aov {
    Some(aov) => format!(
      "Revenue {:.2} across {} orders; average order value {:.2}.",
      current.revenue, current.orders as i64, aov
    ),
    None => format!(
      "Revenue {:.2} across {} orders.",
      current.revenue, current.orders as i64
    ),
  }
}

/// The biggest positive mover in a breakdown, if any.
fn positive_mover(breakdown: &DriverBreakdown) -> Option<&drivers::DriverRow> {
  breakdown.top_movers.first().filter(|row| row.delta > 0.0)
}

/// Render the offline deterministic summary.
pub fn summarize(
  checked: &[CheckedClaim],
  summary: &KpiSummary,
  current: &[OrderRecord],
  previous: Option<&[OrderRecord]>,
) -> String {
  let mut lines = vec![kpi_digest(summary)];

  for status in [
    CheckStatus::Verified,
    CheckStatus::Approximate,
    CheckStatus::Mismatch,
    CheckStatus::Error,
  ] {
    let count = checked.iter().filter(|c| c.status == status).count();
    if count > 0 {
      lines.push(format!("{count} claim(s) {}", status_phrase(status)));
    }
  }

  let breakdowns: Vec<DriverBreakdown> = DRIVER_DIMENSIONS
    .iter()
    .map(|dim| drivers::driver_breakdown(current, previous, *dim))
    .collect();

  for breakdown in &breakdowns {
    if let Some(top) = breakdown.top_current.first() {
      let mut line = format!(
        "Top {}: {} ({:.2})",
        breakdown.dimension, top.segment, top.revenue_cur
      );
      if let Some(mover) = positive_mover(breakdown) {
        line.push_str(&format!(
          "; biggest mover: {} (+{:.2})",
          mover.segment, mover.delta
        ));
      }
      line.push('.');
      lines.push(line);
    }
  }

  lines.push("Actions:".to_string());
  let mismatches = checked
    .iter()
    .filter(|c| c.status == CheckStatus::Mismatch)
    .count();
  // Ties keep the earliest dimension listed.
  let mut best_mover: Option<(Dimension, &drivers::DriverRow)> = None;
  for breakdown in &breakdowns {
    if let Some(mover) = positive_mover(breakdown)
      && best_mover.is_none_or(|(_, best)| mover.delta > best.delta)
    {
      best_mover = Some((breakdown.dimension, mover));
    }
  }

  let mut actions = Vec::new();
  if mismatches > 0 {
    actions.push(format!("- Audit the {mismatches} mismatched claim(s)."));
  }
  if let Some((dimension, mover)) = best_mover {
    actions.push(format!(
      "- Investigate {} ({} revenue up {:.2} vs the previous period).",
      mover.segment, dimension, mover.delta
    ));
  }
  if actions.is_empty() {
    actions.push("- Continue routine monitoring.".to_string());
  }
  lines.extend(actions);

  lines.join("\n")
}

// ─── Backend renderer ────────────────────────────────────────────────────────

#[derive(Serialize)]
struct SummaryPrompt<'a> {
  kpis:    &'a KpiSummary,
  claims:  &'a [CheckedClaim],
  drivers: Vec<DriverBreakdown>,
}

fn unavailable(reason: &str) -> String {
  format!("Explanation unavailable ({reason}).")
}

/// Render the summary via a generation backend.
///
/// A failed call yields a visible unavailable message; the KPIs and checked
/// claims rendered elsewhere in the pass are unaffected.
pub async fn summarize_with_backend<G: TextGenerator>(
  backend: &G,
  checked: &[CheckedClaim],
  summary: &KpiSummary,
  current: &[OrderRecord],
  previous: Option<&[OrderRecord]>,
  max_tokens: u32,
  temperature: f32,
) -> String {
  let prompt = SummaryPrompt {
    kpis:    summary,
    claims:  checked,
    drivers: DRIVER_DIMENSIONS
      .iter()
      .map(|dim| drivers::driver_breakdown(current, previous, *dim))
      .collect(),
  };
  let user = match serde_json::to_string(&prompt) {
    Ok(s) => s,
    Err(e) => return unavailable(&e.to_string()),
  };
  let request = GenerationRequest {
    system: SUMMARY_SYSTEM_PROMPT.to_string(),
    user,
    max_tokens,
    temperature,
  };

  match backend.generate(&request).await {
    Ok(text) => text.trim().to_string(),
    Err(e) => unavailable(&e.to_string()),
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use vera_core::{
    claim::{Comparison, MetricKind},
    dataset::{FilterCtx, Period},
    generate::GenerateError,
    summary::KpiValues,
  };

  use super::*;
  use crate::test_support::{FixedBackend, line};

  fn summary(aov: Option<f64>) -> KpiSummary {
    KpiSummary {
      period: Period::new(
        "2024-02-01".parse().unwrap(),
        "2024-02-29".parse().unwrap(),
      ),
      filter: FilterCtx::all(),
      current: KpiValues {
        revenue: 100.0,
        orders:  3.0,
        aov,
      },
      previous: None,
      top_product: None,
    }
  }

  fn checked_with(status: CheckStatus) -> CheckedClaim {
    CheckedClaim {
      claim_id: "c".into(),
      statement: "s".into(),
      status,
      reason: "r".into(),
      value_reported: 1.0,
      value_computed: 1.0,
      comparison: Comparison::default(),
      metric: MetricKind::Revenue,
    }
  }

  fn current_records() -> Vec<OrderRecord> {
    vec![
      line("A", "2024-02-01", "X", "Audio", "East", 1, 60.0),
      line("B", "2024-02-02", "Y", "Displays", "West", 1, 40.0),
    ]
  }

  #[test]
  fn digest_includes_aov_when_defined() {
    let text = summarize(&[], &summary(Some(33.33)), &current_records(), None);
    assert!(text.starts_with(
      "Revenue 100.00 across 3 orders; average order value 33.33."
    ));
  }

  #[test]
  fn digest_omits_undefined_aov() {
    let text = summarize(&[], &summary(None), &current_records(), None);
    assert!(text.starts_with("Revenue 100.00 across 3 orders.\n"));
    assert!(!text.contains("average order value"));
  }

  #[test]
  fn counts_appear_only_for_nonzero_statuses() {
    let checked = vec![
      checked_with(CheckStatus::Verified),
      checked_with(CheckStatus::Verified),
      checked_with(CheckStatus::Mismatch),
    ];
    let text = summarize(&checked, &summary(None), &current_records(), None);
    assert!(text.contains("2 claim(s) verified"));
    assert!(text.contains("1 claim(s) mismatched"));
    assert!(!text.contains("approximate"));
    assert!(!text.contains("in error"));
  }

  #[test]
  fn names_top_contributors_per_dimension() {
    let text = summarize(&[], &summary(None), &current_records(), None);
    assert!(text.contains("Top category: Audio (60.00)."));
    assert!(text.contains("Top store: East (60.00)."));
    assert!(text.contains("Top product: X (60.00)."));
  }

  #[test]
  fn mover_named_when_previous_records_supplied() {
    let previous =
      vec![line("P", "2024-01-05", "X", "Audio", "East", 1, 10.0)];
    let text = summarize(
      &[],
      &summary(None),
      &current_records(),
      Some(&previous),
    );
    assert!(text.contains("biggest mover: Audio (+50.00)"), "{text}");
  }

  #[test]
  fn actions_recommend_auditing_mismatches() {
    let checked = vec![checked_with(CheckStatus::Mismatch)];
    let text = summarize(&checked, &summary(None), &current_records(), None);
    assert!(text.contains("- Audit the 1 mismatched claim(s)."));
  }

  #[test]
  fn actions_recommend_investigating_largest_mover() {
    let previous =
      vec![line("P", "2024-01-05", "Y", "Displays", "West", 1, 30.0)];
    let text = summarize(
      &[],
      &summary(None),
      &current_records(),
      Some(&previous),
    );
    // Audio is up 60, Displays up 10; Audio is the largest mover and the
    // category dimension is listed first.
    assert!(
      text.contains("- Investigate Audio (category revenue up 60.00"),
      "{text}"
    );
  }

  #[test]
  fn actions_default_to_routine_monitoring() {
    let checked = vec![checked_with(CheckStatus::Verified)];
    let text = summarize(&checked, &summary(None), &current_records(), None);
    assert!(text.contains("- Continue routine monitoring."));
  }

  #[tokio::test]
  async fn backend_text_is_returned_trimmed() {
    let backend = FixedBackend::replies("  Movements: revenue rose.  ");
    let text = summarize_with_backend(
      &backend,
      &[],
      &summary(None),
      &current_records(),
      None,
      300,
      0.2,
    )
    .await;
    assert_eq!(text, "Movements: revenue rose.");
  }

  #[tokio::test]
  async fn backend_failure_is_visible_not_silent() {
    let backend = FixedBackend::failing(|| GenerateError::Auth);
    let text = summarize_with_backend(
      &backend,
      &[],
      &summary(None),
      &current_records(),
      None,
      300,
      0.2,
    )
    .await;
    assert_eq!(
      text,
      "Explanation unavailable (authorization rejected)."
    );
    // The offline digest is NOT substituted.
    assert!(!text.contains("Revenue 100.00"));
  }
}
