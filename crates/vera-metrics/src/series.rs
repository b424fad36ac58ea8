//! Time-series helpers: daily revenue, anomaly score, quarterly rollups.

use std::collections::{BTreeMap, HashSet};

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use vera_core::dataset::{FilterCtx, OrderRecord};

// ─── Daily series ────────────────────────────────────────────────────────────

/// Per-day revenue sums in date order.
pub fn daily_revenue(records: &[OrderRecord]) -> Vec<(NaiveDate, f64)> {
  let mut by_day: BTreeMap<NaiveDate, f64> = BTreeMap::new();
  for r in records {
    *by_day.entry(r.order_date).or_insert(0.0) += r.revenue;
  }
  by_day.into_iter().collect()
}

/// Z-score of the last point against the whole series (population σ).
///
/// `None` for fewer than two points; 0.0 when the series is flat.
pub fn zscore_last_day(series: &[(NaiveDate, f64)]) -> Option<f64> {
  if series.len() < 2 {
    return None;
  }
  let values: Vec<f64> = series.iter().map(|(_, v)| *v).collect();
  let n = values.len() as f64;
  let mean = values.iter().sum::<f64>() / n;
  let variance =
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
  let sd = variance.sqrt();
  if sd == 0.0 {
    Some(0.0)
  } else {
    Some((values[values.len() - 1] - mean) / sd)
  }
}

// ─── Quarterly report ────────────────────────────────────────────────────────

/// One fiscal quarter's aggregates with period-over-period changes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuarterRow {
  /// `FYyyyy-Qn`, where the year is the calendar year the fiscal year starts
  /// in.
  pub quarter: String,
  pub revenue: f64,
  pub orders:  usize,
  pub aov:     Option<f64>,
  /// Revenue change vs the previous listed quarter, in percent.
  pub qoq_pct: Option<f64>,
  /// Revenue change vs the same fiscal quarter one year earlier, in percent.
  pub yoy_pct: Option<f64>,
}

/// Fiscal (year, quarter) bucket for a date, given the month the fiscal year
/// starts in (1 = calendar years).
fn fiscal_bucket(date: NaiveDate, fiscal_start_month: u32) -> (i32, u32) {
  let month = date.month();
  let offset = (month + 12 - fiscal_start_month) % 12;
  let quarter = offset / 3 + 1;
  let year = if month >= fiscal_start_month {
    date.year()
  } else {
    date.year() - 1
  };
  (year, quarter)
}

/// Quarterly revenue, distinct orders, and AOV over the whole dataset span,
/// with quarter-over-quarter and year-over-year revenue changes.
///
/// Changes are row-based: QoQ compares against the previous listed quarter,
/// YoY against the row four back, mirroring how the table is read. Only the
/// last `n_quarters` rows are returned, in ascending quarter order.
pub fn quarterly_report(
  records: &[OrderRecord],
  filter: &FilterCtx,
  n_quarters: usize,
  fiscal_start_month: u32,
) -> Vec<QuarterRow> {
  let mut acc: BTreeMap<(i32, u32), (f64, HashSet<&str>)> = BTreeMap::new();
  for r in records.iter().filter(|r| filter.matches(r)) {
    let entry = acc
      .entry(fiscal_bucket(r.order_date, fiscal_start_month))
      .or_default();
    entry.0 += r.revenue;
    entry.1.insert(r.order_id.as_str());
  }

  let mut rows: Vec<QuarterRow> = acc
    .into_iter()
    .map(|((year, quarter), (revenue, ids))| {
      let orders = ids.len();
      QuarterRow {
        quarter: format!("FY{year}-Q{quarter}"),
        revenue,
        orders,
        aov: (orders > 0).then(|| revenue / orders as f64),
        qoq_pct: None,
        yoy_pct: None,
      }
    })
    .collect();

  for i in 0..rows.len() {
    if i >= 1 {
      rows[i].qoq_pct = pct_change(rows[i - 1].revenue, rows[i].revenue);
    }
    if i >= 4 {
      rows[i].yoy_pct = pct_change(rows[i - 4].revenue, rows[i].revenue);
    }
  }

  if rows.len() > n_quarters {
    rows.drain(..rows.len() - n_quarters);
  }
  rows
}

fn pct_change(base: f64, value: f64) -> Option<f64> {
  if base == 0.0 {
    None
  } else {
    Some((value - base) / base * 100.0)
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
