//! Metric engine for Vera — pure functions over order records.
//!
//! Every operation is deterministic and side-effect free. Filtering composes
//! as logical AND: period bound, then category equality if set, then store
//! equality if set. Pure synchronous; no HTTP or filesystem dependencies.

pub mod drivers;
pub mod series;

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use strum::Display;
use vera_core::dataset::{FilterCtx, OrderRecord, Period};

pub use drivers::{
  Bridge, DriverBreakdown, DriverRow, MixRow, driver_breakdown, mix_table,
  price_volume_bridge,
};
pub use series::{QuarterRow, daily_revenue, quarterly_report, zscore_last_day};

// ─── Dimensions ──────────────────────────────────────────────────────────────

/// A groupable dimension of the order table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Dimension {
  Product,
  Category,
  Store,
}

impl Dimension {
  pub fn value<'a>(&self, record: &'a OrderRecord) -> &'a str {
    match self {
      Self::Product => &record.product,
      Self::Category => &record.category,
      Self::Store => &record.store,
    }
  }
}

// ─── Window selection ────────────────────────────────────────────────────────

fn matched<'a>(
  records: &'a [OrderRecord],
  period: Period,
  filter: &'a FilterCtx,
) -> impl Iterator<Item = &'a OrderRecord> + 'a {
  records
    .iter()
    .filter(move |r| period.contains(r.order_date) && filter.matches(r))
}

/// Materialize the period- and filter-bound slice of `records`.
///
/// Used where a whole slice is handed onward (driver breakdowns, bridges);
/// the scalar metrics below stream instead.
pub fn window(
  records: &[OrderRecord],
  period: Period,
  filter: &FilterCtx,
) -> Vec<OrderRecord> {
  matched(records, period, filter).cloned().collect()
}

// ─── Scalar metrics ──────────────────────────────────────────────────────────

/// Sum of revenue over records in `period` matching `filter`.
/// An empty match set sums to 0.0.
pub fn revenue(
  records: &[OrderRecord],
  period: &Period,
  filter: &FilterCtx,
) -> f64 {
  matched(records, *period, filter).map(|r| r.revenue).sum()
}

/// Count of distinct order identifiers in the matched subset. A single order
/// may span multiple line records.
pub fn order_count(
  records: &[OrderRecord],
  period: &Period,
  filter: &FilterCtx,
) -> usize {
  matched(records, *period, filter)
    .map(|r| r.order_id.as_str())
    .collect::<HashSet<_>>()
    .len()
}

/// `revenue / order_count`, or 0.0 when the window has no orders.
pub fn average_order_value(
  records: &[OrderRecord],
  period: &Period,
  filter: &FilterCtx,
) -> f64 {
  let orders = order_count(records, period, filter);
  if orders == 0 {
    0.0
  } else {
    revenue(records, period, filter) / orders as f64
  }
}

// ─── Segment ranking ─────────────────────────────────────────────────────────

/// Revenue and distinct-order totals for one dimension value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentStat {
  pub segment: String,
  pub revenue: f64,
  pub orders:  usize,
}

/// Top `n` values of `dimension` ranked by summed revenue descending, ties
/// broken by distinct-order count descending, then segment name for
/// determinism.
pub fn top_segments(
  records: &[OrderRecord],
  period: &Period,
  filter: &FilterCtx,
  dimension: Dimension,
  n: usize,
) -> Vec<SegmentStat> {
  let mut acc: HashMap<&str, (f64, HashSet<&str>)> = HashMap::new();
  for r in matched(records, *period, filter) {
    let entry = acc.entry(dimension.value(r)).or_default();
    entry.0 += r.revenue;
    entry.1.insert(r.order_id.as_str());
  }

  let mut stats: Vec<SegmentStat> = acc
    .into_iter()
    .map(|(segment, (revenue, ids))| SegmentStat {
      segment: segment.to_string(),
      revenue,
      orders: ids.len(),
    })
    .collect();

  stats.sort_by(|a, b| {
    b.revenue
      .total_cmp(&a.revenue)
      .then(b.orders.cmp(&a.orders))
      .then(a.segment.cmp(&b.segment))
  });
  stats.truncate(n);
  stats
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
pub(crate) mod test_fixtures {
  use chrono::NaiveDate;
  use vera_core::dataset::OrderRecord;

  pub(crate) fn d(s: &str) -> NaiveDate { s.parse().unwrap() }

  pub(crate) fn line(
    order_id: &str,
    date: &str,
    product: &str,
    category: &str,
    store: &str,
    quantity: u32,
    unit_price: f64,
  ) -> OrderRecord {
    OrderRecord {
      order_id: order_id.into(),
      order_date: d(date),
      product: product.into(),
      category: category.into(),
      store: store.into(),
      quantity,
      unit_price,
      revenue: quantity as f64 * unit_price,
    }
  }

  /// Three orders across two categories and two stores.
  pub(crate) fn small() -> Vec<OrderRecord> {
    vec![
      line("A", "2024-01-01", "X", "Cat", "East", 1, 10.0),
      line("B", "2024-01-02", "Y", "Cat", "West", 2, 5.0),
      line("C", "2024-01-02", "X", "Dog", "East", 1, 20.0),
    ]
  }
}

#[cfg(test)]
mod tests {
  use vera_core::dataset::{FilterCtx, Period};

  use super::{test_fixtures::*, *};

  fn whole_span() -> Period { Period::new(d("2024-01-01"), d("2024-01-03")) }

  #[test]
  fn worked_example_revenue_orders_aov() {
    let records = small();
    let f = FilterCtx::all();
    assert_eq!(revenue(&records, &whole_span(), &f), 40.0);
    assert_eq!(order_count(&records, &whole_span(), &f), 3);
    let aov = average_order_value(&records, &whole_span(), &f);
    assert!((aov - 13.33).abs() < 0.01);
  }

  #[test]
  fn revenue_equals_exact_sum_of_quantity_times_price() {
    let records = small();
    let expected: f64 = records
      .iter()
      .map(|r| r.quantity as f64 * r.unit_price)
      .sum();
    let got = revenue(&records, &whole_span(), &FilterCtx::all());
    assert!((got - expected).abs() < 1e-6);
  }

  #[test]
  fn aov_times_orders_recovers_revenue() {
    let records = small();
    let f = FilterCtx::all();
    let rev = revenue(&records, &whole_span(), &f);
    let orders = order_count(&records, &whole_span(), &f);
    let aov = average_order_value(&records, &whole_span(), &f);
    assert!((aov * orders as f64 - rev).abs() < 1e-6);
  }

  #[test]
  fn aov_is_zero_when_window_has_no_orders() {
    let records = small();
    let empty = Period::new(d("2025-01-01"), d("2025-01-31"));
    assert_eq!(average_order_value(&records, &empty, &FilterCtx::all()), 0.0);
    assert_eq!(revenue(&records, &empty, &FilterCtx::all()), 0.0);
  }

  #[test]
  fn period_bounds_are_inclusive() {
    let records = small();
    let f = FilterCtx::all();
    let first_day = Period::new(d("2024-01-01"), d("2024-01-01"));
    assert_eq!(revenue(&records, &first_day, &f), 10.0);
    let second_day = Period::new(d("2024-01-02"), d("2024-01-02"));
    assert_eq!(revenue(&records, &second_day, &f), 30.0);
  }

  #[test]
  fn filter_composition_commutes() {
    let records = small();
    let both = FilterCtx {
      category: Some("Cat".into()),
      store:    Some("East".into()),
    };
    // The same subset regardless of conceptual application order: one record
    // (order A) matches category=Cat AND store=East.
    assert_eq!(revenue(&records, &whole_span(), &both), 10.0);
    assert_eq!(order_count(&records, &whole_span(), &both), 1);

    let category_only = FilterCtx {
      category: Some("Cat".into()),
      store:    None,
    };
    let store_only = FilterCtx {
      category: None,
      store:    Some("East".into()),
    };
    let via_category: Vec<_> = window(&records, whole_span(), &category_only)
      .into_iter()
      .filter(|r| store_only.matches(r))
      .collect();
    let via_store: Vec<_> = window(&records, whole_span(), &store_only)
      .into_iter()
      .filter(|r| category_only.matches(r))
      .collect();
    assert_eq!(via_category, via_store);
  }

  #[test]
  fn distinct_orders_counted_once_across_lines() {
    let mut records = small();
    // A second line for order A on the same day.
    records.push(line("A", "2024-01-01", "Z", "Cat", "East", 3, 1.0));
    assert_eq!(order_count(&records, &whole_span(), &FilterCtx::all()), 3);
    assert_eq!(revenue(&records, &whole_span(), &FilterCtx::all()), 43.0);
  }

  #[test]
  fn top_segments_ranks_by_revenue_then_orders() {
    let records = vec![
      line("A", "2024-01-01", "X", "Cat", "East", 1, 40.0),
      line("B", "2024-01-01", "Y", "Cat", "East", 1, 15.0),
      line("C", "2024-01-01", "Y", "Cat", "East", 1, 15.0),
      // Z ties Y on revenue but with a single order.
      line("D", "2024-01-01", "Z", "Cat", "East", 1, 30.0),
    ];
    let top = top_segments(
      &records,
      &whole_span(),
      &FilterCtx::all(),
      Dimension::Product,
      3,
    );
    assert_eq!(top.len(), 3);
    assert_eq!(top[0].segment, "X");
    assert_eq!(top[0].revenue, 40.0);
    // Y and Z tie on revenue; Y's two orders rank it first.
    assert_eq!(top[1].segment, "Y");
    assert_eq!(top[1].orders, 2);
    assert_eq!(top[2].segment, "Z");
  }

  #[test]
  fn top_segments_empty_window_is_empty() {
    let records = small();
    let empty = Period::new(d("2030-01-01"), d("2030-01-02"));
    assert!(
      top_segments(
        &records,
        &empty,
        &FilterCtx::all(),
        Dimension::Product,
        5
      )
      .is_empty()
    );
  }
}
