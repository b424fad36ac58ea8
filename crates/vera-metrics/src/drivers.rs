//! Driver and mix breakdowns — which segments move the headline numbers.
//!
//! These operate on already-windowed record slices (see [`crate::window`]);
//! the caller decides the periods and filter. Segment names in the outputs
//! are the canonical field every consumer renders from.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;
use vera_core::dataset::OrderRecord;

use crate::Dimension;

// ─── Driver breakdown ────────────────────────────────────────────────────────

/// One segment's current and previous revenue and the delta between them.
/// A segment absent on one side has zero revenue there.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriverRow {
  pub segment:      String,
  pub revenue_cur:  f64,
  pub revenue_prev: f64,
  pub delta:        f64,
}

/// Top segments by current revenue and, when previous-period records were
/// supplied, by revenue delta descending.
#[derive(Debug, Clone, Serialize)]
pub struct DriverBreakdown {
  pub dimension:   Dimension,
  pub top_current: Vec<DriverRow>,
  /// Sorted by delta descending; empty when no previous slice was given.
  pub top_movers:  Vec<DriverRow>,
}

const TOP_DRIVERS: usize = 5;

fn revenue_by_segment(
  records: &[OrderRecord],
  dimension: Dimension,
) -> BTreeMap<String, f64> {
  let mut out = BTreeMap::new();
  for r in records {
    *out.entry(dimension.value(r).to_string()).or_insert(0.0) += r.revenue;
  }
  out
}

/// Break current (and optionally previous) revenue down by `dimension`.
pub fn driver_breakdown(
  current: &[OrderRecord],
  previous: Option<&[OrderRecord]>,
  dimension: Dimension,
) -> DriverBreakdown {
  let cur = revenue_by_segment(current, dimension);
  let prev = previous
    .map(|p| revenue_by_segment(p, dimension))
    .unwrap_or_default();

  let segments: HashSet<&String> = cur.keys().chain(prev.keys()).collect();
  let mut rows: Vec<DriverRow> = segments
    .into_iter()
    .map(|segment| {
      let revenue_cur = cur.get(segment).copied().unwrap_or(0.0);
      let revenue_prev = prev.get(segment).copied().unwrap_or(0.0);
      DriverRow {
        segment: segment.clone(),
        revenue_cur,
        revenue_prev,
        delta: revenue_cur - revenue_prev,
      }
    })
    .collect();

  let mut top_current = rows.clone();
  top_current.sort_by(|a, b| {
    b.revenue_cur
      .total_cmp(&a.revenue_cur)
      .then(a.segment.cmp(&b.segment))
  });
  top_current.truncate(TOP_DRIVERS);

  let top_movers = if previous.is_some() {
    rows.sort_by(|a, b| {
      b.delta.total_cmp(&a.delta).then(a.segment.cmp(&b.segment))
    });
    rows.truncate(TOP_DRIVERS);
    rows
  } else {
    Vec::new()
  };

  DriverBreakdown {
    dimension,
    top_current,
    top_movers,
  }
}

// ─── Mix table ───────────────────────────────────────────────────────────────

/// Revenue share of one segment in the current window against the previous.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MixRow {
  pub segment:     String,
  pub revenue_cur: f64,
  pub share_cur:   f64,
  pub share_prev:  f64,
  pub delta_share: f64,
}

/// Share-of-revenue mix per segment, sorted by absolute share change
/// descending then current revenue descending, truncated to `top_n`.
///
/// Segments present on either side are listed (outer join); a zero total on
/// one side is treated as 1.0 so shares stay finite.
pub fn mix_table(
  current: &[OrderRecord],
  previous: Option<&[OrderRecord]>,
  dimension: Dimension,
  top_n: usize,
) -> Vec<MixRow> {
  if current.is_empty() {
    return Vec::new();
  }

  let cur = revenue_by_segment(current, dimension);
  let total_cur: f64 = cur.values().sum();
  let total_cur = if total_cur == 0.0 { 1.0 } else { total_cur };

  let prev = previous
    .filter(|p| !p.is_empty())
    .map(|p| revenue_by_segment(p, dimension));
  let total_prev = prev
    .as_ref()
    .map(|p| {
      let t: f64 = p.values().sum();
      if t == 0.0 { 1.0 } else { t }
    })
    .unwrap_or(1.0);

  let empty = BTreeMap::new();
  let prev_map = prev.as_ref().unwrap_or(&empty);

  let segments: HashSet<&String> = cur.keys().chain(prev_map.keys()).collect();
  let mut rows: Vec<MixRow> = segments
    .into_iter()
    .map(|segment| {
      let revenue_cur = cur.get(segment).copied().unwrap_or(0.0);
      let share_cur = revenue_cur / total_cur;
      let share_prev =
        prev_map.get(segment).copied().unwrap_or(0.0) / total_prev;
      MixRow {
        segment: segment.clone(),
        revenue_cur,
        share_cur,
        share_prev,
        delta_share: share_cur - share_prev,
      }
    })
    .collect();

  rows.sort_by(|a, b| {
    b.delta_share
      .abs()
      .total_cmp(&a.delta_share.abs())
      .then(b.revenue_cur.total_cmp(&a.revenue_cur))
      .then(a.segment.cmp(&b.segment))
  });
  rows.truncate(top_n);
  rows
}

// ─── Price/volume bridge ─────────────────────────────────────────────────────

/// Decomposition of a revenue delta into volume, price, and interaction
/// effects: `delta = volume_effect + price_effect + interaction`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bridge {
  pub previous_revenue: f64,
  pub volume_effect:    f64,
  pub price_effect:     f64,
  pub interaction:      f64,
  pub current_revenue:  f64,
  pub delta_revenue:    f64,
}

/// Build the price/volume bridge between two windows. `None` when either
/// slice is empty — there is no meaningful decomposition.
pub fn price_volume_bridge(
  current: &[OrderRecord],
  previous: Option<&[OrderRecord]>,
) -> Option<Bridge> {
  let previous = previous?;
  if current.is_empty() || previous.is_empty() {
    return None;
  }

  let cur_qty: f64 = current.iter().map(|r| r.quantity as f64).sum();
  let prev_qty: f64 = previous.iter().map(|r| r.quantity as f64).sum();
  let cur_rev: f64 = current.iter().map(|r| r.revenue).sum();
  let prev_rev: f64 = previous.iter().map(|r| r.revenue).sum();

  let cur_price = if cur_qty > 0.0 { cur_rev / cur_qty } else { 0.0 };
  let prev_price = if prev_qty > 0.0 { prev_rev / prev_qty } else { 0.0 };

  Some(Bridge {
    previous_revenue: prev_rev,
    volume_effect:    (cur_qty - prev_qty) * prev_price,
    price_effect:     (cur_price - prev_price) * prev_qty,
    interaction:      (cur_qty - prev_qty) * (cur_price - prev_price),
    current_revenue:  cur_rev,
    delta_revenue:    cur_rev - prev_rev,
  })
}

// ─── Tests ───────────────────────────────────────────────────────────────────
