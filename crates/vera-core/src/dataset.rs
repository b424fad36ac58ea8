//! Order records and the window/filter vocabulary shared by every metric.
//!
//! A record is immutable once loaded. The dataset is an append-only in-memory
//! table for the duration of a session; every downstream computation treats it
//! as read-only, so it can be shared freely across render passes.

use std::collections::BTreeSet;

use chrono::{Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

// ─── Order records ───────────────────────────────────────────────────────────

/// One transaction line. `revenue` is derived at load time as
/// `quantity × unit_price` and never recomputed afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
  pub order_id:   String,
  pub order_date: NaiveDate,
  pub product:    String,
  pub category:   String,
  pub store:      String,
  pub quantity:   u32,
  pub unit_price: f64,
  pub revenue:    f64,
}

/// The session dataset. Loaded once, read-only thereafter.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
  records: Vec<OrderRecord>,
}

impl Dataset {
  pub fn new(records: Vec<OrderRecord>) -> Self { Self { records } }

  pub fn records(&self) -> &[OrderRecord] { &self.records }

  pub fn len(&self) -> usize { self.records.len() }

  pub fn is_empty(&self) -> bool { self.records.is_empty() }

  /// Earliest and latest order dates, or `None` for an empty dataset.
  pub fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
    let min = self.records.iter().map(|r| r.order_date).min()?;
    let max = self.records.iter().map(|r| r.order_date).max()?;
    Some((min, max))
  }

  /// Distinct category values, sorted.
  pub fn categories(&self) -> Vec<String> {
    self
      .records
      .iter()
      .map(|r| r.category.clone())
      .collect::<BTreeSet<_>>()
      .into_iter()
      .collect()
  }

  /// Distinct store values, sorted.
  pub fn stores(&self) -> Vec<String> {
    self
      .records
      .iter()
      .map(|r| r.store.clone())
      .collect::<BTreeSet<_>>()
      .into_iter()
      .collect()
  }
}

// ─── Filter context ──────────────────────────────────────────────────────────

/// Optional category/store constraint; `None` means match-all.
///
/// Every metric computation applies the same filter, so verification always
/// recomputes under the filter a claim was generated under.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCtx {
  #[serde(default)]
  pub category: Option<String>,
  #[serde(default)]
  pub store:    Option<String>,
}

impl FilterCtx {
  pub fn all() -> Self { Self::default() }

  pub fn matches(&self, record: &OrderRecord) -> bool {
    self
      .category
      .as_deref()
      .is_none_or(|c| record.category == c)
      && self.store.as_deref().is_none_or(|s| record.store == s)
  }
}

// ─── Period ──────────────────────────────────────────────────────────────────

/// A closed date interval `[start, end]`, both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
  pub start: NaiveDate,
  pub end:   NaiveDate,
}

impl Period {
  pub fn new(start: NaiveDate, end: NaiveDate) -> Self { Self { start, end } }

  pub fn contains(&self, date: NaiveDate) -> bool {
    self.start <= date && date <= self.end
  }

  /// Number of days covered, counting both ends. A period whose end precedes
  /// its start covers zero days.
  pub fn len_days(&self) -> i64 {
    ((self.end - self.start).num_days() + 1).max(0)
  }

  /// The immediately preceding interval of identical length, ending the day
  /// before `start`.
  pub fn previous_contiguous(&self) -> Period {
    Period {
      start: self.start - Days::new(self.len_days() as u64),
      end:   self.start - Days::new(1),
    }
  }

  /// The same calendar dates one year earlier. Feb 29 clamps to Feb 28.
  pub fn previous_year(&self) -> Period {
    Period {
      start: self.start - Months::new(12),
      end:   self.end - Months::new(12),
    }
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
