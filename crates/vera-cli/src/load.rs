//! CSV dataset loading and cleaning.
//!
//! The pipeline expects the canonical column set (`order_id, order_date,
//! product, category, store, quantity, unit_price`). This loader parses and
//! coerces each row, derives revenue, and drops rows that cannot participate
//! in metric computation. Interactive column mapping for other layouts is a
//! front-end concern, not handled here.

use std::path::Path;

use anyhow::Context as _;
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::warn;
use vera_core::dataset::{Dataset, OrderRecord};

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

#[derive(Debug, Deserialize)]
struct RawRow {
  order_id:   String,
  order_date: String,
  product:    String,
  #[serde(default)]
  category:   Option<String>,
  #[serde(default)]
  store:      Option<String>,
  quantity:   f64,
  unit_price: f64,
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
  DATE_FORMATS
    .iter()
    .find_map(|fmt| NaiveDate::parse_from_str(raw.trim(), fmt).ok())
}

/// Coerce one raw row, or reject it.
///
/// Rows with unparseable dates, non-positive or fractional quantities, or
/// non-positive prices are dropped. A missing store becomes `"All"`; a
/// missing category falls back to the product's first word.
fn clean(raw: RawRow) -> Option<OrderRecord> {
  if raw.order_id.trim().is_empty() || raw.product.trim().is_empty() {
    return None;
  }
  let order_date = parse_date(&raw.order_date)?;
  if raw.quantity <= 0.0
    || raw.quantity.fract() != 0.0
    || raw.unit_price <= 0.0
  {
    return None;
  }
  let quantity = raw.quantity as u32;

  let store = raw
    .store
    .filter(|s| !s.trim().is_empty())
    .unwrap_or_else(|| "All".to_string());
  let category = raw
    .category
    .filter(|c| !c.trim().is_empty())
    .unwrap_or_else(|| {
      raw
        .product
        .split_whitespace()
        .next()
        .unwrap_or("General")
        .to_string()
    });

  Some(OrderRecord {
    order_id: raw.order_id,
    order_date,
    product: raw.product,
    category,
    store,
    quantity,
    unit_price: raw.unit_price,
    revenue: quantity as f64 * raw.unit_price,
  })
}

/// Load and clean an orders CSV into a session [`Dataset`], sorted by date.
pub fn load_csv(path: &Path) -> anyhow::Result<Dataset> {
  let mut reader = csv::ReaderBuilder::new()
    .trim(csv::Trim::All)
    .from_path(path)
    .with_context(|| format!("opening {}", path.display()))?;

  let mut records = Vec::new();
  let mut dropped = 0usize;
  for row in reader.deserialize::<RawRow>() {
    match row.ok().and_then(clean) {
      Some(record) => records.push(record),
      None => dropped += 1,
    }
  }
  if dropped > 0 {
    warn!(dropped, path = %path.display(), "dropped unusable rows");
  }

  records.sort_by(|a, b| a.order_date.cmp(&b.order_date));
  Ok(Dataset::new(records))
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use std::fs;

  use super::*;

  fn write_csv(content: &str) -> std::path::PathBuf {
    let path = std::env::temp_dir()
      .join(format!("vera-load-{}.csv", uuid::Uuid::new_v4()));
    fs::write(&path, content).unwrap();
    path
  }

  #[test]
  fn loads_canonical_rows_sorted_by_date() {
    let path = write_csv(
      "order_id,order_date,product,category,store,quantity,unit_price\n\
       O2,2024-01-05,Keyboard,Peripherals,East,2,25.0\n\
       O1,2024-01-02,Earbuds,Audio,West,1,49.99\n",
    );
    let ds = load_csv(&path).unwrap();
    fs::remove_file(&path).unwrap();

    assert_eq!(ds.len(), 2);
    let records = ds.records();
    assert_eq!(records[0].order_id, "O1");
    assert_eq!(records[0].revenue, 49.99);
    assert_eq!(records[1].revenue, 50.0);
  }

  #[test]
  fn drops_rows_that_cannot_participate() {
    let path = write_csv(
      "order_id,order_date,product,category,store,quantity,unit_price\n\
       O1,2024-01-02,Earbuds,Audio,West,1,49.99\n\
       O2,not-a-date,Earbuds,Audio,West,1,49.99\n\
       O3,2024-01-03,Earbuds,Audio,West,0,49.99\n\
       O4,2024-01-03,Earbuds,Audio,West,1.5,49.99\n\
       O5,2024-01-03,Earbuds,Audio,West,2,-1.0\n\
       ,2024-01-03,Earbuds,Audio,West,1,49.99\n",
    );
    let ds = load_csv(&path).unwrap();
    fs::remove_file(&path).unwrap();

    assert_eq!(ds.len(), 1);
    assert_eq!(ds.records()[0].order_id, "O1");
  }

  #[test]
  fn defaults_missing_store_and_category() {
    let path = write_csv(
      "order_id,order_date,product,category,store,quantity,unit_price\n\
       O1,2024-01-02,Laptop Stand,,,1,29.99\n",
    );
    let ds = load_csv(&path).unwrap();
    fs::remove_file(&path).unwrap();

    let record = &ds.records()[0];
    assert_eq!(record.store, "All");
    assert_eq!(record.category, "Laptop");
  }

  #[test]
  fn accepts_slash_date_formats() {
    let path = write_csv(
      "order_id,order_date,product,category,store,quantity,unit_price\n\
       O1,2024/01/02,Earbuds,Audio,West,1,10.0\n\
       O2,01/03/2024,Earbuds,Audio,West,1,10.0\n",
    );
    let ds = load_csv(&path).unwrap();
    fs::remove_file(&path).unwrap();

    assert_eq!(ds.len(), 2);
    assert_eq!(
      ds.date_bounds().unwrap(),
      ("2024-01-02".parse().unwrap(), "2024-01-03".parse().unwrap())
    );
  }
}
