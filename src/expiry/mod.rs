//! Expiry estimation engine.
//!
//! Deterministic shelf-life computation so items always carry a usable
//! expiry date even when none was observed. Both operations are pure and
//! total: every input combination, including unknown categories and
//! unmapped transitions, has a defined result and neither can fail.

mod tables;

pub use tables::{ExpiryTable, ShelfLife, TransitionTable, FALLBACK_CATEGORY, FALLBACK_DAYS};

use chrono::{Duration, NaiveDate};

use crate::inventory::StorageMethod;

/// Default shelf life in days for a category kept under a storage method.
///
/// Unknown categories use the fallback category's row; a row with no value
/// for the method yields [`FALLBACK_DAYS`]. Table values are authored
/// integers and are returned as-is.
pub fn default_shelf_life_days(
  table: &ExpiryTable,
  category: &str,
  method: StorageMethod,
) -> u32 {
  table
    .row(category)
    .or_else(|| table.row(FALLBACK_CATEGORY))
    .and_then(|row| row.days_for(method))
    .unwrap_or(FALLBACK_DAYS)
}

/// Rescale an expiry date when an item moves between storage methods.
///
/// The remaining duration is measured from `today`, clamped at zero before
/// the multiplier is applied, and rounded once after multiplication. An
/// identity move or an unmapped ordered pair returns the date unchanged;
/// the caller persists the result.
pub fn rescale_expiry_on_storage_change(
  table: &TransitionTable,
  current_expiry: NaiveDate,
  from: StorageMethod,
  to: StorageMethod,
  today: NaiveDate,
) -> NaiveDate {
  if from == to {
    return current_expiry;
  }

  let Some(multiplier) = table.multiplier(from, to) else {
    return current_expiry;
  };

  let remaining_days = (current_expiry - today).num_days().max(0);
  let new_remaining_days = (remaining_days as f64 * multiplier).round() as i64;

  today + Duration::days(new_remaining_days)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  #[test]
  fn test_known_category_and_method() {
    let table = ExpiryTable::default();
    assert_eq!(
      default_shelf_life_days(&table, "유제품", StorageMethod::Fridge),
      7
    );
    assert_eq!(
      default_shelf_life_days(&table, "육류", StorageMethod::Freezer),
      90
    );
    assert_eq!(
      default_shelf_life_days(&table, "화장품", StorageMethod::Pantry),
      365
    );
  }

  #[test]
  fn test_unknown_category_uses_fallback_row() {
    let table = ExpiryTable::default();
    assert_eq!(
      default_shelf_life_days(&table, "unknown-category", StorageMethod::Pantry),
      14
    );
    assert_eq!(
      default_shelf_life_days(&table, "unknown-category", StorageMethod::Freezer),
      30
    );
  }

  #[test]
  fn test_null_cell_falls_back_to_seven_days() {
    let table = ExpiryTable::default();
    // 유제품 has no authored pantry value.
    assert_eq!(
      default_shelf_life_days(&table, "유제품", StorageMethod::Pantry),
      7
    );
  }

  #[test]
  fn test_lookup_is_total_even_for_empty_tables() {
    let table = ExpiryTable::new(Vec::new());
    assert_eq!(
      default_shelf_life_days(&table, "유제품", StorageMethod::Fridge),
      FALLBACK_DAYS
    );
  }

  #[test]
  fn test_alternate_table_is_honored() {
    let table = ExpiryTable::new([(
      "시험".to_string(),
      ShelfLife::new(Some(1), Some(2), Some(3)),
    )]);
    assert_eq!(
      default_shelf_life_days(&table, "시험", StorageMethod::Pantry),
      3
    );
  }

  #[test]
  fn test_identity_transition_returns_date_unchanged() {
    let table = TransitionTable::default();
    let expiry = date(2024, 3, 15);
    assert_eq!(
      rescale_expiry_on_storage_change(
        &table,
        expiry,
        StorageMethod::Fridge,
        StorageMethod::Fridge,
        date(2024, 1, 1)
      ),
      expiry
    );
  }

  #[test]
  fn test_unmapped_transition_is_a_no_op() {
    let table = TransitionTable::new(Vec::new());
    let expiry = date(2024, 3, 15);
    assert_eq!(
      rescale_expiry_on_storage_change(
        &table,
        expiry,
        StorageMethod::Fridge,
        StorageMethod::Freezer,
        date(2024, 1, 1)
      ),
      expiry
    );
  }

  #[test]
  fn test_fridge_to_freezer_triples_remaining_days() {
    let table = TransitionTable::default();
    let result = rescale_expiry_on_storage_change(
      &table,
      date(2024, 1, 11),
      StorageMethod::Fridge,
      StorageMethod::Freezer,
      date(2024, 1, 1),
    );
    // 10 remaining days * 3 = 30 days from today.
    assert_eq!(result, date(2024, 1, 31));
  }

  #[test]
  fn test_freezer_to_fridge_shrinks_remaining_days() {
    let table = TransitionTable::default();
    let result = rescale_expiry_on_storage_change(
      &table,
      date(2024, 1, 31),
      StorageMethod::Freezer,
      StorageMethod::Fridge,
      date(2024, 1, 1),
    );
    // round(30 * 0.3) = 9 days from today.
    assert_eq!(result, date(2024, 1, 10));
  }

  #[test]
  fn test_transition_pairs_are_not_reciprocal() {
    let table = TransitionTable::default();
    let forward = table
      .multiplier(StorageMethod::Fridge, StorageMethod::Freezer)
      .unwrap();
    let backward = table
      .multiplier(StorageMethod::Freezer, StorageMethod::Fridge)
      .unwrap();
    // Authored constants: 3 and 0.3, not exact inverses.
    assert_ne!(forward * backward, 1.0);
  }

  #[test]
  fn test_expired_items_clamp_to_today_before_multiplying() {
    let table = TransitionTable::default();
    let today = date(2024, 1, 10);
    let result = rescale_expiry_on_storage_change(
      &table,
      date(2024, 1, 1),
      StorageMethod::Fridge,
      StorageMethod::Freezer,
      today,
    );
    assert_eq!(result, today);
  }

  #[test]
  fn test_rounding_happens_once_after_multiplication() {
    let table = TransitionTable::default();
    // 5 remaining days * 0.3 = 1.5, rounds half away from zero to 2.
    let result = rescale_expiry_on_storage_change(
      &table,
      date(2024, 1, 6),
      StorageMethod::Freezer,
      StorageMethod::Fridge,
      date(2024, 1, 1),
    );
    assert_eq!(result, date(2024, 1, 3));
  }
}
