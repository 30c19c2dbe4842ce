//! Authored shelf-life and storage-transition tables.
//!
//! Pure configuration data. The engine takes these as values so tests can
//! substitute alternate tables; `Default` builds the reference ones.

use std::collections::BTreeMap;

use crate::inventory::StorageMethod;

/// Category row used when a lookup misses.
pub const FALLBACK_CATEGORY: &str = "기타";

/// Day count used when a category row has no value for a storage method.
pub const FALLBACK_DAYS: u32 = 7;

/// Authored day counts for one category, per storage method. `None` means
/// the combination has no authored value and falls back to
/// [`FALLBACK_DAYS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShelfLife {
  pub fridge: Option<u32>,
  pub freezer: Option<u32>,
  pub pantry: Option<u32>,
}

impl ShelfLife {
  pub const fn new(fridge: Option<u32>, freezer: Option<u32>, pantry: Option<u32>) -> Self {
    Self {
      fridge,
      freezer,
      pantry,
    }
  }

  pub fn days_for(&self, method: StorageMethod) -> Option<u32> {
    match method {
      StorageMethod::Fridge => self.fridge,
      StorageMethod::Freezer => self.freezer,
      StorageMethod::Pantry => self.pantry,
    }
  }
}

/// Reference per-category shelf lives, in days.
const CATEGORY_SHELF_LIVES: &[(&str, ShelfLife)] = &[
  ("유제품", ShelfLife::new(Some(7), Some(30), None)),
  ("육류", ShelfLife::new(Some(3), Some(90), None)),
  ("해산물", ShelfLife::new(Some(2), Some(90), None)),
  ("채소", ShelfLife::new(Some(7), Some(30), Some(3))),
  ("과일", ShelfLife::new(Some(7), Some(30), Some(5))),
  ("가공식품", ShelfLife::new(Some(30), Some(180), Some(90))),
  ("음료", ShelfLife::new(Some(14), None, Some(30))),
  ("조미료", ShelfLife::new(Some(90), None, Some(180))),
  ("빵/베이커리", ShelfLife::new(Some(7), Some(30), Some(3))),
  ("달걀", ShelfLife::new(Some(21), Some(120), None)),
  ("두부/콩류", ShelfLife::new(Some(5), Some(60), None)),
  ("김치/발효식품", ShelfLife::new(Some(30), Some(90), None)),
  ("간편식/냉동식품", ShelfLife::new(Some(3), Some(180), None)),
  ("과자/스낵", ShelfLife::new(None, None, Some(60))),
  ("화장품", ShelfLife::new(None, None, Some(365))),
  (FALLBACK_CATEGORY, ShelfLife::new(Some(7), Some(30), Some(14))),
];

/// Category → shelf-life lookup table.
#[derive(Debug, Clone)]
pub struct ExpiryTable {
  rows: BTreeMap<String, ShelfLife>,
}

impl ExpiryTable {
  pub fn new(rows: impl IntoIterator<Item = (String, ShelfLife)>) -> Self {
    Self {
      rows: rows.into_iter().collect(),
    }
  }

  pub fn row(&self, category: &str) -> Option<&ShelfLife> {
    self.rows.get(category)
  }

  /// Category names known to the table.
  pub fn categories(&self) -> impl Iterator<Item = &str> {
    self.rows.keys().map(String::as_str)
  }
}

impl Default for ExpiryTable {
  fn default() -> Self {
    Self::new(
      CATEGORY_SHELF_LIVES
        .iter()
        .map(|(name, row)| (name.to_string(), *row)),
    )
  }
}

/// Reference multipliers for ordered storage transitions.
///
/// Ordered pairs are authored independently and are not reciprocal
/// (fridge to freezer is 3 while freezer to fridge is 0.3).
const STORAGE_TRANSITIONS: &[(StorageMethod, StorageMethod, f64)] = &[
  (StorageMethod::Fridge, StorageMethod::Freezer, 3.0),
  (StorageMethod::Pantry, StorageMethod::Fridge, 2.0),
  (StorageMethod::Pantry, StorageMethod::Freezer, 6.0),
  (StorageMethod::Freezer, StorageMethod::Fridge, 0.3),
  (StorageMethod::Freezer, StorageMethod::Pantry, 0.1),
  (StorageMethod::Fridge, StorageMethod::Pantry, 0.5),
];

/// Ordered (from, to) → multiplier lookup table.
#[derive(Debug, Clone)]
pub struct TransitionTable {
  multipliers: BTreeMap<(StorageMethod, StorageMethod), f64>,
}

impl TransitionTable {
  pub fn new(entries: impl IntoIterator<Item = (StorageMethod, StorageMethod, f64)>) -> Self {
    Self {
      multipliers: entries
        .into_iter()
        .map(|(from, to, multiplier)| ((from, to), multiplier))
        .collect(),
    }
  }

  /// Multiplier for the ordered pair, if authored.
  pub fn multiplier(&self, from: StorageMethod, to: StorageMethod) -> Option<f64> {
    self.multipliers.get(&(from, to)).copied()
  }
}

impl Default for TransitionTable {
  fn default() -> Self {
    Self::new(STORAGE_TRANSITIONS.iter().copied())
  }
}
