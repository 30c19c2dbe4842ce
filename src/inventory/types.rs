//! Item record and its enumerations.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Where an item is kept.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum StorageMethod {
  Fridge,
  Freezer,
  Pantry,
}

impl StorageMethod {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Fridge => "fridge",
      Self::Freezer => "freezer",
      Self::Pantry => "pantry",
    }
  }

  /// Korean display label.
  pub fn label(&self) -> &'static str {
    match self {
      Self::Fridge => "냉장",
      Self::Freezer => "냉동",
      Self::Pantry => "실온",
    }
  }
}

impl fmt::Display for StorageMethod {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for StorageMethod {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "fridge" => Ok(Self::Fridge),
      "freezer" => Ok(Self::Freezer),
      "pantry" => Ok(Self::Pantry),
      other => Err(format!("unknown storage method: {}", other)),
    }
  }
}

/// Inventory lifecycle of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
  Active,
  Consumed,
  Discarded,
}

impl ItemStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Active => "active",
      Self::Consumed => "consumed",
      Self::Discarded => "discarded",
    }
  }
}

impl fmt::Display for ItemStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for ItemStatus {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "active" => Ok(Self::Active),
      "consumed" => Ok(Self::Consumed),
      "discarded" => Ok(Self::Discarded),
      other => Err(format!("unknown item status: {}", other)),
    }
  }
}

/// One tracked inventory item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
  pub id: String,
  pub created_at: DateTime<Utc>,
  pub name: String,
  pub category: Option<String>,
  pub storage_method: StorageMethod,
  pub status: ItemStatus,
  pub purchase_date: NaiveDate,
  pub expiry_date: NaiveDate,
  /// Whether the expiry date was estimated rather than observed.
  pub is_estimated: bool,
  pub quantity: i64,
  pub image_url: Option<String>,
  pub memo: Option<String>,
}

/// Insert payload; id and created_at are assigned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewItem {
  pub name: String,
  pub category: Option<String>,
  pub storage_method: StorageMethod,
  pub purchase_date: NaiveDate,
  pub expiry_date: NaiveDate,
  pub is_estimated: bool,
  pub quantity: i64,
  pub image_url: Option<String>,
  pub memo: Option<String>,
}

/// Partial update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemPatch {
  pub name: Option<String>,
  pub category: Option<String>,
  pub storage_method: Option<StorageMethod>,
  pub status: Option<ItemStatus>,
  pub expiry_date: Option<NaiveDate>,
  pub is_estimated: Option<bool>,
  pub quantity: Option<i64>,
  pub memo: Option<String>,
}

impl ItemPatch {
  pub fn apply(&self, item: &mut Item) {
    if let Some(name) = &self.name {
      item.name = name.clone();
    }
    if let Some(category) = &self.category {
      item.category = Some(category.clone());
    }
    if let Some(storage_method) = self.storage_method {
      item.storage_method = storage_method;
    }
    if let Some(status) = self.status {
      item.status = status;
    }
    if let Some(expiry_date) = self.expiry_date {
      item.expiry_date = expiry_date;
    }
    if let Some(is_estimated) = self.is_estimated {
      item.is_estimated = is_estimated;
    }
    if let Some(quantity) = self.quantity {
      item.quantity = quantity;
    }
    if let Some(memo) = &self.memo {
      item.memo = Some(memo.clone());
    }
  }
}
