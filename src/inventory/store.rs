//! SQLite persistence for inventory items.

use std::sync::Mutex;

use chrono::{DateTime, NaiveDate, Utc};
use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, Connection};
use uuid::Uuid;

use super::types::{Item, ItemPatch, ItemStatus, NewItem, StorageMethod};

/// Schema for the items table.
const ITEMS_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS items (
    id TEXT PRIMARY KEY,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    name TEXT NOT NULL,
    category TEXT,
    storage_method TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'active',
    purchase_date TEXT NOT NULL,
    expiry_date TEXT NOT NULL,
    is_estimated INTEGER NOT NULL DEFAULT 0,
    quantity INTEGER NOT NULL DEFAULT 1,
    image_url TEXT,
    memo TEXT
);

CREATE INDEX IF NOT EXISTS idx_items_status ON items(status);
"#;

const ITEM_COLUMNS: &str =
  "id, created_at, name, category, storage_method, status, purchase_date, expiry_date, \
   is_estimated, quantity, image_url, memo";

/// Inventory store backed by a `rusqlite` connection.
pub struct ItemStore {
  conn: Mutex<Connection>,
}

impl ItemStore {
  /// Open or create the inventory database at the default location.
  pub fn open() -> Result<Self> {
    let path = Self::default_path()?;

    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create data directory: {}", e))?;
    }

    let conn = Connection::open(&path)
      .map_err(|e| eyre!("Failed to open inventory at {}: {}", path.display(), e))?;
    Self::from_connection(conn)
  }

  /// Open an in-memory inventory store.
  pub fn open_in_memory() -> Result<Self> {
    let conn = Connection::open_in_memory()
      .map_err(|e| eyre!("Failed to open in-memory inventory: {}", e))?;
    Self::from_connection(conn)
  }

  fn from_connection(conn: Connection) -> Result<Self> {
    conn
      .execute_batch(ITEMS_SCHEMA)
      .map_err(|e| eyre!("Failed to run inventory migrations: {}", e))?;

    Ok(Self {
      conn: Mutex::new(conn),
    })
  }

  fn default_path() -> Result<std::path::PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(data_dir.join("ecofridge").join("inventory.db"))
  }

  /// Insert a new item and return the stored row.
  pub fn insert(&self, new: &NewItem) -> Result<Item> {
    let id = Uuid::new_v4().to_string();

    {
      let conn = self
        .conn
        .lock()
        .map_err(|e| eyre!("Lock poisoned: {}", e))?;

      conn
        .execute(
          "INSERT INTO items (id, name, category, storage_method, status, purchase_date, \
           expiry_date, is_estimated, quantity, image_url, memo)
           VALUES (?, ?, ?, ?, 'active', ?, ?, ?, ?, ?, ?)",
          params![
            id,
            new.name,
            new.category,
            new.storage_method.as_str(),
            format_date(new.purchase_date),
            format_date(new.expiry_date),
            new.is_estimated,
            new.quantity,
            new.image_url,
            new.memo,
          ],
        )
        .map_err(|e| eyre!("Failed to insert item {}: {}", new.name, e))?;
    }

    self
      .get(&id)?
      .ok_or_else(|| eyre!("Inserted item {} not found", id))
  }

  /// Fetch a single item by id.
  pub fn get(&self, id: &str) -> Result<Option<Item>> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let mut stmt = conn
      .prepare(&format!("SELECT {} FROM items WHERE id = ?", ITEM_COLUMNS))
      .map_err(|e| eyre!("Failed to prepare item query: {}", e))?;

    let raw: Option<RawItem> = stmt.query_row(params![id], RawItem::from_row).ok();
    raw.map(raw_to_item).transpose()
  }

  /// List items, optionally filtered by status, soonest expiry first.
  pub fn list(&self, status: Option<ItemStatus>) -> Result<Vec<Item>> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let (sql, filter) = match status {
      Some(status) => (
        format!(
          "SELECT {} FROM items WHERE status = ? ORDER BY expiry_date ASC",
          ITEM_COLUMNS
        ),
        Some(status.as_str()),
      ),
      None => (
        format!("SELECT {} FROM items ORDER BY expiry_date ASC", ITEM_COLUMNS),
        None,
      ),
    };

    let mut stmt = conn
      .prepare(&sql)
      .map_err(|e| eyre!("Failed to prepare item list query: {}", e))?;

    let raws: Vec<RawItem> = match filter {
      Some(status) => stmt
        .query_map(params![status], RawItem::from_row)
        .map_err(|e| eyre!("Failed to list items: {}", e))?
        .collect::<std::result::Result<_, _>>(),
      None => stmt
        .query_map([], RawItem::from_row)
        .map_err(|e| eyre!("Failed to list items: {}", e))?
        .collect::<std::result::Result<_, _>>(),
    }
    .map_err(|e| eyre!("Failed to read item row: {}", e))?;

    raws.into_iter().map(raw_to_item).collect()
  }

  /// Apply a partial update and return the new row.
  pub fn update(&self, id: &str, patch: &ItemPatch) -> Result<Item> {
    let mut item = self
      .get(id)?
      .ok_or_else(|| eyre!("Item {} not found", id))?;
    patch.apply(&mut item);

    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute(
        "UPDATE items SET name = ?, category = ?, storage_method = ?, status = ?, \
         purchase_date = ?, expiry_date = ?, is_estimated = ?, quantity = ?, memo = ?
         WHERE id = ?",
        params![
          item.name,
          item.category,
          item.storage_method.as_str(),
          item.status.as_str(),
          format_date(item.purchase_date),
          format_date(item.expiry_date),
          item.is_estimated,
          item.quantity,
          item.memo,
          id,
        ],
      )
      .map_err(|e| eyre!("Failed to update item {}: {}", id, e))?;

    Ok(item)
  }

  /// Remove an item.
  pub fn delete(&self, id: &str) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute("DELETE FROM items WHERE id = ?", params![id])
      .map_err(|e| eyre!("Failed to delete item {}: {}", id, e))?;

    Ok(())
  }
}

/// Row as read from SQLite, before enum/date parsing.
struct RawItem {
  id: String,
  created_at: String,
  name: String,
  category: Option<String>,
  storage_method: String,
  status: String,
  purchase_date: String,
  expiry_date: String,
  is_estimated: bool,
  quantity: i64,
  image_url: Option<String>,
  memo: Option<String>,
}

impl RawItem {
  fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id: row.get(0)?,
      created_at: row.get(1)?,
      name: row.get(2)?,
      category: row.get(3)?,
      storage_method: row.get(4)?,
      status: row.get(5)?,
      purchase_date: row.get(6)?,
      expiry_date: row.get(7)?,
      is_estimated: row.get(8)?,
      quantity: row.get(9)?,
      image_url: row.get(10)?,
      memo: row.get(11)?,
    })
  }
}

fn raw_to_item(raw: RawItem) -> Result<Item> {
  Ok(Item {
    created_at: parse_datetime(&raw.created_at)?,
    storage_method: raw
      .storage_method
      .parse::<StorageMethod>()
      .map_err(|e| eyre!("Item {}: {}", raw.id, e))?,
    status: raw
      .status
      .parse::<ItemStatus>()
      .map_err(|e| eyre!("Item {}: {}", raw.id, e))?,
    purchase_date: parse_date(&raw.purchase_date)?,
    expiry_date: parse_date(&raw.expiry_date)?,
    id: raw.id,
    name: raw.name,
    category: raw.category,
    is_estimated: raw.is_estimated,
    quantity: raw.quantity,
    image_url: raw.image_url,
    memo: raw.memo,
  })
}

fn format_date(date: NaiveDate) -> String {
  date.format("%Y-%m-%d").to_string()
}

fn parse_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| eyre!("Failed to parse date '{}': {}", s, e))
}

/// Parse a datetime string from SQLite format.
fn parse_datetime(s: &str) -> Result<DateTime<Utc>> {
  // SQLite stores as "YYYY-MM-DD HH:MM:SS"
  chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
    .map(|dt| dt.and_utc())
    .map_err(|e| eyre!("Failed to parse datetime '{}': {}", s, e))
}
