//! Cache store trait and its SQLite and in-memory implementations.

use std::collections::HashMap;
use std::sync::Mutex;

use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, Connection};

use super::response::CachedResponse;

/// A named, versioned key-value store for cached responses.
///
/// One logical generation per version tag; entries within a generation are
/// keyed by normalized request identity. Implementations must be safe to
/// share across concurrent interception tasks; writes to the same key are
/// last-write-wins.
pub trait CacheStore: Send + Sync {
  /// Store a response under `(generation, key)`, overwriting any prior
  /// entry for that key.
  fn put(&self, generation: &str, key: &str, response: &CachedResponse) -> Result<()>;

  /// Exact-key lookup within a generation.
  fn get(&self, generation: &str, key: &str) -> Result<Option<CachedResponse>>;

  /// Names of every generation currently present.
  fn list_generations(&self) -> Result<Vec<String>>;

  /// Remove a generation and all of its entries.
  fn delete_generation(&self, generation: &str) -> Result<()>;
}

/// SQLite-backed cache store.
pub struct SqliteCacheStore {
  conn: Mutex<Connection>,
}

/// Schema for the shell cache table.
const SHELL_CACHE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS shell_cache (
    generation TEXT NOT NULL,
    request_key TEXT NOT NULL,
    status INTEGER NOT NULL,
    headers TEXT NOT NULL,
    body BLOB NOT NULL,
    cached_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (generation, request_key)
);

CREATE INDEX IF NOT EXISTS idx_shell_cache_generation
    ON shell_cache(generation);
"#;

impl SqliteCacheStore {
  /// Open the cache store at the default location.
  pub fn open() -> Result<Self> {
    let path = Self::default_path()?;

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create cache directory: {}", e))?;
    }

    let conn = Connection::open(&path)
      .map_err(|e| eyre!("Failed to open shell cache at {}: {}", path.display(), e))?;

    Self::from_connection(conn)
  }

  /// Open an in-memory cache store.
  pub fn open_in_memory() -> Result<Self> {
    let conn =
      Connection::open_in_memory().map_err(|e| eyre!("Failed to open in-memory cache: {}", e))?;
    Self::from_connection(conn)
  }

  fn from_connection(conn: Connection) -> Result<Self> {
    conn
      .execute_batch(SHELL_CACHE_SCHEMA)
      .map_err(|e| eyre!("Failed to run shell cache migrations: {}", e))?;

    Ok(Self {
      conn: Mutex::new(conn),
    })
  }

  /// Default database path.
  fn default_path() -> Result<std::path::PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(data_dir.join("ecofridge").join("shell-cache.db"))
  }
}

impl CacheStore for SqliteCacheStore {
  fn put(&self, generation: &str, key: &str, response: &CachedResponse) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let headers = serde_json::to_string(&response.headers)
      .map_err(|e| eyre!("Failed to serialize headers: {}", e))?;

    conn
      .execute(
        "INSERT OR REPLACE INTO shell_cache (generation, request_key, status, headers, body, cached_at)
         VALUES (?, ?, ?, ?, ?, datetime('now'))",
        params![generation, key, response.status, headers, response.body],
      )
      .map_err(|e| eyre!("Failed to store cache entry: {}", e))?;

    Ok(())
  }

  fn get(&self, generation: &str, key: &str) -> Result<Option<CachedResponse>> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let mut stmt = conn
      .prepare(
        "SELECT status, headers, body FROM shell_cache
         WHERE generation = ? AND request_key = ?",
      )
      .map_err(|e| eyre!("Failed to prepare cache lookup: {}", e))?;

    let row: Option<(u16, String, Vec<u8>)> = stmt
      .query_row(params![generation, key], |row| {
        Ok((row.get(0)?, row.get(1)?, row.get(2)?))
      })
      .ok();

    match row {
      Some((status, headers, body)) => {
        let headers: Vec<(String, String)> = serde_json::from_str(&headers)
          .map_err(|e| eyre!("Failed to deserialize headers: {}", e))?;
        Ok(Some(CachedResponse::new(status, headers, body)))
      }
      None => Ok(None),
    }
  }

  fn list_generations(&self) -> Result<Vec<String>> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let mut stmt = conn
      .prepare("SELECT DISTINCT generation FROM shell_cache ORDER BY generation")
      .map_err(|e| eyre!("Failed to prepare generation query: {}", e))?;

    let names = stmt
      .query_map([], |row| row.get(0))
      .map_err(|e| eyre!("Failed to list generations: {}", e))?
      .filter_map(|r| r.ok())
      .collect();

    Ok(names)
  }

  fn delete_generation(&self, generation: &str) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute(
        "DELETE FROM shell_cache WHERE generation = ?",
        params![generation],
      )
      .map_err(|e| eyre!("Failed to delete generation {}: {}", generation, e))?;

    Ok(())
  }
}

/// In-memory cache store, for tests and other callers that must not touch
/// disk.
#[derive(Default)]
pub struct MemoryCacheStore {
  generations: Mutex<HashMap<String, HashMap<String, CachedResponse>>>,
}

impl MemoryCacheStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Number of entries in a generation. Test-side visibility.
  pub fn entry_count(&self, generation: &str) -> usize {
    self
      .generations
      .lock()
      .map(|g| g.get(generation).map(|e| e.len()).unwrap_or(0))
      .unwrap_or(0)
  }
}

impl CacheStore for MemoryCacheStore {
  fn put(&self, generation: &str, key: &str, response: &CachedResponse) -> Result<()> {
    let mut generations = self
      .generations
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    generations
      .entry(generation.to_string())
      .or_default()
      .insert(key.to_string(), response.clone());
    Ok(())
  }

  fn get(&self, generation: &str, key: &str) -> Result<Option<CachedResponse>> {
    let generations = self
      .generations
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    Ok(
      generations
        .get(generation)
        .and_then(|entries| entries.get(key))
        .cloned(),
    )
  }

  fn list_generations(&self) -> Result<Vec<String>> {
    let generations = self
      .generations
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    let mut names: Vec<String> = generations.keys().cloned().collect();
    names.sort();
    Ok(names)
  }

  fn delete_generation(&self, generation: &str) -> Result<()> {
    let mut generations = self
      .generations
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    generations.remove(generation);
    Ok(())
  }
}
