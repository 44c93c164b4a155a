// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Mention persistence.
//!
//! Mentions live in a flat key-value space. Each key is
//! `"<target-href> <source-href>"`, so listing by a target prefix enumerates
//! every source that mentions it, and resubmitting a pair overwrites the
//! existing record.

use async_trait::async_trait;
use rusqlite::{params, OptionalExtension};
use std::collections::BTreeMap;
use std::ops::Bound;
use std::path::Path;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info};
use url::Url;

/// Storage error types.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Database connection error: {0}")]
    Connection(String),
}

impl From<tokio_rusqlite::Error> for StoreError {
    fn from(e: tokio_rusqlite::Error) -> Self {
        match e {
            tokio_rusqlite::Error::Rusqlite(e) => StoreError::Sqlite(e),
            other => StoreError::Connection(other.to_string()),
        }
    }
}

/// One page of keys matching a prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    /// Matching keys in ascending order
    pub keys: Vec<String>,
    /// False when more keys matched than the page could hold
    pub complete: bool,
}

impl Listing {
    /// Build a page from up to `limit + 1` keys; the extra key marks truncation.
    fn from_overfetch(mut keys: Vec<String>, limit: usize) -> Self {
        let complete = keys.len() <= limit;
        keys.truncate(limit);
        Self { keys, complete }
    }
}

/// Key-value store for verified mentions.
#[async_trait]
pub trait MentionStore: Send + Sync {
    /// Insert or overwrite a record.
    async fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Keys beginning with `prefix`, at most one page of them.
    async fn list(&self, prefix: &str) -> Result<Listing, StoreError>;
}

/// Record key for a `(target, source)` pair.
pub fn mention_key(target: &Url, source: &Url) -> String {
    format!("{} {}", target.as_str(), source.as_str())
}

/// Listing prefix selecting exactly the records for `target`.
///
/// Targets are normalised the way `mention_key` stores them, and the
/// separator is included so `/posts/1` does not also match `/posts/10`.
pub fn target_prefix(target: &str) -> String {
    match Url::parse(target) {
        Ok(url) => format!("{} ", url.as_str()),
        Err(_) => format!("{target} "),
    }
}

/// Recover the source component of a record key.
pub fn source_of(key: &str) -> Option<&str> {
    key.split_once(' ').map(|(_, source)| source)
}

/// In-process store, lost on restart.
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, Vec<u8>>>,
    list_limit: usize,
}

impl MemoryStore {
    pub fn new(list_limit: usize) -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
            list_limit,
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl MentionStore for MemoryStore {
    async fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), value.to_vec());
        debug!(key, "Stored mention in memory");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn list(&self, prefix: &str) -> Result<Listing, StoreError> {
        let entries = self.entries.read().await;
        let keys = entries
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .map(|(key, _)| key)
            .take_while(|key| key.starts_with(prefix))
            .take(self.list_limit.saturating_add(1))
            .cloned()
            .collect();
        Ok(Listing::from_overfetch(keys, self.list_limit))
    }
}

/// SQLite-backed store running on a dedicated connection thread.
#[derive(Clone)]
pub struct SqliteStore {
    conn: tokio_rusqlite::Connection,
    list_limit: usize,
}

impl SqliteStore {
    /// Open (creating if needed) a database file.
    pub async fn open(path: &Path, list_limit: usize) -> Result<Self, StoreError> {
        info!(path = %path.display(), "Opening mention database");
        let conn = tokio_rusqlite::Connection::open(path).await?;
        Self::init(conn, list_limit).await
    }

    pub async fn open_in_memory(list_limit: usize) -> Result<Self, StoreError> {
        let conn = tokio_rusqlite::Connection::open_in_memory().await?;
        Self::init(conn, list_limit).await
    }

    async fn init(conn: tokio_rusqlite::Connection, list_limit: usize) -> Result<Self, StoreError> {
        conn.call(|conn| {
            conn.execute_batch(
                "
                PRAGMA journal_mode = WAL;
                PRAGMA synchronous = NORMAL;
                PRAGMA busy_timeout = 5000;
                CREATE TABLE IF NOT EXISTS mentions (
                    key   TEXT PRIMARY KEY NOT NULL,
                    value BLOB NOT NULL
                );
                ",
            )?;
            Ok(())
        })
        .await?;

        Ok(Self { conn, list_limit })
    }
}

#[async_trait]
impl MentionStore for SqliteStore {
    async fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        let (key, value) = (key.to_string(), value.to_vec());
        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO mentions (key, value) VALUES (?1, ?2)
                     ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                    params![key, value],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let key = key.to_string();
        let value = self
            .conn
            .call(move |conn| {
                let value = conn
                    .query_row(
                        "SELECT value FROM mentions WHERE key = ?1",
                        params![key],
                        |row| row.get::<_, Vec<u8>>(0),
                    )
                    .optional()?;
                Ok(value)
            })
            .await?;
        Ok(value)
    }

    async fn list(&self, prefix: &str) -> Result<Listing, StoreError> {
        let prefix = prefix.to_string();
        let fetch = i64::try_from(self.list_limit.saturating_add(1)).unwrap_or(i64::MAX);
        let keys = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT key FROM mentions
                     WHERE substr(key, 1, length(?1)) = ?1
                     ORDER BY key
                     LIMIT ?2",
                )?;
                let keys = stmt
                    .query_map(params![prefix, fetch], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(keys)
            })
            .await?;
        Ok(Listing::from_overfetch(keys, self.list_limit))
    }
}
