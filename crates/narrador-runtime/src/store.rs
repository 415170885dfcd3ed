//! Append-only story store.
//!
//! One row per successful story request in the `historias` table. The
//! table is created when missing and never migrated; rows are never
//! updated or deleted. Provider outputs are stored as JSON text, with SQL
//! `NULL` for a provider that produced nothing.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde_json::Value as JsonValue;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use narrador_core::{NewStoryRecord, StoryRecord};

use crate::config::StoreLocation;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS historias (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    data_criacao TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
    prompt TEXT NOT NULL,
    groq TEXT,
    openai TEXT
);
"#;

/// Errors from the story store.
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Failed to encode or decode stored JSON: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to prepare database directory: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage task failed: {0}")]
    Join(String),

    #[error("Unreadable timestamp in stored record: {0}")]
    InvalidTimestamp(String),
}

/// Destination for finished story records.
#[async_trait]
pub trait StorySink: Send + Sync {
    /// Append a record; the store assigns id and creation time.
    async fn append(&self, record: NewStoryRecord) -> Result<StoryRecord, PersistenceError>;
}

/// SQLite-backed [`StorySink`].
#[derive(Clone)]
pub struct SqliteStoryStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStoryStore {
    /// Open (or create) the store at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PersistenceError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        info!("Story store initialized at {:?}", path);
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Create in-memory storage (for testing)
    pub fn in_memory() -> Result<Self, PersistenceError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_location(location: &StoreLocation) -> Result<Self, PersistenceError> {
        match location {
            StoreLocation::File(path) => Self::open(path),
            StoreLocation::Memory => Self::in_memory(),
        }
    }

    /// Most recent records first.
    pub fn recent(&self, limit: usize) -> Result<Vec<StoryRecord>, PersistenceError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, data_criacao, prompt, groq, openai
             FROM historias ORDER BY id DESC LIMIT ?1",
        )?;

        let rows = stmt
            .query_map(params![limit as i64], RawRecord::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(RawRecord::decode).collect()
    }

    pub fn get(&self, id: i64) -> Result<Option<StoryRecord>, PersistenceError> {
        let conn = self.conn.lock();
        let raw = conn
            .query_row(
                "SELECT id, data_criacao, prompt, groq, openai FROM historias WHERE id = ?1",
                params![id],
                RawRecord::from_row,
            )
            .optional()?;

        raw.map(RawRecord::decode).transpose()
    }

    pub fn count(&self) -> Result<u64, PersistenceError> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM historias", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn insert(&self, record: &NewStoryRecord) -> Result<StoryRecord, PersistenceError> {
        let groq = encode_column(&record.provider_a_output)?;
        let openai = encode_column(&record.provider_b_output)?;

        let conn = self.conn.lock();
        let (id, created_at): (i64, String) = conn.query_row(
            "INSERT INTO historias (prompt, groq, openai) VALUES (?1, ?2, ?3)
             RETURNING id, data_criacao",
            params![record.prompt, groq, openai],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        Ok(StoryRecord {
            id,
            created_at: parse_timestamp(&created_at)?,
            prompt: record.prompt.clone(),
            provider_a_output: record.provider_a_output.clone(),
            provider_b_output: record.provider_b_output.clone(),
        })
    }
}

#[async_trait]
impl StorySink for SqliteStoryStore {
    async fn append(&self, record: NewStoryRecord) -> Result<StoryRecord, PersistenceError> {
        let store = self.clone();
        let stored = tokio::task::spawn_blocking(move || store.insert(&record))
            .await
            .map_err(|e| PersistenceError::Join(e.to_string()))??;

        tracing::debug!(id = stored.id, "Story record stored");
        Ok(stored)
    }
}

struct RawRecord {
    id: i64,
    created_at: String,
    prompt: String,
    groq: Option<String>,
    openai: Option<String>,
}

impl RawRecord {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            created_at: row.get(1)?,
            prompt: row.get(2)?,
            groq: row.get(3)?,
            openai: row.get(4)?,
        })
    }

    fn decode(self) -> Result<StoryRecord, PersistenceError> {
        Ok(StoryRecord {
            id: self.id,
            created_at: parse_timestamp(&self.created_at)?,
            prompt: self.prompt,
            provider_a_output: decode_column(self.groq)?,
            provider_b_output: decode_column(self.openai)?,
        })
    }
}

fn encode_column(value: &JsonValue) -> Result<Option<String>, PersistenceError> {
    if value.is_null() {
        return Ok(None);
    }
    Ok(Some(serde_json::to_string(value)?))
}

fn decode_column(text: Option<String>) -> Result<JsonValue, PersistenceError> {
    match text {
        Some(text) => Ok(serde_json::from_str(&text)?),
        None => Ok(JsonValue::Null),
    }
}

/// Accepts RFC 3339 and SQLite's `CURRENT_TIMESTAMP` format (assumed UTC).
fn parse_timestamp(text: &str) -> Result<DateTime<Utc>, PersistenceError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|_| PersistenceError::InvalidTimestamp(text.to_string()))
}
