use std::path::Path;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{Connection, ErrorCode, OptionalExtension, params};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Result, StoreError};

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Outbound webhook channel registered under a generated identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelMap {
    pub id: Uuid,
    pub channel_credential: String,
    pub channel_secret: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Bearer token bound to an external user id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenMap {
    pub external_user_id: String,
    pub bearer_token: String,
    pub updated_at: DateTime<Utc>,
}

/// Thin repository over SQLite for channel and token mappings.
///
/// Thread-safe via an internal non-poisoning `Mutex<Connection>`.
pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    /// Open (or create) the database at `path` and run pending migrations.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;

        let mut store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        tracing::debug!(path = %path.display(), "Opened store");
        Ok(store)
    }

    /// Open an in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;

        let mut store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    /// Close the underlying connection, flushing any pending WAL state.
    pub fn close(self) -> Result<()> {
        self.conn
            .into_inner()
            .close()
            .map_err(|(_, e)| StoreError::Database(e))
    }

    fn run_migrations(&mut self) -> Result<()> {
        embedded::migrations::runner()
            .run(self.conn.get_mut())
            .map_err(|e| StoreError::Migration(e.to_string()))?;
        Ok(())
    }

    // ── Channel maps ────────────────────────────────────────────────

    /// Register a channel under a freshly generated identifier.
    pub fn create_channel(&self, credential: &str, secret: &str) -> Result<ChannelMap> {
        let now = Utc::now();
        let record = ChannelMap {
            id: Uuid::new_v4(),
            channel_credential: credential.to_string(),
            channel_secret: secret.to_string(),
            created_at: now,
            updated_at: now,
        };

        self.conn()
            .execute(
                "INSERT INTO channel_maps (id, channel_credential, channel_secret, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    record.id.to_string(),
                    record.channel_credential,
                    record.channel_secret,
                    now.to_rfc3339(),
                    now.to_rfc3339()
                ],
            )
            .map_err(|e| classify(e, "channel secret"))?;

        Ok(record)
    }

    pub fn get_channel(&self, id: &Uuid) -> Result<ChannelMap> {
        self.conn()
            .query_row(
                "SELECT id, channel_credential, channel_secret, created_at, updated_at
                 FROM channel_maps WHERE id = ?1",
                params![id.to_string()],
                row_to_channel,
            )
            .optional()?
            .ok_or_else(|| StoreError::NotFound(format!("channel {id}")))
    }

    /// Overwrite a channel's credential and secret in place.
    pub fn update_channel(&self, id: &Uuid, credential: &str, secret: &str) -> Result<ChannelMap> {
        let now = Utc::now().to_rfc3339();
        let updated = self
            .conn()
            .execute(
                "UPDATE channel_maps
                 SET channel_credential = ?1, channel_secret = ?2, updated_at = ?3
                 WHERE id = ?4",
                params![credential, secret, now, id.to_string()],
            )
            .map_err(|e| classify(e, "channel secret"))?;
        if updated == 0 {
            return Err(StoreError::NotFound(format!("channel {id}")));
        }
        self.get_channel(id)
    }

    pub fn delete_channel(&self, id: &Uuid) -> Result<()> {
        let deleted = self
            .conn()
            .execute("DELETE FROM channel_maps WHERE id = ?1", params![id.to_string()])?;
        if deleted == 0 {
            return Err(StoreError::NotFound(format!("channel {id}")));
        }
        Ok(())
    }

    // ── Token maps ──────────────────────────────────────────────────

    /// Bind `token` to `external_user_id`, replacing any previous binding.
    ///
    /// Fails with [`StoreError::Conflict`] when the token is already bound to
    /// a different user.
    pub fn upsert_token(&self, external_user_id: &str, token: &str) -> Result<TokenMap> {
        let now = Utc::now();
        self.conn()
            .execute(
                "INSERT INTO token_maps (external_user_id, bearer_token, updated_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(external_user_id) DO UPDATE SET
                     bearer_token = excluded.bearer_token,
                     updated_at = excluded.updated_at",
                params![external_user_id, token, now.to_rfc3339()],
            )
            .map_err(|e| classify(e, "bearer token"))?;

        Ok(TokenMap {
            external_user_id: external_user_id.to_string(),
            bearer_token: token.to_string(),
            updated_at: now,
        })
    }

    pub fn get_token(&self, external_user_id: &str) -> Result<TokenMap> {
        self.conn()
            .query_row(
                "SELECT external_user_id, bearer_token, updated_at
                 FROM token_maps WHERE external_user_id = ?1",
                params![external_user_id],
                |row| {
                    Ok(TokenMap {
                        external_user_id: row.get(0)?,
                        bearer_token: row.get(1)?,
                        updated_at: get_dt(row, 2)?,
                    })
                },
            )
            .optional()?
            .ok_or_else(|| StoreError::NotFound(format!("token for user {external_user_id}")))
    }

    fn conn(&self) -> parking_lot::MutexGuard<'_, Connection> {
        self.conn.lock()
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

fn classify(err: rusqlite::Error, what: &str) -> StoreError {
    match err {
        rusqlite::Error::SqliteFailure(ref e, _) if e.code == ErrorCode::ConstraintViolation => {
            StoreError::Conflict(what.to_string())
        }
        other => StoreError::Database(other),
    }
}

/// Read an RFC 3339 timestamp column; a corrupt value is a conversion error.
fn get_dt(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

fn row_to_channel(row: &rusqlite::Row<'_>) -> rusqlite::Result<ChannelMap> {
    let raw_id: String = row.get(0)?;
    let id = Uuid::parse_str(&raw_id).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(ChannelMap {
        id,
        channel_credential: row.get(1)?,
        channel_secret: row.get(2)?,
        created_at: get_dt(row, 3)?,
        updated_at: get_dt(row, 4)?,
    })
}
