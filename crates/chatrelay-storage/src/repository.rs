//! Conversation persistence.
//!
//! `ConversationStore` is the seam the chat orchestrator depends on;
//! `ConversationRepository` implements it on top of [`Database`].

use std::sync::Arc;

use chrono::{TimeZone, Utc};

use chatrelay_core::error::RelayError;
use chatrelay_core::types::{StoredTurn, Turn};

use crate::db::Database;

/// Per-user conversation storage.
pub trait ConversationStore: Send + Sync {
    /// Most recent `limit` turns for `user_id`, oldest first.
    ///
    /// A user with no conversation yet gets an empty list, not an error.
    fn get_history(&self, user_id: &str, limit: usize) -> Result<Vec<StoredTurn>, RelayError>;

    /// Append `turns` to the user's conversation, creating it if absent.
    fn append_turns(&self, user_id: &str, turns: &[Turn]) -> Result<(), RelayError>;

    /// Total number of stored turns for `user_id`.
    fn turn_count(&self, user_id: &str) -> Result<u64, RelayError>;

    /// Check that the backing store is reachable.
    fn ping(&self) -> Result<(), RelayError>;
}

/// SQLite-backed conversation store.
pub struct ConversationRepository {
    db: Arc<Database>,
}

impl ConversationRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

impl ConversationStore for ConversationRepository {
    fn get_history(&self, user_id: &str, limit: usize) -> Result<Vec<StoredTurn>, RelayError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT role, text, created_at
                     FROM turns
                     WHERE user_id = ?1
                     ORDER BY seq DESC
                     LIMIT ?2",
                )
                .map_err(|e| RelayError::Storage(e.to_string()))?;

            let rows = stmt
                .query_map(rusqlite::params![user_id, limit], |row| {
                    let created_ms: i64 = row.get(2)?;
                    Ok(StoredTurn {
                        role: row.get(0)?,
                        text: row.get(1)?,
                        created_at: Utc.timestamp_millis_opt(created_ms).single(),
                    })
                })
                .map_err(|e| RelayError::Storage(e.to_string()))?;

            let mut turns = Vec::new();
            for row in rows {
                turns.push(row.map_err(|e| RelayError::Storage(e.to_string()))?);
            }
            // Selected newest-first for the LIMIT; callers want oldest-first.
            turns.reverse();
            Ok(turns)
        })
    }

    fn append_turns(&self, user_id: &str, turns: &[Turn]) -> Result<(), RelayError> {
        if turns.is_empty() {
            return Ok(());
        }

        self.db.with_conn(|conn| {
            let tx = conn
                .unchecked_transaction()
                .map_err(|e| RelayError::Storage(format!("Failed to begin append: {}", e)))?;

            let now = Utc::now().timestamp_millis();
            tx.execute(
                "INSERT INTO conversations (user_id, created_at, updated_at)
                 VALUES (?1, ?2, ?2)
                 ON CONFLICT (user_id) DO UPDATE SET updated_at = excluded.updated_at",
                rusqlite::params![user_id, now],
            )
            .map_err(|e| RelayError::Storage(format!("Failed to upsert conversation: {}", e)))?;

            {
                let mut stmt = tx
                    .prepare(
                        "INSERT INTO turns (id, user_id, role, text, created_at)
                         VALUES (?1, ?2, ?3, ?4, ?5)",
                    )
                    .map_err(|e| RelayError::Storage(e.to_string()))?;
                for turn in turns {
                    stmt.execute(rusqlite::params![
                        turn.id.to_string(),
                        user_id,
                        turn.role.as_stored(),
                        turn.text,
                        turn.created_at.timestamp_millis(),
                    ])
                    .map_err(|e| RelayError::Storage(format!("Failed to append turn: {}", e)))?;
                }
            }

            tx.commit()
                .map_err(|e| RelayError::Storage(format!("Failed to commit append: {}", e)))?;

            tracing::debug!(user_id = %user_id, appended = turns.len(), "Turns appended");
            Ok(())
        })
    }

    fn turn_count(&self, user_id: &str) -> Result<u64, RelayError> {
        self.db.with_conn(|conn| {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM turns WHERE user_id = ?1",
                    rusqlite::params![user_id],
                    |row| row.get(0),
                )
                .map_err(|e| RelayError::Storage(e.to_string()))?;
            Ok(count as u64)
        })
    }

    fn ping(&self) -> Result<(), RelayError> {
        self.db.ping()
    }
}
