//! Database schema migrations.
//!
//! Applies the conversation schema and records it in schema_migrations.

use rusqlite::Connection;
use tracing::info;

use chatrelay_core::error::RelayError;

/// Run all pending database migrations.
pub fn run_migrations(conn: &Connection) -> Result<(), RelayError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version     INTEGER PRIMARY KEY NOT NULL,
            name        TEXT NOT NULL,
            applied_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );",
    )
    .map_err(|e| RelayError::Storage(format!("Failed to create migrations table: {}", e)))?;

    let current_version: i64 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .map_err(|e| RelayError::Storage(format!("Failed to query migration version: {}", e)))?;

    if current_version < 1 {
        apply_v1(conn)?;
        info!("Applied migration v1: conversations");
    }

    Ok(())
}

/// Version 1: one conversation row per user, turns in insertion order.
///
/// `turns.role` has no CHECK constraint; readers skip roles they do not
/// recognize.
fn apply_v1(conn: &Connection) -> Result<(), RelayError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS conversations (
            user_id     TEXT PRIMARY KEY NOT NULL,
            created_at  INTEGER NOT NULL,
            updated_at  INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS turns (
            seq         INTEGER PRIMARY KEY AUTOINCREMENT,
            id          TEXT NOT NULL UNIQUE,
            user_id     TEXT NOT NULL REFERENCES conversations (user_id),
            role        TEXT NOT NULL,
            text        TEXT NOT NULL,
            created_at  INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_turns_user_seq
            ON turns (user_id, seq DESC);

        INSERT INTO schema_migrations (version, name) VALUES (1, 'conversations');
        ",
    )
    .map_err(|e| RelayError::Storage(format!("Migration v1 failed: {}", e)))?;
    Ok(())
}
