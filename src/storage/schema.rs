//! Database schema definitions.

use rusqlite::{Connection, Result};
use tracing::debug;

/// Current schema version.
pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// The complete SQL schema for the wishsync database.
///
/// Timestamps are stored as INTEGER (Unix milliseconds). Banners are
/// stored by provider gacha type code.
pub const SCHEMA_SQL: &str = r"
-- ====================
-- Schema Version Tracking
-- ====================

CREATE TABLE IF NOT EXISTS schema_migrations (
    version TEXT PRIMARY KEY,
    applied_at INTEGER NOT NULL
);

-- ====================
-- Core Tables
-- ====================

-- Users: local accounts with an optional linked provider identity
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    email TEXT NOT NULL UNIQUE,
    lang TEXT,
    created_at INTEGER NOT NULL,
    provider_username TEXT,
    provider_uid TEXT
);

CREATE INDEX IF NOT EXISTS idx_users_provider_uid ON users(provider_uid);

-- Wishes: imported draw history, one row per provider record
CREATE TABLE IF NOT EXISTS wishes (
    owner_id INTEGER NOT NULL,
    id INTEGER NOT NULL,
    gacha_type INTEGER NOT NULL,
    time INTEGER NOT NULL,
    name TEXT NOT NULL,
    item_type TEXT NOT NULL,
    rank_type INTEGER NOT NULL,
    imported_at INTEGER NOT NULL,
    PRIMARY KEY (owner_id, id),
    FOREIGN KEY (owner_id) REFERENCES users(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_wishes_owner_time ON wishes(owner_id, time DESC, id DESC);
CREATE INDEX IF NOT EXISTS idx_wishes_owner_banner ON wishes(owner_id, gacha_type, time DESC, id DESC);

-- ====================
-- Audit Trail
-- ====================

CREATE TABLE IF NOT EXISTS events (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    entity_type TEXT NOT NULL,
    entity_id TEXT NOT NULL,
    event_type TEXT NOT NULL,
    actor TEXT NOT NULL,
    comment TEXT,
    created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_events_entity ON events(entity_type, entity_id, created_at DESC);
";

/// Apply pragmas and the schema to a connection.
///
/// Idempotent; safe to call on every open.
///
/// # Errors
///
/// Returns an error if a pragma or DDL statement fails.
pub fn apply_schema(conn: &Connection) -> Result<()> {
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.pragma_update(None, "temp_store", "MEMORY")?;

    conn.execute_batch(SCHEMA_SQL)?;

    let inserted = conn.execute(
        "INSERT OR IGNORE INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
        rusqlite::params![
            format!("v{CURRENT_SCHEMA_VERSION}"),
            chrono::Utc::now().timestamp_millis()
        ],
    )?;
    if inserted > 0 {
        debug!(version = CURRENT_SCHEMA_VERSION, "Schema created");
    }

    Ok(())
}
