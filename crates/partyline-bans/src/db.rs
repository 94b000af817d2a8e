use rusqlite::{Connection, Result};

/// Initialise the ban-list table. Safe to call on every startup —
/// CREATE IF NOT EXISTS means it's idempotent.
pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS banned_users (
            user_id   TEXT PRIMARY KEY NOT NULL,
            banned_at TEXT NOT NULL
        );",
    )
}
