use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use rusqlite::Connection;
use tracing::{info, instrument};

use partyline_core::types::UserId;

use crate::db::init_db;
use crate::error::Result;

/// Read capability consumed by the relay core.
///
/// The relay never mutates the ban list; it only asks membership questions.
/// Lookup failures propagate — a banned user must never slip through because
/// the store was briefly unreachable.
#[async_trait]
pub trait BanStore: Send + Sync {
    async fn is_banned(&self, user: &UserId) -> Result<bool>;
}

/// SQLite-backed ban list.
///
/// Wraps a single connection in a `Mutex`; ban churn is far too low to
/// justify a pool. Management operations (`ban`/`unban`) are used by the
/// moderation commands, `is_banned` by the relay pipeline.
pub struct SqliteBanStore {
    db: Mutex<Connection>,
}

impl SqliteBanStore {
    /// Wrap an already-open connection, initialising the schema if needed.
    pub fn new(conn: Connection) -> Result<Self> {
        init_db(&conn)?;
        Ok(Self {
            db: Mutex::new(conn),
        })
    }

    /// Ban a user. Returns `false` if they were already banned.
    #[instrument(skip(self), fields(user = %user))]
    pub fn ban(&self, user: &UserId) -> Result<bool> {
        let now = chrono::Utc::now().to_rfc3339();
        let db = self.db.lock().unwrap();
        let n = db.execute(
            "INSERT OR IGNORE INTO banned_users (user_id, banned_at) VALUES (?1, ?2)",
            rusqlite::params![user.as_str(), now],
        )?;
        if n > 0 {
            info!("user banned");
        }
        Ok(n > 0)
    }

    /// Unban a user. Returns `false` if they were not banned.
    #[instrument(skip(self), fields(user = %user))]
    pub fn unban(&self, user: &UserId) -> Result<bool> {
        let db = self.db.lock().unwrap();
        let n = db.execute(
            "DELETE FROM banned_users WHERE user_id = ?1",
            rusqlite::params![user.as_str()],
        )?;
        if n > 0 {
            info!("user unbanned");
        }
        Ok(n > 0)
    }

    /// All banned user IDs, oldest ban first.
    pub fn banned_users(&self) -> Result<Vec<UserId>> {
        let db = self.db.lock().unwrap();
        let mut stmt =
            db.prepare("SELECT user_id FROM banned_users ORDER BY banned_at")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        Ok(rows.filter_map(|r| r.ok()).map(UserId::from).collect())
    }

    fn is_banned_sync(&self, user: &UserId) -> Result<bool> {
        let db = self.db.lock().unwrap();
        let mut stmt =
            db.prepare_cached("SELECT 1 FROM banned_users WHERE user_id = ?1")?;
        Ok(stmt.exists(rusqlite::params![user.as_str()])?)
    }
}

#[async_trait]
impl BanStore for SqliteBanStore {
    async fn is_banned(&self, user: &UserId) -> Result<bool> {
        self.is_banned_sync(user)
    }
}

/// In-memory ban list for tests and single-process embedding.
#[derive(Default)]
pub struct MemoryBanStore {
    banned: Mutex<HashSet<UserId>>,
}

impl MemoryBanStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ban(&self, user: &UserId) -> bool {
        self.banned.lock().unwrap().insert(user.clone())
    }

    pub fn unban(&self, user: &UserId) -> bool {
        self.banned.lock().unwrap().remove(user)
    }
}

#[async_trait]
impl BanStore for MemoryBanStore {
    async fn is_banned(&self, user: &UserId) -> Result<bool> {
        Ok(self.banned.lock().unwrap().contains(user))
    }
}
