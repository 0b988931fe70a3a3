// SqliteDatabase — rusqlite backend implementing the Database trait.
//
// The Connection is wrapped in tokio::sync::Mutex because Connection is !Sync.
// Trait methods lock the mutex, do synchronous rusqlite work, and return.
// The lock is never held across .await points.

use anyhow::Result;
use async_trait::async_trait;
use rusqlite::Connection;
use tokio::sync::Mutex;

use super::models::{RetrainEntry, RetrainRecord};
use super::traits::Database;

pub struct SqliteDatabase {
    conn: Mutex<Connection>,
}

impl SqliteDatabase {
    /// Wrap an already-opened rusqlite Connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }
}

#[async_trait]
impl Database for SqliteDatabase {
    async fn table_count(&self) -> Result<i64> {
        let conn = self.conn.lock().await;
        super::schema::table_count(&conn)
    }

    async fn record_retrain(&self, entry: &RetrainEntry) -> Result<i64> {
        let conn = self.conn.lock().await;
        super::queries::insert_retrain(&conn, entry)
    }

    async fn recent_retrains(&self, limit: u32) -> Result<Vec<RetrainRecord>> {
        let conn = self.conn.lock().await;
        super::queries::get_recent_retrains(&conn, limit)
    }

    async fn last_retrain(&self) -> Result<Option<RetrainRecord>> {
        let conn = self.conn.lock().await;
        super::queries::get_last_retrain(&conn)
    }

    async fn clear_history(&self) -> Result<usize> {
        let conn = self.conn.lock().await;
        super::queries::clear_history(&conn)
    }
}
