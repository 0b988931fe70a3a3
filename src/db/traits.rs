// Database trait — backend-agnostic async interface for history storage.
//
// Implementor: SqliteDatabase (wraps rusqlite). Methods are async so a
// blocking backend behind a mutex and a native async backend fit behind the
// same interface.

use anyhow::Result;
use async_trait::async_trait;

use super::models::{RetrainEntry, RetrainRecord};

#[async_trait]
pub trait Database: Send + Sync {
    // --- Lifecycle ---

    /// Count the number of user-created tables in the database.
    async fn table_count(&self) -> Result<i64>;

    // --- Retrain history ---

    /// Record a retrain outcome and return its ID.
    async fn record_retrain(&self, entry: &RetrainEntry) -> Result<i64>;

    /// The most recent retrains, oldest first.
    async fn recent_retrains(&self, limit: u32) -> Result<Vec<RetrainRecord>>;

    /// The latest retrain, if any.
    async fn last_retrain(&self) -> Result<Option<RetrainRecord>>;

    /// Remove all history. Returns the number of rows deleted.
    async fn clear_history(&self) -> Result<usize>;
}
