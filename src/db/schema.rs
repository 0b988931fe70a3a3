// Database schema — table creation and migrations.
//
// A `schema_version` table records which schema version the file was
// created with, so later column changes can be applied as migrations.

use anyhow::{Context, Result};
use rusqlite::Connection;

/// Create all tables if they don't exist yet.
///
/// This is idempotent — safe to call on every startup.
pub fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        -- Tracks schema version for future migrations
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- One row per retrain: the thresholds it produced and how far they moved
        CREATE TABLE IF NOT EXISTS retrain_history (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            kind TEXT NOT NULL,                -- baseline / benign / attack
            attack_rate REAL,                  -- attack share of the new batch, if known
            tau1 REAL NOT NULL,
            tau2 REAL NOT NULL,
            d_tau1 REAL NOT NULL DEFAULT 0,    -- delta vs previous persisted tau1
            d_tau2 REAL NOT NULL DEFAULT 0,
            cost REAL NOT NULL,
            fallback_used INTEGER NOT NULL DEFAULT 0,
            events INTEGER NOT NULL DEFAULT 0, -- evaluation sample size
            recorded_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- Index for listing recent retrains
        CREATE INDEX IF NOT EXISTS idx_history_recorded
            ON retrain_history(recorded_at);
        ",
    )
    .context("Failed to create database tables")?;

    // Record initial schema version if not already set
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [1],
    )?;

    Ok(())
}

/// Count the number of tables in the database (useful for init confirmation).
pub fn table_count(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
        [],
        |row| row.get(0),
    )?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_tables_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        create_tables(&conn).unwrap();
    }

    #[test]
    fn test_table_count() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        // schema_version, retrain_history
        assert_eq!(table_count(&conn).unwrap(), 2i64);
    }

    #[test]
    fn test_schema_version_recorded_once() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        create_tables(&conn).unwrap();

        let versions: Vec<i64> = conn
            .prepare("SELECT version FROM schema_version ORDER BY version")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .map(|r| r.unwrap())
            .collect();
        assert_eq!(versions, vec![1]);
    }

    #[test]
    fn test_history_table_has_events_column() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();

        let columns: Vec<String> = conn
            .prepare("SELECT name FROM pragma_table_info('retrain_history')")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .map(|r| r.unwrap())
            .collect();
        assert!(columns.iter().any(|c| c == "events"));
    }
}
