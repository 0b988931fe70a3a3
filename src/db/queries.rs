// Database queries — CRUD operations for the history tables.
//
// Every database interaction goes through this module. This keeps SQL
// contained in one place and gives the rest of the app clean Rust interfaces.

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::models::{RetrainEntry, RetrainKind, RetrainRecord};

/// Record a retrain and return its row ID.
pub fn insert_retrain(conn: &Connection, entry: &RetrainEntry) -> Result<i64> {
    conn.execute(
        "INSERT INTO retrain_history
            (kind, attack_rate, tau1, tau2, d_tau1, d_tau2, cost, fallback_used, events)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            entry.kind.as_str(),
            entry.attack_rate,
            entry.tau1,
            entry.tau2,
            entry.d_tau1,
            entry.d_tau2,
            entry.cost,
            entry.fallback_used,
            entry.events,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// The most recent `limit` retrains, returned oldest first (chart order).
pub fn get_recent_retrains(conn: &Connection, limit: u32) -> Result<Vec<RetrainRecord>> {
    let mut stmt = conn.prepare(
        "SELECT id, kind, attack_rate, tau1, tau2, d_tau1, d_tau2, cost,
                fallback_used, events, recorded_at
         FROM retrain_history
         ORDER BY id DESC
         LIMIT ?1",
    )?;
    let mut records = stmt
        .query_map(params![limit], row_to_record)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("Failed to read retrain history")?;
    records.reverse();
    Ok(records)
}

/// The latest retrain, if any.
pub fn get_last_retrain(conn: &Connection) -> Result<Option<RetrainRecord>> {
    let record = conn
        .query_row(
            "SELECT id, kind, attack_rate, tau1, tau2, d_tau1, d_tau2, cost,
                    fallback_used, events, recorded_at
             FROM retrain_history
             ORDER BY id DESC
             LIMIT 1",
            [],
            row_to_record,
        )
        .optional()?;
    Ok(record)
}

/// Delete all history rows. Returns how many were removed.
pub fn clear_history(conn: &Connection) -> Result<usize> {
    let removed = conn.execute("DELETE FROM retrain_history", [])?;
    Ok(removed)
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<RetrainRecord> {
    let kind: String = row.get(1)?;
    Ok(RetrainRecord {
        id: row.get(0)?,
        // Unknown kinds (hand-edited rows) display as baseline
        kind: RetrainKind::parse(&kind).unwrap_or(RetrainKind::Baseline),
        attack_rate: row.get(2)?,
        tau1: row.get(3)?,
        tau2: row.get(4)?,
        d_tau1: row.get(5)?,
        d_tau2: row.get(6)?,
        cost: row.get(7)?,
        fallback_used: row.get(8)?,
        events: row.get(9)?,
        recorded_at: row.get(10)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema::create_tables;

    fn entry(kind: RetrainKind, tau1: f64, tau2: f64) -> RetrainEntry {
        RetrainEntry {
            kind,
            attack_rate: None,
            tau1,
            tau2,
            d_tau1: 0.0,
            d_tau2: 0.0,
            cost: 12.0,
            fallback_used: false,
            events: 200,
        }
    }

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        conn
    }

    #[test]
    fn test_insert_and_read_back() {
        let conn = conn();
        let id = insert_retrain(&conn, &entry(RetrainKind::Attack, 0.1, 0.5)).unwrap();
        let last = get_last_retrain(&conn).unwrap().unwrap();
        assert_eq!(last.id, id);
        assert_eq!(last.kind, RetrainKind::Attack);
        assert_eq!(last.events, 200);
        assert!(!last.fallback_used);
    }

    #[test]
    fn test_recent_is_oldest_first_and_limited() {
        let conn = conn();
        for i in 0..5 {
            insert_retrain(&conn, &entry(RetrainKind::Benign, 0.1 + i as f64 * 0.01, 0.9)).unwrap();
        }
        let recent = get_recent_retrains(&conn, 3).unwrap();
        assert_eq!(recent.len(), 3);
        assert!(recent[0].id < recent[2].id);
        assert!((recent[2].tau1 - 0.14).abs() < 1e-12);
    }

    #[test]
    fn test_clear_history() {
        let conn = conn();
        insert_retrain(&conn, &entry(RetrainKind::Baseline, 0.1, 0.9)).unwrap();
        assert_eq!(clear_history(&conn).unwrap(), 1);
        assert!(get_last_retrain(&conn).unwrap().is_none());
    }
}
