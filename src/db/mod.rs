// Database layer — SQLite storage for threshold history.
//
// The models and the Database trait are always available; the rusqlite
// backend is behind the default `sqlite` feature.
//
// We use rusqlite with the "bundled" feature so there's no system SQLite
// dependency. The database file lives wherever RISKGATE_DB_PATH points
// (defaults to riskgate.db in the store directory).

pub mod models;
#[cfg(feature = "sqlite")]
pub mod queries;
#[cfg(feature = "sqlite")]
pub mod schema;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod traits;

#[cfg(feature = "sqlite")]
use anyhow::{Context, Result};
#[cfg(feature = "sqlite")]
use rusqlite::Connection;
#[cfg(feature = "sqlite")]
use std::path::Path;
#[cfg(feature = "sqlite")]
use std::sync::Arc;

pub use traits::Database;

#[cfg(feature = "sqlite")]
/// Open (or create) the database, run migrations, and wrap it.
///
/// Called by `riskgate init` and by `tune` so the first retrain works
/// without a separate init step.
pub fn initialize_sqlite(db_path: &Path) -> Result<Arc<dyn Database>> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!(
                    "Failed to create directory for database: {}",
                    db_path.display()
                )
            })?;
        }
    }

    let conn = Connection::open(db_path)
        .with_context(|| format!("Failed to open database at {}", db_path.display()))?;

    // Enable WAL mode for better concurrent read performance
    conn.pragma_update(None, "journal_mode", "WAL")?;

    schema::create_tables(&conn)?;

    Ok(Arc::new(sqlite::SqliteDatabase::new(conn)))
}

#[cfg(feature = "sqlite")]
/// Open an existing database (fails if it doesn't exist yet).
pub fn open_sqlite(db_path: &Path) -> Result<Arc<dyn Database>> {
    if !db_path.exists() {
        anyhow::bail!(
            "Database not found at {}. Run `riskgate init` first.",
            db_path.display()
        );
    }

    let conn = Connection::open(db_path)
        .with_context(|| format!("Failed to open database at {}", db_path.display()))?;

    conn.pragma_update(None, "journal_mode", "WAL")?;
    // Pick up migrations added since the file was created
    schema::create_tables(&conn)?;

    Ok(Arc::new(sqlite::SqliteDatabase::new(conn)))
}

#[cfg(feature = "sqlite")]
/// In-memory database, for tests and dry runs.
pub fn open_in_memory() -> Result<Arc<dyn Database>> {
    let conn = Connection::open_in_memory()?;
    schema::create_tables(&conn)?;
    Ok(Arc::new(sqlite::SqliteDatabase::new(conn)))
}
