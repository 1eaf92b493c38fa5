pub mod migrations;
pub mod models;
pub mod queries;

use std::path::Path;
use std::sync::Mutex;

use anyhow::Result;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use tracing::info;

pub use rusqlite;

/// The ledger store: one SQLite connection behind a mutex. The mutex is
/// what serializes conflicting mutations; `with_tx` adds the transaction
/// boundary around multi-statement units.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        // WAL mode for concurrent reads
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        migrations::run(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory store, used by tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        migrations::run(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| anyhow::anyhow!("DB lock poisoned: {}", e))?;
        f(&conn)
    }

    /// Run `f` inside an IMMEDIATE transaction: commit on `Ok`, roll back
    /// on any `Err`. Every multi-statement mutation goes through here; the
    /// read-check-write sequence under the writer lock is what makes
    /// conflicting state transitions observe each other.
    pub fn with_tx<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T, E>,
        E: From<anyhow::Error>,
    {
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| anyhow::anyhow!("DB lock poisoned: {}", e))?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(anyhow::Error::from)?;
        let out = f(&tx)?;
        tx.commit().map_err(anyhow::Error::from)?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_tx_rolls_back_on_error() {
        let db = Database::open_in_memory().unwrap();

        let result: Result<(), anyhow::Error> = db.with_tx(|tx| {
            tx.execute(
                "INSERT INTO pixel_blocks (id, name) VALUES ('ghost', 'Ghost')",
                [],
            )?;
            anyhow::bail!("abort after insert");
        });
        assert!(result.is_err());

        let count: i64 = db
            .with_conn(|conn| {
                Ok(conn.query_row(
                    "SELECT count(*) FROM pixel_blocks WHERE id = 'ghost'",
                    [],
                    |row| row.get(0),
                )?)
            })
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn with_tx_commits_on_ok() {
        let db = Database::open_in_memory().unwrap();

        db.with_tx(|tx| -> Result<()> {
            tx.execute(
                "INSERT INTO pixel_blocks (id, name) VALUES ('kept', 'Kept')",
                [],
            )?;
            Ok(())
        })
        .unwrap();

        let count: i64 = db
            .with_conn(|conn| {
                Ok(conn.query_row(
                    "SELECT count(*) FROM pixel_blocks WHERE id = 'kept'",
                    [],
                    |row| row.get(0),
                )?)
            })
            .unwrap();
        assert_eq!(count, 1);
    }
}
