use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{Connection, Transaction, params};

use crate::model::TransactionRecord;
use crate::util::{ensure_directory, now_utc_string};

/// Persistence seam for extracted transactions. Extractors submit
/// records one at a time and commit once per table, so persistence is
/// atomic per table.
pub trait TransactionStore {
    fn add(&mut self, record: &TransactionRecord) -> Result<()>;
    fn commit_batch(&mut self) -> Result<()>;
}

/// Opens (creating if needed) the database that backs one processing
/// session. The connection is the session: dropping it releases the
/// session on every exit path.
pub fn open_connection(db_path: &Path) -> Result<Connection> {
    if let Some(parent) = db_path.parent() {
        ensure_directory(parent)?;
    }

    let connection = Connection::open(db_path)
        .with_context(|| format!("failed to open database: {}", db_path.display()))?;
    configure_connection(&connection)?;
    ensure_schema(&connection)?;

    Ok(connection)
}

fn configure_connection(connection: &Connection) -> Result<()> {
    connection
        .pragma_update(None, "journal_mode", "WAL")
        .context("failed to set journal_mode=WAL")?;
    connection
        .pragma_update(None, "synchronous", "NORMAL")
        .context("failed to set synchronous=NORMAL")?;
    Ok(())
}

pub fn ensure_schema(connection: &Connection) -> Result<()> {
    connection
        .execute_batch(
            "
            CREATE TABLE IF NOT EXISTS documents (
              document_id INTEGER PRIMARY KEY,
              fund_id INTEGER NOT NULL,
              source TEXT,
              status TEXT NOT NULL,
              processed_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS capital_calls (
              id INTEGER PRIMARY KEY AUTOINCREMENT,
              fund_id INTEGER NOT NULL,
              call_date TEXT NOT NULL,
              call_type TEXT NOT NULL,
              amount REAL NOT NULL,
              description TEXT,
              created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS distributions (
              id INTEGER PRIMARY KEY AUTOINCREMENT,
              fund_id INTEGER NOT NULL,
              distribution_date TEXT NOT NULL,
              distribution_type TEXT NOT NULL,
              is_recallable INTEGER NOT NULL DEFAULT 0,
              amount REAL NOT NULL,
              description TEXT,
              created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS adjustments (
              id INTEGER PRIMARY KEY AUTOINCREMENT,
              fund_id INTEGER NOT NULL,
              adjustment_date TEXT NOT NULL,
              adjustment_type TEXT NOT NULL,
              category TEXT,
              amount REAL NOT NULL,
              is_contribution_adjustment INTEGER NOT NULL DEFAULT 0,
              description TEXT,
              created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS document_chunks (
              document_id INTEGER NOT NULL,
              chunk_index INTEGER NOT NULL,
              fund_id INTEGER NOT NULL,
              page INTEGER NOT NULL,
              content TEXT NOT NULL,
              text_hash TEXT NOT NULL,
              indexed_at TEXT NOT NULL,
              PRIMARY KEY(document_id, chunk_index)
            );
            ",
        )
        .context("failed to create schema")?;

    Ok(())
}

/// Upserts the bookkeeping row for a processed document.
pub fn record_document(
    connection: &Connection,
    document_id: i64,
    fund_id: i64,
    source: Option<&str>,
    status: &str,
) -> Result<()> {
    connection
        .execute(
            "
            INSERT INTO documents(document_id, fund_id, source, status, processed_at)
            VALUES(?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(document_id) DO UPDATE SET
              fund_id=excluded.fund_id,
              source=excluded.source,
              status=excluded.status,
              processed_at=excluded.processed_at
            ",
            params![document_id, fund_id, source, status, now_utc_string()],
        )
        .context("failed to record document")?;

    Ok(())
}

pub struct SqliteStore<'a> {
    connection: &'a Connection,
    pending: Vec<TransactionRecord>,
}

impl<'a> SqliteStore<'a> {
    pub fn new(connection: &'a Connection) -> Self {
        Self {
            connection,
            pending: Vec::new(),
        }
    }
}

impl TransactionStore for SqliteStore<'_> {
    fn add(&mut self, record: &TransactionRecord) -> Result<()> {
        self.pending.push(record.clone());
        Ok(())
    }

    fn commit_batch(&mut self) -> Result<()> {
        // A failed batch is dropped rather than retried with the next
        // table's records.
        let pending = std::mem::take(&mut self.pending);
        if pending.is_empty() {
            return Ok(());
        }

        let tx = self
            .connection
            .unchecked_transaction()
            .context("failed to begin transaction batch")?;
        for record in &pending {
            insert_record(&tx, record)?;
        }
        tx.commit().context("failed to commit transaction batch")?;

        Ok(())
    }
}

fn insert_record(tx: &Transaction<'_>, record: &TransactionRecord) -> Result<()> {
    match record {
        TransactionRecord::CapitalCall {
            fund_id,
            date,
            amount,
            call_type,
        } => {
            tx.execute(
                "
                INSERT INTO capital_calls(fund_id, call_date, call_type, amount, description, created_at)
                VALUES(?1, ?2, ?3, ?4, ?5, ?6)
                ",
                params![fund_id, date, call_type, amount, call_type, now_utc_string()],
            )
            .context("failed to insert capital call")?;
        }
        TransactionRecord::Distribution {
            fund_id,
            date,
            amount,
            distribution_type,
            is_recallable,
        } => {
            tx.execute(
                "
                INSERT INTO distributions(fund_id, distribution_date, distribution_type, is_recallable, amount, description, created_at)
                VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7)
                ",
                params![
                    fund_id,
                    date,
                    distribution_type,
                    is_recallable,
                    amount,
                    distribution_type,
                    now_utc_string(),
                ],
            )
            .context("failed to insert distribution")?;
        }
        TransactionRecord::Adjustment {
            fund_id,
            date,
            amount,
            adjustment_type,
            is_contribution_adjustment,
        } => {
            tx.execute(
                "
                INSERT INTO adjustments(fund_id, adjustment_date, adjustment_type, category, amount, is_contribution_adjustment, description, created_at)
                VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                ",
                params![
                    fund_id,
                    date,
                    adjustment_type,
                    adjustment_type,
                    amount,
                    is_contribution_adjustment,
                    adjustment_type,
                    now_utc_string(),
                ],
            )
            .context("failed to insert adjustment")?;
        }
    }

    Ok(())
}

/// In-memory store used by table and pipeline tests.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryStore {
    pub committed: Vec<TransactionRecord>,
    pub pending: Vec<TransactionRecord>,
    pub commits: usize,
}

#[cfg(test)]
impl TransactionStore for MemoryStore {
    fn add(&mut self, record: &TransactionRecord) -> Result<()> {
        self.pending.push(record.clone());
        Ok(())
    }

    fn commit_batch(&mut self) -> Result<()> {
        self.committed.append(&mut self.pending);
        self.commits += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rusqlite::Connection;

    use super::*;

    fn memory_connection() -> Connection {
        let connection = Connection::open_in_memory().expect("open in-memory database");
        ensure_schema(&connection).expect("create schema");
        connection
    }

    fn query_count(connection: &Connection, sql: &str) -> i64 {
        connection
            .query_row(sql, [], |row| row.get(0))
            .expect("count query")
    }

    #[test]
    fn commit_batch_persists_all_pending_records() {
        let connection = memory_connection();
        let mut store = SqliteStore::new(&connection);

        store
            .add(&TransactionRecord::CapitalCall {
                fund_id: 7,
                date: NaiveDate::from_ymd_opt(2023, 1, 15).unwrap(),
                amount: 100_000.0,
                call_type: "Capital Call".to_string(),
            })
            .unwrap();
        store
            .add(&TransactionRecord::Distribution {
                fund_id: 7,
                date: NaiveDate::from_ymd_opt(2023, 6, 30).unwrap(),
                amount: 25_000.0,
                distribution_type: "Return of Capital".to_string(),
                is_recallable: true,
            })
            .unwrap();
        store.commit_batch().unwrap();

        assert_eq!(query_count(&connection, "SELECT COUNT(*) FROM capital_calls"), 1);
        assert_eq!(query_count(&connection, "SELECT COUNT(*) FROM distributions"), 1);

        let recallable: i64 = connection
            .query_row("SELECT is_recallable FROM distributions", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(recallable, 1);
    }

    #[test]
    fn empty_commit_is_a_no_op() {
        let connection = memory_connection();
        let mut store = SqliteStore::new(&connection);

        store.commit_batch().unwrap();
        assert_eq!(query_count(&connection, "SELECT COUNT(*) FROM capital_calls"), 0);
    }

    #[test]
    fn adjustment_rows_keep_their_sign() {
        let connection = memory_connection();
        let mut store = SqliteStore::new(&connection);

        store
            .add(&TransactionRecord::Adjustment {
                fund_id: 3,
                date: NaiveDate::from_ymd_opt(2023, 3, 1).unwrap(),
                amount: -500.0,
                adjustment_type: "Capital Rebalance".to_string(),
                is_contribution_adjustment: true,
            })
            .unwrap();
        store.commit_batch().unwrap();

        let amount: f64 = connection
            .query_row("SELECT amount FROM adjustments", [], |row| row.get(0))
            .unwrap();
        assert_eq!(amount, -500.0);
    }

    #[test]
    fn record_document_upserts_on_reprocess() {
        let connection = memory_connection();

        record_document(&connection, 11, 7, Some("q3.pdf"), "failed").unwrap();
        record_document(&connection, 11, 7, Some("q3.pdf"), "completed").unwrap();

        assert_eq!(query_count(&connection, "SELECT COUNT(*) FROM documents"), 1);
        let status: String = connection
            .query_row("SELECT status FROM documents WHERE document_id = 11", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(status, "completed");
    }
}
