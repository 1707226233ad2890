//! # Executable Handles
//!
//! A [`DbHandle`] is what a repository runs its scopes against: the pool, or
//! a shared transaction.
//!
//! ## Handle Kinds
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         DbHandle                                        │
//! │                                                                         │
//! │  Pool(SqlitePool)            each statement borrows any connection     │
//! │                                                                         │
//! │  Transaction(TxHandle)       Arc<Mutex<Option<Transaction>>>           │
//! │       │                      statements run one at a time on the       │
//! │       │                      transaction's connection                  │
//! │       ├── commit()   ─► Option taken, later use → TransactionClosed    │
//! │       └── rollback() ─► Option taken, later use → TransactionClosed    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Sharing One Transaction
//! ```rust,ignore
//! let tx = db.begin().await?;
//! let orders = orders.transacting(tx.clone());
//! let clients = clients.transacting(tx.clone());
//!
//! let order = orders.create(fields).await?;
//! clients.update(client_id, last_order(&order)).await?;
//! tx.commit().await?;
//! ```

use std::fmt;
use std::sync::Arc;

use repokit_core::{format_timestamp, CompiledQuery, Scope, Value};
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments};
use sqlx::{SqlitePool, Transaction};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::row::{decode_row, Row};

// =============================================================================
// Transaction Handle
// =============================================================================

/// A transaction that several repositories can share.
///
/// Cloning shares the same transaction. Commit and rollback belong to the
/// caller; dropping the last clone of an open handle rolls back.
#[derive(Clone)]
pub struct TxHandle {
    inner: Arc<Mutex<Option<Transaction<'static, Sqlite>>>>,
}

impl TxHandle {
    /// Starts a transaction on a pooled connection.
    pub async fn begin(pool: &SqlitePool) -> DbResult<Self> {
        let tx = pool.begin().await?;
        debug!("Transaction started");

        Ok(TxHandle {
            inner: Arc::new(Mutex::new(Some(tx))),
        })
    }

    pub async fn commit(&self) -> DbResult<()> {
        let tx = self
            .inner
            .lock()
            .await
            .take()
            .ok_or(DbError::TransactionClosed)?;
        tx.commit().await?;

        debug!("Transaction committed");
        Ok(())
    }

    pub async fn rollback(&self) -> DbResult<()> {
        let tx = self
            .inner
            .lock()
            .await
            .take()
            .ok_or(DbError::TransactionClosed)?;
        tx.rollback().await?;

        debug!("Transaction rolled back");
        Ok(())
    }

    /// False once committed or rolled back.
    pub async fn is_open(&self) -> bool {
        self.inner.lock().await.is_some()
    }
}

impl fmt::Debug for TxHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TxHandle").finish_non_exhaustive()
    }
}

// =============================================================================
// DbHandle
// =============================================================================

/// Where a scope gets executed.
#[derive(Debug, Clone)]
pub enum DbHandle {
    Pool(SqlitePool),
    Transaction(TxHandle),
}

impl DbHandle {
    /// Runs the scope and decodes every returned row.
    ///
    /// Statements without a `RETURNING` clause resolve to an empty list.
    pub async fn fetch_all(&self, scope: &Scope) -> DbResult<Vec<Row>> {
        let compiled = scope.to_sql()?;
        debug!(
            table = %scope.table_name(),
            sql = %compiled.sql,
            bindings = compiled.bindings.len(),
            "Fetching rows"
        );

        let rows = match self {
            DbHandle::Pool(pool) => bind_all(&compiled).fetch_all(pool).await?,
            DbHandle::Transaction(tx) => {
                let mut guard = tx.inner.lock().await;
                let conn = guard.as_mut().ok_or(DbError::TransactionClosed)?;
                bind_all(&compiled).fetch_all(&mut **conn).await?
            }
        };

        let decoded = rows
            .iter()
            .map(decode_row)
            .collect::<Result<Vec<_>, _>>()?;

        debug!(rows = decoded.len(), "Rows fetched");
        Ok(decoded)
    }

    /// Runs the scope and returns the number of affected rows.
    pub async fn execute(&self, scope: &Scope) -> DbResult<u64> {
        let compiled = scope.to_sql()?;
        debug!(
            table = %scope.table_name(),
            sql = %compiled.sql,
            bindings = compiled.bindings.len(),
            "Executing statement"
        );

        let result = match self {
            DbHandle::Pool(pool) => bind_all(&compiled).execute(pool).await?,
            DbHandle::Transaction(tx) => {
                let mut guard = tx.inner.lock().await;
                let conn = guard.as_mut().ok_or(DbError::TransactionClosed)?;
                bind_all(&compiled).execute(&mut **conn).await?
            }
        };

        Ok(result.rows_affected())
    }

    pub fn is_transaction(&self) -> bool {
        matches!(self, DbHandle::Transaction(_))
    }
}

impl From<SqlitePool> for DbHandle {
    fn from(pool: SqlitePool) -> Self {
        DbHandle::Pool(pool)
    }
}

impl From<&SqlitePool> for DbHandle {
    fn from(pool: &SqlitePool) -> Self {
        DbHandle::Pool(pool.clone())
    }
}

impl From<TxHandle> for DbHandle {
    fn from(tx: TxHandle) -> Self {
        DbHandle::Transaction(tx)
    }
}

impl From<&TxHandle> for DbHandle {
    fn from(tx: &TxHandle) -> Self {
        DbHandle::Transaction(tx.clone())
    }
}

/// Binds every positional value. Timestamps go in as RFC 3339 text.
fn bind_all(compiled: &CompiledQuery) -> Query<'_, Sqlite, SqliteArguments<'_>> {
    compiled
        .bindings
        .iter()
        .fold(sqlx::query(&compiled.sql), |query, value| match value {
            Value::Null => query.bind(None::<String>),
            Value::Bool(b) => query.bind(*b),
            Value::Integer(n) => query.bind(*n),
            Value::Real(x) => query.bind(*x),
            Value::Text(s) => query.bind(s.as_str()),
            Value::Blob(bytes) => query.bind(bytes.as_slice()),
            Value::Timestamp(ts) => query.bind(format_timestamp(ts)),
        })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use repokit_core::Fields;
    use serde_json::json;

    async fn setup() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        sqlx::query(
            "CREATE TABLE items (
                id INTEGER PRIMARY KEY,
                label TEXT,
                weight REAL,
                raw BLOB,
                in_stock BOOLEAN
            )",
        )
        .execute(db.pool())
        .await
        .unwrap();
        db
    }

    #[tokio::test]
    async fn test_decodes_storage_classes() {
        let db = setup().await;
        let handle = db.handle();

        let insert = Scope::table("items")
            .insert(
                Fields::new()
                    .with("label", "bolt")
                    .with("weight", 1.5)
                    .with("raw", vec![1_u8, 2])
                    .with("in_stock", true),
            )
            .returning_all();
        let rows = handle.fetch_all(&insert).await.unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["id"], json!(1));
        assert_eq!(rows[0]["label"], json!("bolt"));
        assert_eq!(rows[0]["weight"], json!(1.5));
        assert_eq!(rows[0]["raw"], json!([1, 2]));
        assert_eq!(rows[0]["in_stock"], json!(true));
    }

    #[tokio::test]
    async fn test_execute_counts_affected_rows() {
        let db = setup().await;
        let handle = db.handle();

        for label in ["a", "b", "c"] {
            handle
                .execute(&Scope::table("items").insert(Fields::new().with("label", label)))
                .await
                .unwrap();
        }

        let deleted = handle
            .execute(&Scope::table("items").where_in("label", ["a", "b"]).delete())
            .await
            .unwrap();
        assert_eq!(deleted, 2);
    }

    #[tokio::test]
    async fn test_finished_transaction_is_closed() {
        let db = setup().await;
        let tx = db.begin().await.unwrap();
        tx.commit().await.unwrap();

        assert!(!tx.is_open().await);
        let err = DbHandle::from(&tx)
            .fetch_all(&Scope::table("items"))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::TransactionClosed));
        assert!(matches!(tx.rollback().await, Err(DbError::TransactionClosed)));
    }

    #[tokio::test]
    async fn test_database_errors_propagate() {
        let db = setup().await;
        let err = db
            .handle()
            .fetch_all(&Scope::table("missing_table"))
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::Sqlx(sqlx::Error::Database(_))));
    }
}
