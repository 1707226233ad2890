//! # Database Error Types
//!
//! Error types for database operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError::Sqlx ← carried as-is, never re-categorized                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Caller inspects with is_unique_violation() / is_not_found() / ...     │
//! │                                                                         │
//! │  Builder errors (CoreError) and hydration errors sit next to it.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use repokit_core::CoreError;
use thiserror::Error;

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// The database rejected or failed the statement.
    ///
    /// ## When This Occurs
    /// - Constraint violation (UNIQUE, FOREIGN KEY, NOT NULL)
    /// - Unknown table or column
    /// - Pool timeout or closed pool
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    /// The scope could not be compiled.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A decoded row did not deserialize into the entity type.
    #[error("Cannot hydrate row from {table}: {source}")]
    Hydrate {
        table: String,
        #[source]
        source: serde_json::Error,
    },

    /// A count query returned something other than `[{count: n}]`.
    #[error("Invalid count result: {0}")]
    InvalidCount(String),

    /// `named()` was called with a name the configuration never registered.
    #[error("Unknown scope: {0}")]
    UnknownScope(String),

    /// An `INSERT ... RETURNING *` came back empty.
    #[error("Insert into {table} returned no row")]
    NothingReturned { table: String },

    /// The transaction behind a handle was already committed or rolled back.
    #[error("Transaction already finished")]
    TransactionClosed,

    /// Database connection failed.
    ///
    /// ## When This Occurs
    /// - Database file can't be created
    /// - File permissions issue
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Configuration could not be read or is invalid.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl DbError {
    /// True for SQLite UNIQUE / PRIMARY KEY violations.
    pub fn is_unique_violation(&self) -> bool {
        self.database_message()
            .is_some_and(|msg| msg.contains("UNIQUE constraint failed"))
    }

    /// True for SQLite FOREIGN KEY violations.
    pub fn is_foreign_key_violation(&self) -> bool {
        self.database_message()
            .is_some_and(|msg| msg.contains("FOREIGN KEY constraint failed"))
    }

    /// True when sqlx reported `RowNotFound`.
    pub fn is_not_found(&self) -> bool {
        matches!(self, DbError::Sqlx(sqlx::Error::RowNotFound))
    }

    /// Column named by a UNIQUE violation (`table.column`), if any.
    ///
    /// ```text
    /// "UNIQUE constraint failed: records.name" → Some("records.name")
    /// ```
    pub fn unique_violation_field(&self) -> Option<String> {
        self.database_message().and_then(|msg| {
            msg.split("UNIQUE constraint failed: ")
                .nth(1)
                .map(str::to_string)
        })
    }

    fn database_message(&self) -> Option<String> {
        match self {
            DbError::Sqlx(sqlx::Error::Database(db_err)) => Some(db_err.message().to_string()),
            _ => None,
        }
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::RepositoryConfig;

    #[test]
    fn test_error_messages() {
        let err = DbError::UnknownScope("bars".to_string());
        assert_eq!(err.to_string(), "Unknown scope: bars");

        let err = DbError::from(CoreError::PrimaryKeyArity {
            expected: 2,
            actual: 3,
        });
        assert_eq!(err.to_string(), "Primary key expects 2 values, got 3");
    }

    #[test]
    fn test_sqlx_errors_pass_through() {
        let err = DbError::from(sqlx::Error::RowNotFound);
        assert!(err.is_not_found());
        assert!(!err.is_unique_violation());
        assert_eq!(err.to_string(), sqlx::Error::RowNotFound.to_string());
    }

    async fn constrained_db() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        sqlx::query(
            "CREATE TABLE labels (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT UNIQUE,
                created_at TEXT,
                updated_at TEXT
            )",
        )
        .execute(db.pool())
        .await
        .unwrap();
        sqlx::query(
            "CREATE TABLE tagged (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                label_id INTEGER NOT NULL REFERENCES labels(id)
            )",
        )
        .execute(db.pool())
        .await
        .unwrap();
        db
    }

    #[tokio::test]
    async fn test_unique_violation_names_column() {
        let db = constrained_db().await;
        let labels = db.repository(RepositoryConfig::new("labels"));

        labels.create([("name", "urgent")]).await.unwrap();
        let err = labels.create([("name", "urgent")]).await.unwrap_err();

        assert!(err.is_unique_violation());
        assert!(!err.is_foreign_key_violation());
        assert_eq!(err.unique_violation_field().as_deref(), Some("labels.name"));
    }

    #[tokio::test]
    async fn test_foreign_key_violation() {
        let db = constrained_db().await;
        let tagged = db.repository(RepositoryConfig::new("tagged").without_timestamps());

        let err = tagged.create([("label_id", 99)]).await.unwrap_err();

        assert!(err.is_foreign_key_violation());
        assert!(!err.is_unique_violation());
        assert_eq!(err.unique_violation_field(), None);
    }
}
