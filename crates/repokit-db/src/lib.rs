//! # repokit-db: Database Layer for repokit
//!
//! Runs [`repokit_core::Scope`]s against SQLite through sqlx and builds the
//! [`Repository`] API on top of them.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         repokit Data Flow                               │
//! │                                                                         │
//! │  Application code                                                      │
//! │       │  records.all_where([("name", "bar")]).execute().await          │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   repokit-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repository   │    │   DbHandle   │  │   │
//! │  │   │   (pool.rs)   │    │ (repository/) │    │ (handle.rs)  │  │   │
//! │  │   │               │    │               │    │              │  │   │
//! │  │   │ SqlitePool    │───►│ Scope         │───►│ Pool or      │  │   │
//! │  │   │ DbConfig      │    │ composition   │    │ Transaction  │  │   │
//! │  │   │               │    │ Entity<E>     │◄───│ Row decoding │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`handle`] - Pool and transaction handles that execute scopes
//! - [`row`] - Row decoding and entity hydration
//! - [`repository`] - The repository itself and its configuration
//! - [`error`] - Database error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use repokit_db::{Database, DbConfig, Fields, RepositoryConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/db.sqlite")).await?;
//! let records = db.repository(RepositoryConfig::new("records"));
//!
//! let created = records.create(Fields::new().with("name", "foo")).await?;
//! let foos = records.all_where([("name", "foo")]).count().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod handle;
pub mod pool;
pub mod repository;
pub mod row;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use handle::{DbHandle, TxHandle};
pub use pool::{Database, DbConfig};
pub use repository::{Repository, RepositoryConfig};
pub use row::{Entity, Row};

// Core types used in repository signatures
pub use repokit_core::{
    Conditions, Direction, Fields, Operator, PkValue, PrimaryKey, Scope, ScopeRegistry,
    TimestampEvent, Timestamps, Value,
};
