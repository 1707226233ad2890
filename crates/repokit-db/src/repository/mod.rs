//! # Repository Module
//!
//! Table-level CRUD built on composable scopes.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  RepositoryConfig (table, pk, timestamps, named scopes)                │
//! │       │  shared via Arc                                                 │
//! │       ▼                                                                 │
//! │  Repository<E>                                                         │
//! │  ├── all / all_where / scoped / named    → new Repository<E>           │
//! │  ├── execute / first / count             → reads                       │
//! │  ├── create / update / destroy           → single row (RETURNING *)    │
//! │  └── update_all / destroy_all            → affected row count          │
//! │       │                                                                 │
//! │       │  Scope::to_sql()                                                │
//! │       ▼                                                                 │
//! │  DbHandle (pool or shared transaction)                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Contents
//!
//! - [`RepositoryConfig`] - Per-table settings and named scopes
//! - [`Repository`] - Queries and writes over one table

pub mod base;
pub mod config;

pub use base::Repository;
pub use config::RepositoryConfig;
