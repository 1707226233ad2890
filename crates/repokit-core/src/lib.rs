//! # repokit-core: Pure Query Building for repokit
//!
//! Everything a repository needs to decide WHAT to run, with zero I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        repokit Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Application code                             │   │
//! │  │    records.all_where(..)   records.create(..)   records.named(..)│   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 repokit-db (Repository<E>)                      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ repokit-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   value   │  │   scope   │  │   keys    │  │ timestamps│  │   │
//! │  │   │  Value    │  │  Scope    │  │PrimaryKey │  │ Timestamps│  │   │
//! │  │   │  Fields   │  │  to_sql   │  │ PkValue   │  │  apply    │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • SQL TEXT + BINDINGS ONLY              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`value`] - `Value`, `Fields` / `Conditions`
//! - [`scope`] - the composable `Scope` and its SQLite compiler
//! - [`sql`] - identifier quoting, `CompiledQuery`, literal quoting
//! - [`keys`] - primary keys and key → conditions
//! - [`timestamps`] - created/updated timestamp policy
//! - [`registry`] - named scopes
//! - [`error`] - builder errors
//!
//! ## Example Usage
//!
//! ```rust
//! use repokit_core::{PrimaryKey, Scope};
//!
//! let pk = PrimaryKey::from(["tenant_id", "id"]);
//! let conditions = pk.conditions([1, 2]).unwrap();
//!
//! let compiled = Scope::table("orders")
//!     .where_conditions(conditions)
//!     .delete()
//!     .returning_all()
//!     .to_sql()
//!     .unwrap();
//!
//! assert_eq!(
//!     compiled.sql,
//!     "DELETE FROM `orders` WHERE `id` = ? AND `tenant_id` = ? RETURNING *"
//! );
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod keys;
pub mod registry;
pub mod scope;
pub mod sql;
pub mod timestamps;
pub mod value;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult};
pub use keys::{PkValue, PrimaryKey};
pub use registry::{ScopeFn, ScopeRegistry};
pub use scope::{Direction, Operator, Scope};
pub use sql::{quote, quote_identifier, quote_list, CompiledQuery};
pub use timestamps::{apply_timestamps, TimestampEvent, Timestamps};
pub use value::{format_timestamp, Conditions, Fields, Value};
