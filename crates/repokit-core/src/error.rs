//! # Error Types
//!
//! Builder errors for repokit-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  repokit-core errors (this file)                                       │
//! │  └── CoreError        - A scope or key cannot be turned into SQL       │
//! │                                                                         │
//! │  repokit-db errors (separate crate)                                    │
//! │  └── DbError          - Execution, hydration, handle failures          │
//! │                                                                         │
//! │  Flow: CoreError → DbError::Core → caller                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! These are the only errors the pure half can produce. Anything the
//! database says comes out of repokit-db untouched.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Errors raised while building or compiling a scope.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    /// `update` was compiled with no columns to set.
    ///
    /// ## When This Occurs
    /// - `update_all(Fields::new())` on a repository without timestamps
    /// - `Scope::update` called with an empty mapping
    #[error("Empty update on table {table}: nothing to set")]
    EmptyUpdate { table: String },

    /// A composite key was given the wrong number of values.
    ///
    /// ## Example
    /// ```text
    /// pk = ["tenant_id", "id"]     value = [1]
    ///                                │
    ///                                ▼
    /// PrimaryKeyArity { expected: 2, actual: 1 }
    /// ```
    #[error("Primary key expects {expected} values, got {actual}")]
    PrimaryKeyArity { expected: usize, actual: usize },

    /// A scalar key value was given for a composite key, or a list for a
    /// single-column key.
    #[error("Primary key {key} cannot be matched by a {given} value")]
    PrimaryKeyShape { key: String, given: &'static str },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::PrimaryKeyArity {
            expected: 2,
            actual: 1,
        };
        assert_eq!(err.to_string(), "Primary key expects 2 values, got 1");

        let err = CoreError::EmptyUpdate {
            table: "records".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Empty update on table records: nothing to set"
        );
    }
}
