//! # Repository Configuration
//!
//! Everything that describes a KIND of repository: table, key, timestamp
//! columns and named scopes. One configuration is wrapped in an `Arc` and
//! shared by every repository derived from it (`scoped`, `all`, `named`,
//! `transacting`, ...).
//!
//! ## Example
//! ```rust,ignore
//! let config = RepositoryConfig::new("records")
//!     .pk("id")
//!     .scope("bars", |scope, _| scope.where_eq("name", "bar"));
//!
//! let orders = RepositoryConfig::new("order_lines")
//!     .pk(["order_id", "line_no"])
//!     .without_timestamps();
//! ```

use repokit_core::{PrimaryKey, Scope, ScopeRegistry, Timestamps, Value};

/// Type-level repository settings.
///
/// | Setting | Default |
/// |---------|---------|
/// | primary key | `id` |
/// | timestamps | `created_at` / `updated_at` |
/// | named scopes | none |
#[derive(Debug, Clone)]
pub struct RepositoryConfig {
    table_name: String,
    pk: PrimaryKey,
    timestamps: Option<Timestamps>,
    scopes: ScopeRegistry,
}

impl RepositoryConfig {
    pub fn new(table_name: impl Into<String>) -> Self {
        RepositoryConfig {
            table_name: table_name.into(),
            pk: PrimaryKey::default(),
            timestamps: Some(Timestamps::default()),
            scopes: ScopeRegistry::new(),
        }
    }

    /// Overrides the table name.
    pub fn table_name(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = table_name.into();
        self
    }

    /// Sets the primary-key column, or columns for a composite key.
    pub fn pk(mut self, pk: impl Into<PrimaryKey>) -> Self {
        self.pk = pk.into();
        self
    }

    pub fn timestamps(mut self, timestamps: Timestamps) -> Self {
        self.timestamps = Some(timestamps);
        self
    }

    /// Turns timestamp injection off entirely.
    pub fn without_timestamps(mut self) -> Self {
        self.timestamps = None;
        self
    }

    /// Registers one named scope.
    pub fn scope<F>(mut self, name: impl Into<String>, scope: F) -> Self
    where
        F: Fn(Scope, &[Value]) -> Scope + Send + Sync + 'static,
    {
        self.scopes.insert(name, scope);
        self
    }

    /// Replaces the named-scope registry.
    pub fn scopes(mut self, scopes: ScopeRegistry) -> Self {
        self.scopes = scopes;
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn table(&self) -> &str {
        &self.table_name
    }

    pub fn primary_key(&self) -> &PrimaryKey {
        &self.pk
    }

    pub fn timestamp_columns(&self) -> Option<&Timestamps> {
        self.timestamps.as_ref()
    }

    pub fn registry(&self) -> &ScopeRegistry {
        &self.scopes
    }

    /// All rows of the configured table.
    pub fn default_scope(&self) -> Scope {
        Scope::table(&self.table_name)
    }
}
