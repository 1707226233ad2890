//! # Repository
//!
//! CRUD convenience over a [`Scope`], with optional hydration into an
//! [`Entity`] type and automatic timestamps.
//!
//! ## Scope Composition
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    How Repositories Derive                              │
//! │                                                                         │
//! │  records                      scope: SELECT * FROM records             │
//! │     │                                                                   │
//! │     │ .all_where({name: "bar"})                                        │
//! │     ▼                                                                   │
//! │  bars (new Repository)        scope: ... WHERE name = 'bar'            │
//! │     │                                                                   │
//! │     ├── .execute()   → Vec<E>  (hydrated rows)                         │
//! │     ├── .count()     → SELECT count(*) ... WHERE name = 'bar'          │
//! │     └── .destroy_all() → DELETE ... WHERE name = 'bar'                 │
//! │                                                                         │
//! │  `records` itself is untouched: every derivation clones the scope.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Single-Row Results
//! `create`, `update` and `destroy` run with `RETURNING *` and keep the LAST
//! returned row. When several rows match an update or destroy, all of them
//! are changed and the last one is returned.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use chrono::Utc;
use repokit_core::{
    quote, quote_list, CompiledQuery, Conditions, Fields, PkValue, Scope, TimestampEvent, Value,
};
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::handle::DbHandle;
use crate::repository::config::RepositoryConfig;
use crate::row::{hydrate, Entity, Row};

/// A repository over one table.
///
/// `E` is the entity rows are hydrated into; the default, [`Row`], passes
/// rows through unchanged.
///
/// ## Usage
/// ```rust,ignore
/// let records: Repository<Record> = Repository::new(db.handle(), config);
///
/// let created = records.create(Fields::new().with("name", "foo")).await?;
/// let foos = records.all_where([("name", "foo")]).execute().await?;
/// let removed = records.destroy(created.id).await?;
/// ```
pub struct Repository<E = Row> {
    db: DbHandle,
    config: Arc<RepositoryConfig>,
    scope: Scope,
    entity: PhantomData<fn() -> E>,
}

impl<E> Clone for Repository<E> {
    fn clone(&self) -> Self {
        Repository {
            db: self.db.clone(),
            config: Arc::clone(&self.config),
            scope: self.scope.clone(),
            entity: PhantomData,
        }
    }
}

impl<E> fmt::Debug for Repository<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repository")
            .field("table", &self.config.table())
            .field("scope", &self.scope)
            .field("transaction", &self.db.is_transaction())
            .finish()
    }
}

impl<E: Entity> Repository<E> {
    // =========================================================================
    // Construction
    // =========================================================================

    /// A repository over all rows of the configured table.
    pub fn new(db: impl Into<DbHandle>, config: RepositoryConfig) -> Self {
        let scope = config.default_scope();
        Self::with_scope(db, config, scope)
    }

    /// A repository over an explicit starting scope.
    pub fn with_scope(db: impl Into<DbHandle>, config: RepositoryConfig, scope: Scope) -> Self {
        Repository {
            db: db.into(),
            config: Arc::new(config),
            scope,
            entity: PhantomData,
        }
    }

    /// Same handle and configuration, another scope.
    fn derive(&self, db: DbHandle, scope: Scope) -> Self {
        Repository {
            db,
            config: Arc::clone(&self.config),
            scope,
            entity: PhantomData,
        }
    }

    /// The same repository, hydrating into `T` instead.
    pub fn with_entity<T: Entity>(&self) -> Repository<T> {
        Repository {
            db: self.db.clone(),
            config: Arc::clone(&self.config),
            scope: self.scope.clone(),
            entity: PhantomData,
        }
    }

    pub fn db(&self) -> &DbHandle {
        &self.db
    }

    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    pub fn table_name(&self) -> &str {
        self.config.table()
    }

    // =========================================================================
    // Scopes
    // =========================================================================

    /// An independent copy of the current scope.
    pub fn scope(&self) -> Scope {
        self.scope.clone()
    }

    /// A new repository whose scope is `refine` applied to a clone of the
    /// current one.
    pub fn scoped<F>(&self, refine: F) -> Self
    where
        F: FnOnce(Scope) -> Scope,
    {
        self.derive(self.db.clone(), refine(self.scope()))
    }

    /// [`scoped`](Self::scoped) for refinements that take arguments.
    pub fn scoped_with<F>(&self, refine: F, args: &[Value]) -> Self
    where
        F: FnOnce(Scope, &[Value]) -> Scope,
    {
        self.derive(self.db.clone(), refine(self.scope(), args))
    }

    /// Applies a named scope from the configuration.
    ///
    /// ## Errors
    /// [`DbError::UnknownScope`] when `name` was never registered.
    pub fn named(&self, name: &str, args: &[Value]) -> DbResult<Self> {
        let scope = self
            .config
            .registry()
            .apply(name, self.scope(), args)
            .ok_or_else(|| DbError::UnknownScope(name.to_string()))?;

        Ok(self.derive(self.db.clone(), scope))
    }

    /// A repository on another handle, typically a transaction, starting
    /// from the default scope.
    pub fn transacting(&self, db: impl Into<DbHandle>) -> Self {
        self.derive(db.into(), self.config.default_scope())
    }

    /// Every row in scope, as a new repository.
    pub fn all(&self) -> Self {
        self.scoped(|scope| scope)
    }

    /// Rows in scope matching `conditions`, as a new repository.
    pub fn all_where(&self, conditions: impl Into<Conditions>) -> Self {
        let conditions = conditions.into();
        self.scoped(|scope| scope.where_conditions(conditions))
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Runs the current scope and hydrates the result.
    pub async fn execute(&self) -> DbResult<Vec<E>> {
        self.fetch(&self.scope).await
    }

    pub async fn first(&self) -> DbResult<Option<E>> {
        self.first_where(Conditions::new()).await
    }

    /// At most one row matching `conditions`.
    pub async fn first_where(&self, conditions: impl Into<Conditions>) -> DbResult<Option<E>> {
        let scope = self.scope().where_conditions(conditions).limit(1);
        self.fetch_one(&scope).await
    }

    pub async fn count(&self) -> DbResult<i64> {
        self.count_expr("*").await
    }

    /// `count(expression)` over the current scope.
    pub async fn count_expr(&self, expression: &str) -> DbResult<i64> {
        let rows = self.db.fetch_all(&self.scope().count(expression)).await?;
        parse_count(&rows)
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Inserts one row, filling unset timestamp columns, and returns it.
    pub async fn create(&self, fields: impl Into<Fields>) -> DbResult<E> {
        let fields = self.update_timestamps(
            fields.into(),
            &[TimestampEvent::CreatedAt, TimestampEvent::UpdatedAt],
        );
        debug!(table = %self.table_name(), columns = fields.len(), "Creating row");

        let scope = self.scope().insert(fields).returning_all();
        self.fetch_one(&scope)
            .await?
            .ok_or_else(|| DbError::NothingReturned {
                table: self.table_name().to_string(),
            })
    }

    /// Updates the row identified by `pk` and returns it, or `None` when no
    /// row matched.
    pub async fn update(
        &self,
        pk: impl Into<PkValue>,
        fields: impl Into<Fields>,
    ) -> DbResult<Option<E>> {
        let conditions = self.pk_conditions(pk)?;
        debug!(table = %self.table_name(), "Updating row by primary key");

        let scope = self.update_scope(conditions, fields.into()).returning_all();
        self.fetch_one(&scope).await
    }

    /// Updates every row in scope. Returns the number of rows changed.
    pub async fn update_all(&self, fields: impl Into<Fields>) -> DbResult<u64> {
        self.update_all_where(Conditions::new(), fields).await
    }

    /// Updates rows in scope matching `conditions`.
    pub async fn update_all_where(
        &self,
        conditions: impl Into<Conditions>,
        fields: impl Into<Fields>,
    ) -> DbResult<u64> {
        let scope = self.update_scope(conditions.into(), fields.into());
        let changed = self.db.execute(&scope).await?;

        debug!(table = %self.table_name(), rows = changed, "Rows updated");
        Ok(changed)
    }

    /// Deletes the row identified by `pk` and returns it as it was, or
    /// `None` when no row matched.
    pub async fn destroy(&self, pk: impl Into<PkValue>) -> DbResult<Option<E>> {
        let conditions = self.pk_conditions(pk)?;
        debug!(table = %self.table_name(), "Destroying row by primary key");

        let scope = self
            .scope()
            .where_conditions(conditions)
            .delete()
            .returning_all();
        self.fetch_one(&scope).await
    }

    /// Deletes every row in scope. Returns the number of rows deleted.
    pub async fn destroy_all(&self) -> DbResult<u64> {
        self.destroy_all_where(Conditions::new()).await
    }

    pub async fn destroy_all_where(&self, conditions: impl Into<Conditions>) -> DbResult<u64> {
        let scope = self.scope().where_conditions(conditions).delete();
        let deleted = self.db.execute(&scope).await?;

        debug!(table = %self.table_name(), rows = deleted, "Rows destroyed");
        Ok(deleted)
    }

    fn update_scope(&self, conditions: Conditions, fields: Fields) -> Scope {
        let fields = self.update_timestamps(fields, &[TimestampEvent::UpdatedAt]);
        self.scope().where_conditions(conditions).update(fields)
    }

    // =========================================================================
    // Utilities
    // =========================================================================

    /// Conditions selecting the row identified by `pk`.
    pub fn pk_conditions(&self, pk: impl Into<PkValue>) -> DbResult<Conditions> {
        Ok(self.config.primary_key().conditions(pk)?)
    }

    /// Executes `scope` and hydrates every row.
    pub async fn fetch(&self, scope: &Scope) -> DbResult<Vec<E>> {
        let rows = self.db.fetch_all(scope).await?;
        hydrate(self.table_name(), rows)
    }

    /// [`fetch`](Self::fetch), keeping only the LAST row.
    pub async fn fetch_one(&self, scope: &Scope) -> DbResult<Option<E>> {
        Ok(self.fetch(scope).await?.pop())
    }

    /// `fields` with `now` in every configured, unset column for `events`.
    pub fn update_timestamps(&self, fields: Fields, events: &[TimestampEvent]) -> Fields {
        repokit_core::apply_timestamps(self.config.timestamp_columns(), fields, events, Utc::now())
    }

    /// Single-quoted literal text. Does not escape embedded quotes.
    pub fn quote(value: impl Into<Value>) -> String {
        quote(&value.into())
    }

    /// Quoted literals joined with `,`. Does not escape embedded quotes.
    pub fn quote_list<I, V>(values: I) -> String
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        quote_list(&values)
    }

    /// The compiled form of the current scope.
    pub fn to_sql(&self) -> DbResult<CompiledQuery> {
        Ok(self.scope.to_sql()?)
    }
}

/// Reads `[{count: n}]`, accepting numbers and numeric strings.
fn parse_count(rows: &[Row]) -> DbResult<i64> {
    let value = rows
        .first()
        .and_then(|row| row.get("count"))
        .ok_or_else(|| DbError::InvalidCount("no count column in result".to_string()))?;

    match value {
        JsonValue::Number(n) => n
            .as_i64()
            .ok_or_else(|| DbError::InvalidCount(n.to_string())),
        JsonValue::String(s) => s
            .trim()
            .parse()
            .map_err(|_| DbError::InvalidCount(s.clone())),
        other => Err(DbError::InvalidCount(other.to_string())),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
