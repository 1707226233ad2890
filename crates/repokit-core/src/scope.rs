//! # Scope: Composable Query Values
//!
//! A [`Scope`] is a lazily-evaluated description of one statement against one
//! table. Every refinement consumes the scope and returns a new one, so a
//! clone can be refined without touching the original.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Scope Lifecycle                                 │
//! │                                                                         │
//! │  Scope::table("records")            SELECT * FROM "records"            │
//! │       │                                                                 │
//! │       │ .where_eq("name", "bar")     ... WHERE "name" = ?               │
//! │       │ .limit(1)                    ... LIMIT 1                        │
//! │       ▼                                                                 │
//! │  refined scope (still a value, nothing executed)                       │
//! │       │                                                                 │
//! │       │ .update(fields)              pending operation is replaced     │
//! │       │ .returning_all()             ... RETURNING *                    │
//! │       ▼                                                                 │
//! │  .to_sql() → CompiledQuery { sql, bindings }                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  repokit-db executes it                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dialect
//! SQL is generated for SQLite. `truncate` becomes a bare `DELETE`, and
//! ordering/limit/offset only apply to `SELECT` and `count`.

use crate::error::{CoreError, CoreResult};
use crate::sql::{quote_identifier, CompiledQuery};
use crate::value::{Conditions, Fields, Value};

// =============================================================================
// Operators
// =============================================================================

/// Comparison operator for [`Scope::where_op`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    NotEq,
    Lt,
    Lte,
    Gt,
    Gte,
    Like,
}

impl Operator {
    fn as_sql(self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::NotEq => "<>",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::Like => "LIKE",
        }
    }
}

/// Sort direction for [`Scope::order_by`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    fn as_sql(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

// =============================================================================
// Internal Representation
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Predicate {
    Compare {
        column: String,
        op: Operator,
        value: Value,
    },
    Null {
        column: String,
        negated: bool,
    },
    In {
        column: String,
        values: Vec<Value>,
        negated: bool,
    },
    Raw {
        sql: String,
        bindings: Vec<Value>,
    },
}

impl Predicate {
    fn compile(&self, bindings: &mut Vec<Value>) -> String {
        match self {
            Predicate::Compare { column, op, value } => {
                bindings.push(value.clone());
                format!("{} {} ?", quote_identifier(column), op.as_sql())
            }
            Predicate::Null { column, negated } => {
                let not = if *negated { " NOT" } else { "" };
                format!("{} IS{} NULL", quote_identifier(column), not)
            }
            // Empty IN lists never match, empty NOT IN lists always do.
            Predicate::In {
                values, negated, ..
            } if values.is_empty() => {
                if *negated {
                    "1 = 1".to_string()
                } else {
                    "1 = 0".to_string()
                }
            }
            Predicate::In {
                column,
                values,
                negated,
            } => {
                bindings.extend(values.iter().cloned());
                let placeholders = vec!["?"; values.len()].join(", ");
                let not = if *negated { " NOT" } else { "" };
                format!("{}{} IN ({})", quote_identifier(column), not, placeholders)
            }
            Predicate::Raw { sql, bindings: raw } => {
                bindings.extend(raw.iter().cloned());
                format!("({})", sql)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
enum Operation {
    #[default]
    Select,
    Count(String),
    Insert(Fields),
    Update(Fields),
    Delete,
    Truncate,
}

// =============================================================================
// Scope
// =============================================================================

/// A composable query against one table.
///
/// ## Example
/// ```rust
/// use repokit_core::Scope;
///
/// let base = Scope::table("records");
/// let bars = base.clone().where_eq("name", "bar").limit(1);
///
/// assert_eq!(base.to_sql().unwrap().sql, "SELECT * FROM `records`");
/// assert_eq!(
///     bars.to_sql().unwrap().sql,
///     "SELECT * FROM `records` WHERE `name` = ? LIMIT 1"
/// );
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Scope {
    table: String,
    columns: Vec<String>,
    predicates: Vec<Predicate>,
    order: Vec<(String, Direction)>,
    limit: Option<u64>,
    offset: Option<u64>,
    operation: Operation,
    returning: Vec<String>,
}

impl Scope {
    /// All rows of `table`.
    pub fn table(table: impl Into<String>) -> Self {
        Scope {
            table: table.into(),
            columns: Vec::new(),
            predicates: Vec::new(),
            order: Vec::new(),
            limit: None,
            offset: None,
            operation: Operation::Select,
            returning: Vec::new(),
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    // =========================================================================
    // Filters
    // =========================================================================

    /// `column = value`, or `column IS NULL` for a null value.
    pub fn where_eq(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.where_op(column, Operator::Eq, value)
    }

    /// ANDs one equality per entry. An empty mapping adds nothing.
    pub fn where_conditions(self, conditions: impl Into<Conditions>) -> Self {
        let conditions: Conditions = conditions.into();
        conditions
            .into_iter()
            .fold(self, |scope, (column, value)| scope.where_eq(column, value))
    }

    /// `column <op> value`. Null values turn `=`/`<>` into `IS [NOT] NULL`.
    pub fn where_op(
        mut self,
        column: impl Into<String>,
        op: Operator,
        value: impl Into<Value>,
    ) -> Self {
        let column = column.into();
        let value = value.into();

        let predicate = match (op, value.is_null()) {
            (Operator::Eq, true) => Predicate::Null {
                column,
                negated: false,
            },
            (Operator::NotEq, true) => Predicate::Null {
                column,
                negated: true,
            },
            _ => Predicate::Compare { column, op, value },
        };

        self.predicates.push(predicate);
        self
    }

    pub fn where_null(mut self, column: impl Into<String>) -> Self {
        self.predicates.push(Predicate::Null {
            column: column.into(),
            negated: false,
        });
        self
    }

    pub fn where_not_null(mut self, column: impl Into<String>) -> Self {
        self.predicates.push(Predicate::Null {
            column: column.into(),
            negated: true,
        });
        self
    }

    pub fn where_in<I, V>(mut self, column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.predicates.push(Predicate::In {
            column: column.into(),
            values: values.into_iter().map(Into::into).collect(),
            negated: false,
        });
        self
    }

    pub fn where_not_in<I, V>(mut self, column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.predicates.push(Predicate::In {
            column: column.into(),
            values: values.into_iter().map(Into::into).collect(),
            negated: true,
        });
        self
    }

    /// Raw SQL fragment with its own `?` bindings, wrapped in parentheses.
    pub fn where_raw(mut self, sql: impl Into<String>, bindings: Vec<Value>) -> Self {
        self.predicates.push(Predicate::Raw {
            sql: sql.into(),
            bindings,
        });
        self
    }

    // =========================================================================
    // Shaping
    // =========================================================================

    /// Restricts the selected columns. No columns means `*`.
    pub fn select<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, direction: Direction) -> Self {
        self.order.push((column.into(), direction));
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    // =========================================================================
    // Operations
    // =========================================================================
    // Each of these replaces the pending operation; filters are kept.

    pub fn insert(mut self, fields: impl Into<Fields>) -> Self {
        self.operation = Operation::Insert(fields.into());
        self
    }

    pub fn update(mut self, fields: impl Into<Fields>) -> Self {
        self.operation = Operation::Update(fields.into());
        self
    }

    pub fn delete(mut self) -> Self {
        self.operation = Operation::Delete;
        self
    }

    /// `count(expression)`, aliased as `count`. Pass `"*"` for all rows.
    pub fn count(mut self, expression: impl Into<String>) -> Self {
        self.operation = Operation::Count(expression.into());
        self
    }

    /// Removes every row of the table, ignoring filters.
    pub fn truncate(mut self) -> Self {
        self.operation = Operation::Truncate;
        self
    }

    pub fn returning<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.returning = columns.into_iter().map(Into::into).collect();
        self
    }

    /// `RETURNING *`.
    pub fn returning_all(self) -> Self {
        self.returning(["*"])
    }

    // =========================================================================
    // Compilation
    // =========================================================================

    /// Compiles the scope into SQL text and positional bindings.
    pub fn to_sql(&self) -> CoreResult<CompiledQuery> {
        let table = quote_identifier(&self.table);
        let mut bindings = Vec::new();

        let sql = match &self.operation {
            Operation::Select => {
                let columns = if self.columns.is_empty() {
                    "*".to_string()
                } else {
                    join_identifiers(&self.columns)
                };
                let mut sql = format!("SELECT {} FROM {}", columns, table);
                sql.push_str(&self.where_clause(&mut bindings));
                sql.push_str(&self.order_clause());
                sql.push_str(&self.limit_clause());
                sql
            }

            Operation::Count(expression) => {
                let mut sql = format!(
                    "SELECT count({}) AS `count` FROM {}",
                    count_target(expression),
                    table
                );
                sql.push_str(&self.where_clause(&mut bindings));
                sql.push_str(&self.limit_clause());
                sql
            }

            Operation::Insert(fields) if fields.is_empty() => {
                let mut sql = format!("INSERT INTO {} DEFAULT VALUES", table);
                sql.push_str(&self.returning_clause());
                sql
            }

            Operation::Insert(fields) => {
                let columns: Vec<&str> = fields.columns().collect();
                let placeholders = vec!["?"; columns.len()].join(", ");
                bindings.extend(fields.values().cloned());

                let mut sql = format!(
                    "INSERT INTO {} ({}) VALUES ({})",
                    table,
                    join_identifiers(&columns),
                    placeholders
                );
                sql.push_str(&self.returning_clause());
                sql
            }

            Operation::Update(fields) => {
                if fields.is_empty() {
                    return Err(CoreError::EmptyUpdate {
                        table: self.table.clone(),
                    });
                }

                let assignments = fields
                    .iter()
                    .map(|(column, value)| {
                        bindings.push(value.clone());
                        format!("{} = ?", quote_identifier(column))
                    })
                    .collect::<Vec<_>>()
                    .join(", ");

                let mut sql = format!("UPDATE {} SET {}", table, assignments);
                sql.push_str(&self.where_clause(&mut bindings));
                sql.push_str(&self.returning_clause());
                sql
            }

            Operation::Delete => {
                let mut sql = format!("DELETE FROM {}", table);
                sql.push_str(&self.where_clause(&mut bindings));
                sql.push_str(&self.returning_clause());
                sql
            }

            Operation::Truncate => format!("DELETE FROM {}", table),
        };

        Ok(CompiledQuery { sql, bindings })
    }

    fn where_clause(&self, bindings: &mut Vec<Value>) -> String {
        if self.predicates.is_empty() {
            return String::new();
        }

        let predicates = self
            .predicates
            .iter()
            .map(|p| p.compile(bindings))
            .collect::<Vec<_>>()
            .join(" AND ");

        format!(" WHERE {}", predicates)
    }

    fn order_clause(&self) -> String {
        if self.order.is_empty() {
            return String::new();
        }

        let terms = self
            .order
            .iter()
            .map(|(column, direction)| {
                format!("{} {}", quote_identifier(column), direction.as_sql())
            })
            .collect::<Vec<_>>()
            .join(", ");

        format!(" ORDER BY {}", terms)
    }

    fn limit_clause(&self) -> String {
        match (self.limit, self.offset) {
            (None, None) => String::new(),
            (Some(limit), None) => format!(" LIMIT {}", limit),
            (Some(limit), Some(offset)) => format!(" LIMIT {} OFFSET {}", limit, offset),
            // SQLite only accepts OFFSET after a LIMIT.
            (None, Some(offset)) => format!(" LIMIT -1 OFFSET {}", offset),
        }
    }

    fn returning_clause(&self) -> String {
        if self.returning.is_empty() {
            String::new()
        } else {
            format!(" RETURNING {}", join_identifiers(&self.returning))
        }
    }
}

/// Bare column names are quoted; expressions such as `DISTINCT name` or
/// `coalesce(a, b)` are passed through as written.
fn count_target(expression: &str) -> String {
    let is_expression = expression
        .chars()
        .any(|c| c.is_whitespace() || c == '(' || c == ')');

    if is_expression {
        expression.to_string()
    } else {
        quote_identifier(expression)
    }
}

fn join_identifiers<S: AsRef<str>>(names: &[S]) -> String {
    names
        .iter()
        .map(|n| quote_identifier(n.as_ref()))
        .collect::<Vec<_>>()
        .join(", ")
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sql(scope: &Scope) -> String {
        scope.to_sql().unwrap().sql
    }

    #[test]
    fn test_clone_is_independent() {
        let base = Scope::table("records");
        let refined = base.clone().where_eq("name", "foo");

        assert_eq!(sql(&base), "SELECT * FROM `records`");
        assert_eq!(sql(&refined), "SELECT * FROM `records` WHERE `name` = ?");
    }

    #[test]
    fn test_conditions_and_null() {
        let conditions = Fields::new().with("name", "foo").with("deleted_at", Value::Null);
        let compiled = Scope::table("records")
            .where_conditions(conditions)
            .to_sql()
            .unwrap();

        // Fields iterate in column order.
        assert_eq!(
            compiled.sql,
            "SELECT * FROM `records` WHERE `deleted_at` IS NULL AND `name` = ?"
        );
        assert_eq!(compiled.bindings, vec![Value::from("foo")]);
    }

    #[test]
    fn test_empty_conditions_add_nothing() {
        let scope = Scope::table("records").where_conditions(Conditions::new());
        assert_eq!(sql(&scope), "SELECT * FROM `records`");
    }

    #[test]
    fn test_in_lists() {
        let scope = Scope::table("records").where_in("id", [1, 2, 3]);
        let compiled = scope.to_sql().unwrap();
        assert_eq!(
            compiled.sql,
            "SELECT * FROM `records` WHERE `id` IN (?, ?, ?)"
        );
        assert_eq!(compiled.bindings.len(), 3);

        let empty = Scope::table("records").where_in("id", Vec::<i64>::new());
        assert_eq!(sql(&empty), "SELECT * FROM `records` WHERE 1 = 0");

        let none_excluded = Scope::table("records").where_not_in("id", Vec::<i64>::new());
        assert_eq!(sql(&none_excluded), "SELECT * FROM `records` WHERE 1 = 1");
    }

    #[test]
    fn test_select_shaping() {
        let scope = Scope::table("records")
            .select(["id", "name"])
            .where_op("rank", Operator::Gte, 3)
            .order_by("name", Direction::Desc)
            .limit(10)
            .offset(20);

        assert_eq!(
            sql(&scope),
            "SELECT `id`, `name` FROM `records` WHERE `rank` >= ? \
             ORDER BY `name` DESC LIMIT 10 OFFSET 20"
        );

        let offset_only = Scope::table("records").offset(5);
        assert_eq!(sql(&offset_only), "SELECT * FROM `records` LIMIT -1 OFFSET 5");
    }

    #[test]
    fn test_count() {
        let scope = Scope::table("records").where_eq("name", "bar").count("*");
        assert_eq!(
            sql(&scope),
            "SELECT count(*) AS `count` FROM `records` WHERE `name` = ?"
        );

        let by_column = Scope::table("records").count("id");
        assert_eq!(
            sql(&by_column),
            "SELECT count(`id`) AS `count` FROM `records`"
        );

        let distinct = Scope::table("records").count("DISTINCT name");
        assert_eq!(
            sql(&distinct),
            "SELECT count(DISTINCT name) AS `count` FROM `records`"
        );
    }

    #[test]
    fn test_insert() {
        let compiled = Scope::table("records")
            .insert(Fields::new().with("name", "foo").with("rank", 1))
            .returning_all()
            .to_sql()
            .unwrap();

        assert_eq!(
            compiled.sql,
            "INSERT INTO `records` (`name`, `rank`) VALUES (?, ?) RETURNING *"
        );
        assert_eq!(compiled.bindings, vec![Value::from("foo"), Value::from(1)]);

        let empty = Scope::table("records").insert(Fields::new());
        assert_eq!(sql(&empty), "INSERT INTO `records` DEFAULT VALUES");
    }

    #[test]
    fn test_update_binds_set_before_where() {
        let compiled = Scope::table("records")
            .where_eq("id", 7)
            .update(Fields::new().with("name", "bar"))
            .returning(["id", "name"])
            .to_sql()
            .unwrap();

        assert_eq!(
            compiled.sql,
            "UPDATE `records` SET `name` = ? WHERE `id` = ? RETURNING `id`, `name`"
        );
        assert_eq!(compiled.bindings, vec![Value::from("bar"), Value::from(7)]);
    }

    #[test]
    fn test_empty_update_is_rejected() {
        let err = Scope::table("records").update(Fields::new()).to_sql().unwrap_err();
        assert_eq!(
            err,
            CoreError::EmptyUpdate {
                table: "records".to_string()
            }
        );
    }

    #[test]
    fn test_delete_and_truncate() {
        let delete = Scope::table("records").where_eq("name", "foo").delete();
        assert_eq!(sql(&delete), "DELETE FROM `records` WHERE `name` = ?");

        let truncate = Scope::table("records").where_eq("name", "foo").truncate();
        assert_eq!(sql(&truncate), "DELETE FROM `records`");
    }

    #[test]
    fn test_raw_predicate() {
        let compiled = Scope::table("records")
            .where_raw("length(name) > ?", vec![Value::from(3)])
            .to_sql()
            .unwrap();

        assert_eq!(
            compiled.sql,
            "SELECT * FROM `records` WHERE (length(name) > ?)"
        );
        assert_eq!(compiled.bindings, vec![Value::from(3)]);
    }
}
