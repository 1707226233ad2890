//! # Primary Keys
//!
//! A repository's primary key is one column or an ordered tuple of columns.
//! [`PrimaryKey::conditions`] turns a key value into the equality conditions
//! that select that row.
//!
//! ## Positional Zip
//! ```text
//! pk    = ["tenant_id", "id"]
//! value = [1,           2   ]
//!            │           │
//!            ▼           ▼
//! { tenant_id: 1,  id: 2 }
//! ```

use std::fmt;

use crate::error::{CoreError, CoreResult};
use crate::value::{Conditions, Value};

// =============================================================================
// Primary Key
// =============================================================================

/// Primary-key column(s). Defaults to `id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrimaryKey {
    Single(String),
    Composite(Vec<String>),
}

impl Default for PrimaryKey {
    fn default() -> Self {
        PrimaryKey::Single("id".to_string())
    }
}

impl PrimaryKey {
    /// Column names in key order.
    pub fn columns(&self) -> Vec<&str> {
        match self {
            PrimaryKey::Single(column) => vec![column.as_str()],
            PrimaryKey::Composite(columns) => columns.iter().map(String::as_str).collect(),
        }
    }

    pub fn is_composite(&self) -> bool {
        matches!(self, PrimaryKey::Composite(_))
    }

    /// Builds the conditions selecting the row identified by `pk`.
    ///
    /// ## Errors
    /// - [`CoreError::PrimaryKeyArity`] - composite value of the wrong length
    /// - [`CoreError::PrimaryKeyShape`] - scalar for a composite key or the
    ///   other way round
    pub fn conditions(&self, pk: impl Into<PkValue>) -> CoreResult<Conditions> {
        match (self, pk.into()) {
            (PrimaryKey::Single(column), PkValue::Single(value)) => {
                Ok(Conditions::new().with(column.as_str(), value))
            }

            (PrimaryKey::Composite(columns), PkValue::Composite(values)) => {
                if columns.len() != values.len() {
                    return Err(CoreError::PrimaryKeyArity {
                        expected: columns.len(),
                        actual: values.len(),
                    });
                }
                Ok(columns.iter().cloned().zip(values).collect())
            }

            (key, PkValue::Single(_)) => Err(CoreError::PrimaryKeyShape {
                key: key.to_string(),
                given: "scalar",
            }),

            (key, PkValue::Composite(_)) => Err(CoreError::PrimaryKeyShape {
                key: key.to_string(),
                given: "composite",
            }),
        }
    }
}

impl fmt::Display for PrimaryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimaryKey::Single(column) => write!(f, "{}", column),
            PrimaryKey::Composite(columns) => write!(f, "({})", columns.join(", ")),
        }
    }
}

impl From<&str> for PrimaryKey {
    fn from(column: &str) -> Self {
        PrimaryKey::Single(column.to_string())
    }
}

impl From<String> for PrimaryKey {
    fn from(column: String) -> Self {
        PrimaryKey::Single(column)
    }
}

impl From<Vec<String>> for PrimaryKey {
    fn from(columns: Vec<String>) -> Self {
        PrimaryKey::Composite(columns)
    }
}

impl From<Vec<&str>> for PrimaryKey {
    fn from(columns: Vec<&str>) -> Self {
        PrimaryKey::Composite(columns.into_iter().map(str::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for PrimaryKey {
    fn from(columns: [&str; N]) -> Self {
        PrimaryKey::Composite(columns.into_iter().map(str::to_string).collect())
    }
}

// =============================================================================
// Key Values
// =============================================================================

/// The value identifying one row: a scalar, or one value per key column.
#[derive(Debug, Clone, PartialEq)]
pub enum PkValue {
    Single(Value),
    Composite(Vec<Value>),
}

macro_rules! scalar_pk {
    ($($t:ty),*) => {
        $(
            impl From<$t> for PkValue {
                fn from(value: $t) -> Self {
                    PkValue::Single(Value::from(value))
                }
            }
        )*
    };
}

scalar_pk!(i32, i64, u32, &str, String, &String, uuid::Uuid);

impl From<Value> for PkValue {
    fn from(value: Value) -> Self {
        PkValue::Single(value)
    }
}

impl<V: Into<Value>> From<Vec<V>> for PkValue {
    fn from(values: Vec<V>) -> Self {
        PkValue::Composite(values.into_iter().map(Into::into).collect())
    }
}

impl<V: Into<Value>, const N: usize> From<[V; N]> for PkValue {
    fn from(values: [V; N]) -> Self {
        PkValue::Composite(values.into_iter().map(Into::into).collect())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_key() {
        let pk = PrimaryKey::default();
        let conditions = pk.conditions(42).unwrap();

        assert_eq!(conditions, Conditions::new().with("id", 42));
    }

    #[test]
    fn test_composite_key_zips_positionally() {
        let pk = PrimaryKey::from(["a", "b"]);
        let conditions = pk.conditions([1, 2]).unwrap();

        assert_eq!(conditions, Conditions::new().with("a", 1).with("b", 2));
    }

    #[test]
    fn test_composite_key_arity() {
        let pk = PrimaryKey::from(vec!["a", "b"]);
        let err = pk.conditions(vec![1]).unwrap_err();

        assert_eq!(
            err,
            CoreError::PrimaryKeyArity {
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn test_shape_mismatch() {
        let composite = PrimaryKey::from(["a", "b"]);
        assert!(matches!(
            composite.conditions(1),
            Err(CoreError::PrimaryKeyShape { given: "scalar", .. })
        ));

        let single = PrimaryKey::from("id");
        assert!(matches!(
            single.conditions([1, 2]),
            Err(CoreError::PrimaryKeyShape { given: "composite", .. })
        ));
    }

    #[test]
    fn test_display() {
        assert_eq!(PrimaryKey::default().to_string(), "id");
        assert_eq!(PrimaryKey::from(["a", "b"]).to_string(), "(a, b)");
    }
}
