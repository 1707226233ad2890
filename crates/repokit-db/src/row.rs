//! # Rows and Hydration
//!
//! Decoded rows are plain JSON maps. An [`Entity`] is any type that can be
//! built from one; rows themselves are the pass-through entity.
//!
//! ## Decoding
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SQLite storage class        JSON value                                 │
//! │  ─────────────────────       ──────────────────                         │
//! │  NULL                  ──►   null                                       │
//! │  INTEGER               ──►   number  (bool when declared BOOLEAN)       │
//! │  REAL                  ──►   number (NaN / ±inf → null)                 │
//! │  TEXT                  ──►   string  (timestamps are RFC 3339 text)     │
//! │  BLOB                  ──►   array of byte numbers                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Hydration
//! ```rust,ignore
//! #[derive(Deserialize)]
//! struct Record {
//!     id: i64,
//!     name: Option<String>,
//!     created_at: DateTime<Utc>,
//! }
//!
//! impl Entity for Record {}
//!
//! let records: Repository<Record> = Repository::new(db.handle(), config);
//! ```

use serde::de::DeserializeOwned;
use serde_json::{Map, Number, Value as JsonValue};
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Row as _, TypeInfo, ValueRef};

use crate::error::{DbError, DbResult};

/// A decoded result row: column name → JSON value.
pub type Row = Map<String, JsonValue>;

/// A type a repository can hydrate rows into.
///
/// The provided `from_row` deserializes the row map with serde, so for most
/// types an empty `impl Entity for T {}` is enough.
pub trait Entity: DeserializeOwned + Send + Unpin + 'static {
    fn from_row(row: Row) -> Result<Self, serde_json::Error> {
        serde_json::from_value(JsonValue::Object(row))
    }
}

/// Raw rows pass through unchanged.
impl Entity for Row {
    fn from_row(row: Row) -> Result<Self, serde_json::Error> {
        Ok(row)
    }
}

/// Decodes every column of a SQLite row by its runtime storage class.
pub fn decode_row(row: &SqliteRow) -> Result<Row, sqlx::Error> {
    let mut decoded = Map::with_capacity(row.columns().len());

    for column in row.columns() {
        let index = column.ordinal();
        let declared_bool = column.type_info().name() == "BOOLEAN";

        let storage = {
            let raw = row.try_get_raw(index)?;
            if raw.is_null() {
                None
            } else {
                Some(raw.type_info().name().to_string())
            }
        };

        let value = match storage.as_deref() {
            None => JsonValue::Null,
            Some("INTEGER") if declared_bool => {
                JsonValue::Bool(row.try_get::<i64, _>(index)? != 0)
            }
            Some("INTEGER") => JsonValue::from(row.try_get::<i64, _>(index)?),
            Some("REAL") => Number::from_f64(row.try_get::<f64, _>(index)?)
                .map_or(JsonValue::Null, JsonValue::Number),
            Some("BLOB") => JsonValue::from(row.try_get::<Vec<u8>, _>(index)?),
            Some(_) => JsonValue::String(row.try_get::<String, _>(index)?),
        };

        decoded.insert(column.name().to_string(), value);
    }

    Ok(decoded)
}

/// Hydrates decoded rows into `E`, keeping their order.
pub fn hydrate<E: Entity>(table: &str, rows: Vec<Row>) -> DbResult<Vec<E>> {
    rows.into_iter()
        .map(|row| {
            E::from_row(row).map_err(|source| DbError::Hydrate {
                table: table.to_string(),
                source,
            })
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Named {
        id: i64,
        name: String,
    }

    impl Entity for Named {}

    fn row(value: JsonValue) -> Row {
        match value {
            JsonValue::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_rows_pass_through() {
        let rows = vec![row(json!({"id": 1, "extra": true}))];
        let hydrated: Vec<Row> = hydrate("records", rows.clone()).unwrap();

        assert_eq!(hydrated, rows);
    }

    #[test]
    fn test_hydrates_entities_in_order() {
        let rows = vec![
            row(json!({"id": 1, "name": "foo"})),
            row(json!({"id": 2, "name": "bar"})),
        ];
        let hydrated: Vec<Named> = hydrate("records", rows).unwrap();

        assert_eq!(
            hydrated,
            vec![
                Named { id: 1, name: "foo".to_string() },
                Named { id: 2, name: "bar".to_string() },
            ]
        );
    }

    #[test]
    fn test_hydration_error_names_table() {
        let rows = vec![row(json!({"id": "not a number", "name": "foo"}))];
        let err = hydrate::<Named>("records", rows).unwrap_err();

        assert!(matches!(err, DbError::Hydrate { ref table, .. } if table == "records"));
    }
}
