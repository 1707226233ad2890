//! # SQL Text Helpers
//!
//! Identifier quoting, the compiled form of a scope, and the naive literal
//! quoting helpers.
//!
//! ## Quoting Rules
//! ```text
//! identifier      records              → `records`
//! dotted          records.name         → `records`.`name`
//! wildcard        *                    → *
//! embedded tick   we`ird               → `we``ird`
//!
//! literal         quote("x")           → 'x'
//! list            quote_list(["x","y"]) → 'x','y'
//! ```
//!
//! Identifiers are never double-quoted: SQLite reads an unknown
//! double-quoted name as a string literal instead of failing.

use std::fmt;

use crate::value::Value;

/// A scope compiled to SQLite SQL with `?` placeholders.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    /// The statement text.
    pub sql: String,

    /// Positional bindings, one per `?`.
    pub bindings: Vec<Value>,
}

impl fmt::Display for CompiledQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

/// Backtick-quotes an identifier, segment by segment.
pub fn quote_identifier(name: &str) -> String {
    name.split('.')
        .map(|segment| {
            if segment == "*" {
                segment.to_string()
            } else {
                format!("`{}`", segment.replace('`', "``"))
            }
        })
        .collect::<Vec<_>>()
        .join(".")
}

/// Wraps a value in single quotes.
///
/// ## Known Limitation
/// Embedded single quotes are NOT escaped. This is diagnostic text only and
/// must never be spliced into SQL built from untrusted input; use scope
/// bindings for that.
pub fn quote(value: &Value) -> String {
    format!("'{}'", value)
}

/// Quotes each value and joins them with `,`.
///
/// Same limitation as [`quote`].
pub fn quote_list(values: &[Value]) -> String {
    values.iter().map(quote).collect::<Vec<_>>().join(",")
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("records"), "`records`");
        assert_eq!(quote_identifier("records.name"), "`records`.`name`");
        assert_eq!(quote_identifier("*"), "*");
        assert_eq!(quote_identifier("records.*"), "`records`.*");
        assert_eq!(quote_identifier("we`ird"), "`we``ird`");
    }

    #[test]
    fn test_quote_list() {
        let values = vec![Value::from("x"), Value::from("y")];
        assert_eq!(quote_list(&values), "'x','y'");
        assert_eq!(quote(&Value::from(5)), "'5'");
    }

    #[test]
    fn test_quote_does_not_escape() {
        assert_eq!(quote(&Value::from("o'hara")), "'o'hara'");
    }
}
