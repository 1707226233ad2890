//! # Named Scopes
//!
//! A [`ScopeRegistry`] maps a name to a reusable refinement. It is built once
//! per repository configuration and shared by every repository derived from
//! it.
//!
//! ```text
//! registry: "bars"   → |scope, _|    scope.where_eq("name", "bar")
//!           "ranked" → |scope, args| scope.where_op("rank", Gte, args[0])
//!
//! repo.named("bars", &[])  ──► new repository, scope refined by "bars"
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::scope::Scope;
use crate::value::Value;

/// A named refinement: receives a clone of the current scope and the call
/// arguments.
pub type ScopeFn = Arc<dyn Fn(Scope, &[Value]) -> Scope + Send + Sync>;

/// Name → refinement lookup table.
#[derive(Clone, Default)]
pub struct ScopeRegistry {
    scopes: HashMap<String, ScopeFn>,
}

impl ScopeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style registration. A later registration under the same name
    /// replaces the earlier one.
    pub fn register<F>(mut self, name: impl Into<String>, scope: F) -> Self
    where
        F: Fn(Scope, &[Value]) -> Scope + Send + Sync + 'static,
    {
        self.insert(name, scope);
        self
    }

    pub fn insert<F>(&mut self, name: impl Into<String>, scope: F)
    where
        F: Fn(Scope, &[Value]) -> Scope + Send + Sync + 'static,
    {
        self.scopes.insert(name.into(), Arc::new(scope));
    }

    pub fn get(&self, name: &str) -> Option<&ScopeFn> {
        self.scopes.get(name)
    }

    /// Applies the named refinement, or `None` if the name is unknown.
    pub fn apply(&self, name: &str, scope: Scope, args: &[Value]) -> Option<Scope> {
        self.scopes.get(name).map(|f| f(scope, args))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.scopes.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.scopes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }
}

impl fmt::Debug for ScopeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeRegistry")
            .field("scopes", &self.names())
            .finish()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::Operator;

    fn registry() -> ScopeRegistry {
        ScopeRegistry::new()
            .register("bars", |scope, _| scope.where_eq("name", "bar"))
            .register("ranked", |scope, args| {
                let min = args.first().cloned().unwrap_or(Value::Integer(0));
                scope.where_op("rank", Operator::Gte, min)
            })
    }

    #[test]
    fn test_apply_named_scope() {
        let scope = registry()
            .apply("bars", Scope::table("records"), &[])
            .unwrap();

        assert_eq!(
            scope.to_sql().unwrap().sql,
            "SELECT * FROM `records` WHERE `name` = ?"
        );
    }

    #[test]
    fn test_arguments_are_forwarded() {
        let compiled = registry()
            .apply("ranked", Scope::table("records"), &[Value::from(5)])
            .unwrap()
            .to_sql()
            .unwrap();

        assert_eq!(compiled.bindings, vec![Value::from(5)]);
    }

    #[test]
    fn test_unknown_name() {
        assert!(registry().apply("nope", Scope::table("records"), &[]).is_none());
        assert_eq!(registry().names(), vec!["bars", "ranked"]);
        assert!(format!("{:?}", registry()).contains("bars"));
    }
}
