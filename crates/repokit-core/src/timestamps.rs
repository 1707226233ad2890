//! # Timestamp Policy
//!
//! Which columns receive `now()` on create and update.
//!
//! ## Injection Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create(fields)  → events [CreatedAt, UpdatedAt]                       │
//! │  update(..)      → events [UpdatedAt]                                  │
//! │                                                                         │
//! │  for each event:                                                        │
//! │     column configured?   no  → skip                                    │
//! │     caller set it?       yes → keep the caller's value                 │
//! │                          no  → column = now                            │
//! │                                                                         │
//! │  timestamps disabled (None) → fields returned untouched                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A column explicitly set to `Null` counts as unset.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value::{Fields, Value};

/// Logical timestamp events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampEvent {
    CreatedAt,
    UpdatedAt,
}

/// Event → column mapping. A `None` column disables that event only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timestamps {
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl Default for Timestamps {
    fn default() -> Self {
        Timestamps {
            created_at: Some("created_at".to_string()),
            updated_at: Some("updated_at".to_string()),
        }
    }
}

impl Timestamps {
    /// Custom column names for both events.
    pub fn new(created_at: impl Into<String>, updated_at: impl Into<String>) -> Self {
        Timestamps {
            created_at: Some(created_at.into()),
            updated_at: Some(updated_at.into()),
        }
    }

    pub fn column(&self, event: TimestampEvent) -> Option<&str> {
        match event {
            TimestampEvent::CreatedAt => self.created_at.as_deref(),
            TimestampEvent::UpdatedAt => self.updated_at.as_deref(),
        }
    }

    /// Returns `fields` with `now` filled into every unset event column.
    pub fn apply(&self, mut fields: Fields, events: &[TimestampEvent], now: DateTime<Utc>) -> Fields {
        for event in events {
            if let Some(column) = self.column(*event) {
                if !fields.is_set(column) {
                    fields.insert(column, Value::Timestamp(now));
                }
            }
        }
        fields
    }
}

/// [`Timestamps::apply`] for an optional policy; `None` is a no-op.
pub fn apply_timestamps(
    timestamps: Option<&Timestamps>,
    fields: Fields,
    events: &[TimestampEvent],
    now: DateTime<Utc>,
) -> Fields {
    match timestamps {
        Some(ts) => ts.apply(fields, events, now),
        None => fields,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_fills_unset_columns() {
        let fields = Timestamps::default().apply(
            Fields::new().with("name", "foo"),
            &[TimestampEvent::CreatedAt, TimestampEvent::UpdatedAt],
            now(),
        );

        assert_eq!(fields.get("created_at"), Some(&Value::Timestamp(now())));
        assert_eq!(fields.get("updated_at"), Some(&Value::Timestamp(now())));
        assert_eq!(fields.get("name"), Some(&Value::from("foo")));
    }

    #[test]
    fn test_keeps_caller_values() {
        let earlier = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let fields = Timestamps::default().apply(
            Fields::new().with("created_at", earlier).with("updated_at", Value::Null),
            &[TimestampEvent::CreatedAt, TimestampEvent::UpdatedAt],
            now(),
        );

        assert_eq!(fields.get("created_at"), Some(&Value::Timestamp(earlier)));
        assert_eq!(fields.get("updated_at"), Some(&Value::Timestamp(now())));
    }

    #[test]
    fn test_only_requested_events() {
        let fields = Timestamps::default().apply(Fields::new(), &[TimestampEvent::UpdatedAt], now());

        assert!(!fields.contains("created_at"));
        assert!(fields.contains("updated_at"));
    }

    #[test]
    fn test_disabled() {
        let fields = apply_timestamps(None, Fields::new(), &[TimestampEvent::CreatedAt], now());
        assert!(fields.is_empty());

        let partial = Timestamps {
            created_at: None,
            updated_at: Some("modified".to_string()),
        };
        let fields = partial.apply(
            Fields::new(),
            &[TimestampEvent::CreatedAt, TimestampEvent::UpdatedAt],
            now(),
        );
        assert_eq!(fields.columns().collect::<Vec<_>>(), vec!["modified"]);
    }
}
