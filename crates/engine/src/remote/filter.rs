//! Search filters for remote list calls.
//!
//! The remote platform accepts a map of field conditions on its list
//! endpoints. [`Filter`] builds that map while keeping predicate order, so a
//! transport can render conditions deterministically.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storebridge_core::RemoteId;

/// Comparison operator of one predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOp {
    /// Field equals the value.
    Eq,
    /// Field is one of the listed values.
    In,
    /// Field is greater than or equal to the value.
    Gteq,
}

/// Value side of one predicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// A string value.
    Str(String),
    /// An integer value.
    Int(i64),
    /// A list of string values, used with [`FilterOp::In`].
    List(Vec<String>),
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<RemoteId> for FilterValue {
    fn from(value: RemoteId) -> Self {
        Self::Int(value.as_i64())
    }
}

/// One field condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Predicate {
    /// Remote field name.
    pub field: String,
    /// Comparison operator.
    pub op: FilterOp,
    /// Comparison value.
    pub value: FilterValue,
}

/// An ordered set of field conditions for a remote list call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    predicates: Vec<Predicate>,
}

impl Filter {
    /// An empty filter matching everything.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            predicates: Vec::new(),
        }
    }

    /// Add an equality condition.
    #[must_use]
    pub fn eq(mut self, field: &str, value: impl Into<FilterValue>) -> Self {
        self.predicates.push(Predicate {
            field: field.to_string(),
            op: FilterOp::Eq,
            value: value.into(),
        });
        self
    }

    /// Add a membership condition.
    #[must_use]
    pub fn any_of(mut self, field: &str, values: Vec<String>) -> Self {
        self.predicates.push(Predicate {
            field: field.to_string(),
            op: FilterOp::In,
            value: FilterValue::List(values),
        });
        self
    }

    /// Add a lower-bound timestamp condition.
    ///
    /// The remote side compares timestamps rendered to whole seconds, so any
    /// sub-second part of `since` is dropped here.
    #[must_use]
    pub fn since(mut self, field: &str, since: DateTime<Utc>) -> Self {
        self.predicates.push(Predicate {
            field: field.to_string(),
            op: FilterOp::Gteq,
            value: FilterValue::Str(since.format("%Y-%m-%d %H:%M:%S").to_string()),
        });
        self
    }

    /// The conditions in insertion order.
    #[must_use]
    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    /// Whether the filter has no conditions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }
}
