//! Filtering and ordering options for repository queries.
//!
//! Conditions are ANDed together; orderings apply in the listed order. Field
//! names are passed through to the store, which is also responsible for
//! rejecting operator/value combinations it does not support.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{AsRefStr, Display, EnumString};

use crate::{Error, Result};

/// Comparison operator of a `where` clause.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, Display, EnumString,
)]
pub enum Operator {
    /// Field equals value.
    #[serde(rename = "==")]
    #[strum(serialize = "==")]
    Eq,
    /// Field differs from value.
    #[serde(rename = "!=")]
    #[strum(serialize = "!=")]
    Ne,
    /// Field is less than or equal to value.
    #[serde(rename = "<=")]
    #[strum(serialize = "<=")]
    Lte,
    /// Field is less than value.
    #[serde(rename = "<")]
    #[strum(serialize = "<")]
    Lt,
    /// Field is greater than value.
    #[serde(rename = ">")]
    #[strum(serialize = ">")]
    Gt,
    /// Field is greater than or equal to value.
    #[serde(rename = ">=")]
    #[strum(serialize = ">=")]
    Gte,
    /// Field equals one of the values in an array.
    #[serde(rename = "in")]
    #[strum(serialize = "in")]
    In,
    /// Field equals none of the values in an array.
    #[serde(rename = "not-in")]
    #[strum(serialize = "not-in")]
    NotIn,
    /// Field matches a `%`/`_` wildcard pattern.
    #[serde(rename = "like")]
    #[strum(serialize = "like")]
    Like,
}

/// A single `(field, operator, value)` clause.
///
/// Serialized as a JSON array triple, e.g. `["name", "==", "a"]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition(pub String, pub Operator, pub Value);

impl Condition {
    /// Creates a new condition.
    pub fn new(field: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        Self(field.into(), operator, value.into())
    }

    /// Returns the field name.
    #[inline]
    pub fn field(&self) -> &str {
        &self.0
    }

    /// Returns the comparison operator.
    #[inline]
    pub fn operator(&self) -> Operator {
        self.1
    }

    /// Returns the comparison value.
    #[inline]
    pub fn value(&self) -> &Value {
        &self.2
    }
}

/// Sort order direction.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Ascending order (A-Z, oldest first, smallest first).
    #[default]
    Asc,
    /// Descending order (Z-A, newest first, largest first).
    Desc,
}

/// A single `(field, direction)` ordering clause.
///
/// Serialized as a JSON array pair, e.g. `["name", "desc"]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ordering(pub String, pub SortOrder);

impl Ordering {
    /// Creates a new ordering clause.
    pub fn new(field: impl Into<String>, order: SortOrder) -> Self {
        Self(field.into(), order)
    }

    /// Returns the field name.
    #[inline]
    pub fn field(&self) -> &str {
        &self.0
    }

    /// Returns the sort order.
    #[inline]
    pub fn order(&self) -> SortOrder {
        self.1
    }
}

/// Conditions plus ordering applied on top of a query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Filter {
    /// Conditions ANDed together.
    #[serde(rename = "where", default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
    /// Ordering clauses applied in listed order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub order_by: Vec<Ordering>,
}

impl Filter {
    /// Creates an empty filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a condition.
    pub fn and(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Adds a condition built from its parts.
    pub fn when(self, field: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        self.and(Condition::new(field, operator, value))
    }

    /// Adds an equality condition.
    pub fn eq(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.when(field, Operator::Eq, value)
    }

    /// Adds an ordering clause.
    pub fn order_by(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.order_by.push(Ordering::new(field, order));
        self
    }

    /// Adds an ascending ordering clause.
    pub fn asc(self, field: impl Into<String>) -> Self {
        self.order_by(field, SortOrder::Asc)
    }

    /// Adds a descending ordering clause.
    pub fn desc(self, field: impl Into<String>) -> Self {
        self.order_by(field, SortOrder::Desc)
    }

    /// Returns true if the filter has neither conditions nor orderings.
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty() && self.order_by.is_empty()
    }
}

/// A filter guaranteed to carry at least one condition.
///
/// Required by single-result lookups so that "return any document" cannot be
/// expressed by accident.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchFilter(Filter);

impl MatchFilter {
    /// Creates a match filter from its first condition.
    pub fn new(condition: Condition) -> Self {
        Self(Filter::new().and(condition))
    }

    /// Creates a match filter with a single equality condition.
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(Condition::new(field, Operator::Eq, value))
    }

    /// Adds another condition.
    pub fn and(self, condition: Condition) -> Self {
        Self(self.0.and(condition))
    }

    /// Adds an ordering clause.
    pub fn order_by(self, field: impl Into<String>, order: SortOrder) -> Self {
        Self(self.0.order_by(field, order))
    }

    /// Returns the underlying filter.
    pub fn as_filter(&self) -> &Filter {
        &self.0
    }

    /// Consumes the match filter and returns the underlying filter.
    pub fn into_inner(self) -> Filter {
        self.0
    }
}

impl TryFrom<Filter> for MatchFilter {
    type Error = Error;

    fn try_from(filter: Filter) -> Result<Self> {
        if filter.conditions.is_empty() {
            return Err(Error::invalid_input(
                "a single-result lookup requires at least one where clause",
            ));
        }
        Ok(Self(filter))
    }
}

impl From<Condition> for MatchFilter {
    fn from(condition: Condition) -> Self {
        Self::new(condition)
    }
}

/// Options for multi-result lookups.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    /// Conditions and orderings.
    pub filter: Filter,
    /// Requested page size, clamped to the configured maximum.
    pub take: Option<usize>,
}

impl FindOptions {
    /// Creates options from a filter.
    pub fn new(filter: Filter) -> Self {
        Self { filter, take: None }
    }

    /// Sets the requested page size.
    pub fn with_take(mut self, take: usize) -> Self {
        self.take = Some(take);
        self
    }
}

impl From<Filter> for FindOptions {
    fn from(filter: Filter) -> Self {
        Self::new(filter)
    }
}

/// Options for cursor-paginated lookups.
///
/// When `page_token` is set, the filter state stored in the token takes
/// precedence over `filter` and `take`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageRequest {
    /// Conditions and orderings.
    pub filter: Filter,
    /// Requested page size, clamped to the configured maximum.
    pub take: Option<usize>,
    /// Opaque token returned by a previous page.
    pub page_token: Option<String>,
}

impl PageRequest {
    /// Creates a first-page request with the given filter.
    pub fn new(filter: Filter) -> Self {
        Self {
            filter,
            take: None,
            page_token: None,
        }
    }

    /// Sets the requested page size.
    pub fn with_take(mut self, take: usize) -> Self {
        self.take = Some(take);
        self
    }

    /// Continues from a previously returned page token.
    pub fn with_page_token(mut self, token: impl Into<String>) -> Self {
        self.page_token = Some(token.into());
        self
    }

    /// Continues from a page token if one is given.
    pub fn with_optional_token(mut self, token: Option<String>) -> Self {
        self.page_token = token;
        self
    }
}
