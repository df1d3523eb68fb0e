//! Native query representation.
//!
//! A [`Query`] is built with the same sequence of calls a managed document
//! store client exposes (limit, order, cursor, filter) and handed to
//! [`DocumentStore::run_query`] for execution.
//!
//! [`DocumentStore::run_query`]: super::DocumentStore::run_query

use serde_json::Value;

use crate::types::{Condition, DocumentId, Filter, Operator, SortOrder};

/// Field a query orders by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderField {
    /// The document identifier.
    DocumentId,
    /// A (possibly dotted) field path.
    Field(String),
}

/// One ordering clause of a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOrder {
    /// Field to order by.
    pub field: OrderField,
    /// Direction.
    pub order: SortOrder,
}

/// Position a query starts or ends at, relative to its first ordering.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryCursor {
    /// Rows strictly after the given value.
    StartAfter(Value),
    /// Rows strictly before the given value.
    EndBefore(Value),
}

/// Row limit of a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    /// Keep the first `n` matching rows.
    First(usize),
    /// Keep the last `n` matching rows, still returned in query order.
    Last(usize),
}

impl Limit {
    /// Returns the row count of this limit.
    pub fn count(&self) -> usize {
        match self {
            Limit::First(n) | Limit::Last(n) => *n,
        }
    }
}

/// A filtered, ordered and limited query against one collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    collection: String,
    conditions: Vec<Condition>,
    orders: Vec<QueryOrder>,
    cursor: Option<QueryCursor>,
    limit: Option<Limit>,
}

impl Query {
    /// Creates an unfiltered query over a collection.
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            conditions: Vec::new(),
            orders: Vec::new(),
            cursor: None,
            limit: None,
        }
    }

    /// Keeps at most the first `n` rows.
    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(Limit::First(n));
        self
    }

    /// Keeps at most the last `n` rows.
    pub fn limit_to_last(mut self, n: usize) -> Self {
        self.limit = Some(Limit::Last(n));
        self
    }

    /// Orders by document identifier, ascending.
    pub fn order_by_document_id(mut self) -> Self {
        self.orders.push(QueryOrder {
            field: OrderField::DocumentId,
            order: SortOrder::Asc,
        });
        self
    }

    /// Orders by a field.
    pub fn order_by(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.orders.push(QueryOrder {
            field: OrderField::Field(field.into()),
            order,
        });
        self
    }

    /// Adds a `where` condition.
    pub fn filter(mut self, field: impl Into<String>, operator: Operator, value: Value) -> Self {
        self.conditions.push(Condition::new(field, operator, value));
        self
    }

    /// Starts strictly after the given document identifier.
    pub fn start_after(mut self, id: &DocumentId) -> Self {
        self.cursor = Some(QueryCursor::StartAfter(Value::String(id.to_string())));
        self
    }

    /// Ends strictly before the given document identifier.
    pub fn end_before(mut self, id: &DocumentId) -> Self {
        self.cursor = Some(QueryCursor::EndBefore(Value::String(id.to_string())));
        self
    }

    /// Applies the conditions and orderings of a filter, in listed order.
    pub fn apply(self, filter: &Filter) -> Self {
        let query = filter.conditions.iter().fold(self, |query, condition| {
            query.filter(
                condition.field(),
                condition.operator(),
                condition.value().clone(),
            )
        });

        filter.order_by.iter().fold(query, |query, ordering| {
            query.order_by(ordering.field(), ordering.order())
        })
    }

    /// Returns the collection name.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Returns the `where` conditions.
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// Returns the ordering clauses.
    pub fn orders(&self) -> &[QueryOrder] {
        &self.orders
    }

    /// Returns the cursor, if any.
    pub fn cursor(&self) -> Option<&QueryCursor> {
        self.cursor.as_ref()
    }

    /// Returns the limit, if any.
    pub fn limit_value(&self) -> Option<Limit> {
        self.limit
    }
}
