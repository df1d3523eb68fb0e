//! In-process document store.
//!
//! Mirrors the query and write semantics of a managed document store closely
//! enough to run repositories against it in tests and local tooling:
//! - results are ordered by the query orderings, then by document id
//! - ordering on a field excludes documents that lack it
//! - `!=` and `not-in` exclude documents that lack the field
//! - cursors compare against the value of the first ordering
//! - batches are applied to a copy and swapped in only if every write succeeds

use std::cmp::Ordering as CmpOrdering;
use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;

use super::{
    DocumentStore, Limit, OrderField, Precondition, Query, QueryCursor, QueryOrder, WriteBatch,
    WriteOp,
};
use crate::types::{Condition, Document, DocumentId, Operator, SortOrder};
use crate::{Error, Result, TRACING_TARGET_STORE};

type Collection = BTreeMap<DocumentId, Value>;
type Collections = BTreeMap<String, Collection>;

/// Thread-safe in-memory [`DocumentStore`].
///
/// Cloning is cheap and clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    collections: Arc<RwLock<Collections>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of every document in a collection, ordered by id.
    pub async fn documents(&self, collection: &str) -> Vec<Document> {
        let collections = self.collections.read().await;
        collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, data)| Document::new(id.clone(), data.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Returns the number of documents in a collection.
    pub async fn count(&self, collection: &str) -> usize {
        let collections = self.collections.read().await;
        collections.get(collection).map_or(0, BTreeMap::len)
    }
}

#[async_trait::async_trait]
impl DocumentStore for MemoryStore {
    async fn run_query(&self, query: &Query) -> Result<Vec<Document>> {
        let collections = self.collections.read().await;
        let Some(docs) = collections.get(query.collection()) else {
            return Ok(Vec::new());
        };

        let mut rows = Vec::new();
        for (id, data) in docs {
            let doc = Document::new(id.clone(), data.clone());
            if matches_all(&doc, query.conditions())? && has_order_fields(&doc, query.orders()) {
                rows.push(doc);
            }
        }

        rows.sort_by(|a, b| compare_documents(a, b, query.orders()));

        if let Some(cursor) = query.cursor() {
            let first = query.orders().first();
            rows.retain(|doc| past_cursor(doc, first, cursor));
        }

        match query.limit_value() {
            Some(Limit::First(n)) => rows.truncate(n),
            Some(Limit::Last(n)) => {
                let skip = rows.len().saturating_sub(n);
                rows = rows.split_off(skip);
            }
            None => {}
        }

        tracing::debug!(
            target: TRACING_TARGET_STORE,
            collection = %query.collection(),
            conditions = query.conditions().len(),
            rows = rows.len(),
            "Executed in-memory query"
        );

        Ok(rows)
    }

    async fn get(&self, collection: &str, id: &DocumentId) -> Result<Option<Document>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|data| Document::new(id.clone(), data.clone())))
    }

    async fn create(&self, collection: &str, id: &DocumentId, data: Value) -> Result<()> {
        let mut collections = self.collections.write().await;
        apply(&mut collections, WriteOp::create(collection, id.clone(), data))
    }

    async fn update(&self, collection: &str, id: &DocumentId, data: Value) -> Result<()> {
        let mut collections = self.collections.write().await;
        apply(&mut collections, WriteOp::update(collection, id.clone(), data))
    }

    async fn delete(
        &self,
        collection: &str,
        id: &DocumentId,
        precondition: Precondition,
    ) -> Result<()> {
        let mut collections = self.collections.write().await;
        apply(
            &mut collections,
            WriteOp::delete(collection, id.clone(), precondition),
        )
    }

    async fn commit(&self, batch: WriteBatch) -> Result<()> {
        let mut collections = self.collections.write().await;
        let size = batch.len();

        let mut staged = collections.clone();
        for op in batch {
            apply(&mut staged, op)?;
        }
        *collections = staged;

        tracing::debug!(
            target: TRACING_TARGET_STORE,
            ops = size,
            "Committed write batch"
        );

        Ok(())
    }
}

fn apply(collections: &mut Collections, op: WriteOp) -> Result<()> {
    match op {
        WriteOp::Create {
            collection,
            id,
            data,
        } => {
            let docs = collections.entry(collection.clone()).or_default();
            if docs.contains_key(&id) {
                return Err(Error::already_exists(collection, id.to_string()));
            }
            docs.insert(id, data);
        }
        WriteOp::Update {
            collection,
            id,
            data,
        } => {
            let Some(existing) = collections.get_mut(&collection).and_then(|d| d.get_mut(&id))
            else {
                return Err(Error::not_found(collection, id.to_string()));
            };
            merge(existing, data);
        }
        WriteOp::Delete {
            collection,
            id,
            precondition,
        } => {
            let removed = collections
                .get_mut(&collection)
                .and_then(|docs| docs.remove(&id));
            if removed.is_none() && precondition == Precondition::Exists {
                return Err(Error::not_found(collection, id.to_string()));
            }
        }
    }

    Ok(())
}

fn merge(existing: &mut Value, update: Value) {
    match (existing, update) {
        (Value::Object(current), Value::Object(fields)) => current.extend(fields),
        (existing, update) => *existing = update,
    }
}

fn order_key(doc: &Document, field: &OrderField) -> Option<Value> {
    match field {
        OrderField::DocumentId => Some(Value::String(doc.id.to_string())),
        OrderField::Field(path) => doc.field(path).cloned(),
    }
}

fn has_order_fields(doc: &Document, orders: &[QueryOrder]) -> bool {
    orders.iter().all(|order| match &order.field {
        OrderField::DocumentId => true,
        OrderField::Field(path) => doc.field(path).is_some(),
    })
}

fn directed(ordering: CmpOrdering, order: SortOrder) -> CmpOrdering {
    match order {
        SortOrder::Asc => ordering,
        SortOrder::Desc => ordering.reverse(),
    }
}

fn compare_documents(a: &Document, b: &Document, orders: &[QueryOrder]) -> CmpOrdering {
    orders
        .iter()
        .map(|order| {
            let left = order_key(a, &order.field).unwrap_or(Value::Null);
            let right = order_key(b, &order.field).unwrap_or(Value::Null);
            directed(compare_values(&left, &right), order.order)
        })
        .find(|ordering| ordering.is_ne())
        .unwrap_or_else(|| a.id.cmp(&b.id))
}

fn past_cursor(doc: &Document, first: Option<&QueryOrder>, cursor: &QueryCursor) -> bool {
    let (field, order) = first.map_or((&OrderField::DocumentId, SortOrder::Asc), |o| {
        (&o.field, o.order)
    });
    let key = order_key(doc, field).unwrap_or(Value::Null);

    match cursor {
        QueryCursor::StartAfter(value) => {
            directed(compare_values(&key, value), order) == CmpOrdering::Greater
        }
        QueryCursor::EndBefore(value) => {
            directed(compare_values(&key, value), order) == CmpOrdering::Less
        }
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Total order over JSON values: by type first, then by value.
fn compare_values(a: &Value, b: &Value) -> CmpOrdering {
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.partial_cmp(&y).unwrap_or(CmpOrdering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => x
            .iter()
            .zip(y)
            .map(|(l, r)| compare_values(l, r))
            .find(|ordering| ordering.is_ne())
            .unwrap_or_else(|| x.len().cmp(&y.len())),
        (Value::Object(x), Value::Object(y)) => x.len().cmp(&y.len()).then_with(|| {
            serde_json::to_string(x)
                .unwrap_or_default()
                .cmp(&serde_json::to_string(y).unwrap_or_default())
        }),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

fn same_value(a: &Value, b: &Value) -> bool {
    type_rank(a) == type_rank(b) && compare_values(a, b) == CmpOrdering::Equal
}

fn matches_all(doc: &Document, conditions: &[Condition]) -> Result<bool> {
    for condition in conditions {
        if !matches(doc, condition)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn matches(doc: &Document, condition: &Condition) -> Result<bool> {
    let field = doc.field(condition.field());
    let expected = condition.value();

    let matched = match condition.operator() {
        Operator::Eq => field.is_some_and(|v| same_value(v, expected)),
        Operator::Ne => field.is_some_and(|v| !same_value(v, expected)),
        Operator::Lt => compare_same_type(field, expected).is_some_and(CmpOrdering::is_lt),
        Operator::Lte => compare_same_type(field, expected).is_some_and(CmpOrdering::is_le),
        Operator::Gt => compare_same_type(field, expected).is_some_and(CmpOrdering::is_gt),
        Operator::Gte => compare_same_type(field, expected).is_some_and(CmpOrdering::is_ge),
        Operator::In => {
            let candidates = array_operand(condition)?;
            field.is_some_and(|v| candidates.iter().any(|c| same_value(v, c)))
        }
        Operator::NotIn => {
            let candidates = array_operand(condition)?;
            field.is_some_and(|v| !candidates.iter().any(|c| same_value(v, c)))
        }
        Operator::Like => {
            let Some(pattern) = expected.as_str() else {
                return Err(Error::invalid_input(format!(
                    "'like' on field '{}' requires a string pattern",
                    condition.field()
                )));
            };
            field
                .and_then(Value::as_str)
                .is_some_and(|text| like(text, pattern))
        }
    };

    Ok(matched)
}

fn compare_same_type(field: Option<&Value>, expected: &Value) -> Option<CmpOrdering> {
    let value = field?;
    (type_rank(value) == type_rank(expected)).then(|| compare_values(value, expected))
}

fn array_operand(condition: &Condition) -> Result<&Vec<Value>> {
    condition.value().as_array().ok_or_else(|| {
        Error::invalid_input(format!(
            "'{}' on field '{}' requires an array value",
            condition.operator(),
            condition.field()
        ))
    })
}

/// SQL-style pattern match: `%` matches any run, `_` matches one character.
fn like(text: &str, pattern: &str) -> bool {
    let text: Vec<char> = text.chars().collect();
    let pattern: Vec<char> = pattern.chars().collect();

    // matched[j]: pattern[..j] matches the text consumed so far
    let mut matched = vec![false; pattern.len() + 1];
    matched[0] = true;
    for j in 1..=pattern.len() {
        matched[j] = matched[j - 1] && pattern[j - 1] == '%';
    }

    for c in text {
        let mut next = vec![false; pattern.len() + 1];
        for j in 1..=pattern.len() {
            next[j] = match pattern[j - 1] {
                '%' => next[j - 1] || matched[j],
                '_' => matched[j - 1],
                p => matched[j - 1] && p == c,
            };
        }
        matched = next;
    }

    matched[pattern.len()]
}
