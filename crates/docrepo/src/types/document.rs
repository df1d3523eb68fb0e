//! Persisted documents and their identifiers.

use std::fmt;

use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identifier of a document within a collection.
///
/// Entities may use string or integer identifiers; both are stored in their
/// decimal/string form and compared lexicographically, matching the store's
/// document-id ordering.
#[derive(
    Debug, Display, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, From, Into, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    /// Creates a new document identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for DocumentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for DocumentId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<&String> for DocumentId {
    fn from(id: &String) -> Self {
        Self(id.clone())
    }
}

macro_rules! impl_from_integer {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for DocumentId {
                fn from(id: $ty) -> Self {
                    Self(id.to_string())
                }
            }
        )*
    };
}

impl_from_integer!(i32, i64, u32, u64, usize);

/// A raw persisted record: identifier plus JSON payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Document identifier.
    pub id: DocumentId,
    /// Persisted fields.
    pub data: Value,
}

impl Document {
    /// Creates a new document.
    pub fn new(id: impl Into<DocumentId>, data: Value) -> Self {
        Self {
            id: id.into(),
            data,
        }
    }

    /// Looks up a field by dotted path (`address.city`).
    ///
    /// Returns `None` when any segment is missing or traverses a non-object.
    pub fn field(&self, path: &str) -> Option<&Value> {
        path.split('.')
            .try_fold(&self.data, |value, segment| value.as_object()?.get(segment))
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.id, self.data)
    }
}

/// A record type with a unique identifier.
///
/// Repositories use the identifier as the document key; entities are owned by
/// the caller and never retained beyond a call.
pub trait Entity: Send + Sync {
    /// Returns the unique identifier of this entity.
    fn id(&self) -> DocumentId;
}
