//! Conversion between domain entities and persisted documents.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::types::Document;
use crate::{Error, Result};

/// Bidirectional converter between an entity and its persisted JSON form.
///
/// Implementations should be pure and invertible: `to_entity(to_json(e))`
/// must yield an entity equal to `e`. Errors abort the enclosing repository
/// call and are surfaced unchanged.
pub trait Mapper<T>: Send + Sync {
    /// Builds an entity from a persisted document.
    fn to_entity(&self, document: Document) -> Result<T>;

    /// Serializes an entity into its persisted form.
    fn to_json(&self, entity: &T) -> Result<Value>;
}

impl<T, M> Mapper<T> for &M
where
    M: Mapper<T> + ?Sized,
{
    fn to_entity(&self, document: Document) -> Result<T> {
        (**self).to_entity(document)
    }

    fn to_json(&self, entity: &T) -> Result<Value> {
        (**self).to_json(entity)
    }
}

impl<T, M> Mapper<T> for Arc<M>
where
    M: Mapper<T> + ?Sized,
{
    fn to_entity(&self, document: Document) -> Result<T> {
        (**self).to_entity(document)
    }

    fn to_json(&self, entity: &T) -> Result<Value> {
        (**self).to_json(entity)
    }
}

/// Serde-backed mapper for entities that serialize to a JSON object.
///
/// The document payload is deserialized as-is; the document id is not injected,
/// so entities are expected to persist their own identifier field.
pub struct JsonMapper<T> {
    _entity: PhantomData<fn() -> T>,
}

impl<T> JsonMapper<T> {
    /// Creates a new JSON mapper.
    pub fn new() -> Self {
        Self {
            _entity: PhantomData,
        }
    }
}

impl<T> Default for JsonMapper<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for JsonMapper<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for JsonMapper<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonMapper").finish()
    }
}

impl<T> Mapper<T> for JsonMapper<T>
where
    T: Serialize + DeserializeOwned,
{
    fn to_entity(&self, document: Document) -> Result<T> {
        serde_json::from_value(document.data).map_err(Error::mapping)
    }

    fn to_json(&self, entity: &T) -> Result<Value> {
        let value = serde_json::to_value(entity).map_err(Error::mapping)?;
        if !value.is_object() {
            return Err(Error::mapping(format!(
                "entity must serialize to a JSON object, got {value}"
            )));
        }
        Ok(value)
    }
}
