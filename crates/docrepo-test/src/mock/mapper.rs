//! Mock mapper for testing.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use docrepo::{Document, DocumentId, Error, JsonMapper, Mapper, Result};
use serde_json::Value;

#[derive(Debug, Default)]
struct Calls {
    to_entity: Vec<DocumentId>,
    to_json: usize,
    fail_once: Option<String>,
    fail_always: Option<String>,
}

/// Mapper that records calls and delegates to an inner mapper.
///
/// Failures can be injected for the next call or for every call. Clones share
/// the same recorded state.
pub struct MockMapper<T, M = JsonMapper<T>> {
    inner: M,
    calls: Arc<Mutex<Calls>>,
    _entity: std::marker::PhantomData<fn() -> T>,
}

impl<T> MockMapper<T, JsonMapper<T>> {
    /// Creates a mock delegating to a [`JsonMapper`].
    pub fn json() -> Self {
        Self::new(JsonMapper::new())
    }
}

impl<T, M> MockMapper<T, M> {
    /// Creates a mock delegating to `inner`.
    pub fn new(inner: M) -> Self {
        Self {
            inner,
            calls: Arc::default(),
            _entity: std::marker::PhantomData,
        }
    }

    /// Makes the next call fail with a mapping error.
    pub fn fail_next(&self, message: impl Into<String>) {
        self.lock().fail_once = Some(message.into());
    }

    /// Makes every call fail with a mapping error until cleared.
    pub fn fail_always(&self, message: impl Into<String>) {
        self.lock().fail_always = Some(message.into());
    }

    /// Clears injected failures.
    pub fn clear_failures(&self) {
        let mut calls = self.lock();
        calls.fail_once = None;
        calls.fail_always = None;
    }

    /// Returns the identifiers of the documents passed to `to_entity`.
    pub fn to_entity_calls(&self) -> Vec<DocumentId> {
        self.lock().to_entity.clone()
    }

    /// Returns how many times `to_json` was called.
    pub fn to_json_calls(&self) -> usize {
        self.lock().to_json
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Calls> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn injected_failure(calls: &mut Calls) -> Option<Error> {
        calls
            .fail_once
            .take()
            .or_else(|| calls.fail_always.clone())
            .map(Error::mapping)
    }
}

impl<T, M> Mapper<T> for MockMapper<T, M>
where
    M: Mapper<T>,
{
    fn to_entity(&self, document: Document) -> Result<T> {
        {
            let mut calls = self.lock();
            calls.to_entity.push(document.id.clone());
            if let Some(error) = Self::injected_failure(&mut calls) {
                return Err(error);
            }
        }
        self.inner.to_entity(document)
    }

    fn to_json(&self, entity: &T) -> Result<Value> {
        {
            let mut calls = self.lock();
            calls.to_json += 1;
            if let Some(error) = Self::injected_failure(&mut calls) {
                return Err(error);
            }
        }
        self.inner.to_json(entity)
    }
}

impl<T, M: Clone> Clone for MockMapper<T, M> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            calls: Arc::clone(&self.calls),
            _entity: std::marker::PhantomData,
        }
    }
}

impl<T, M> fmt::Debug for MockMapper<T, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockMapper")
            .field("calls", &*self.lock())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use docrepo::{
        CollectionRef, DocumentRepository, FindOptions, ReadRepository, WriteRepository,
    };
    use serde::{Deserialize, Serialize};

    use super::*;
    use crate::seeded_store;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Note {
        id: u64,
        body: String,
    }

    impl docrepo::Entity for Note {
        fn id(&self) -> DocumentId {
            self.id.into()
        }
    }

    fn note(id: u64, body: &str) -> Note {
        Note {
            id,
            body: body.to_owned(),
        }
    }

    #[tokio::test]
    async fn records_calls_through_repository() {
        let store = seeded_store("notes", []).await.unwrap();
        let mapper = MockMapper::<Note>::json();
        let repo: DocumentRepository<Note, _> = DocumentRepository::immediate(
            mapper.clone(),
            CollectionRef::new(store, "notes"),
        );

        repo.create(&note(1, "a")).await.unwrap();
        repo.create(&note(2, "b")).await.unwrap();
        let notes = repo.find(FindOptions::default()).await.unwrap();

        assert_eq!(notes, vec![note(1, "a"), note(2, "b")]);
        assert_eq!(mapper.to_json_calls(), 2);
        assert_eq!(
            mapper.to_entity_calls(),
            vec![DocumentId::from(1_u64), DocumentId::from(2_u64)]
        );
    }

    #[tokio::test]
    async fn injected_failure_aborts_write() {
        let store = seeded_store("notes", []).await.unwrap();
        let mapper = MockMapper::<Note>::json();
        let repo: DocumentRepository<Note, _> = DocumentRepository::immediate(
            mapper.clone(),
            CollectionRef::new(store.clone(), "notes"),
        );

        mapper.fail_next("boom");
        let err = repo.create(&note(1, "a")).await.unwrap_err();
        assert!(matches!(err, Error::Mapping(_)));
        assert_eq!(store.count("notes").await, 0);

        repo.create(&note(1, "a")).await.unwrap();
        assert_eq!(store.count("notes").await, 1);
    }

    #[test]
    fn fail_always_persists_until_cleared() {
        let mapper = MockMapper::<Note>::json();
        mapper.fail_always("down");

        assert!(mapper.to_json(&note(1, "a")).is_err());
        assert!(mapper.to_json(&note(1, "a")).is_err());

        mapper.clear_failures();
        assert!(mapper.to_json(&note(1, "a")).is_ok());
        assert_eq!(mapper.to_json_calls(), 3);
    }
}
