//! Repository contracts and the document-backed implementation.

mod document_repository;

use std::fmt;
use std::future::Future;
use std::sync::Arc;

pub use document_repository::DocumentRepository;

use crate::Result;
use crate::types::{DocumentId, FindOptions, MatchFilter, Page, PageRequest};
use crate::unit_of_work::UnitOfWork;

/// Read operations over a collection of entities.
pub trait ReadRepository<T> {
    /// Returns up to `take` entities matching the filter.
    ///
    /// The page size defaults to the configured default and is clamped to
    /// `[1, max_take]`.
    fn find(&self, options: FindOptions) -> impl Future<Output = Result<Vec<T>>> + Send;

    /// Returns the first entity matching the filter, or `None`.
    fn find_one(&self, filter: MatchFilter) -> impl Future<Output = Result<Option<T>>> + Send;

    /// Looks up an entity by identifier.
    fn find_by_id(&self, id: &DocumentId) -> impl Future<Output = Result<Option<T>>> + Send;

    /// Returns one page of entities ordered by document identifier.
    ///
    /// When the request carries a page token, the filter, ordering and page
    /// size stored in the token take precedence over the request.
    fn paginate(&self, request: PageRequest) -> impl Future<Output = Result<Page<T>>> + Send;
}

/// Write operations over a collection of entities.
///
/// In [`WriteMode::Batched`] mode none of these calls touches the store; the
/// writes take effect when the unit of work commits.
pub trait WriteRepository<T> {
    /// Inserts a new entity. Fails if its identifier is already taken.
    fn create(&self, entity: &T) -> impl Future<Output = Result<()>> + Send;

    /// Updates an existing entity keyed by its identifier.
    fn update(&self, entity: &T) -> impl Future<Output = Result<()>> + Send;

    /// Deletes an entity. Fails if it does not exist.
    fn delete_by_id(&self, id: &DocumentId) -> impl Future<Output = Result<()>> + Send;
}

/// How a repository applies writes, fixed at construction.
#[derive(Clone, Default)]
pub enum WriteMode {
    /// Writes go straight to the store.
    #[default]
    Immediate,
    /// Writes are queued into a unit of work.
    Batched(Arc<dyn UnitOfWork>),
}

impl WriteMode {
    /// Creates a batched mode backed by `unit_of_work`.
    pub fn batched(unit_of_work: Arc<dyn UnitOfWork>) -> Self {
        Self::Batched(unit_of_work)
    }

    /// Returns true if writes are deferred to a unit of work.
    pub fn is_batched(&self) -> bool {
        matches!(self, Self::Batched(_))
    }
}

impl fmt::Debug for WriteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Immediate => f.write_str("Immediate"),
            Self::Batched(_) => f.write_str("Batched"),
        }
    }
}
