#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

// Tracing target constants for consistent logging.

/// Tracing target for repository read and write operations.
///
/// Use this target for logging query translation, pagination and entity mapping.
pub const TRACING_TARGET_REPOSITORY: &str = "docrepo::repository";

/// Tracing target for unit-of-work operations.
///
/// Use this target for logging batch lifecycle events: begin, enqueue, commit and rollback.
pub const TRACING_TARGET_UNIT_OF_WORK: &str = "docrepo::unit_of_work";

/// Tracing target for document store operations.
///
/// Use this target for logging query execution and writes against a store backend.
pub const TRACING_TARGET_STORE: &str = "docrepo::store";

mod config;
mod error;
pub mod mapper;
pub mod prelude;
pub mod repository;
pub mod store;
pub mod types;
mod unit_of_work;

pub use config::RepositoryConfig;
pub use error::{BoxError, Error, Result};
pub use mapper::{JsonMapper, Mapper};
pub use repository::{DocumentRepository, ReadRepository, WriteMode, WriteRepository};
pub use store::{
    CollectionRef, DocumentStore, MemoryStore, Precondition, Query, WriteBatch, WriteOp,
};
pub use types::{
    Condition, DEFAULT_TAKE, Direction, Document, DocumentId, Entity, Filter, FindOptions,
    MAX_TAKE, MatchFilter, Operator, Ordering, Page, PageCursor, PageRequest, SortOrder,
};
pub use unit_of_work::{BatchState, StoreUnitOfWork, UnitOfWork};
