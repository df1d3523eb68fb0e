//! Prelude module for docrepo.
//!
//! Re-exports the types and traits most callers need, so a single `use`
//! statement brings repositories, filters and the unit of work into scope.
//!
//! # Example
//!
//! ```rust
//! use docrepo::prelude::*;
//!
//! let filter = Filter::new().eq("team", "core").asc("name");
//! let request = PageRequest::new(filter).with_take(20);
//! assert_eq!(request.take, Some(20));
//! ```

// Repositories
pub use crate::repository::{DocumentRepository, ReadRepository, WriteMode, WriteRepository};
// Mapping
pub use crate::mapper::{JsonMapper, Mapper};
// Storage
pub use crate::store::{CollectionRef, DocumentStore, MemoryStore};
// Requests and results
pub use crate::types::{
    Condition, Direction, Document, DocumentId, Entity, Filter, FindOptions, MatchFilter,
    Operator, Page, PageRequest, SortOrder,
};
// Unit of work
pub use crate::unit_of_work::{StoreUnitOfWork, UnitOfWork};
pub use crate::{Error, RepositoryConfig, Result};
