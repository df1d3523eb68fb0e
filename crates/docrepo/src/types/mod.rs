//! Document, filter and pagination types shared by repositories and stores.

mod document;
mod filter;
mod pagination;

pub use document::{Document, DocumentId, Entity};
pub use filter::{
    Condition, Filter, FindOptions, MatchFilter, Operator, Ordering, PageRequest, SortOrder,
};
pub use pagination::{DEFAULT_TAKE, Direction, MAX_TAKE, Page, PageCursor};
