//! Cursor-based pagination types.
//!
//! Pages are resumed from opaque tokens that carry the scan direction, the
//! boundary document id and the filter the page was produced from. Only
//! adjacent-page navigation is supported.

mod cursor;
mod page;

pub use cursor::{Direction, PageCursor};
pub use page::Page;

/// Maximum number of items per page.
pub const MAX_TAKE: usize = 100;

/// Page size used when the caller does not request one.
pub const DEFAULT_TAKE: usize = 50;
