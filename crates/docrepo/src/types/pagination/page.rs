//! A bounded page of results.

use serde::{Deserialize, Serialize};

/// Result of a cursor-paginated query.
///
/// A `None` token means there is no further page in that direction; it is
/// serialized as an explicit `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// The items in this page, in ascending document-id order.
    pub data: Vec<T>,
    /// Token to fetch the following page.
    pub next_page_token: Option<String>,
    /// Token to fetch the preceding page.
    pub prev_page_token: Option<String>,
}

impl<T> Page<T> {
    /// Creates an empty page without tokens.
    pub fn empty() -> Self {
        Self {
            data: Vec::new(),
            next_page_token: None,
            prev_page_token: None,
        }
    }

    /// Returns the number of items in this page.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if this page has no items.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns true if a following page may exist.
    pub fn has_next(&self) -> bool {
        self.next_page_token.is_some()
    }

    /// Returns true if a preceding page exists.
    pub fn has_prev(&self) -> bool {
        self.prev_page_token.is_some()
    }

    /// Maps the items to a different type, keeping the tokens.
    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            data: self.data.into_iter().map(f).collect(),
            next_page_token: self.next_page_token,
            prev_page_token: self.prev_page_token,
        }
    }
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self::empty()
    }
}
