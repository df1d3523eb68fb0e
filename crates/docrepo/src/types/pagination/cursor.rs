//! Opaque page tokens.
//!
//! A token is the standard base64 encoding of a UTF-8 JSON object:
//!
//! ```json
//! { "v": 1, "type": "next", "ref": "42", "take": 50, "where": [...], "orderBy": [...], "page": 1 }
//! ```
//!
//! Tokens are only meaningful for the filter they were produced from. No
//! signature or tamper check is performed; callers must treat them as untrusted
//! input, which is why the decoded page size is clamped again before use.

use std::fmt;

use base64::prelude::*;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::types::{Condition, DocumentId, Filter, Ordering};
use crate::{Error, Result};

/// Direction in which a page token resumes the scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Direction {
    /// Rows strictly after the reference document.
    Next,
    /// Rows strictly before the reference document.
    Prev,
}

/// Decoded state of a page token.
///
/// Every field other than the direction is optional on the wire; missing
/// values fall back to the caller's request.
#[derive(Debug, Clone, PartialEq)]
pub struct PageCursor {
    /// Scan direction.
    pub direction: Direction,
    /// Boundary document of the page the token was produced from.
    pub reference: Option<DocumentId>,
    /// Page size.
    pub take: Option<usize>,
    /// Conditions of the originating filter.
    pub conditions: Option<Vec<Condition>>,
    /// Orderings of the originating filter.
    pub order_by: Option<Vec<Ordering>>,
    /// Zero-based index of the page the token points to.
    pub page: Option<u64>,
}

/// Current token format version.
pub const CURSOR_VERSION: u32 = 1;

fn default_version() -> u32 {
    CURSOR_VERSION
}

#[derive(Serialize, Deserialize)]
struct WireCursor {
    #[serde(default = "default_version")]
    v: u32,
    #[serde(rename = "type")]
    kind: String,
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    take: Option<usize>,
    #[serde(rename = "where", default, skip_serializing_if = "Option::is_none")]
    conditions: Option<Vec<Condition>>,
    #[serde(rename = "orderBy", default, skip_serializing_if = "Option::is_none")]
    order_by: Option<Vec<Ordering>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    page: Option<u64>,
}

impl PageCursor {
    /// Creates a cursor resuming in `direction` from `reference`.
    pub fn new(
        direction: Direction,
        reference: DocumentId,
        take: usize,
        filter: &Filter,
        page: u64,
    ) -> Self {
        Self {
            direction,
            reference: Some(reference),
            take: Some(take),
            conditions: (!filter.conditions.is_empty()).then(|| filter.conditions.clone()),
            order_by: (!filter.order_by.is_empty()).then(|| filter.order_by.clone()),
            page: Some(page),
        }
    }

    /// Encodes the cursor as a base64 token.
    pub fn encode(&self) -> Result<String> {
        let wire = WireCursor {
            v: CURSOR_VERSION,
            kind: self.direction.to_string(),
            reference: self.reference.as_ref().map(|id| id.to_string()),
            take: self.take,
            conditions: self.conditions.clone(),
            order_by: self.order_by.clone(),
            page: self.page,
        };

        let json = serde_json::to_vec(&wire)?;
        Ok(BASE64_STANDARD.encode(json))
    }

    /// Decodes a cursor from a base64 token.
    ///
    /// # Errors
    ///
    /// - [`Error::TokenEncoding`] if the token is not valid base64
    /// - [`Error::Serialization`] if the payload is not the expected JSON object
    /// - [`Error::InvalidPageToken`] if the version or direction is not recognized
    pub fn decode(token: &str) -> Result<Self> {
        let bytes = BASE64_STANDARD.decode(token)?;
        let wire: WireCursor = serde_json::from_slice(&bytes)?;

        if wire.v != CURSOR_VERSION {
            return Err(Error::invalid_page_token(format!(
                "unsupported token version {}",
                wire.v
            )));
        }

        let direction = wire.kind.parse::<Direction>().map_err(|_| {
            Error::invalid_page_token(format!("unrecognized direction '{}'", wire.kind))
        })?;

        Ok(Self {
            direction,
            reference: wire.reference.map(DocumentId::from),
            take: wire.take,
            conditions: wire.conditions,
            order_by: wire.order_by,
            page: wire.page,
        })
    }
}

impl fmt::Display for PageCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.reference, self.direction) {
            (Some(reference), Direction::Next) => write!(f, "after {reference}"),
            (Some(reference), Direction::Prev) => write!(f, "before {reference}"),
            (None, _) => f.write_str("from start"),
        }
    }
}
