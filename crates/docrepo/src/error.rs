//! Error types and utilities for repository operations.

/// Type-erased error type for backend and mapper failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result type for all operations in this crate.
///
/// This is a convenience type alias that defaults to using [`Error`] as the error type.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Unified error type for repository, unit-of-work and store operations.
///
/// Store errors are surfaced as-is: this layer performs no retries and does not
/// translate backend failures into another taxonomy.
#[derive(Debug, thiserror::Error)]
#[must_use = "repository errors should be handled appropriately"]
pub enum Error {
    /// Caller supplied input that cannot be used.
    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    /// Page token decoded but carries state this layer refuses to resume from.
    #[error("Invalid page token: {reason}")]
    InvalidPageToken { reason: String },

    /// Page token is not valid base64.
    #[error("Page token encoding error: {0}")]
    TokenEncoding(#[from] base64::DecodeError),

    /// JSON (de)serialization failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Mapper failed to convert between an entity and its persisted form.
    #[error("Mapping error: {0}")]
    Mapping(#[source] BoxError),

    /// Create precondition failed: the document already exists.
    #[error("Document '{id}' already exists in collection '{collection}'")]
    AlreadyExists { collection: String, id: String },

    /// Existence precondition failed: the document does not exist.
    #[error("Document '{id}' not found in collection '{collection}'")]
    NotFound { collection: String, id: String },

    /// Unit of work has no active batch.
    #[error("Unit of work has no active transaction")]
    TransactionNotActive,

    /// Store backend failure (network, transport, internal).
    #[error("Store backend error: {0}")]
    Backend(#[source] BoxError),

    /// Invalid configuration.
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl Error {
    /// Create an invalid input error
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }

    /// Create an invalid page token error
    pub fn invalid_page_token(reason: impl Into<String>) -> Self {
        Self::InvalidPageToken {
            reason: reason.into(),
        }
    }

    /// Create a mapping error from any error source
    pub fn mapping(source: impl Into<BoxError>) -> Self {
        Self::Mapping(source.into())
    }

    /// Create an already-exists error
    pub fn already_exists(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self::AlreadyExists {
            collection: collection.into(),
            id: id.into(),
        }
    }

    /// Create a not-found error
    pub fn not_found(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            collection: collection.into(),
            id: id.into(),
        }
    }

    /// Create a backend error from any error source
    pub fn backend(source: impl Into<BoxError>) -> Self {
        Self::Backend(source.into())
    }

    /// Create an invalid configuration error
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Returns whether this error is a store precondition violation.
    ///
    /// Covers create-on-existing and update/delete-on-missing.
    pub fn is_precondition_failure(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. } | Self::NotFound { .. })
    }

    /// Returns whether this error originates from a malformed or rejected page token.
    pub fn is_page_token_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidPageToken { .. } | Self::TokenEncoding(_) | Self::Serialization(_)
        )
    }
}
