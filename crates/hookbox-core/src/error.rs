//! Error types and result handling for ingestion and storage operations.
//!
//! Two layers: `CoreError` describes what went wrong inside the storage
//! layer, `HookboxError` is the request-facing taxonomy with stable codes
//! that the HTTP layer maps onto status codes.

use thiserror::Error;

/// Result type alias using `CoreError`.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core error type for storage operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(String),

    /// A message with this identifier is already stored.
    ///
    /// This is the one expected, non-fatal storage outcome: the ingestion
    /// path treats it as a duplicate delivery.
    #[error("Message {message_id} already exists")]
    AlreadyExists {
        /// Identifier that collided
        message_id: String,
    },

    /// Invalid input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl CoreError {
    /// Returns true for the uniqueness signal the ingestion path recovers from.
    pub const fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. })
    }
}

// Unique violations on insert are mapped to `AlreadyExists` at the call
// site, where the colliding message id is known.
impl From<sqlx::Error> for CoreError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// Request-facing error taxonomy with codes for client disambiguation.
#[derive(Debug, Error)]
pub enum HookboxError {
    /// Signature header missing or HMAC mismatch (E1001).
    #[error("[E1001] Invalid signature: HMAC validation failed")]
    InvalidSignature,

    /// Webhook payload is malformed or incomplete (E1002).
    #[error("[E1002] Validation failed: {reason}")]
    Validation {
        /// Human-readable reason, returned to the caller verbatim
        reason: String,
    },

    /// Query parameters out of range (E1003).
    #[error("[E1003] Invalid query: {reason}")]
    InvalidQuery {
        /// Which parameter was rejected and why
        reason: String,
    },

    /// The message store could not serve the request (E3001).
    #[error("[E3001] Storage unavailable: {0}")]
    StorageUnavailable(#[source] CoreError),
}

impl HookboxError {
    /// Creates a validation error from any displayable reason.
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation { reason: reason.into() }
    }

    /// Creates a query validation error.
    pub fn invalid_query(reason: impl Into<String>) -> Self {
        Self::InvalidQuery { reason: reason.into() }
    }

    /// Returns the error code (E1001-E3001).
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidSignature => "E1001",
            Self::Validation { .. } => "E1002",
            Self::InvalidQuery { .. } => "E1003",
            Self::StorageUnavailable(_) => "E3001",
        }
    }

    /// Returns the message exposed to HTTP callers.
    ///
    /// Storage details stay in the logs.
    pub fn detail(&self) -> String {
        match self {
            Self::InvalidSignature => "invalid signature".to_string(),
            Self::Validation { reason } | Self::InvalidQuery { reason } => reason.clone(),
            Self::StorageUnavailable(_) => "storage unavailable".to_string(),
        }
    }

    /// Returns whether the caller caused this error.
    pub const fn is_client_error(&self) -> bool {
        !matches!(self, Self::StorageUnavailable(_))
    }
}

impl From<CoreError> for HookboxError {
    fn from(err: CoreError) -> Self {
        Self::StorageUnavailable(err)
    }
}
