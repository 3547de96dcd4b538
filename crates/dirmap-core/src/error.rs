//! Error types for the mapping engine and the directory collaborator.
//!
//! Directory errors carry a transient/permanent classification so callers
//! can decide whether retrying the batch is worthwhile; the engine itself
//! never retries.

use thiserror::Error;

/// Error from the directory-search collaborator.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// Failed to establish a session with the directory.
    #[error("directory connection failed: {message}")]
    ConnectionFailed {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The directory rejected the bind.
    #[error("directory bind failed: {message}")]
    BindFailed { message: String },

    /// A search failed at the transport or protocol level.
    #[error("directory search failed: {message}")]
    SearchFailed {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation attempted without an established session.
    #[error("no directory session established")]
    NotConnected,

    /// The directory did not answer within the configured deadline.
    #[error("directory timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// The collaborator's configuration is invalid.
    #[error("invalid directory configuration: {message}")]
    InvalidConfiguration { message: String },
}

impl DirectoryError {
    /// Whether the condition may resolve itself and the batch is worth
    /// retrying later.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            DirectoryError::ConnectionFailed { .. }
                | DirectoryError::SearchFailed { .. }
                | DirectoryError::NotConnected
                | DirectoryError::Timeout { .. }
        )
    }

    /// Whether the condition requires intervention before retrying.
    pub fn is_permanent(&self) -> bool {
        !self.is_transient()
    }

    /// Create a connection failure.
    pub fn connection_failed(message: impl Into<String>) -> Self {
        DirectoryError::ConnectionFailed {
            message: message.into(),
            source: None,
        }
    }

    /// Create a connection failure with its underlying cause.
    pub fn connection_failed_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        DirectoryError::ConnectionFailed {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a search failure.
    pub fn search_failed(message: impl Into<String>) -> Self {
        DirectoryError::SearchFailed {
            message: message.into(),
            source: None,
        }
    }

    /// Create a search failure with its underlying cause.
    pub fn search_failed_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        DirectoryError::SearchFailed {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a configuration error.
    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        DirectoryError::InvalidConfiguration {
            message: message.into(),
        }
    }
}

/// Error returned by the mapping engine.
#[derive(Debug, Error)]
pub enum IdmapError {
    /// The identity subsystem is known offline; nothing was attempted and
    /// the request list was not touched.
    #[error("identity subsystem is offline")]
    ServiceUnavailable,

    /// A directory search failed mid-batch. Requests resolved by earlier
    /// chunks keep their status; the call as a whole should be considered
    /// failed and may be retried in full.
    #[error("directory unavailable: {0}")]
    DirectoryUnavailable(#[from] DirectoryError),

    /// Buffer growth failed while building a search filter.
    #[error("allocation failed while building a search filter")]
    AllocationFailure,
}

/// Result alias for engine operations.
pub type IdmapResult<T> = Result<T, IdmapError>;
