//! Error types for tag resolution.
//!
//! [`Error`] is the closed taxonomy surfaced to the request-handling layer.
//! [`LookupError`] is the narrower contract the read-side collaborators speak;
//! the tag service decides how each lookup failure is classified.

use thiserror::Error;

use crate::digest::Digest;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by tag service operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The repository context could not be resolved.
    #[error("repository name not known to registry: {name}")]
    RepositoryUnknown {
        /// Repository name as `namespace/name`.
        name: String,
    },

    /// The tag is absent, or present but not visible to this repository.
    #[error("unknown tag={tag}")]
    TagUnknown {
        /// Tag name.
        tag: String,
    },

    /// A descriptor handed to a write does not match any known image.
    #[error("image not found: {digest}")]
    ImageNotFound {
        /// Digest that failed to resolve.
        digest: Digest,
    },

    /// The caller cancelled the request.
    #[error("request cancelled")]
    Cancelled,

    /// A digest string could not be parsed.
    #[error("invalid digest '{digest}': {reason}")]
    InvalidDigest {
        /// The offending digest string.
        digest: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A repository reference could not be parsed.
    #[error("invalid repository reference '{reference}': {reason}")]
    InvalidReference {
        /// The offending reference string.
        reference: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A collaborator failed for reasons other than absence.
    #[error("{collaborator} failed: {message}")]
    Backend {
        /// Name of the failing collaborator.
        collaborator: &'static str,
        /// Error message reported by the collaborator.
        message: String,
    },
}

impl Error {
    /// Creates a [`Error::TagUnknown`] for the given tag.
    #[must_use]
    pub fn tag_unknown(tag: impl Into<String>) -> Self {
        Self::TagUnknown { tag: tag.into() }
    }

    /// Creates a [`Error::RepositoryUnknown`] for the given repository name.
    #[must_use]
    pub fn repository_unknown(name: impl Into<String>) -> Self {
        Self::RepositoryUnknown { name: name.into() }
    }

    /// Returns true for the "does not exist" family of errors.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::RepositoryUnknown { .. } | Self::TagUnknown { .. } | Self::ImageNotFound { .. }
        )
    }
}

/// Failure reported by a read-side collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// The requested object does not exist.
    #[error("not found")]
    NotFound,

    /// The lookup observed the request's cancellation.
    #[error("cancelled")]
    Cancelled,

    /// Any other failure (transport, decoding, permissions).
    #[error("{0}")]
    Backend(String),
}

impl LookupError {
    /// Converts a lookup failure into a pass-through [`Error`].
    ///
    /// `NotFound` has no generic meaning here; callers classify it themselves
    /// before falling back to this conversion.
    #[must_use]
    pub fn into_error(self, collaborator: &'static str) -> Error {
        match self {
            Self::Cancelled => Error::Cancelled,
            Self::NotFound => Error::Backend {
                collaborator,
                message: "not found".to_string(),
            },
            Self::Backend(message) => Error::Backend {
                collaborator,
                message,
            },
        }
    }
}
