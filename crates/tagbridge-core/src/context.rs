//! Per-request context forwarded to every collaborator call.

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::{Error, Result};

/// Request-scoped context.
///
/// Carries the caller's cancellation signal and a request id used to
/// correlate log lines. Collaborators receive the same context unchanged.
#[derive(Debug, Clone)]
pub struct Context {
    request_id: Uuid,
    cancellation: CancellationToken,
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    /// Creates a context with a fresh request id and its own cancellation token.
    #[must_use]
    pub fn new() -> Self {
        Self::with_cancellation(CancellationToken::new())
    }

    /// Creates a context bound to a caller-supplied cancellation token.
    #[must_use]
    pub fn with_cancellation(cancellation: CancellationToken) -> Self {
        Self {
            request_id: Uuid::now_v7(),
            cancellation,
        }
    }

    /// Returns the request id.
    #[must_use]
    pub const fn request_id(&self) -> Uuid {
        self.request_id
    }

    /// Returns true once the caller has cancelled the request.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Fails with [`Error::Cancelled`] if the request was cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cancelled`] once the token has been triggered.
    pub fn ensure_active(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_context_is_active() {
        let ctx = Context::new();
        assert!(!ctx.is_cancelled());
        assert!(ctx.ensure_active().is_ok());
    }

    #[test]
    fn test_cancellation_is_shared_with_caller() {
        let token = CancellationToken::new();
        let ctx = Context::with_cancellation(token.clone());
        let forwarded = ctx.clone();

        token.cancel();

        assert!(ctx.is_cancelled());
        assert_eq!(forwarded.ensure_active(), Err(Error::Cancelled));
    }

    #[test]
    fn test_request_ids_are_unique() {
        assert_ne!(Context::new().request_id(), Context::new().request_id());
    }
}
