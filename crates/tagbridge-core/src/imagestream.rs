//! Repository resolution and the control-plane tag index.
//!
//! Both contracts are read-only. The index is owned and mutated elsewhere;
//! tag resolution only ever projects it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::context::Context;
use crate::digest::Digest;
use crate::error::LookupError;
use crate::reference::RepositoryRef;

/// Handle to a resolved repository context.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepositoryHandle {
    repository: RepositoryRef,
    uid: String,
}

impl RepositoryHandle {
    /// Creates a handle for the given repository.
    ///
    /// `uid` is the control plane's identifier for the image stream backing it.
    #[must_use]
    pub fn new(repository: RepositoryRef, uid: impl Into<String>) -> Self {
        Self {
            repository,
            uid: uid.into(),
        }
    }

    /// Returns the repository this handle was resolved from.
    #[must_use]
    pub const fn repository(&self) -> &RepositoryRef {
        &self.repository
    }

    /// Returns the control-plane identifier.
    #[must_use]
    pub fn uid(&self) -> &str {
        &self.uid
    }
}

/// A single `(tag, digest)` mapping in an image stream.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TagEntry {
    /// Tag name.
    pub tag: String,

    /// Digest the tag currently points at.
    pub digest: Digest,
}

impl TagEntry {
    /// Creates a new tag entry.
    #[must_use]
    pub fn new(tag: impl Into<String>, digest: Digest) -> Self {
        Self {
            tag: tag.into(),
            digest,
        }
    }
}

/// Maps a repository reference to a control-plane handle.
#[async_trait]
pub trait RepositoryContextResolver: Send + Sync {
    /// Resolves the repository.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::NotFound`] if the repository has no image stream.
    async fn resolve(
        &self,
        ctx: &Context,
        repository: &RepositoryRef,
    ) -> Result<RepositoryHandle, LookupError>;
}

/// Read-only projection of an image stream's tags.
#[async_trait]
pub trait ImageStreamReader: Send + Sync {
    /// Returns the digest the tag currently points at.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::NotFound`] if the stream has no such tag.
    async fn get_tag(
        &self,
        ctx: &Context,
        handle: &RepositoryHandle,
        tag: &str,
    ) -> Result<Digest, LookupError>;

    /// Lists every tag in the stream. Order is not significant.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream cannot be read.
    async fn list_tags(
        &self,
        ctx: &Context,
        handle: &RepositoryHandle,
    ) -> Result<Vec<TagEntry>, LookupError>;

    /// Returns whether pullthrough is enabled for the repository.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream cannot be read.
    async fn pullthrough_enabled(
        &self,
        ctx: &Context,
        handle: &RepositoryHandle,
    ) -> Result<bool, LookupError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_accessors() {
        let handle = RepositoryHandle::new(RepositoryRef::new("user", "app"), "uid-1");
        assert_eq!(handle.repository().to_string(), "user/app");
        assert_eq!(handle.uid(), "uid-1");
    }

    #[test]
    fn test_tag_entries_order_by_name() {
        let digest = Digest::sha256_of(b"x");
        let mut entries = vec![
            TagEntry::new("v2", digest.clone()),
            TagEntry::new("latest", digest.clone()),
            TagEntry::new("v1", digest),
        ];
        entries.sort();
        let names: Vec<_> = entries.iter().map(|e| e.tag.as_str()).collect();
        assert_eq!(names, ["latest", "v1", "v2"]);
    }
}
