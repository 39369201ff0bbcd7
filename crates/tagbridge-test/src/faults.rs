//! Fault-injecting collaborators.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tagbridge_core::{
    Context, Descriptor, Digest, Error, ImageMetadata, ImageMetadataStore, ImageStreamReader,
    LookupError, RepositoryContextResolver, RepositoryHandle, RepositoryRef, TagEntry,
    TagService,
};

/// Image store that fails lookups for selected digests.
#[derive(Debug, Clone)]
pub struct FailingImageStore<T> {
    inner: T,
    failing: Arc<RwLock<HashSet<Digest>>>,
    error: LookupError,
}

impl<T> FailingImageStore<T> {
    /// Wraps `inner`; failing lookups report `error`.
    #[must_use]
    pub fn new(inner: T, error: LookupError) -> Self {
        Self {
            inner,
            failing: Arc::new(RwLock::new(HashSet::new())),
            error,
        }
    }

    /// Makes lookups of `digest` fail.
    #[must_use]
    pub fn failing(self, digest: Digest) -> Self {
        self.failing.write().insert(digest);
        self
    }
}

#[async_trait]
impl<T: ImageMetadataStore> ImageMetadataStore for FailingImageStore<T> {
    async fn get(
        &self,
        ctx: &Context,
        digest: &Digest,
    ) -> Result<ImageMetadata, LookupError> {
        if self.failing.read().contains(digest) {
            tracing::debug!(%digest, error = %self.error, "Injecting image lookup failure");
            return Err(self.error.clone());
        }
        self.inner.get(ctx, digest).await
    }
}

/// Resolver that always fails with the given error.
#[derive(Debug, Clone)]
pub struct FailingResolver {
    error: LookupError,
}

impl FailingResolver {
    /// Creates a resolver failing with `error`.
    #[must_use]
    pub const fn new(error: LookupError) -> Self {
        Self { error }
    }
}

#[async_trait]
impl RepositoryContextResolver for FailingResolver {
    async fn resolve(
        &self,
        _ctx: &Context,
        _repository: &RepositoryRef,
    ) -> Result<RepositoryHandle, LookupError> {
        Err(self.error.clone())
    }
}

/// Index reads that [`FailingIndex`] can be told to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexCall {
    /// [`ImageStreamReader::get_tag`].
    GetTag,
    /// [`ImageStreamReader::list_tags`].
    ListTags,
    /// [`ImageStreamReader::pullthrough_enabled`].
    PullthroughEnabled,
}

/// Image stream index whose selected reads fail.
///
/// Failing a read with [`LookupError::NotFound`] models a stream removed
/// after the repository was resolved.
#[derive(Debug, Clone)]
pub struct FailingIndex<T> {
    inner: T,
    failing: Arc<RwLock<HashSet<IndexCall>>>,
    error: LookupError,
}

impl<T> FailingIndex<T> {
    /// Wraps `inner`; failing reads report `error`.
    #[must_use]
    pub fn new(inner: T, error: LookupError) -> Self {
        Self {
            inner,
            failing: Arc::new(RwLock::new(HashSet::new())),
            error,
        }
    }

    /// Makes `call` fail.
    #[must_use]
    pub fn failing(self, call: IndexCall) -> Self {
        self.failing.write().insert(call);
        self
    }

    fn fault(&self, call: IndexCall) -> Result<(), LookupError> {
        if self.failing.read().contains(&call) {
            tracing::debug!(?call, error = %self.error, "Injecting index failure");
            return Err(self.error.clone());
        }
        Ok(())
    }
}

#[async_trait]
impl<T: ImageStreamReader> ImageStreamReader for FailingIndex<T> {
    async fn get_tag(
        &self,
        ctx: &Context,
        handle: &RepositoryHandle,
        tag: &str,
    ) -> Result<Digest, LookupError> {
        self.fault(IndexCall::GetTag)?;
        self.inner.get_tag(ctx, handle, tag).await
    }

    async fn list_tags(
        &self,
        ctx: &Context,
        handle: &RepositoryHandle,
    ) -> Result<Vec<TagEntry>, LookupError> {
        self.fault(IndexCall::ListTags)?;
        self.inner.list_tags(ctx, handle).await
    }

    async fn pullthrough_enabled(
        &self,
        ctx: &Context,
        handle: &RepositoryHandle,
    ) -> Result<bool, LookupError> {
        self.fault(IndexCall::PullthroughEnabled)?;
        self.inner.pullthrough_enabled(ctx, handle).await
    }
}

/// Local tag store whose writes and removals fail with a fixed error.
///
/// Reads are delegated to the wrapped store.
#[derive(Debug, Clone)]
pub struct FailingTagStore<T> {
    inner: T,
    error: Error,
}

impl<T> FailingTagStore<T> {
    /// Wraps `inner`; `tag` and `untag` report `error`.
    #[must_use]
    pub const fn new(inner: T, error: Error) -> Self {
        Self { inner, error }
    }
}

#[async_trait]
impl<T: TagService> TagService for FailingTagStore<T> {
    async fn get(&self, ctx: &Context, tag: &str) -> tagbridge_core::Result<Descriptor> {
        self.inner.get(ctx, tag).await
    }

    async fn tag(
        &self,
        _ctx: &Context,
        _tag: &str,
        _descriptor: Descriptor,
    ) -> tagbridge_core::Result<()> {
        Err(self.error.clone())
    }

    async fn untag(&self, _ctx: &Context, _tag: &str) -> tagbridge_core::Result<()> {
        Err(self.error.clone())
    }

    async fn all(&self, ctx: &Context) -> tagbridge_core::Result<Vec<String>> {
        self.inner.all(ctx).await
    }

    async fn lookup(
        &self,
        ctx: &Context,
        descriptor: &Descriptor,
    ) -> tagbridge_core::Result<Vec<String>> {
        self.inner.lookup(ctx, descriptor).await
    }
}
