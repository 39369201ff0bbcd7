//! Call-recording collaborator wrappers.
//!
//! [`Recording`] wraps any collaborator and counts every call made through
//! it into a shared [`CallLog`], so tests can assert which data sources an
//! operation touched.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tagbridge_core::{
    Context, Descriptor, Digest, ImageMetadata, ImageMetadataStore, ImageStreamReader,
    LookupError, RepositoryContextResolver, RepositoryHandle, RepositoryRef, Result, TagEntry,
    TagService,
};

/// Shared call counter keyed by call name.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<BTreeMap<String, usize>>>,
}

impl CallLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, name: &str) {
        *self.calls.lock().entry(name.to_string()).or_default() += 1;
    }

    /// Returns how many times `name` was called.
    #[must_use]
    pub fn count(&self, name: &str) -> usize {
        self.calls.lock().get(name).copied().unwrap_or(0)
    }

    /// Returns the total number of recorded calls.
    #[must_use]
    pub fn total(&self) -> usize {
        self.calls.lock().values().sum()
    }

    /// Returns the total number of calls whose name starts with `prefix`.
    #[must_use]
    pub fn total_with_prefix(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|(name, _)| name.starts_with(prefix))
            .map(|(_, count)| count)
            .sum()
    }

    /// Returns a copy of all counters.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<String, usize> {
        self.calls.lock().clone()
    }

    /// Clears all counters.
    pub fn reset(&self) {
        self.calls.lock().clear();
    }
}

/// Wraps a collaborator and records each call under `<prefix>.<method>`.
#[derive(Debug, Clone)]
pub struct Recording<T> {
    inner: T,
    prefix: &'static str,
    log: CallLog,
}

impl<T> Recording<T> {
    /// Wraps `inner`, recording into `log` with the given prefix.
    #[must_use]
    pub const fn new(inner: T, prefix: &'static str, log: CallLog) -> Self {
        Self { inner, prefix, log }
    }

    /// Returns the wrapped collaborator.
    #[must_use]
    pub const fn inner(&self) -> &T {
        &self.inner
    }

    fn record(&self, method: &str) {
        self.log.record(&format!("{}.{method}", self.prefix));
    }
}

#[async_trait]
impl<T: RepositoryContextResolver> RepositoryContextResolver for Recording<T> {
    async fn resolve(
        &self,
        ctx: &Context,
        repository: &RepositoryRef,
    ) -> std::result::Result<RepositoryHandle, LookupError> {
        self.record("resolve");
        self.inner.resolve(ctx, repository).await
    }
}

#[async_trait]
impl<T: ImageStreamReader> ImageStreamReader for Recording<T> {
    async fn get_tag(
        &self,
        ctx: &Context,
        handle: &RepositoryHandle,
        tag: &str,
    ) -> std::result::Result<Digest, LookupError> {
        self.record("get_tag");
        self.inner.get_tag(ctx, handle, tag).await
    }

    async fn list_tags(
        &self,
        ctx: &Context,
        handle: &RepositoryHandle,
    ) -> std::result::Result<Vec<TagEntry>, LookupError> {
        self.record("list_tags");
        self.inner.list_tags(ctx, handle).await
    }

    async fn pullthrough_enabled(
        &self,
        ctx: &Context,
        handle: &RepositoryHandle,
    ) -> std::result::Result<bool, LookupError> {
        self.record("pullthrough_enabled");
        self.inner.pullthrough_enabled(ctx, handle).await
    }
}

#[async_trait]
impl<T: ImageMetadataStore> ImageMetadataStore for Recording<T> {
    async fn get(
        &self,
        ctx: &Context,
        digest: &Digest,
    ) -> std::result::Result<ImageMetadata, LookupError> {
        self.record("get");
        self.inner.get(ctx, digest).await
    }
}

#[async_trait]
impl<T: TagService> TagService for Recording<T> {
    async fn get(&self, ctx: &Context, tag: &str) -> Result<Descriptor> {
        self.record("get");
        self.inner.get(ctx, tag).await
    }

    async fn tag(&self, ctx: &Context, tag: &str, descriptor: Descriptor) -> Result<()> {
        self.record("tag");
        self.inner.tag(ctx, tag, descriptor).await
    }

    async fn untag(&self, ctx: &Context, tag: &str) -> Result<()> {
        self.record("untag");
        self.inner.untag(ctx, tag).await
    }

    async fn all(&self, ctx: &Context) -> Result<Vec<String>> {
        self.record("all");
        self.inner.all(ctx).await
    }

    async fn lookup(&self, ctx: &Context, descriptor: &Descriptor) -> Result<Vec<String>> {
        self.record("lookup");
        self.inner.lookup(ctx, descriptor).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tagbridge_registry::InMemoryTagStore;

    #[test]
    fn test_call_log_counts() {
        let log = CallLog::new();
        log.record("images.get");
        log.record("images.get");
        log.record("index.list_tags");

        assert_eq!(log.count("images.get"), 2);
        assert_eq!(log.count("local.tag"), 0);
        assert_eq!(log.total(), 3);
        assert_eq!(log.total_with_prefix("index."), 1);

        log.reset();
        assert_eq!(log.total(), 0);
    }

    #[tokio::test]
    async fn test_recording_tag_store() {
        let log = CallLog::new();
        let store = Recording::new(InMemoryTagStore::new(), "local", log.clone());
        let ctx = Context::new();

        store
            .tag(&ctx, "v1", Descriptor::for_digest(Digest::sha256_of(b"x")))
            .await
            .unwrap();
        let _ = TagService::get(&store, &ctx, "v1").await;

        assert_eq!(log.count("local.tag"), 1);
        assert_eq!(log.count("local.get"), 1);
        assert_eq!(store.inner().len(), 1);
    }
}
