//! In-memory collaborators.
//!
//! [`InMemoryControlPlane`] backs the resolver, the image stream index and the
//! image metadata store from a single shared state. [`InMemoryTagStore`] is a
//! plain tag service usable as the local store. Clones share state.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tagbridge_core::{
    Context, Descriptor, Digest, Error, ImageMetadata, ImageMetadataStore, ImageStreamReader,
    LookupError, RepositoryContextResolver, RepositoryHandle, RepositoryRef, Result, TagEntry,
    TagService,
};

#[derive(Debug, Default)]
struct ControlPlaneState {
    streams: HashMap<RepositoryRef, StreamRecord>,
    images: HashMap<Digest, ImageMetadata>,
    next_uid: u64,
}

#[derive(Debug)]
struct StreamRecord {
    uid: String,
    pullthrough: bool,
    tags: BTreeMap<String, Digest>,
}

/// Control-plane state held in memory.
///
/// Mutators exist for fixtures and tooling; the tag service only reads
/// through the collaborator traits.
#[derive(Debug, Clone, Default)]
pub struct InMemoryControlPlane {
    state: Arc<RwLock<ControlPlaneState>>,
}

impl InMemoryControlPlane {
    /// Creates an empty control plane.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the image stream for `repository`, or updates its pullthrough flag.
    pub fn upsert_stream(&self, repository: RepositoryRef, pullthrough: bool) {
        let mut state = self.state.write();
        if let Some(stream) = state.streams.get_mut(&repository) {
            stream.pullthrough = pullthrough;
            return;
        }
        state.next_uid += 1;
        let uid = format!("imagestream-{}", state.next_uid);
        state.streams.insert(
            repository,
            StreamRecord {
                uid,
                pullthrough,
                tags: BTreeMap::new(),
            },
        );
    }

    /// Removes the image stream for `repository`. Returns true if it existed.
    pub fn remove_stream(&self, repository: &RepositoryRef) -> bool {
        self.state.write().streams.remove(repository).is_some()
    }

    /// Sets the pullthrough flag. Returns false if the stream does not exist.
    pub fn set_pullthrough(&self, repository: &RepositoryRef, pullthrough: bool) -> bool {
        let mut state = self.state.write();
        let Some(stream) = state.streams.get_mut(repository) else {
            return false;
        };
        stream.pullthrough = pullthrough;
        true
    }

    /// Points `tag` at `digest`, overwriting any previous mapping.
    /// Returns false if the stream does not exist.
    pub fn set_tag(&self, repository: &RepositoryRef, tag: impl Into<String>, digest: Digest) -> bool {
        self.state
            .write()
            .streams
            .get_mut(repository)
            .map(|stream| stream.tags.insert(tag.into(), digest))
            .is_some()
    }

    /// Removes `tag` from the stream. Returns true if it existed.
    pub fn remove_tag(&self, repository: &RepositoryRef, tag: &str) -> bool {
        self.state
            .write()
            .streams
            .get_mut(repository)
            .and_then(|stream| stream.tags.remove(tag))
            .is_some()
    }

    /// Records image metadata, replacing any previous record for the digest.
    pub fn put_image(&self, image: ImageMetadata) {
        self.state.write().images.insert(image.digest.clone(), image);
    }

    /// Reclassifies an image. Returns false if the image is unknown.
    pub fn set_managed(&self, digest: &Digest, managed: bool) -> bool {
        let mut state = self.state.write();
        let Some(image) = state.images.remove(digest) else {
            return false;
        };
        state.images.insert(digest.clone(), image.with_managed(managed));
        true
    }

    /// Forgets an image. Returns true if it existed.
    pub fn remove_image(&self, digest: &Digest) -> bool {
        self.state.write().images.remove(digest).is_some()
    }

    fn with_stream<T>(
        &self,
        handle: &RepositoryHandle,
        f: impl FnOnce(&StreamRecord) -> std::result::Result<T, LookupError>,
    ) -> std::result::Result<T, LookupError> {
        let state = self.state.read();
        match state.streams.get(handle.repository()) {
            Some(stream) if stream.uid == handle.uid() => f(stream),
            _ => Err(LookupError::NotFound),
        }
    }
}

fn check(ctx: &Context) -> std::result::Result<(), LookupError> {
    if ctx.is_cancelled() {
        Err(LookupError::Cancelled)
    } else {
        Ok(())
    }
}

#[async_trait]
impl RepositoryContextResolver for InMemoryControlPlane {
    async fn resolve(
        &self,
        ctx: &Context,
        repository: &RepositoryRef,
    ) -> std::result::Result<RepositoryHandle, LookupError> {
        check(ctx)?;
        self.state
            .read()
            .streams
            .get(repository)
            .map(|stream| RepositoryHandle::new(repository.clone(), stream.uid.clone()))
            .ok_or(LookupError::NotFound)
    }
}

#[async_trait]
impl ImageStreamReader for InMemoryControlPlane {
    async fn get_tag(
        &self,
        ctx: &Context,
        handle: &RepositoryHandle,
        tag: &str,
    ) -> std::result::Result<Digest, LookupError> {
        check(ctx)?;
        self.with_stream(handle, |stream| {
            stream.tags.get(tag).cloned().ok_or(LookupError::NotFound)
        })
    }

    async fn list_tags(
        &self,
        ctx: &Context,
        handle: &RepositoryHandle,
    ) -> std::result::Result<Vec<TagEntry>, LookupError> {
        check(ctx)?;
        self.with_stream(handle, |stream| {
            Ok(stream
                .tags
                .iter()
                .map(|(tag, digest)| TagEntry::new(tag.clone(), digest.clone()))
                .collect())
        })
    }

    async fn pullthrough_enabled(
        &self,
        ctx: &Context,
        handle: &RepositoryHandle,
    ) -> std::result::Result<bool, LookupError> {
        check(ctx)?;
        self.with_stream(handle, |stream| Ok(stream.pullthrough))
    }
}

#[async_trait]
impl ImageMetadataStore for InMemoryControlPlane {
    async fn get(
        &self,
        ctx: &Context,
        digest: &Digest,
    ) -> std::result::Result<ImageMetadata, LookupError> {
        check(ctx)?;
        self.state
            .read()
            .images
            .get(digest)
            .cloned()
            .ok_or(LookupError::NotFound)
    }
}

/// Map-backed tag store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTagStore {
    tags: Arc<RwLock<HashMap<String, Descriptor>>>,
}

impl InMemoryTagStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with the given tags.
    #[must_use]
    pub fn with_tags(tags: impl IntoIterator<Item = (String, Descriptor)>) -> Self {
        Self {
            tags: Arc::new(RwLock::new(tags.into_iter().collect())),
        }
    }

    /// Returns the number of stored tags.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tags.read().len()
    }

    /// Returns true if no tags are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tags.read().is_empty()
    }

    /// Returns a copy of the stored tags, sorted by name.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<String, Descriptor> {
        self.tags
            .read()
            .iter()
            .map(|(tag, desc)| (tag.clone(), desc.clone()))
            .collect()
    }
}

#[async_trait]
impl TagService for InMemoryTagStore {
    async fn get(&self, ctx: &Context, tag: &str) -> Result<Descriptor> {
        ctx.ensure_active()?;
        self.tags
            .read()
            .get(tag)
            .cloned()
            .ok_or_else(|| Error::tag_unknown(tag))
    }

    async fn tag(&self, ctx: &Context, tag: &str, descriptor: Descriptor) -> Result<()> {
        ctx.ensure_active()?;
        self.tags.write().insert(tag.to_string(), descriptor);
        Ok(())
    }

    async fn untag(&self, ctx: &Context, tag: &str) -> Result<()> {
        ctx.ensure_active()?;
        self.tags
            .write()
            .remove(tag)
            .map(|_| ())
            .ok_or_else(|| Error::tag_unknown(tag))
    }

    async fn all(&self, ctx: &Context) -> Result<Vec<String>> {
        ctx.ensure_active()?;
        let mut tags: Vec<_> = self.tags.read().keys().cloned().collect();
        tags.sort();
        Ok(tags)
    }

    async fn lookup(&self, ctx: &Context, descriptor: &Descriptor) -> Result<Vec<String>> {
        ctx.ensure_active()?;
        let mut tags: Vec<_> = self
            .tags
            .read()
            .iter()
            .filter(|(_, desc)| desc.digest == descriptor.digest)
            .map(|(tag, _)| tag.clone())
            .collect();
        tags.sort();
        Ok(tags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo() -> RepositoryRef {
        RepositoryRef::new("user", "app")
    }

    #[tokio::test]
    async fn test_resolve_missing_stream() {
        let plane = InMemoryControlPlane::new();
        let err = plane.resolve(&Context::new(), &repo()).await.unwrap_err();
        assert_eq!(err, LookupError::NotFound);
    }

    #[tokio::test]
    async fn test_stale_handle_is_not_found() {
        let plane = InMemoryControlPlane::new();
        plane.upsert_stream(repo(), false);
        let ctx = Context::new();
        let handle = plane.resolve(&ctx, &repo()).await.unwrap();

        plane.remove_stream(&repo());
        plane.upsert_stream(repo(), false);

        assert_eq!(
            plane.list_tags(&ctx, &handle).await.unwrap_err(),
            LookupError::NotFound
        );
    }

    #[tokio::test]
    async fn test_tag_overwrite() {
        let plane = InMemoryControlPlane::new();
        plane.upsert_stream(repo(), false);
        let first = Digest::sha256_of(b"one");
        let second = Digest::sha256_of(b"two");
        assert!(plane.set_tag(&repo(), "latest", first));
        assert!(plane.set_tag(&repo(), "latest", second.clone()));

        let ctx = Context::new();
        let handle = plane.resolve(&ctx, &repo()).await.unwrap();
        assert_eq!(plane.get_tag(&ctx, &handle, "latest").await.unwrap(), second);
        assert_eq!(plane.list_tags(&ctx, &handle).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_set_tag_without_stream() {
        let plane = InMemoryControlPlane::new();
        assert!(!plane.set_tag(&repo(), "latest", Digest::sha256_of(b"x")));
        assert!(!plane.set_pullthrough(&repo(), true));
    }

    #[tokio::test]
    async fn test_set_managed() {
        let plane = InMemoryControlPlane::new();
        let digest = Digest::sha256_of(b"image");
        plane.put_image(ImageMetadata::managed(digest.clone()));
        assert!(plane.set_managed(&digest, false));

        let image = ImageMetadataStore::get(&plane, &Context::new(), &digest)
            .await
            .unwrap();
        assert!(!image.is_managed());
        assert!(!plane.set_managed(&Digest::sha256_of(b"other"), true));
    }

    #[tokio::test]
    async fn test_tag_store_round_trip() {
        let store = InMemoryTagStore::new();
        let ctx = Context::new();
        let desc = Descriptor::for_digest(Digest::sha256_of(b"image"));

        store.tag(&ctx, "v1", desc.clone()).await.unwrap();
        store.tag(&ctx, "v2", desc.clone()).await.unwrap();

        assert_eq!(store.get(&ctx, "v1").await.unwrap(), desc);
        assert_eq!(store.all(&ctx).await.unwrap(), ["v1", "v2"]);
        assert_eq!(store.lookup(&ctx, &desc).await.unwrap(), ["v1", "v2"]);

        store.untag(&ctx, "v1").await.unwrap();
        assert_eq!(
            store.untag(&ctx, "v1").await.unwrap_err(),
            Error::tag_unknown("v1")
        );
        assert_eq!(store.len(), 1);
    }
}
