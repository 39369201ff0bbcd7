//! Pullthrough-aware tag service.
//!
//! Reads are answered from the control-plane image stream plus image
//! metadata. Writes go to the wrapped local tag store only, so a freshly
//! written tag does not become readable through [`TagService::get`] until the
//! control plane indexes it.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tagbridge_core::{
    Context, Descriptor, Digest, Error, ImageMetadata, ImageMetadataStore, ImageStreamReader,
    LookupError, RepositoryContextResolver, RepositoryHandle, RepositoryRef, Result, TagService,
    Visibility,
};
use tracing::{debug, info, instrument, warn};

use crate::config::TagServiceConfig;

const INDEX: &str = "image stream index";
const IMAGES: &str = "image metadata store";

/// Tag service for one repository, honouring the pullthrough policy.
///
/// All collaborators are injected at construction. The service keeps no
/// state between calls.
pub struct PullthroughTagService {
    repository: RepositoryRef,
    resolver: Arc<dyn RepositoryContextResolver>,
    index: Arc<dyn ImageStreamReader>,
    images: Arc<dyn ImageMetadataStore>,
    local: Arc<dyn TagService>,
    config: TagServiceConfig,
}

impl std::fmt::Debug for PullthroughTagService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PullthroughTagService")
            .field("repository", &self.repository)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl PullthroughTagService {
    /// Creates a tag service for `repository`.
    #[must_use]
    pub fn new(
        repository: RepositoryRef,
        resolver: Arc<dyn RepositoryContextResolver>,
        index: Arc<dyn ImageStreamReader>,
        images: Arc<dyn ImageMetadataStore>,
        local: Arc<dyn TagService>,
    ) -> Self {
        Self {
            repository,
            resolver,
            index,
            images,
            local,
            config: TagServiceConfig::default(),
        }
    }

    /// Replaces the service configuration.
    #[must_use]
    pub const fn with_config(mut self, config: TagServiceConfig) -> Self {
        self.config = config;
        self
    }

    /// Returns the repository this service answers for.
    #[must_use]
    pub const fn repository(&self) -> &RepositoryRef {
        &self.repository
    }

    /// Resolves the repository context. Any failure other than cancellation
    /// collapses to [`Error::RepositoryUnknown`].
    async fn resolve(&self, ctx: &Context) -> Result<RepositoryHandle> {
        ctx.ensure_active()?;
        match self.resolver.resolve(ctx, &self.repository).await {
            Ok(handle) => Ok(handle),
            Err(LookupError::Cancelled) => Err(Error::Cancelled),
            Err(e) => {
                debug!(error = %e, "Repository context not resolvable");
                Err(Error::repository_unknown(self.repository.to_string()))
            }
        }
    }

    async fn pullthrough_enabled(&self, ctx: &Context, handle: &RepositoryHandle) -> Result<bool> {
        ctx.ensure_active()?;
        self.index
            .pullthrough_enabled(ctx, handle)
            .await
            .map_err(|e| self.stream_error(e))
    }

    async fn image(
        &self,
        ctx: &Context,
        digest: &Digest,
    ) -> std::result::Result<ImageMetadata, LookupError> {
        if ctx.is_cancelled() {
            return Err(LookupError::Cancelled);
        }
        self.images.get(ctx, digest).await
    }

    /// The image stream disappeared between resolution and the read.
    fn stream_error(&self, e: LookupError) -> Error {
        match e {
            LookupError::NotFound => Error::repository_unknown(self.repository.to_string()),
            other => other.into_error(INDEX),
        }
    }

    /// Resolves `tag` through the index, the image metadata and the policy.
    ///
    /// Absence at any step and policy rejection are reported identically.
    async fn resolve_visible(
        &self,
        ctx: &Context,
        handle: &RepositoryHandle,
        tag: &str,
    ) -> Result<Digest> {
        ctx.ensure_active()?;
        let digest = match self.index.get_tag(ctx, handle, tag).await {
            Ok(digest) => digest,
            Err(LookupError::NotFound) => return Err(Error::tag_unknown(tag)),
            Err(e) => return Err(e.into_error(INDEX)),
        };

        let image = match self.image(ctx, &digest).await {
            Ok(image) => image,
            Err(LookupError::NotFound) => {
                debug!(tag, %digest, "Tagged image not found");
                return Err(Error::tag_unknown(tag));
            }
            Err(e) => return Err(e.into_error(IMAGES)),
        };

        let pullthrough = self.pullthrough_enabled(ctx, handle).await?;
        let visibility = decide(&image, pullthrough);
        debug!(
            tag,
            %digest,
            media_type = image.media_type.as_ref().map(tracing::field::display),
            size = image.size,
            %visibility,
            "Tag visibility decided"
        );
        if visibility.is_visible() {
            Ok(digest)
        } else {
            Err(Error::tag_unknown(tag))
        }
    }

    /// Lists visible tag names, optionally restricted to one digest.
    ///
    /// Each distinct digest is classified at most once per call. Entries whose
    /// image cannot be fetched are left out.
    async fn visible_tags(
        &self,
        ctx: &Context,
        handle: &RepositoryHandle,
        only: Option<&Digest>,
    ) -> Result<Vec<String>> {
        ctx.ensure_active()?;
        let entries = self
            .index
            .list_tags(ctx, handle)
            .await
            .map_err(|e| self.stream_error(e))?;

        let candidates: Vec<_> = entries
            .into_iter()
            .filter(|entry| only.is_none_or(|d| &entry.digest == d))
            .collect();
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let pullthrough = self.pullthrough_enabled(ctx, handle).await?;

        let mut decisions: HashMap<Digest, Visibility> = HashMap::new();
        let mut tags = Vec::new();
        for entry in candidates {
            let visibility = match decisions.get(&entry.digest) {
                Some(visibility) => *visibility,
                None => {
                    let visibility = match self.image(ctx, &entry.digest).await {
                        Ok(image) => decide(&image, pullthrough),
                        Err(LookupError::Cancelled) => return Err(Error::Cancelled),
                        Err(e) => {
                            warn!(
                                tag = %entry.tag,
                                digest = %entry.digest,
                                error = %e,
                                "Failed to fetch tagged image, skipping"
                            );
                            Visibility::Hidden
                        }
                    };
                    decisions.insert(entry.digest.clone(), visibility);
                    visibility
                }
            };

            if visibility.is_visible() {
                tags.push(entry.tag);
            }
        }

        tags.sort();
        Ok(tags)
    }
}

/// The only place image classification meets the repository's pullthrough flag.
fn decide(image: &ImageMetadata, pullthrough_enabled: bool) -> Visibility {
    Visibility::decide(image.is_managed(), pullthrough_enabled)
}

#[async_trait]
impl TagService for PullthroughTagService {
    #[instrument(skip(self, ctx), fields(repository = %self.repository, request_id = %ctx.request_id()))]
    async fn get(&self, ctx: &Context, tag: &str) -> Result<Descriptor> {
        let handle = self.resolve(ctx).await?;
        let digest = self.resolve_visible(ctx, &handle, tag).await?;
        Ok(Descriptor::for_digest(digest))
    }

    #[instrument(skip(self, ctx, descriptor), fields(repository = %self.repository, request_id = %ctx.request_id(), digest = %descriptor.digest))]
    async fn tag(&self, ctx: &Context, tag: &str, descriptor: Descriptor) -> Result<()> {
        let handle = self.resolve(ctx).await?;

        let image = match self.image(ctx, &descriptor.digest).await {
            Ok(image) => image,
            Err(LookupError::NotFound) => {
                return Err(Error::ImageNotFound {
                    digest: descriptor.digest,
                })
            }
            Err(e) => return Err(e.into_error(IMAGES)),
        };

        let pullthrough = self.pullthrough_enabled(ctx, &handle).await?;
        let visibility = decide(&image, pullthrough);
        if !visibility.is_visible() {
            debug!(%visibility, "Refusing to tag image not eligible for pullthrough");
            return Err(Error::tag_unknown(tag));
        }

        ctx.ensure_active()?;
        self.local.tag(ctx, tag, descriptor).await?;
        info!(%visibility, "Tag written to local store");
        Ok(())
    }

    #[instrument(skip(self, ctx), fields(repository = %self.repository, request_id = %ctx.request_id()))]
    async fn untag(&self, ctx: &Context, tag: &str) -> Result<()> {
        let handle = self.resolve(ctx).await?;
        match self.resolve_visible(ctx, &handle, tag).await {
            Ok(_) => {}
            Err(e @ (Error::Cancelled | Error::RepositoryUnknown { .. })) => return Err(e),
            Err(e) => {
                debug!(error = %e, "Untag resolution failed");
                return Err(Error::tag_unknown(tag));
            }
        }

        if !self.config.untag_local {
            return Ok(());
        }

        ctx.ensure_active()?;
        match self.local.untag(ctx, tag).await {
            Ok(()) => {
                info!("Tag removed from local store");
                Ok(())
            }
            Err(Error::TagUnknown { .. }) => {
                debug!("Tag absent from local store");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    #[instrument(skip(self, ctx), fields(repository = %self.repository, request_id = %ctx.request_id()))]
    async fn all(&self, ctx: &Context) -> Result<Vec<String>> {
        let handle = self.resolve(ctx).await?;
        self.visible_tags(ctx, &handle, None).await
    }

    #[instrument(skip(self, ctx, descriptor), fields(repository = %self.repository, request_id = %ctx.request_id(), digest = %descriptor.digest))]
    async fn lookup(&self, ctx: &Context, descriptor: &Descriptor) -> Result<Vec<String>> {
        let handle = self.resolve(ctx).await?;
        self.visible_tags(ctx, &handle, Some(&descriptor.digest))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{InMemoryControlPlane, InMemoryTagStore};
    use tokio_util::sync::CancellationToken;

    fn repo() -> RepositoryRef {
        RepositoryRef::new("user", "app")
    }

    fn service(plane: &InMemoryControlPlane, local: &InMemoryTagStore) -> PullthroughTagService {
        PullthroughTagService::new(
            repo(),
            Arc::new(plane.clone()),
            Arc::new(plane.clone()),
            Arc::new(plane.clone()),
            Arc::new(local.clone()),
        )
    }

    fn setup(managed: bool, pullthrough: bool) -> (InMemoryControlPlane, Digest) {
        let digest = Digest::sha256_of(b"manifest");
        let plane = InMemoryControlPlane::new();
        plane.upsert_stream(repo(), pullthrough);
        plane.set_tag(&repo(), "latest", digest.clone());
        plane.put_image(ImageMetadata::new(digest.clone()).with_managed(managed));
        (plane, digest)
    }

    #[tokio::test]
    async fn test_get_managed() {
        let (plane, digest) = setup(true, false);
        let svc = service(&plane, &InMemoryTagStore::new());

        let desc = svc.get(&Context::new(), "latest").await.unwrap();
        assert_eq!(desc, Descriptor::for_digest(digest));
    }

    #[tokio::test]
    async fn test_get_returns_digest_only_for_described_image() {
        let (plane, digest) = setup(true, false);
        plane.put_image(
            ImageMetadata::managed(digest.clone())
                .with_size(2048)
                .with_media_type(tagbridge_core::MediaType::OCI_MANIFEST),
        );
        let svc = service(&plane, &InMemoryTagStore::new());

        let desc = svc.get(&Context::new(), "latest").await.unwrap();
        assert_eq!(desc, Descriptor::for_digest(digest));
    }

    #[tokio::test]
    async fn test_get_unmanaged_hidden_without_pullthrough() {
        let (plane, _) = setup(false, false);
        let svc = service(&plane, &InMemoryTagStore::new());

        let err = svc.get(&Context::new(), "latest").await.unwrap_err();
        assert_eq!(err, Error::tag_unknown("latest"));
    }

    #[tokio::test]
    async fn test_get_unknown_repository() {
        let plane = InMemoryControlPlane::new();
        let svc = service(&plane, &InMemoryTagStore::new());

        let err = svc.get(&Context::new(), "latest").await.unwrap_err();
        assert_eq!(err, Error::repository_unknown("user/app"));
    }

    #[tokio::test]
    async fn test_get_with_missing_image_is_tag_unknown() {
        let (plane, digest) = setup(true, true);
        plane.remove_image(&digest);
        let svc = service(&plane, &InMemoryTagStore::new());

        let err = svc.get(&Context::new(), "latest").await.unwrap_err();
        assert_eq!(err, Error::tag_unknown("latest"));
    }

    #[tokio::test]
    async fn test_all_shares_classification_between_tags() {
        let (plane, digest) = setup(false, true);
        plane.set_tag(&repo(), "stable", digest);
        let svc = service(&plane, &InMemoryTagStore::new());

        let tags = svc.all(&Context::new()).await.unwrap();
        assert_eq!(tags, ["latest", "stable"]);
    }

    #[tokio::test]
    async fn test_tag_rejects_unknown_image() {
        let (plane, _) = setup(true, true);
        let local = InMemoryTagStore::new();
        let svc = service(&plane, &local);
        let missing = Digest::sha256_of(b"missing");

        let err = svc
            .tag(&Context::new(), "new", Descriptor::for_digest(missing.clone()))
            .await
            .unwrap_err();
        assert_eq!(err, Error::ImageNotFound { digest: missing });
        assert!(local.is_empty());
    }

    #[tokio::test]
    async fn test_untag_ignores_absent_local_tag() {
        let (plane, _) = setup(true, false);
        let svc = service(&plane, &InMemoryTagStore::new());

        svc.untag(&Context::new(), "latest").await.unwrap();
    }

    #[tokio::test]
    async fn test_untag_removes_local_tag() {
        let (plane, digest) = setup(true, false);
        let local = InMemoryTagStore::new();
        local
            .tag(&Context::new(), "latest", Descriptor::for_digest(digest))
            .await
            .unwrap();
        let svc = service(&plane, &local);

        svc.untag(&Context::new(), "latest").await.unwrap();
        assert!(local.is_empty());
    }

    #[tokio::test]
    async fn test_untag_local_disabled_leaves_store() {
        let (plane, digest) = setup(true, false);
        let local = InMemoryTagStore::new();
        local
            .tag(&Context::new(), "latest", Descriptor::for_digest(digest))
            .await
            .unwrap();
        let svc = service(&plane, &local)
            .with_config(TagServiceConfig::default().with_untag_local(false));

        svc.untag(&Context::new(), "latest").await.unwrap();
        assert_eq!(local.len(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_context_aborts_before_write() {
        let (plane, digest) = setup(true, true);
        let local = InMemoryTagStore::new();
        let svc = service(&plane, &local);
        let token = CancellationToken::new();
        token.cancel();

        let err = svc
            .tag(
                &Context::with_cancellation(token),
                "new",
                Descriptor::for_digest(digest),
            )
            .await
            .unwrap_err();
        assert_eq!(err, Error::Cancelled);
        assert!(local.is_empty());
    }
}
