//! Registry fixtures for tag service tests.
//!
//! A [`RegistryFixture`] starts out as repository `user/app` whose image
//! stream maps `latest` to a managed image, with pullthrough disabled.
//! Builder methods reshape it; [`RegistryFixture::service`] wires a
//! [`PullthroughTagService`] whose collaborators all record into one
//! [`CallLog`].
//!
//! # Examples
//!
//! ```rust
//! use tagbridge_test::RegistryFixture;
//!
//! let fixture = RegistryFixture::new()
//!     .with_managed(false)
//!     .with_pullthrough(true);
//! let service = fixture.service();
//! ```

use std::sync::Arc;

use tagbridge_core::{
    Digest, ImageMetadata, ImageMetadataStore, ImageStreamReader, RepositoryContextResolver,
    RepositoryRef, TagService,
};
use tagbridge_registry::{
    InMemoryControlPlane, InMemoryTagStore, PullthroughTagService, TagServiceConfig,
};

use crate::recording::{CallLog, Recording};

/// Default tag present in the fixture's image stream.
pub const DEFAULT_TAG: &str = "latest";

/// Returns a deterministic digest for a label.
#[must_use]
pub fn digest_of(label: &str) -> Digest {
    Digest::sha256_of(label.as_bytes())
}

/// A control plane, a local store and a call log for one repository.
#[derive(Debug, Clone)]
pub struct RegistryFixture {
    repository: RepositoryRef,
    digest: Digest,
    plane: InMemoryControlPlane,
    local: InMemoryTagStore,
    log: CallLog,
    config: TagServiceConfig,
}

impl Default for RegistryFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryFixture {
    /// Creates the default fixture.
    #[must_use]
    pub fn new() -> Self {
        let repository = RepositoryRef::new("user", "app");
        let digest = digest_of("user/app:latest");

        let plane = InMemoryControlPlane::new();
        plane.upsert_stream(repository.clone(), false);
        plane.set_tag(&repository, DEFAULT_TAG, digest.clone());
        plane.put_image(ImageMetadata::managed(digest.clone()));

        Self {
            repository,
            digest,
            plane,
            local: InMemoryTagStore::new(),
            log: CallLog::new(),
            config: TagServiceConfig::default(),
        }
    }

    /// Sets the repository's pullthrough flag.
    #[must_use]
    pub fn with_pullthrough(self, pullthrough: bool) -> Self {
        self.plane.set_pullthrough(&self.repository, pullthrough);
        self
    }

    /// Reclassifies the default image.
    #[must_use]
    pub fn with_managed(self, managed: bool) -> Self {
        self.plane.set_managed(&self.digest, managed);
        self
    }

    /// Adds a tag to the image stream.
    #[must_use]
    pub fn with_tag(self, tag: &str, digest: Digest) -> Self {
        self.plane.set_tag(&self.repository, tag, digest);
        self
    }

    /// Records an image.
    #[must_use]
    pub fn with_image(self, image: ImageMetadata) -> Self {
        self.plane.put_image(image);
        self
    }

    /// Moves the image stream to another repository, leaving this one unresolvable.
    #[must_use]
    pub fn with_stream_elsewhere(self) -> Self {
        let other = RepositoryRef::new(
            &self.repository.namespace,
            format!("{}-another", self.repository.name),
        );
        self.plane.remove_stream(&self.repository);
        self.plane.upsert_stream(other.clone(), true);
        self.plane.set_tag(&other, DEFAULT_TAG, self.digest.clone());
        self
    }

    /// Sets the tag service configuration.
    #[must_use]
    pub const fn with_config(mut self, config: TagServiceConfig) -> Self {
        self.config = config;
        self
    }

    /// Returns the repository under test.
    #[must_use]
    pub const fn repository(&self) -> &RepositoryRef {
        &self.repository
    }

    /// Returns the digest of the default image.
    #[must_use]
    pub const fn digest(&self) -> &Digest {
        &self.digest
    }

    /// Returns the control plane.
    #[must_use]
    pub const fn plane(&self) -> &InMemoryControlPlane {
        &self.plane
    }

    /// Returns the local tag store.
    #[must_use]
    pub const fn local(&self) -> &InMemoryTagStore {
        &self.local
    }

    /// Returns the shared call log.
    #[must_use]
    pub const fn log(&self) -> &CallLog {
        &self.log
    }

    /// Builds a service whose collaborators record under
    /// `resolver.*`, `index.*`, `images.*` and `local.*`.
    #[must_use]
    pub fn service(&self) -> PullthroughTagService {
        self.build(
            self.plane.clone(),
            self.plane.clone(),
            self.plane.clone(),
            self.local.clone(),
        )
    }

    /// Builds a service using `images` (recorded under `images.*`).
    #[must_use]
    pub fn service_with_images<I>(&self, images: I) -> PullthroughTagService
    where
        I: ImageMetadataStore + 'static,
    {
        self.build(self.plane.clone(), self.plane.clone(), images, self.local.clone())
    }

    /// Builds a service using `resolver` (recorded under `resolver.*`).
    #[must_use]
    pub fn service_with_resolver<R>(&self, resolver: R) -> PullthroughTagService
    where
        R: RepositoryContextResolver + 'static,
    {
        self.build(resolver, self.plane.clone(), self.plane.clone(), self.local.clone())
    }

    /// Builds a service using `index` (recorded under `index.*`).
    #[must_use]
    pub fn service_with_index<X>(&self, index: X) -> PullthroughTagService
    where
        X: ImageStreamReader + 'static,
    {
        self.build(self.plane.clone(), index, self.plane.clone(), self.local.clone())
    }

    /// Builds a service writing into `local` (recorded under `local.*`)
    /// instead of the fixture's store.
    #[must_use]
    pub fn service_with_local<L>(&self, local: L) -> PullthroughTagService
    where
        L: TagService + 'static,
    {
        self.build(self.plane.clone(), self.plane.clone(), self.plane.clone(), local)
    }

    fn recording<T>(&self, inner: T, prefix: &'static str) -> Recording<T> {
        Recording::new(inner, prefix, self.log.clone())
    }

    fn build<R, X, I, L>(&self, resolver: R, index: X, images: I, local: L) -> PullthroughTagService
    where
        R: RepositoryContextResolver + 'static,
        X: ImageStreamReader + 'static,
        I: ImageMetadataStore + 'static,
        L: TagService + 'static,
    {
        PullthroughTagService::new(
            self.repository.clone(),
            Arc::new(self.recording(resolver, "resolver")),
            Arc::new(self.recording(index, "index")),
            Arc::new(self.recording(images, "images")),
            Arc::new(self.recording(local, "local")),
        )
        .with_config(self.config.clone())
    }
}
