//! Image metadata and its lookup contract.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::context::Context;
use crate::descriptor::MediaType;
use crate::digest::Digest;
use crate::error::LookupError;

/// Annotation recording that image content was pushed directly into this registry.
pub const MANAGED_ANNOTATION: &str = "registry.tagbridge.io/managed";

/// Registry-side record of an image.
///
/// The managed/unmanaged classification is assigned when content enters the
/// registry and is only ever read here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageMetadata {
    /// Digest identifying the image.
    pub digest: Digest,

    /// Size of the manifest, if recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,

    /// Manifest media type, if recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<MediaType>,

    /// Image annotations.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

impl ImageMetadata {
    /// Creates metadata with no annotations (classified as unmanaged).
    #[must_use]
    pub const fn new(digest: Digest) -> Self {
        Self {
            digest,
            size: None,
            media_type: None,
            annotations: BTreeMap::new(),
        }
    }

    /// Creates metadata for an image pushed directly into the registry.
    #[must_use]
    pub fn managed(digest: Digest) -> Self {
        Self::new(digest).with_managed(true)
    }

    /// Creates metadata for an image mirrored from an upstream registry.
    #[must_use]
    pub fn unmanaged(digest: Digest) -> Self {
        Self::new(digest).with_managed(false)
    }

    /// Sets the managed classification annotation.
    #[must_use]
    pub fn with_managed(mut self, managed: bool) -> Self {
        self.annotations
            .insert(MANAGED_ANNOTATION.to_string(), managed.to_string());
        self
    }

    /// Sets the recorded size.
    #[must_use]
    pub const fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    /// Sets the recorded media type.
    #[must_use]
    pub fn with_media_type(mut self, media_type: impl Into<MediaType>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }

    /// Returns true if the image content was pushed directly into this registry.
    ///
    /// Only the exact annotation value `"true"` counts; anything else,
    /// including absence, means unmanaged.
    #[must_use]
    pub fn is_managed(&self) -> bool {
        self.annotations
            .get(MANAGED_ANNOTATION)
            .is_some_and(|v| v == "true")
    }
}

/// Lookup of image metadata by digest.
#[async_trait]
pub trait ImageMetadataStore: Send + Sync {
    /// Fetches metadata for the image with the given digest.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::NotFound`] if no such image is known.
    async fn get(&self, ctx: &Context, digest: &Digest) -> Result<ImageMetadata, LookupError>;
}
