//! Content descriptors returned to registry callers.

use serde::{Deserialize, Serialize};

use crate::digest::Digest;

/// Manifest media type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MediaType(String);

impl MediaType {
    /// OCI image manifest media type.
    pub const OCI_MANIFEST: &'static str = "application/vnd.oci.image.manifest.v1+json";

    /// OCI image index media type.
    pub const OCI_INDEX: &'static str = "application/vnd.oci.image.index.v1+json";

    /// Docker schema2 manifest media type.
    pub const DOCKER_MANIFEST_V2: &'static str =
        "application/vnd.docker.distribution.manifest.v2+json";

    /// Docker schema2 manifest list media type.
    pub const DOCKER_MANIFEST_LIST: &'static str =
        "application/vnd.docker.distribution.manifest.list.v2+json";

    /// Docker schema1 signed manifest media type.
    pub const DOCKER_MANIFEST_V1_SIGNED: &'static str =
        "application/vnd.docker.distribution.manifest.v1+prettyjws";

    /// Creates a new media type.
    #[must_use]
    pub fn new(media_type: impl Into<String>) -> Self {
        Self(media_type.into())
    }

    /// Returns the media type string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for MediaType {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl Serialize for MediaType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for MediaType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self(s))
    }
}

/// Descriptor of tagged content.
///
/// Tag resolution only ever fills in the digest. Size and media type are
/// carried through from whoever supplied the descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Descriptor {
    /// Digest of the targeted content.
    pub digest: Digest,

    /// Size in bytes of the content, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,

    /// Media type of the content, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<MediaType>,
}

impl Descriptor {
    /// Creates a descriptor carrying only a digest.
    ///
    /// # Examples
    ///
    /// ```
    /// use tagbridge_core::{Descriptor, Digest};
    ///
    /// let desc = Descriptor::for_digest(Digest::sha256_of(b"manifest"));
    /// assert!(desc.size.is_none());
    /// ```
    #[must_use]
    pub const fn for_digest(digest: Digest) -> Self {
        Self {
            digest,
            size: None,
            media_type: None,
        }
    }

    /// Sets the content size.
    #[must_use]
    pub const fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    /// Sets the media type.
    #[must_use]
    pub fn with_media_type(mut self, media_type: impl Into<MediaType>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }
}
