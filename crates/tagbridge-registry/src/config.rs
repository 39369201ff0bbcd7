//! Configuration and control-plane snapshots.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tagbridge_core::{Descriptor, Digest, ImageMetadata, MediaType, RepositoryRef};

use crate::error::ConfigError;
use crate::memory::{InMemoryControlPlane, InMemoryTagStore};

/// Environment variable overriding [`TagServiceConfig::untag_local`].
pub const ENV_UNTAG_LOCAL: &str = "TAGBRIDGE_UNTAG_LOCAL";

/// Configuration for [`crate::PullthroughTagService`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TagServiceConfig {
    /// Whether a successful untag also removes the tag from the local store.
    pub untag_local: bool,
}

impl Default for TagServiceConfig {
    fn default() -> Self {
        Self { untag_local: true }
    }
}

impl TagServiceConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether untag also removes the tag from the local store.
    #[must_use]
    pub const fn with_untag_local(mut self, untag_local: bool) -> Self {
        self.untag_local = untag_local;
        self
    }

    /// Applies overrides from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnv`] if a variable is set to an unparseable value.
    pub fn with_process_env(self) -> Result<Self, ConfigError> {
        self.with_env_overrides(|name| std::env::var(name).ok())
    }

    /// Applies overrides read through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnv`] if a variable is set to an unparseable value.
    ///
    /// # Examples
    ///
    /// ```
    /// use tagbridge_registry::TagServiceConfig;
    ///
    /// let config = TagServiceConfig::default()
    ///     .with_env_overrides(|_| Some("false".to_string()))?;
    /// assert!(!config.untag_local);
    /// # Ok::<(), tagbridge_registry::ConfigError>(())
    /// ```
    pub fn with_env_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(value) = lookup(ENV_UNTAG_LOCAL) {
            self.untag_local = parse_bool(&value).ok_or(ConfigError::InvalidEnv {
                variable: ENV_UNTAG_LOCAL,
                value,
            })?;
        }
        Ok(self)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Serialized view of control-plane state and local tag stores.
///
/// Used to seed the in-memory collaborators for tooling and tests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrySnapshot {
    /// Image streams.
    #[serde(default)]
    pub repositories: Vec<RepositorySnapshot>,

    /// Known images.
    #[serde(default)]
    pub images: Vec<ImageSnapshot>,

    /// Local tag store content per repository (`namespace/name`).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub local_tags: BTreeMap<String, BTreeMap<String, Digest>>,
}

/// One image stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositorySnapshot {
    /// Namespace.
    pub namespace: String,

    /// Repository name.
    pub name: String,

    /// Whether pullthrough is enabled.
    #[serde(default)]
    pub pullthrough: bool,

    /// Tag to digest mappings.
    #[serde(default)]
    pub tags: BTreeMap<String, Digest>,
}

impl RepositorySnapshot {
    /// Returns the repository reference.
    #[must_use]
    pub fn reference(&self) -> RepositoryRef {
        RepositoryRef::new(&self.namespace, &self.name)
    }
}

/// One image record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageSnapshot {
    /// Image digest.
    pub digest: Digest,

    /// Whether the image was pushed directly into the registry.
    #[serde(default)]
    pub managed: bool,

    /// Manifest size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,

    /// Manifest media type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<MediaType>,
}

impl From<&ImageSnapshot> for ImageMetadata {
    fn from(image: &ImageSnapshot) -> Self {
        let mut metadata = Self::new(image.digest.clone()).with_managed(image.managed);
        metadata.size = image.size;
        metadata.media_type.clone_from(&image.media_type);
        metadata
    }
}

impl RegistrySnapshot {
    /// Loads a snapshot from a YAML or JSON file (by extension, YAML otherwise).
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let snapshot: Self = if is_json(path) {
            serde_json::from_str(&content).map_err(|e| ConfigError::JsonError {
                path: path.to_path_buf(),
                source: e,
            })?
        } else {
            serde_yaml::from_str(&content).map_err(|e| ConfigError::YamlError {
                path: path.to_path_buf(),
                source: e,
            })?
        };

        snapshot.validate()?;
        tracing::debug!(
            path = %path.display(),
            repositories = snapshot.repositories.len(),
            images = snapshot.images.len(),
            "Loaded registry snapshot"
        );
        Ok(snapshot)
    }

    /// Checks references and rejects duplicate repositories or images.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first inconsistency found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for repository in &self.repositories {
            let reference =
                RepositoryRef::parse(&format!("{}/{}", repository.namespace, repository.name))?;
            if !seen.insert(reference.clone()) {
                return Err(ConfigError::InvalidSnapshot {
                    message: format!("duplicate repository {reference}"),
                });
            }
        }

        let mut digests = HashSet::new();
        for image in &self.images {
            if !digests.insert(&image.digest) {
                return Err(ConfigError::InvalidSnapshot {
                    message: format!("duplicate image {}", image.digest),
                });
            }
        }

        for repository in self.local_tags.keys() {
            RepositoryRef::parse(repository)?;
        }

        Ok(())
    }

    /// Builds an in-memory control plane holding the snapshot's streams and images.
    #[must_use]
    pub fn to_control_plane(&self) -> InMemoryControlPlane {
        let plane = InMemoryControlPlane::new();
        for repository in &self.repositories {
            let reference = repository.reference();
            plane.upsert_stream(reference.clone(), repository.pullthrough);
            for (tag, digest) in &repository.tags {
                plane.set_tag(&reference, tag.clone(), digest.clone());
            }
        }
        for image in &self.images {
            plane.put_image(image.into());
        }
        plane
    }

    /// Builds the local tag store for `repository`.
    #[must_use]
    pub fn local_store(&self, repository: &RepositoryRef) -> InMemoryTagStore {
        let tags = self
            .local_tags
            .get(&repository.to_string())
            .into_iter()
            .flatten()
            .map(|(tag, digest)| (tag.clone(), Descriptor::for_digest(digest.clone())));
        InMemoryTagStore::with_tags(tags)
    }

    /// Replaces the recorded local tags of `repository` with the content of `store`.
    pub fn set_local_tags(&mut self, repository: &RepositoryRef, store: &InMemoryTagStore) {
        let tags: BTreeMap<_, _> = store
            .snapshot()
            .into_iter()
            .map(|(tag, descriptor)| (tag, descriptor.digest))
            .collect();
        if tags.is_empty() {
            self.local_tags.remove(&repository.to_string());
        } else {
            self.local_tags.insert(repository.to_string(), tags);
        }
    }

    /// Writes the snapshot to `path`, as JSON or YAML by extension like [`Self::load`].
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = if is_json(path) {
            serde_json::to_string_pretty(self).map_err(|e| ConfigError::JsonError {
                path: path.to_path_buf(),
                source: e,
            })?
        } else {
            serde_yaml::to_string(self).map_err(|e| ConfigError::YamlError {
                path: path.to_path_buf(),
                source: e,
            })?
        };

        std::fs::write(path, content).map_err(|e| ConfigError::IoError {
            path: path.to_path_buf(),
            source: e,
        })?;
        tracing::debug!(path = %path.display(), "Saved registry snapshot");
        Ok(())
    }
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tagbridge_core::{Context, ImageMetadataStore, ImageStreamReader, RepositoryContextResolver, TagService};

    const MANAGED: &str = "sha256:2c26b46b68ffc68ff99b453c1d30413413422d706483bfa0f98a5e886266e7ae";
    const MIRRORED: &str = "sha256:fcde2b2edba56bf408601fb721fe9b5c338d10ee429ea04fae5511b68fbf8fb9";

    fn yaml() -> String {
        format!(
            r"
repositories:
  - namespace: user
    name: app
    pullthrough: false
    tags:
      latest: {MANAGED}
      mirror: {MIRRORED}
images:
  - digest: {MANAGED}
    managed: true
    size: 1024
  - digest: {MIRRORED}
localTags:
  user/app:
    staged: {MANAGED}
"
        )
    }

    fn write_temp(content: &str, suffix: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_config_default() {
        assert!(TagServiceConfig::default().untag_local);
    }

    #[test]
    fn test_env_override() {
        let config = TagServiceConfig::new()
            .with_env_overrides(|name| (name == ENV_UNTAG_LOCAL).then(|| "off".to_string()))
            .unwrap();
        assert!(!config.untag_local);

        let unchanged = TagServiceConfig::new().with_env_overrides(|_| None).unwrap();
        assert!(unchanged.untag_local);
    }

    #[test]
    fn test_env_override_rejects_garbage() {
        let err = TagServiceConfig::new()
            .with_env_overrides(|_| Some("maybe".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { .. }));
    }

    #[test]
    fn test_load_yaml() {
        let file = write_temp(&yaml(), ".yaml");
        let snapshot = RegistrySnapshot::load(file.path()).unwrap();

        assert_eq!(snapshot.repositories.len(), 1);
        assert_eq!(snapshot.repositories[0].tags.len(), 2);
        assert!(snapshot.images[0].managed);
        assert!(!snapshot.images[1].managed);
        assert_eq!(snapshot.images[0].size, Some(1024));
    }

    #[test]
    fn test_load_json() {
        let json = format!(
            r#"{{"repositories":[{{"namespace":"user","name":"app","pullthrough":true,"tags":{{"latest":"{MANAGED}"}}}}],"images":[]}}"#
        );
        let file = write_temp(&json, ".json");
        let snapshot = RegistrySnapshot::load(file.path()).unwrap();
        assert!(snapshot.repositories[0].pullthrough);
    }

    #[test]
    fn test_load_rejects_bad_digest() {
        let file = write_temp(
            "repositories:\n  - namespace: user\n    name: app\n    tags:\n      latest: sha256:nope\n",
            ".yaml",
        );
        let err = RegistrySnapshot::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::YamlError { .. }));
    }

    #[test]
    fn test_validate_rejects_duplicates() {
        let repository = RepositorySnapshot {
            namespace: "user".to_string(),
            name: "app".to_string(),
            pullthrough: false,
            tags: BTreeMap::new(),
        };
        let snapshot = RegistrySnapshot {
            repositories: vec![repository.clone(), repository],
            ..Default::default()
        };
        assert!(matches!(
            snapshot.validate(),
            Err(ConfigError::InvalidSnapshot { .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = RegistrySnapshot::load("/nonexistent/snapshot.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::IoError { .. }));
    }

    #[tokio::test]
    async fn test_to_control_plane() {
        let file = write_temp(&yaml(), ".yml");
        let snapshot = RegistrySnapshot::load(file.path()).unwrap();
        let plane = snapshot.to_control_plane();
        let ctx = Context::new();
        let repo = RepositoryRef::new("user", "app");

        let handle = plane.resolve(&ctx, &repo).await.unwrap();
        assert!(!plane.pullthrough_enabled(&ctx, &handle).await.unwrap());
        let digest = plane.get_tag(&ctx, &handle, "mirror").await.unwrap();
        let image = plane.get(&ctx, &digest).await.unwrap();
        assert!(!image.is_managed());

        let local = snapshot.local_store(&repo);
        assert_eq!(local.all(&ctx).await.unwrap(), ["staged"]);
        assert!(snapshot
            .local_store(&RepositoryRef::new("other", "repo"))
            .is_empty());
    }

    #[test]
    fn test_save_persists_local_tags() {
        let file = write_temp(&yaml(), ".yaml");
        let mut snapshot = RegistrySnapshot::load(file.path()).unwrap();
        let repo = RepositoryRef::new("user", "app");

        let store = InMemoryTagStore::with_tags([(
            "v2".to_string(),
            Descriptor::for_digest(MIRRORED.parse().unwrap()),
        )]);
        snapshot.set_local_tags(&repo, &store);
        snapshot.save(file.path()).unwrap();

        let reloaded = RegistrySnapshot::load(file.path()).unwrap();
        assert_eq!(reloaded, snapshot);
        assert_eq!(reloaded.local_tags["user/app"].len(), 1);

        snapshot.set_local_tags(&repo, &InMemoryTagStore::new());
        assert!(snapshot.local_tags.is_empty());
    }
}
