//! Repository references.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Immutable `(namespace, name)` pair identifying a repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RepositoryRef {
    /// Namespace (project) owning the repository.
    pub namespace: String,

    /// Repository name within the namespace.
    pub name: String,
}

impl RepositoryRef {
    /// Creates a new reference without validation.
    #[must_use]
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Parses a `namespace/name` reference.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidReference`] if either component is empty,
    /// contains characters outside `[a-z0-9._-]`, or if extra path segments are present.
    ///
    /// # Examples
    ///
    /// ```
    /// use tagbridge_core::RepositoryRef;
    ///
    /// let repo = RepositoryRef::parse("user/app")?;
    /// assert_eq!(repo.namespace, "user");
    /// assert_eq!(repo.name, "app");
    /// # Ok::<(), tagbridge_core::Error>(())
    /// ```
    pub fn parse(reference: &str) -> Result<Self> {
        let invalid = |reason: &str| Error::InvalidReference {
            reference: reference.to_string(),
            reason: reason.to_string(),
        };

        let mut parts = reference.split('/');
        let (Some(namespace), Some(name), None) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid("expected exactly one '/' separator"));
        };

        for component in [namespace, name] {
            if component.is_empty() {
                return Err(invalid("empty path component"));
            }
            if !component
                .bytes()
                .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || matches!(b, b'.' | b'_' | b'-'))
            {
                return Err(invalid("path components must match [a-z0-9._-]+"));
            }
        }

        Ok(Self::new(namespace, name))
    }
}

impl fmt::Display for RepositoryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

impl FromStr for RepositoryRef {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let repo: RepositoryRef = "user/app".parse().unwrap();
        assert_eq!(repo, RepositoryRef::new("user", "app"));
        assert_eq!(repo.to_string(), "user/app");
    }

    #[test]
    fn test_parse_rejects_missing_name() {
        assert!(RepositoryRef::parse("user").is_err());
        assert!(RepositoryRef::parse("user/").is_err());
        assert!(RepositoryRef::parse("/app").is_err());
    }

    #[test]
    fn test_parse_rejects_extra_segments() {
        let err = RepositoryRef::parse("registry.example.com/user/app").unwrap_err();
        assert!(matches!(err, Error::InvalidReference { .. }));
    }

    #[test]
    fn test_parse_rejects_uppercase() {
        assert!(RepositoryRef::parse("User/App").is_err());
    }
}
