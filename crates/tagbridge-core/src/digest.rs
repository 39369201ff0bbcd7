//! Content-addressed image digests.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};

use crate::error::{Error, Result};

/// Algorithm prefix for SHA-256 digests.
pub const SHA256: &str = "sha256";

/// A validated `<algorithm>:<encoded>` content digest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Digest(String);

impl Digest {
    /// Parses and validates a digest string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDigest`] if the algorithm or encoded part is malformed.
    ///
    /// # Examples
    ///
    /// ```
    /// use tagbridge_core::Digest;
    ///
    /// let digest = Digest::parse(
    ///     "sha256:2c26b46b68ffc68ff99b453c1d30413413422d706483bfa0f98a5e886266e7ae",
    /// )?;
    /// assert_eq!(digest.algorithm(), "sha256");
    /// # Ok::<(), tagbridge_core::Error>(())
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        let invalid = |reason: &str| Error::InvalidDigest {
            digest: s.to_string(),
            reason: reason.to_string(),
        };

        let (algorithm, encoded) = s
            .split_once(':')
            .ok_or_else(|| invalid("missing ':' separator"))?;

        if !is_valid_algorithm(algorithm) {
            return Err(invalid("invalid algorithm component"));
        }
        if encoded.is_empty() {
            return Err(invalid("empty encoded part"));
        }
        if algorithm == SHA256 {
            if encoded.len() != 64 {
                return Err(invalid("sha256 digest must be 64 hex characters"));
            }
            if !encoded.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
                return Err(invalid("sha256 digest must be lowercase hex"));
            }
        } else if !encoded
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'=' | b'_' | b'-'))
        {
            return Err(invalid("invalid characters in encoded part"));
        }

        Ok(Self(s.to_string()))
    }

    /// Computes the SHA-256 digest of the given content.
    #[must_use]
    pub fn sha256_of(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        Self(format!("{SHA256}:{}", hex::encode(hasher.finalize())))
    }

    /// Returns the algorithm component (e.g. "sha256").
    #[must_use]
    pub fn algorithm(&self) -> &str {
        self.0.split_once(':').map_or("", |(a, _)| a)
    }

    /// Returns the encoded part without the algorithm prefix.
    #[must_use]
    pub fn encoded(&self) -> &str {
        self.0.split_once(':').map_or("", |(_, e)| e)
    }

    /// Returns the full digest string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// algorithm-component := [a-z0-9]+ ( [+._-] [a-z0-9]+ )*
fn is_valid_algorithm(algorithm: &str) -> bool {
    !algorithm.is_empty()
        && algorithm
            .split(['+', '.', '_', '-'])
            .all(|part| {
                !part.is_empty()
                    && part
                        .bytes()
                        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
            })
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Digest {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Digest {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl From<Digest> for String {
    fn from(d: Digest) -> Self {
        d.0
    }
}

impl AsRef<str> for Digest {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
